//! Session context handed to every attribute and method call

use crate::collection::ObjectHandle;
use crate::object_type::ObjectType;
use dlms_core::{DlmsResult, ObisCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session preferences consumed by the object model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    /// Read time zones and deviations with the ordinary UTC offset sign
    /// (UTC+02:00 is +120) instead of the DLMS one (-120)
    pub use_utc_to_normal_time: bool,
    /// Reject decoded arrays whose elements differ in type
    pub strict_array_types: bool,
}

impl ContextSettings {
    /// Parse settings from JSON; missing keys keep their defaults
    pub fn from_json(text: &str) -> DlmsResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Lookup of objects by logical name, provided by the owning collection
#[cfg_attr(test, mockall::automock)]
pub trait ObjectResolver {
    fn resolve(&self, object_type: ObjectType, logical_name: &ObisCode) -> Option<ObjectHandle>;
}

/// Settings plus the optional resolver of the current session
#[derive(Clone, Copy, Default)]
pub struct Context<'a> {
    pub settings: ContextSettings,
    resolver: Option<&'a dyn ObjectResolver>,
}

impl<'a> Context<'a> {
    pub fn new(settings: ContextSettings) -> Self {
        Self {
            settings,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: &'a dyn ObjectResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn resolver(&self) -> Option<&'a dyn ObjectResolver> {
        self.resolver
    }

    /// Resolve through the attached resolver, `None` without one
    pub fn resolve(
        &self,
        object_type: ObjectType,
        logical_name: &ObisCode,
    ) -> Option<ObjectHandle> {
        self.resolver
            .and_then(|resolver| resolver.resolve(object_type, logical_name))
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_json() {
        let settings = ContextSettings::from_json(r#"{"use_utc_to_normal_time": true}"#).unwrap();
        assert!(settings.use_utc_to_normal_time);
        assert!(!settings.strict_array_types);
        assert!(ContextSettings::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_context_resolves_through_resolver() {
        let ln = ObisCode::new(1, 0, 1, 8, 0, 255);
        let mut resolver = MockObjectResolver::new();
        resolver
            .expect_resolve()
            .withf(move |object_type, name| *object_type == ObjectType::Register && *name == ln)
            .times(1)
            .return_const(Some(ObjectHandle::new(3)));

        let ctx = Context::default().with_resolver(&resolver);
        assert_eq!(ctx.resolve(ObjectType::Register, &ln), Some(ObjectHandle::new(3)));
        assert_eq!(Context::default().resolve(ObjectType::Register, &ln), None);
    }
}
