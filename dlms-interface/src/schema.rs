//! Version-gated class schemas
//!
//! Each interface class declares one static [`ClassSchema`]. Attribute and
//! method counts, names, wire types and default access all derive from it, so
//! a new schema version only ever appends entries with a higher `since`.

use crate::attribute::{AccessMode, MethodAccessMode};
use crate::object_type::ObjectType;
use dlms_core::DataObjectType;

/// Declaration of one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDef {
    pub name: &'static str,
    pub data_type: DataObjectType,
    pub ui_type: Option<DataObjectType>,
    pub access: AccessMode,
    pub is_static: bool,
    /// First schema version carrying the attribute
    pub since: u8,
}

impl AttributeDef {
    pub const fn new(name: &'static str, data_type: DataObjectType) -> Self {
        Self {
            name,
            data_type,
            ui_type: None,
            access: AccessMode::ReadWrite,
            is_static: false,
            since: 0,
        }
    }

    /// Attribute 1 of every class
    pub const fn logical_name() -> Self {
        Self::new("LogicalName", DataObjectType::OctetString)
            .access(AccessMode::Read)
            .fixed()
    }

    pub const fn access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    pub const fn read_only(self) -> Self {
        self.access(AccessMode::Read)
    }

    /// Value not expected to change during a session
    pub const fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub const fn ui(mut self, ui_type: DataObjectType) -> Self {
        self.ui_type = Some(ui_type);
        self
    }

    pub const fn since(mut self, version: u8) -> Self {
        self.since = version;
        self
    }
}

/// Declaration of one method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDef {
    pub name: &'static str,
    pub since: u8,
    pub access: MethodAccessMode,
}

impl MethodDef {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            since: 0,
            access: MethodAccessMode::Access,
        }
    }

    pub const fn since(mut self, version: u8) -> Self {
        self.since = version;
        self
    }
}

/// Attribute and method layout of an interface class
#[derive(Debug)]
pub struct ClassSchema {
    pub object_type: ObjectType,
    pub max_version: u8,
    /// Ordered by index, starting at attribute 1
    pub attributes: &'static [AttributeDef],
    /// Ordered by index, starting at method 1
    pub methods: &'static [MethodDef],
}

impl ClassSchema {
    pub fn supports_version(&self, version: u8) -> bool {
        version <= self.max_version
    }

    pub fn attribute_count(&self, version: u8) -> u8 {
        self.attributes.iter().filter(|a| a.since <= version).count() as u8
    }

    pub fn method_count(&self, version: u8) -> u8 {
        self.methods.iter().filter(|m| m.since <= version).count() as u8
    }

    /// Attribute `index` (1-based), whatever the version
    pub fn attribute(&self, index: u8) -> Option<&AttributeDef> {
        index
            .checked_sub(1)
            .and_then(|i| self.attributes.get(usize::from(i)))
    }

    /// Method `index` (1-based), whatever the version
    pub fn method(&self, index: u8) -> Option<&MethodDef> {
        index
            .checked_sub(1)
            .and_then(|i| self.methods.get(usize::from(i)))
    }

    pub fn names(&self, version: u8) -> Vec<&'static str> {
        self.attributes
            .iter()
            .filter(|a| a.since <= version)
            .map(|a| a.name)
            .collect()
    }

    pub fn method_names(&self, version: u8) -> Vec<&'static str> {
        self.methods
            .iter()
            .filter(|m| m.since <= version)
            .map(|m| m.name)
            .collect()
    }
}
