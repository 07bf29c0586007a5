//! The contract every COSEM interface class implements
//!
//! Implementors provide the class schema, access to their [`ObjectBase`] and the
//! typed handling of attributes 2..n and methods. Index range checks, the
//! logical name, read times, dirty tracking and the refresh policy are
//! provided here once for every class.

use crate::context::{Context, ObjectResolver};
use crate::object::{AttributeChange, ObjectBase};
use crate::object_type::ObjectType;
use crate::persistence::{PersistReader, PersistWriter};
use crate::schema::ClassSchema;
use chrono::Utc;
use dlms_asn1::{decode_data_with, encode_data};
use dlms_core::{DataObject, DataObjectType, DlmsError, DlmsResult, ObisCode};
use std::fmt;

/// COSEM object: an interface class instance addressed by logical name
pub trait CosemObject: Send + fmt::Debug {
    /// Static layout of the class
    fn schema(&self) -> &'static ClassSchema;

    fn base(&self) -> &ObjectBase;

    fn base_mut(&mut self) -> &mut ObjectBase;

    /// Encode attribute `index` (2..=count) from the typed fields
    fn get_attribute(&self, ctx: &Context<'_>, index: u8) -> DlmsResult<DataObject>;

    /// Decode attribute `index` (2..=count) into the typed fields
    ///
    /// Implementations validate the whole value before assigning anything.
    fn set_attribute(&mut self, ctx: &Context<'_>, index: u8, value: DataObject) -> DlmsResult<()>;

    /// Execute method `index` (1..=count)
    fn invoke_method(
        &mut self,
        ctx: &Context<'_>,
        index: u8,
        parameters: Option<DataObject>,
    ) -> DlmsResult<Option<DataObject>>;

    /// Write the attribute elements (header elements are written by the caller)
    fn save(&self, writer: &mut PersistWriter) -> DlmsResult<()>;

    /// Read the attribute elements back, defaulting what is missing
    fn load(&mut self, reader: &PersistReader<'_>) -> DlmsResult<()>;

    /// Resolve references to other objects once the whole collection is loaded
    fn post_load(&mut self, _resolver: &dyn ObjectResolver) -> DlmsResult<()> {
        Ok(())
    }

    fn object_type(&self) -> ObjectType {
        self.schema().object_type
    }

    fn class_id(&self) -> u16 {
        self.object_type().id()
    }

    fn version(&self) -> u8 {
        self.base().version()
    }

    fn logical_name(&self) -> Option<ObisCode> {
        self.base().logical_name()
    }

    fn attribute_count(&self) -> u8 {
        self.schema().attribute_count(self.version())
    }

    fn method_count(&self) -> u8 {
        self.schema().method_count(self.version())
    }

    fn names(&self) -> Vec<&'static str> {
        self.schema().names(self.version())
    }

    fn method_names(&self) -> Vec<&'static str> {
        self.schema().method_names(self.version())
    }

    /// Wire type of attribute `index`
    ///
    /// # Errors
    ///
    /// [`DlmsError::InvalidIndex`] outside `1..=attribute_count()`; this is a
    /// caller bug and has no wire-level result code.
    fn data_type(&self, index: u8) -> DlmsResult<DataObjectType> {
        let def = self
            .schema()
            .attribute(index)
            .filter(|_| index <= self.attribute_count())
            .ok_or(DlmsError::InvalidIndex {
                class_id: self.class_id(),
                index,
            })?;
        Ok(self.base().attributes().data_type(index).unwrap_or(def.data_type))
    }

    /// Display type of attribute `index`, the wire type unless declared otherwise
    fn ui_data_type(&self, index: u8) -> DlmsResult<DataObjectType> {
        let data_type = self.data_type(index)?;
        Ok(self.base().attributes().ui_data_type(index).unwrap_or(data_type))
    }

    /// Attributes the transport should fetch, in index order
    ///
    /// The logical name when it is unknown; every non-static readable attribute;
    /// static attributes until they have been read once. `force_all` lists
    /// every attribute of the current version.
    fn attribute_indices_needing_refresh(&self, force_all: bool) -> Vec<u8> {
        let base = self.base();
        let mut indices = Vec::new();
        if force_all || base.logical_name().is_none() {
            indices.push(1);
        }
        for index in 2..=self.attribute_count() {
            let is_static = base.attributes().is_static(index);
            let wanted = force_all
                || (!is_static && base.can_read(index))
                || (is_static && !base.is_read(index));
            if wanted {
                indices.push(index);
            }
        }
        indices
    }

    /// Current value of attribute `index`
    fn get_value(&self, ctx: &Context<'_>, index: u8) -> DlmsResult<DataObject> {
        check_attribute_index(self, index)?;
        if !self.base().can_read(index) {
            log::warn!("{}: attribute {} has no read access", self.class_id(), index);
            return Err(DlmsError::ReadWriteDenied(format!(
                "Attribute {} of {} is not readable",
                index,
                self.object_type()
            )));
        }
        if index == 1 {
            return self
                .logical_name()
                .map(|ln| DataObject::OctetString(ln.to_bytes().to_vec()))
                .ok_or_else(|| DlmsError::ReadWriteDenied("Logical name is not set".to_string()));
        }
        self.get_attribute(ctx, index)
    }

    /// Apply a value received from the device
    ///
    /// On success the attribute is marked read now and any pending local value is
    /// dropped. On failure nothing is changed.
    fn set_value(&mut self, ctx: &Context<'_>, index: u8, value: DataObject) -> DlmsResult<()> {
        check_attribute_index(self, index)?;
        log::debug!("{} attribute {} <- {}", self.object_type(), index, value);
        if index == 1 {
            let bytes = value.as_octet_string().map_err(|_| {
                DlmsError::type_mismatch(DataObjectType::OctetString, value.get_type())
            })?;
            let ln = ObisCode::from_bytes(bytes).map_err(|_| {
                DlmsError::type_mismatch("OctetString(6)", format!("OctetString({})", bytes.len()))
            })?;
            self.base_mut().set_logical_name(ln)?;
        } else {
            self.set_attribute(ctx, index, value)?;
        }
        let base = self.base_mut();
        base.mark_read(index, Utc::now());
        base.clear_dirty(index);
        Ok(())
    }

    /// Attribute `index` encoded as A-XDR, as a GET response carries it
    fn get_encoded(&self, ctx: &Context<'_>, index: u8) -> DlmsResult<Vec<u8>> {
        Ok(encode_data(&self.get_value(ctx, index)?))
    }

    /// Apply an A-XDR encoded attribute value received from the device
    fn set_encoded(&mut self, ctx: &Context<'_>, index: u8, bytes: &[u8]) -> DlmsResult<()> {
        let value = decode_data_with(bytes, ctx.settings.strict_array_types)?;
        self.set_value(ctx, index, value)
    }

    /// Invoke method `index` with optional parameters
    fn invoke(
        &mut self,
        ctx: &Context<'_>,
        index: u8,
        parameters: Option<DataObject>,
    ) -> DlmsResult<Option<DataObject>> {
        if index == 0 || index > self.method_count() {
            log::warn!("{}: method {} is not defined", self.object_type(), index);
            return Err(DlmsError::ReadWriteDenied(format!(
                "{} version {} has no method {}",
                self.object_type(),
                self.version(),
                index
            )));
        }
        log::debug!("{} invoke method {}", self.object_type(), index);
        self.invoke_method(ctx, index, parameters).inspect_err(|e| {
            log::warn!("{} method {} failed: {}", self.object_type(), index, e);
        })
    }

    /// Change attribute `index` locally, leaving it dirty until committed
    fn write_local(
        &mut self,
        ctx: &Context<'_>,
        index: u8,
        value: DataObject,
    ) -> DlmsResult<AttributeChange> {
        check_attribute_index(self, index)?;
        if index == 1 || !self.base().access(index).can_write() {
            log::warn!("{}: attribute {} is not writable", self.object_type(), index);
            return Err(DlmsError::ReadWriteDenied(format!(
                "Attribute {} of {} is not writable",
                index,
                self.object_type()
            )));
        }
        let previous = self.get_attribute(ctx, index)?;
        self.set_attribute(ctx, index, value.clone())?;
        Ok(self.base_mut().mark_dirty(index, value, previous))
    }

    /// Drop the pending value of `index` and restore the value it replaced
    ///
    /// The attribute stays dirty if the previous value cannot be restored.
    fn discard_dirty(
        &mut self,
        ctx: &Context<'_>,
        index: u8,
    ) -> DlmsResult<Option<AttributeChange>> {
        let Some(previous) = self.base().dirty_previous(index).cloned() else {
            return Ok(None);
        };
        self.set_attribute(ctx, index, previous)?;
        self.base_mut().take_dirty(index);
        let change = AttributeChange {
            index,
            dirty: false,
            value: None,
        };
        self.base_mut().notify(&change);
        Ok(Some(change))
    }
}

fn check_attribute_index<T: CosemObject + ?Sized>(object: &T, index: u8) -> DlmsResult<()> {
    if index == 0 || index > object.attribute_count() {
        log::warn!("{}: attribute {} is not defined", object.object_type(), index);
        return Err(DlmsError::ReadWriteDenied(format!(
            "{} version {} has no attribute {}",
            object.object_type(),
            object.version(),
            index
        )));
    }
    Ok(())
}

/// Error for a method the class declares but does not implement
pub(crate) fn method_denied(object_type: ObjectType, index: u8) -> DlmsError {
    DlmsError::ReadWriteDenied(format!("Method {} of {} is not supported", index, object_type))
}

/// Error for a parameterless method called with something other than `Integer8(0)`/none
pub(crate) fn expect_no_parameters(parameters: &Option<DataObject>) -> DlmsResult<()> {
    match parameters {
        None | Some(DataObject::Null) | Some(DataObject::Integer8(0)) => Ok(()),
        Some(other) => Err(DlmsError::type_mismatch(DataObjectType::Integer, other.get_type())),
    }
}

/// Parameters of a method that requires them
pub(crate) fn required_parameters(parameters: Option<DataObject>) -> DlmsResult<DataObject> {
    parameters.ok_or_else(|| DlmsError::type_mismatch("parameters", DataObjectType::NullData))
}
