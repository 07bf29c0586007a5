//! Data interface class (Class ID: 1)
//!
//! The Data interface class is the simplest COSEM interface class.
//! It holds a single value whose type is only known once the device reports it.
//!
//! # Attributes
//!
//! - Attribute 1: logical_name (OBIS code) - The logical name of the object
//! - Attribute 2: value (any type) - The data value
//!
//! # Methods
//!
//! None
//!
//! # Usage
//!
//! ```rust,no_run
//! use dlms_interface::{CosemObject, Context, Data};
//! use dlms_core::{DataObject, ObisCode};
//!
//! let mut data = Data::new(ObisCode::new(0, 0, 96, 1, 0, 255));
//! let ctx = Context::default();
//! data.set_value(&ctx, 2, DataObject::new_visible_string("SN-1234")).unwrap();
//! assert_eq!(data.value(), &DataObject::new_visible_string("SN-1234"));
//! ```

use crate::context::Context;
use crate::cosem_object::CosemObject;
use crate::object::ObjectBase;
use crate::object_type::ObjectType;
use crate::persistence::{PersistReader, PersistWriter};
use crate::schema::{AttributeDef, ClassSchema};
use dlms_core::{DataObject, DataObjectType, DlmsResult, ObisCode};

static SCHEMA: ClassSchema = ClassSchema {
    object_type: ObjectType::Data,
    max_version: 0,
    attributes: &[
        AttributeDef::logical_name(),
        AttributeDef::new("Value", DataObjectType::NullData),
    ],
    methods: &[],
};

/// Data interface class (Class ID: 1)
#[derive(Debug)]
pub struct Data {
    base: ObjectBase,
    value: DataObject,
}

impl Data {
    pub const ATTR_VALUE: u8 = 2;

    pub fn new(logical_name: ObisCode) -> Self {
        Self {
            base: ObjectBase::initial(&SCHEMA, Some(logical_name)),
            value: DataObject::Null,
        }
    }

    pub fn value(&self) -> &DataObject {
        &self.value
    }

    fn store(&mut self, value: DataObject) {
        if !value.is_null() {
            self.base
                .attributes_mut()
                .set_data_type(Self::ATTR_VALUE, value.get_type());
        }
        self.value = value;
    }
}

impl CosemObject for Data {
    fn schema(&self) -> &'static ClassSchema {
        &SCHEMA
    }

    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_attribute(&self, _ctx: &Context<'_>, _index: u8) -> DlmsResult<DataObject> {
        Ok(self.value.clone())
    }

    fn set_attribute(
        &mut self,
        _ctx: &Context<'_>,
        _index: u8,
        value: DataObject,
    ) -> DlmsResult<()> {
        self.store(value);
        Ok(())
    }

    fn invoke_method(
        &mut self,
        _ctx: &Context<'_>,
        index: u8,
        _parameters: Option<DataObject>,
    ) -> DlmsResult<Option<DataObject>> {
        Err(crate::cosem_object::method_denied(ObjectType::Data, index))
    }

    fn save(&self, writer: &mut PersistWriter) -> DlmsResult<()> {
        writer.write("Value", &self.value)
    }

    fn load(&mut self, reader: &PersistReader<'_>) -> DlmsResult<()> {
        let value = reader.read_or("Value", DataObject::Null)?;
        self.store(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AccessMode;
    use dlms_core::DlmsError;

    #[test]
    fn test_data_value_type_follows_device() {
        let mut data = Data::new(ObisCode::new(0, 0, 96, 1, 0, 255));
        let ctx = Context::default();
        assert_eq!(data.data_type(2).unwrap(), DataObjectType::NullData);

        data.set_value(&ctx, 2, DataObject::Unsigned32(42)).unwrap();
        assert_eq!(data.data_type(2).unwrap(), DataObjectType::DoubleLongUnsigned);
        assert_eq!(data.get_value(&ctx, 2).unwrap(), DataObject::Unsigned32(42));
        assert!(data.base().is_read(2));
    }

    #[test]
    fn test_data_counts() {
        let data = Data::new(ObisCode::new(0, 0, 96, 1, 0, 255));
        assert_eq!(data.class_id(), 1);
        assert_eq!(data.attribute_count(), 2);
        assert_eq!(data.method_count(), 0);
        assert_eq!(data.names(), vec!["LogicalName", "Value"]);
    }

    #[test]
    fn test_data_logical_name_attribute() {
        let data = Data::new(ObisCode::new(0, 0, 96, 1, 0, 255));
        let ctx = Context::default();
        assert_eq!(
            data.get_value(&ctx, 1).unwrap(),
            DataObject::OctetString(vec![0, 0, 96, 1, 0, 255])
        );
        assert_eq!(data.base().access(1), AccessMode::Read);
        assert!(matches!(
            data.get_value(&ctx, 3),
            Err(DlmsError::ReadWriteDenied(_))
        ));
        assert!(matches!(data.data_type(3), Err(DlmsError::InvalidIndex { .. })));
        assert!(matches!(data.data_type(0), Err(DlmsError::InvalidIndex { .. })));
    }

    #[test]
    fn test_data_has_no_methods() {
        let mut data = Data::new(ObisCode::new(0, 0, 96, 1, 0, 255));
        let ctx = Context::default();
        assert!(matches!(
            data.invoke(&ctx, 1, None),
            Err(DlmsError::ReadWriteDenied(_))
        ));
    }
}
