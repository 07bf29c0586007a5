//! Register interface class (Class ID: 3)
//!
//! The Register interface class represents a single register value with
//! scaling factor and unit information.
//!
//! # Attributes
//!
//! - Attribute 1: logical_name (OBIS code) - The logical name of the object
//! - Attribute 2: value - The register value (any numeric type, or a string)
//! - Attribute 3: scaler_unit - ScalerUnit structure (scaler and unit), static
//!
//! # Methods
//!
//! - Method 1: reset - Set the value back to the default of its type
//!
//! # Usage
//!
//! ```rust,no_run
//! use dlms_interface::{CosemObject, Context, Register, ScalerUnit, UnitId};
//! use dlms_core::{DataObject, ObisCode};
//!
//! let mut register = Register::new(ObisCode::new(1, 0, 1, 8, 0, 255));
//! let ctx = Context::default();
//! register.set_value(&ctx, 3, ScalerUnit::new(3, UnitId::WattHour).to_data_object()).unwrap();
//! register.set_value(&ctx, 2, DataObject::Unsigned32(12345)).unwrap();
//! assert_eq!(register.scaled_value().unwrap(), 12_345_000.0);
//! ```

use crate::context::Context;
use crate::cosem_object::{expect_no_parameters, method_denied, CosemObject};
use crate::object::ObjectBase;
use crate::object_type::ObjectType;
use crate::persistence::{PersistReader, PersistWriter};
use crate::scaler_unit::ScalerUnit;
use crate::schema::{AttributeDef, ClassSchema, MethodDef};
use dlms_core::{DataObject, DataObjectType, DlmsError, DlmsResult, ObisCode};

static SCHEMA: ClassSchema = ClassSchema {
    object_type: ObjectType::Register,
    max_version: 0,
    attributes: &[
        AttributeDef::logical_name(),
        AttributeDef::new("Value", DataObjectType::NullData),
        AttributeDef::new("ScalerUnit", DataObjectType::Structure)
            .read_only()
            .fixed(),
    ],
    methods: &[MethodDef::new("Reset")],
};

/// Register interface class (Class ID: 3)
#[derive(Debug)]
pub struct Register {
    base: ObjectBase,
    value: DataObject,
    scaler_unit: ScalerUnit,
}

impl Register {
    pub const ATTR_VALUE: u8 = 2;
    pub const ATTR_SCALER_UNIT: u8 = 3;
    pub const METHOD_RESET: u8 = 1;

    pub fn new(logical_name: ObisCode) -> Self {
        Self {
            base: ObjectBase::initial(&SCHEMA, Some(logical_name)),
            value: DataObject::Null,
            scaler_unit: ScalerUnit::none(),
        }
    }

    pub fn value(&self) -> &DataObject {
        &self.value
    }

    pub fn scaler_unit(&self) -> ScalerUnit {
        self.scaler_unit
    }

    /// Get the scaled value as f64
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not numeric
    pub fn scaled_value(&self) -> DlmsResult<f64> {
        if !self.value.is_number() {
            return Err(DlmsError::type_mismatch("numeric value", self.value.get_type()));
        }
        Ok(self.scaler_unit.scale_value(self.value.to_f64()?))
    }

    fn store_value(&mut self, value: DataObject) {
        if !value.is_null() {
            self.base
                .attributes_mut()
                .set_data_type(Self::ATTR_VALUE, value.get_type());
        }
        self.value = value;
    }
}

impl CosemObject for Register {
    fn schema(&self) -> &'static ClassSchema {
        &SCHEMA
    }

    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_attribute(&self, _ctx: &Context<'_>, index: u8) -> DlmsResult<DataObject> {
        match index {
            Self::ATTR_VALUE => Ok(self.value.clone()),
            _ => Ok(self.scaler_unit.to_data_object()),
        }
    }

    fn set_attribute(
        &mut self,
        _ctx: &Context<'_>,
        index: u8,
        value: DataObject,
    ) -> DlmsResult<()> {
        match index {
            Self::ATTR_VALUE => self.store_value(value),
            _ => self.scaler_unit = ScalerUnit::from_data_object(&value)?,
        }
        Ok(())
    }

    fn invoke_method(
        &mut self,
        _ctx: &Context<'_>,
        index: u8,
        parameters: Option<DataObject>,
    ) -> DlmsResult<Option<DataObject>> {
        if index != Self::METHOD_RESET {
            return Err(method_denied(ObjectType::Register, index));
        }
        expect_no_parameters(&parameters)?;
        let reset = match self.base.attributes().data_type(Self::ATTR_VALUE) {
            Some(data_type) => data_type.default_value(),
            None => DataObject::Null,
        };
        log::debug!("Reset register {:?} to {}", self.base.logical_name(), reset);
        self.value = reset;
        Ok(None)
    }

    fn save(&self, writer: &mut PersistWriter) -> DlmsResult<()> {
        writer.write("Value", &self.value)?;
        writer.write_group("ScalerUnit", |group| {
            group.write("Scaler", &self.scaler_unit.scaler)?;
            group.write("Unit", &self.scaler_unit.unit)
        })
    }

    fn load(&mut self, reader: &PersistReader<'_>) -> DlmsResult<()> {
        let value = reader.read_or("Value", DataObject::Null)?;
        let scaler_unit = reader.read_group("ScalerUnit", |group| {
            Ok(ScalerUnit::from_raw(group.read("Scaler")?, group.read("Unit")?))
        })?;
        self.store_value(value);
        self.scaler_unit = scaler_unit;
        Ok(())
    }
}
