//! Scaler and unit of Register values
//!
//! Attribute 3 of the Register interface class is a structure of two elements:
//! - **scaler**: Integer8, the value is multiplied by 10^scaler
//! - **unit**: Enumerate, the unit code from the DLMS unit table
//!
//! # Usage
//!
//! ```rust,no_run
//! use dlms_interface::{ScalerUnit, UnitId};
//!
//! // kWh: raw value in Wh, scaled by 10^3
//! let scaler_unit = ScalerUnit::new(3, UnitId::WattHour);
//! assert_eq!(scaler_unit.scale_value(12.0), 12000.0);
//! ```

use dlms_core::{DataObject, DataObjectType, DlmsError, DlmsResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit codes of the DLMS unit table used by the adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UnitId {
    Year = 1,
    Month = 2,
    Week = 3,
    Day = 4,
    Hour = 5,
    Minute = 6,
    Second = 7,
    Ampere = 33,
    Volt = 35,
    VoltAmpere = 28,
    Watt = 27,
    VoltAmpereReactive = 29,
    WattHour = 30,
    VoltAmpereHour = 31,
    VarHour = 32,
    Hertz = 44,
    Kelvin = 52,
    Celsius = 9,
    CubicMeter = 13,
    CubicMeterPerHour = 15,
    Liter = 19,
    Percent = 56,
    Count = 255,
}

impl UnitId {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => Self::Year,
            2 => Self::Month,
            3 => Self::Week,
            4 => Self::Day,
            5 => Self::Hour,
            6 => Self::Minute,
            7 => Self::Second,
            13 => Self::CubicMeter,
            15 => Self::CubicMeterPerHour,
            27 => Self::Watt,
            28 => Self::VoltAmpere,
            29 => Self::VoltAmpereReactive,
            30 => Self::WattHour,
            31 => Self::VoltAmpereHour,
            32 => Self::VarHour,
            33 => Self::Ampere,
            35 => Self::Volt,
            44 => Self::Hertz,
            56 => Self::Percent,
            52 => Self::Kelvin,
            9 => Self::Celsius,
            19 => Self::Liter,
            255 => Self::Count,
            _ => return None,
        })
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Get the symbol for this unit
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Year => "a",
            Self::Month => "mo",
            Self::Week => "wk",
            Self::Day => "d",
            Self::Hour => "h",
            Self::Minute => "min",
            Self::Second => "s",
            Self::Ampere => "A",
            Self::Volt => "V",
            Self::VoltAmpere => "VA",
            Self::Watt => "W",
            Self::VoltAmpereReactive => "var",
            Self::WattHour => "Wh",
            Self::VoltAmpereHour => "VAh",
            Self::VarHour => "varh",
            Self::Hertz => "Hz",
            Self::Kelvin => "K",
            Self::Celsius => "°C",
            Self::CubicMeter => "m³",
            Self::CubicMeterPerHour => "m³/h",
            Self::Liter => "l",
            Self::Percent => "%",
            Self::Count => "",
        }
    }

    pub fn is_energy_unit(self) -> bool {
        matches!(self, Self::WattHour | Self::VoltAmpereHour | Self::VarHour)
    }

    pub fn is_power_unit(self) -> bool {
        matches!(self, Self::Watt | Self::VoltAmpere | Self::VoltAmpereReactive)
    }
}

/// Scaler Unit structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalerUnit {
    /// The actual value is multiplied by 10^scaler
    pub scaler: i8,
    /// Raw unit code; codes outside [`UnitId`] are kept as received
    pub unit: u8,
}

impl ScalerUnit {
    pub fn new(scaler: i8, unit: UnitId) -> Self {
        Self {
            scaler,
            unit: unit.to_u8(),
        }
    }

    pub fn from_raw(scaler: i8, unit: u8) -> Self {
        Self { scaler, unit }
    }

    /// No scaling, unit code 0 ("not set")
    pub fn none() -> Self {
        Self { scaler: 0, unit: 0 }
    }

    pub fn unit_id(&self) -> Option<UnitId> {
        UnitId::from_u8(self.unit)
    }

    /// The scaled value (value * 10^scaler)
    pub fn scale_value(&self, value: f64) -> f64 {
        value * 10_f64.powi(i32::from(self.scaler))
    }

    /// Reverse scaling (scaled_value / 10^scaler)
    pub fn unscale_value(&self, scaled_value: f64) -> f64 {
        scaled_value / 10_f64.powi(i32::from(self.scaler))
    }

    pub fn to_data_object(&self) -> DataObject {
        DataObject::Structure(vec![
            DataObject::Integer8(self.scaler),
            DataObject::Enumerate(self.unit),
        ])
    }

    /// Parse the attribute structure; the unit may arrive as Enumerate or Unsigned8
    pub fn from_data_object(obj: &DataObject) -> DlmsResult<Self> {
        let elements = obj.as_structure_of(2)?;
        let scaler = match &elements[0] {
            DataObject::Integer8(v) => *v,
            other => {
                return Err(DlmsError::type_mismatch(
                    DataObjectType::Integer,
                    other.get_type(),
                ))
            }
        };
        let unit = match &elements[1] {
            DataObject::Enumerate(v) | DataObject::Unsigned8(v) => *v,
            other => {
                return Err(DlmsError::type_mismatch(
                    DataObjectType::Enumerate,
                    other.get_type(),
                ))
            }
        };
        Ok(Self { scaler, unit })
    }
}

impl Default for ScalerUnit {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for ScalerUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit_id() {
            Some(unit) => write!(f, "10^{} {}", self.scaler, unit.symbol()),
            None => write!(f, "10^{} unit {}", self.scaler, self.unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_unit_creation() {
        let su = ScalerUnit::new(3, UnitId::Watt);
        assert_eq!(su.scaler, 3);
        assert_eq!(su.unit, 27);
        assert_eq!(su.unit_id(), Some(UnitId::Watt));
        assert_eq!(su.to_string(), "10^3 W");
    }

    #[test]
    fn test_scale_value() {
        let su = ScalerUnit::new(-2, UnitId::Volt);
        assert!((su.scale_value(23015.0) - 230.15).abs() < 1e-9);
        assert!((su.unscale_value(230.15) - 23015.0).abs() < 1e-6);
    }

    #[test]
    fn test_to_from_data_object() {
        let su = ScalerUnit::new(3, UnitId::WattHour);
        let obj = su.to_data_object();
        assert_eq!(ScalerUnit::from_data_object(&obj).unwrap(), su);

        let raw = DataObject::Structure(vec![DataObject::Integer8(0), DataObject::Unsigned8(200)]);
        let su = ScalerUnit::from_data_object(&raw).unwrap();
        assert_eq!(su.unit_id(), None);
    }

    #[test]
    fn test_from_data_object_rejects_bad_shape() {
        let short = DataObject::Structure(vec![DataObject::Integer8(0)]);
        assert!(matches!(
            ScalerUnit::from_data_object(&short),
            Err(DlmsError::TypeMismatch { .. })
        ));
        let wrong =
            DataObject::Structure(vec![DataObject::Unsigned8(0), DataObject::Enumerate(30)]);
        assert!(ScalerUnit::from_data_object(&wrong).is_err());
    }

    #[test]
    fn test_unit_id_codes() {
        for code in 0..=255u8 {
            if let Some(unit) = UnitId::from_u8(code) {
                assert_eq!(unit.to_u8(), code);
            }
        }
        assert!(UnitId::WattHour.is_energy_unit());
        assert!(UnitId::Watt.is_power_unit());
    }
}
