//! Data object types for DLMS/COSEM protocol

use crate::error::{DlmsError, DlmsResult};
use crate::datatypes::bit_string::BitString;
use crate::datatypes::cosem_date::CosemDate;
use crate::datatypes::cosem_time::CosemTime;
use crate::datatypes::cosem_date_time::CosemDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Container class holding data to send to the smart meter or received by the smart meter
///
/// Stores various data types including numbers, lists, byte arrays, BitString,
/// or date/time formats.
/// Structures and arrays nest to arbitrary depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataObject {
    /// Null data
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer 8-bit
    Integer8(i8),
    /// Integer 16-bit
    Integer16(i16),
    /// Integer 32-bit
    Integer32(i32),
    /// Integer 64-bit
    Integer64(i64),
    /// Unsigned integer 8-bit
    Unsigned8(u8),
    /// Unsigned integer 16-bit
    Unsigned16(u16),
    /// Unsigned integer 32-bit
    Unsigned32(u32),
    /// Unsigned integer 64-bit
    Unsigned64(u64),
    /// Float 32-bit
    Float32(f32),
    /// Float 64-bit
    Float64(f64),
    /// Enumeration (8-bit)
    Enumerate(u8),
    /// BCD (Binary Coded Decimal)
    Bcd(u8),
    /// Octet string
    OctetString(Vec<u8>),
    /// Visible string
    VisibleString(String),
    /// UTF-8 string
    Utf8String(String),
    /// Bit string
    BitString(BitString),
    /// Array of DataObjects, variable arity
    Array(Vec<DataObject>),
    /// Structure (ordered list of DataObjects), fixed arity
    Structure(Vec<DataObject>),
    /// Date
    Date(CosemDate),
    /// Time
    Time(CosemTime),
    /// Date and time
    DateTime(CosemDateTime),
}

/// Type enumeration for DataObject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataObjectType {
    /// Null
    NullData,
    /// Array
    Array,
    /// Structure
    Structure,
    /// Boolean
    Boolean,
    /// Bit string
    BitString,
    /// Integer 32-bit
    DoubleLong,
    /// Unsigned integer 32-bit
    DoubleLongUnsigned,
    /// Octet string
    OctetString,
    /// UTF-8 string
    Utf8String,
    /// Visible string
    VisibleString,
    /// BCD
    Bcd,
    /// Integer 8-bit
    Integer,
    /// Integer 16-bit
    LongInteger,
    /// Unsigned integer 8-bit
    Unsigned,
    /// Unsigned integer 16-bit
    LongUnsigned,
    /// Integer 64-bit
    Long64,
    /// Unsigned integer 64-bit
    Long64Unsigned,
    /// Enumeration
    Enumerate,
    /// Float 32-bit
    Float32,
    /// Float 64-bit
    Float64,
    /// Date time
    DateTime,
    /// Date
    Date,
    /// Time
    Time,
}

impl DataObjectType {
    /// Check if this type is a number type
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            DataObjectType::DoubleLong
                | DataObjectType::DoubleLongUnsigned
                | DataObjectType::Integer
                | DataObjectType::LongInteger
                | DataObjectType::Unsigned
                | DataObjectType::LongUnsigned
                | DataObjectType::Long64
                | DataObjectType::Long64Unsigned
                | DataObjectType::Enumerate
                | DataObjectType::Bcd
                | DataObjectType::Float32
                | DataObjectType::Float64
        )
    }

    /// Zero/empty value of this type
    pub fn default_value(&self) -> DataObject {
        match self {
            DataObjectType::NullData => DataObject::Null,
            DataObjectType::Array => DataObject::Array(Vec::new()),
            DataObjectType::Structure => DataObject::Structure(Vec::new()),
            DataObjectType::Boolean => DataObject::Boolean(false),
            DataObjectType::BitString => DataObject::BitString(BitString::default()),
            DataObjectType::DoubleLong => DataObject::Integer32(0),
            DataObjectType::DoubleLongUnsigned => DataObject::Unsigned32(0),
            DataObjectType::OctetString => DataObject::OctetString(Vec::new()),
            DataObjectType::Utf8String => DataObject::Utf8String(String::new()),
            DataObjectType::VisibleString => DataObject::VisibleString(String::new()),
            DataObjectType::Bcd => DataObject::Bcd(0),
            DataObjectType::Integer => DataObject::Integer8(0),
            DataObjectType::LongInteger => DataObject::Integer16(0),
            DataObjectType::Unsigned => DataObject::Unsigned8(0),
            DataObjectType::LongUnsigned => DataObject::Unsigned16(0),
            DataObjectType::Long64 => DataObject::Integer64(0),
            DataObjectType::Long64Unsigned => DataObject::Unsigned64(0),
            DataObjectType::Enumerate => DataObject::Enumerate(0),
            DataObjectType::Float32 => DataObject::Float32(0.0),
            DataObjectType::Float64 => DataObject::Float64(0.0),
            DataObjectType::DateTime => DataObject::DateTime(CosemDateTime::unspecified()),
            DataObjectType::Date => DataObject::Date(CosemDate::unspecified()),
            DataObjectType::Time => DataObject::Time(CosemTime::unspecified()),
        }
    }
}

impl fmt::Display for DataObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Numeric payload of a value, before casting to the requested width
enum Numeric {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl DataObject {
    /// Get the type of this DataObject
    pub fn get_type(&self) -> DataObjectType {
        match self {
            DataObject::Null => DataObjectType::NullData,
            DataObject::Boolean(_) => DataObjectType::Boolean,
            DataObject::Integer8(_) => DataObjectType::Integer,
            DataObject::Integer16(_) => DataObjectType::LongInteger,
            DataObject::Integer32(_) => DataObjectType::DoubleLong,
            DataObject::Integer64(_) => DataObjectType::Long64,
            DataObject::Unsigned8(_) => DataObjectType::Unsigned,
            DataObject::Unsigned16(_) => DataObjectType::LongUnsigned,
            DataObject::Unsigned32(_) => DataObjectType::DoubleLongUnsigned,
            DataObject::Unsigned64(_) => DataObjectType::Long64Unsigned,
            DataObject::Float32(_) => DataObjectType::Float32,
            DataObject::Float64(_) => DataObjectType::Float64,
            DataObject::Enumerate(_) => DataObjectType::Enumerate,
            DataObject::Bcd(_) => DataObjectType::Bcd,
            DataObject::OctetString(_) => DataObjectType::OctetString,
            DataObject::VisibleString(_) => DataObjectType::VisibleString,
            DataObject::Utf8String(_) => DataObjectType::Utf8String,
            DataObject::BitString(_) => DataObjectType::BitString,
            DataObject::Array(_) => DataObjectType::Array,
            DataObject::Structure(_) => DataObjectType::Structure,
            DataObject::Date(_) => DataObjectType::Date,
            DataObject::Time(_) => DataObjectType::Time,
            DataObject::DateTime(_) => DataObjectType::DateTime,
        }
    }

    /// Constructs a visible string data
    pub fn new_visible_string(string: impl Into<String>) -> Self {
        DataObject::VisibleString(string.into())
    }

    /// Constructs an array data
    ///
    /// # Errors
    ///
    /// Returns an error if array elements have different types
    pub fn new_array(array: Vec<DataObject>) -> DlmsResult<Self> {
        if let Some(first) = array.first() {
            let array_type = first.get_type();
            for (index, sub) in array.iter().enumerate() {
                if sub.get_type() != array_type {
                    return Err(DlmsError::InvalidData(format!(
                        "Array is of type {:?}, but element at {} is of type {:?}",
                        array_type,
                        index,
                        sub.get_type()
                    )));
                }
            }
        }
        Ok(DataObject::Array(array))
    }

    /// Check if this DataObject is a number
    pub fn is_number(&self) -> bool {
        self.get_type().is_number()
    }

    /// Check if this DataObject is a complex type (Array or Structure)
    pub fn is_complex(&self) -> bool {
        matches!(self, DataObject::Array(_) | DataObject::Structure(_))
    }

    /// Check if this DataObject is null
    pub fn is_null(&self) -> bool {
        matches!(self, DataObject::Null)
    }

    fn mismatch(&self, expected: &str) -> DlmsError {
        DlmsError::type_mismatch(expected, self.get_type())
    }

    fn numeric(&self, expected: &str) -> DlmsResult<Numeric> {
        Ok(match self {
            DataObject::Boolean(b) => Numeric::Unsigned(u64::from(*b)),
            DataObject::Integer8(v) => Numeric::Signed(i64::from(*v)),
            DataObject::Integer16(v) => Numeric::Signed(i64::from(*v)),
            DataObject::Integer32(v) => Numeric::Signed(i64::from(*v)),
            DataObject::Integer64(v) => Numeric::Signed(*v),
            DataObject::Unsigned8(v) | DataObject::Enumerate(v) | DataObject::Bcd(v) => {
                Numeric::Unsigned(u64::from(*v))
            }
            DataObject::Unsigned16(v) => Numeric::Unsigned(u64::from(*v)),
            DataObject::Unsigned32(v) => Numeric::Unsigned(u64::from(*v)),
            DataObject::Unsigned64(v) => Numeric::Unsigned(*v),
            DataObject::Float32(v) => Numeric::Float(f64::from(*v)),
            DataObject::Float64(v) => Numeric::Float(*v),
            _ => return Err(self.mismatch(expected)),
        })
    }

    /// Get the value as a boolean; numbers are true when non-zero
    pub fn as_bool(&self) -> DlmsResult<bool> {
        match self {
            DataObject::Boolean(b) => Ok(*b),
            _ => Ok(self.to_i64().map_err(|_| self.mismatch("Boolean"))? != 0),
        }
    }

    /// Get the value as an octet string
    pub fn as_octet_string(&self) -> DlmsResult<&[u8]> {
        match self {
            DataObject::OctetString(s) => Ok(s),
            _ => Err(self.mismatch("OctetString")),
        }
    }

    /// Get the value as text (visible or UTF-8 string)
    pub fn as_str(&self) -> DlmsResult<&str> {
        match self {
            DataObject::VisibleString(s) | DataObject::Utf8String(s) => Ok(s),
            _ => Err(self.mismatch("VisibleString")),
        }
    }

    pub fn as_bit_string(&self) -> DlmsResult<&BitString> {
        match self {
            DataObject::BitString(bs) => Ok(bs),
            _ => Err(self.mismatch("BitString")),
        }
    }

    /// Get the value as an array
    pub fn as_array(&self) -> DlmsResult<&[DataObject]> {
        match self {
            DataObject::Array(a) => Ok(a),
            _ => Err(self.mismatch("Array")),
        }
    }

    /// Get the value as a structure
    pub fn as_structure(&self) -> DlmsResult<&[DataObject]> {
        match self {
            DataObject::Structure(s) => Ok(s),
            _ => Err(self.mismatch("Structure")),
        }
    }

    /// Get a structure of exactly `arity` elements
    pub fn as_structure_of(&self, arity: usize) -> DlmsResult<&[DataObject]> {
        let elements = self.as_structure()?;
        if elements.len() != arity {
            return Err(DlmsError::type_mismatch(
                format!("Structure of {} elements", arity),
                format!("Structure of {} elements", elements.len()),
            ));
        }
        Ok(elements)
    }
}

macro_rules! numeric_coercions {
    ($($name:ident => $ty:ty, $label:literal;)*) => {
        impl DataObject {
            $(
                #[doc = concat!(
                    "Convert any numeric value to `",
                    stringify!($ty),
                    "` with `as`-cast semantics"
                )]
                pub fn $name(&self) -> DlmsResult<$ty> {
                    Ok(match self.numeric($label)? {
                        Numeric::Signed(v) => v as $ty,
                        Numeric::Unsigned(v) => v as $ty,
                        Numeric::Float(v) => v as $ty,
                    })
                }
            )*
        }
    };
}

numeric_coercions! {
    to_u8 => u8, "Unsigned";
    to_u16 => u16, "LongUnsigned";
    to_u32 => u32, "DoubleLongUnsigned";
    to_u64 => u64, "Long64Unsigned";
    to_i8 => i8, "Integer";
    to_i16 => i16, "LongInteger";
    to_i32 => i32, "DoubleLong";
    to_i64 => i64, "Long64";
    to_f64 => f64, "Float64";
}

impl fmt::Display for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataObject::Null => write!(f, "NULL_DATA"),
            DataObject::Boolean(b) => write!(f, "BOOLEAN: {}", b),
            DataObject::Integer8(i) => write!(f, "INTEGER: {}", i),
            DataObject::Integer16(i) => write!(f, "LONG_INTEGER: {}", i),
            DataObject::Integer32(i) => write!(f, "DOUBLE_LONG: {}", i),
            DataObject::Integer64(i) => write!(f, "LONG64: {}", i),
            DataObject::Unsigned8(u) => write!(f, "UNSIGNED: {}", u),
            DataObject::Unsigned16(u) => write!(f, "LONG_UNSIGNED: {}", u),
            DataObject::Unsigned32(u) => write!(f, "DOUBLE_LONG_UNSIGNED: {}", u),
            DataObject::Unsigned64(u) => write!(f, "LONG64_UNSIGNED: {}", u),
            DataObject::Float32(fl) => write!(f, "FLOAT32: {}", fl),
            DataObject::Float64(fl) => write!(f, "FLOAT64: {}", fl),
            DataObject::Enumerate(e) => write!(f, "ENUMERATE: {}", e),
            DataObject::Bcd(b) => write!(f, "BCD: {}", b),
            DataObject::OctetString(s) => {
                write!(f, "OCTET_STRING: ")?;
                for byte in s {
                    write!(f, "{:02X} ", byte)?;
                }
                Ok(())
            }
            DataObject::VisibleString(s) => write!(f, "VISIBLE_STRING: {}", s),
            DataObject::Utf8String(s) => write!(f, "UTF8_STRING: {}", s),
            DataObject::BitString(bs) => write!(f, "BIT_STRING: {}", bs),
            DataObject::Array(arr) => {
                write!(f, "ARRAY: {} element(s)", arr.len())?;
                for (i, elem) in arr.iter().enumerate() {
                    write!(f, "\n  [{}]: {}", i, elem)?;
                }
                Ok(())
            }
            DataObject::Structure(s) => {
                write!(f, "STRUCTURE: {} element(s)", s.len())?;
                for (i, elem) in s.iter().enumerate() {
                    write!(f, "\n  [{}]: {}", i, elem)?;
                }
                Ok(())
            }
            DataObject::Date(d) => write!(f, "DATE: {}", d),
            DataObject::Time(t) => write!(f, "TIME: {}", t),
            DataObject::DateTime(dt) => write!(f, "DATE_TIME: {}", dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_object_null() {
        let obj = DataObject::Null;
        assert!(obj.is_null());
        assert_eq!(obj.get_type(), DataObjectType::NullData);
    }

    #[test]
    fn test_data_object_boolean() {
        assert!(DataObject::Boolean(true).as_bool().unwrap());
        assert!(DataObject::Unsigned8(1).as_bool().unwrap());
        assert!(DataObject::OctetString(vec![1]).as_bool().is_err());
    }

    #[test]
    fn test_data_object_array() {
        let arr = vec![
            DataObject::Integer32(1),
            DataObject::Integer32(2),
            DataObject::Integer32(3),
        ];
        let obj = DataObject::new_array(arr).unwrap();
        assert!(obj.is_complex());
        assert_eq!(obj.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_data_object_array_mixed_types() {
        let arr = vec![DataObject::Integer32(1), DataObject::Boolean(true)];
        assert!(DataObject::new_array(arr).is_err());
    }

    #[test]
    fn test_numeric_coercion_widens_and_truncates() {
        assert_eq!(DataObject::Unsigned8(200).to_u32().unwrap(), 200);
        assert_eq!(DataObject::Unsigned16(0x1234).to_u8().unwrap(), 0x34);
        assert_eq!(DataObject::Integer8(-1).to_u16().unwrap(), 0xFFFF);
        assert_eq!(DataObject::Integer64(-5).to_i16().unwrap(), -5);
        assert_eq!(DataObject::Enumerate(4).to_i32().unwrap(), 4);
        assert_eq!(DataObject::Float32(2.75).to_i32().unwrap(), 2);
        assert_eq!(DataObject::Unsigned32(7).to_f64().unwrap(), 7.0);
    }

    #[test]
    fn test_numeric_coercion_rejects_non_numbers() {
        let err = DataObject::Structure(vec![]).to_u32().unwrap_err();
        match err {
            DlmsError::TypeMismatch { expected, found } => {
                assert_eq!(expected, "DoubleLongUnsigned");
                assert_eq!(found, "Structure");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(DataObject::OctetString(vec![1, 2]).to_i8().is_err());
        assert!(DataObject::Null.to_f64().is_err());
    }

    #[test]
    fn test_structure_arity() {
        let value = DataObject::Structure(vec![DataObject::Null, DataObject::Null]);
        assert!(value.as_structure_of(2).is_ok());
        assert!(value.as_structure_of(3).is_err());
    }

    #[test]
    fn test_default_value_matches_type() {
        for data_type in [
            DataObjectType::DoubleLongUnsigned,
            DataObjectType::VisibleString,
            DataObjectType::DateTime,
            DataObjectType::BitString,
        ] {
            assert_eq!(data_type.default_value().get_type(), data_type);
        }
    }
}
