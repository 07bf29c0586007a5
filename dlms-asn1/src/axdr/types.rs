//! A-XDR types for DLMS/COSEM

use dlms_core::datatypes::DataObjectType;
use dlms_core::error::{DlmsError, DlmsResult};

/// A-XDR tag values for different data types
///
/// Tag values are fixed by the DLMS data-type table and shared by every
/// implementation. Compact array (0x13) and don't-care (0xFF) are not part
/// of the value universe and are rejected by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxdrTag {
    Null = 0x00,
    Boolean = 0x03,
    Integer8 = 0x0F,
    Integer16 = 0x10,
    Integer32 = 0x05,
    Integer64 = 0x14,
    Unsigned8 = 0x11,
    Unsigned16 = 0x12,
    Unsigned32 = 0x06,
    Unsigned64 = 0x15,
    Float32 = 0x17,
    Float64 = 0x18,
    OctetString = 0x09,
    VisibleString = 0x0A,
    Utf8String = 0x0C,
    Bcd = 0x0D,
    BitString = 0x04,
    Date = 0x1A,
    Time = 0x1B,
    DateTime = 0x19,
    Array = 0x01,
    Structure = 0x02,
    Enumerate = 0x16,
}

impl AxdrTag {
    /// Get tag from u8 value
    pub fn from_u8(value: u8) -> DlmsResult<Self> {
        match value {
            0x00 => Ok(AxdrTag::Null),
            0x03 => Ok(AxdrTag::Boolean),
            0x0F => Ok(AxdrTag::Integer8),
            0x10 => Ok(AxdrTag::Integer16),
            0x05 => Ok(AxdrTag::Integer32),
            0x14 => Ok(AxdrTag::Integer64),
            0x11 => Ok(AxdrTag::Unsigned8),
            0x12 => Ok(AxdrTag::Unsigned16),
            0x06 => Ok(AxdrTag::Unsigned32),
            0x15 => Ok(AxdrTag::Unsigned64),
            0x17 => Ok(AxdrTag::Float32),
            0x18 => Ok(AxdrTag::Float64),
            0x09 => Ok(AxdrTag::OctetString),
            0x0A => Ok(AxdrTag::VisibleString),
            0x0C => Ok(AxdrTag::Utf8String),
            0x0D => Ok(AxdrTag::Bcd),
            0x04 => Ok(AxdrTag::BitString),
            0x1A => Ok(AxdrTag::Date),
            0x1B => Ok(AxdrTag::Time),
            0x19 => Ok(AxdrTag::DateTime),
            0x01 => Ok(AxdrTag::Array),
            0x02 => Ok(AxdrTag::Structure),
            0x16 => Ok(AxdrTag::Enumerate),
            0x13 => Err(DlmsError::Decode("Compact array tag 0x13 is not supported".to_string())),
            0xFF => Err(DlmsError::Decode("Don't-care tag 0xFF is not a value".to_string())),
            _ => Err(DlmsError::Decode(format!(
                "Unknown A-XDR tag: 0x{:02X}",
                value
            ))),
        }
    }

    /// Convert tag to u8 value
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Wire tag of a value type
    pub fn for_type(data_type: DataObjectType) -> Self {
        match data_type {
            DataObjectType::NullData => AxdrTag::Null,
            DataObjectType::Array => AxdrTag::Array,
            DataObjectType::Structure => AxdrTag::Structure,
            DataObjectType::Boolean => AxdrTag::Boolean,
            DataObjectType::BitString => AxdrTag::BitString,
            DataObjectType::DoubleLong => AxdrTag::Integer32,
            DataObjectType::DoubleLongUnsigned => AxdrTag::Unsigned32,
            DataObjectType::OctetString => AxdrTag::OctetString,
            DataObjectType::Utf8String => AxdrTag::Utf8String,
            DataObjectType::VisibleString => AxdrTag::VisibleString,
            DataObjectType::Bcd => AxdrTag::Bcd,
            DataObjectType::Integer => AxdrTag::Integer8,
            DataObjectType::LongInteger => AxdrTag::Integer16,
            DataObjectType::Unsigned => AxdrTag::Unsigned8,
            DataObjectType::LongUnsigned => AxdrTag::Unsigned16,
            DataObjectType::Long64 => AxdrTag::Integer64,
            DataObjectType::Long64Unsigned => AxdrTag::Unsigned64,
            DataObjectType::Enumerate => AxdrTag::Enumerate,
            DataObjectType::Float32 => AxdrTag::Float32,
            DataObjectType::Float64 => AxdrTag::Float64,
            DataObjectType::DateTime => AxdrTag::DateTime,
            DataObjectType::Date => AxdrTag::Date,
            DataObjectType::Time => AxdrTag::Time,
        }
    }

    /// Value type carried under this tag
    pub fn data_type(self) -> DataObjectType {
        match self {
            AxdrTag::Null => DataObjectType::NullData,
            AxdrTag::Boolean => DataObjectType::Boolean,
            AxdrTag::Integer8 => DataObjectType::Integer,
            AxdrTag::Integer16 => DataObjectType::LongInteger,
            AxdrTag::Integer32 => DataObjectType::DoubleLong,
            AxdrTag::Integer64 => DataObjectType::Long64,
            AxdrTag::Unsigned8 => DataObjectType::Unsigned,
            AxdrTag::Unsigned16 => DataObjectType::LongUnsigned,
            AxdrTag::Unsigned32 => DataObjectType::DoubleLongUnsigned,
            AxdrTag::Unsigned64 => DataObjectType::Long64Unsigned,
            AxdrTag::Float32 => DataObjectType::Float32,
            AxdrTag::Float64 => DataObjectType::Float64,
            AxdrTag::OctetString => DataObjectType::OctetString,
            AxdrTag::VisibleString => DataObjectType::VisibleString,
            AxdrTag::Utf8String => DataObjectType::Utf8String,
            AxdrTag::Bcd => DataObjectType::Bcd,
            AxdrTag::BitString => DataObjectType::BitString,
            AxdrTag::Date => DataObjectType::Date,
            AxdrTag::Time => DataObjectType::Time,
            AxdrTag::DateTime => DataObjectType::DateTime,
            AxdrTag::Array => DataObjectType::Array,
            AxdrTag::Structure => DataObjectType::Structure,
            AxdrTag::Enumerate => DataObjectType::Enumerate,
        }
    }
}

/// Object-count / length prefix of variable-length types
///
/// Counts below 128 take one byte. Larger counts take a `0x80 | n` byte
/// followed by `n` big-endian length bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthEncoding {
    /// Short form: length < 128, encoded in 1 byte
    Short(u8),
    /// Long form: length >= 128, encoded with length-of-length byte + length bytes
    Long(usize),
}

impl LengthEncoding {
    /// Pick the shortest form for `len`
    pub fn of(len: usize) -> Self {
        match u8::try_from(len) {
            Ok(short) if short < 0x80 => LengthEncoding::Short(short),
            _ => LengthEncoding::Long(len),
        }
    }

    /// The count carried by either form
    pub fn value(&self) -> usize {
        match self {
            LengthEncoding::Short(len) => usize::from(*len),
            LengthEncoding::Long(len) => *len,
        }
    }

    /// Encode length to bytes
    pub fn encode(&self) -> Vec<u8> {
        match self {
            LengthEncoding::Short(len) => vec![*len],
            LengthEncoding::Long(len) => {
                let bytes = len.to_be_bytes();
                let skip = bytes.iter().take_while(|b| **b == 0).count();
                let significant = &bytes[skip..];
                let mut result = Vec::with_capacity(1 + significant.len());
                result.push(0x80 | significant.len() as u8);
                result.extend_from_slice(significant);
                result
            }
        }
    }

    /// Decode length from bytes, returning the form and the number of bytes consumed
    pub fn decode(bytes: &[u8]) -> DlmsResult<(Self, usize)> {
        let Some(&first_byte) = bytes.first() else {
            return Err(DlmsError::Decode("Not enough bytes for length".to_string()));
        };

        if (first_byte & 0x80) == 0 {
            return Ok((LengthEncoding::Short(first_byte), 1));
        }

        let length_of_length = (first_byte & 0x7F) as usize;
        if length_of_length == 0 || length_of_length > 4 {
            return Err(DlmsError::Decode(format!(
                "Invalid length-of-length: {}",
                length_of_length
            )));
        }
        let Some(length_bytes) = bytes.get(1..1 + length_of_length) else {
            return Err(DlmsError::Decode("Not enough bytes for long length".to_string()));
        };

        let len = length_bytes
            .iter()
            .fold(0usize, |len, &byte| (len << 8) | usize::from(byte));
        Ok((LengthEncoding::Long(len), 1 + length_of_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_encoding_short() {
        let enc = LengthEncoding::of(10);
        assert_eq!(enc, LengthEncoding::Short(10));
        assert_eq!(enc.encode(), vec![10]);
    }

    #[test]
    fn test_length_encoding_long() {
        let enc = LengthEncoding::of(256);
        let bytes = enc.encode();
        assert_eq!(bytes, vec![0x82, 0x01, 0x00]);
        let (decoded, consumed) = LengthEncoding::decode(&bytes).unwrap();
        assert_eq!(decoded.value(), 256);
        assert_eq!(consumed, bytes.len());

        assert_eq!(LengthEncoding::of(128).encode(), vec![0x81, 0x80]);
    }

    #[test]
    fn test_length_encoding_truncated() {
        assert!(LengthEncoding::decode(&[]).is_err());
        assert!(LengthEncoding::decode(&[0x82, 0x01]).is_err());
        assert!(LengthEncoding::decode(&[0x80]).is_err());
    }

    #[test]
    fn test_reserved_tags_are_rejected() {
        assert!(matches!(AxdrTag::from_u8(0x13), Err(DlmsError::Decode(_))));
        assert!(matches!(AxdrTag::from_u8(0xFF), Err(DlmsError::Decode(_))));
        assert!(matches!(AxdrTag::from_u8(0x07), Err(DlmsError::Decode(_))));
    }

    #[test]
    fn test_tag_type_mapping_is_consistent() {
        for byte in 0u8..=0x1B {
            if let Ok(tag) = AxdrTag::from_u8(byte) {
                assert_eq!(AxdrTag::for_type(tag.data_type()), tag);
            }
        }
    }
}
