//! A-XDR decoder for DLMS/COSEM

use crate::axdr::types::{AxdrTag, LengthEncoding};
use dlms_core::datatypes::*;
use dlms_core::error::{DlmsError, DlmsResult};

/// Nesting limit for structures and arrays
pub const MAX_DEPTH: usize = 64;

/// A-XDR decoder for decoding DLMS/COSEM data types
///
/// Malformed input is always a [`DlmsError::Decode`]: truncated payloads,
/// unknown tags and nesting beyond [`MAX_DEPTH`] are never defaulted.
#[derive(Debug)]
pub struct AxdrDecoder<'a> {
    buffer: &'a [u8],
    position: usize,
    strict_arrays: bool,
    depth: usize,
}

impl<'a> AxdrDecoder<'a> {
    /// Create a new decoder
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
            strict_arrays: false,
            depth: 0,
        }
    }

    /// Require array elements to share one type
    pub fn with_strict_arrays(mut self, strict: bool) -> Self {
        self.strict_arrays = strict;
        self
    }

    /// Decode a DataObject
    pub fn decode_data_object(&mut self) -> DlmsResult<DataObject> {
        let offset = self.position;
        let tag = self.decode_tag()?;
        log::trace!("A-XDR decode {:?} at offset {}", tag, offset);

        let value = match tag {
            AxdrTag::Null => DataObject::Null,
            AxdrTag::Boolean => DataObject::Boolean(self.decode_bool()?),
            AxdrTag::Integer8 => DataObject::Integer8(self.decode_u8()? as i8),
            AxdrTag::Integer16 => DataObject::Integer16(i16::from_be_bytes(self.read_array()?)),
            AxdrTag::Integer32 => DataObject::Integer32(i32::from_be_bytes(self.read_array()?)),
            AxdrTag::Integer64 => DataObject::Integer64(i64::from_be_bytes(self.read_array()?)),
            AxdrTag::Unsigned8 => DataObject::Unsigned8(self.decode_u8()?),
            AxdrTag::Unsigned16 => DataObject::Unsigned16(u16::from_be_bytes(self.read_array()?)),
            AxdrTag::Unsigned32 => DataObject::Unsigned32(u32::from_be_bytes(self.read_array()?)),
            AxdrTag::Unsigned64 => DataObject::Unsigned64(u64::from_be_bytes(self.read_array()?)),
            AxdrTag::Float32 => {
                DataObject::Float32(f32::from_bits(u32::from_be_bytes(self.read_array()?)))
            }
            AxdrTag::Float64 => {
                DataObject::Float64(f64::from_bits(u64::from_be_bytes(self.read_array()?)))
            }
            AxdrTag::Enumerate => DataObject::Enumerate(self.decode_u8()?),
            AxdrTag::Bcd => DataObject::Bcd(self.decode_u8()?),
            AxdrTag::OctetString => DataObject::OctetString(self.decode_octet_string()?.to_vec()),
            AxdrTag::VisibleString => DataObject::VisibleString(self.decode_text()?),
            AxdrTag::Utf8String => DataObject::Utf8String(self.decode_text()?),
            AxdrTag::BitString => DataObject::BitString(self.decode_bit_string()?),
            AxdrTag::Array => {
                let elements = self.decode_sequence()?;
                if self.strict_arrays {
                    DataObject::new_array(elements)
                        .map_err(|e| DlmsError::Decode(format!("At offset {}: {}", offset, e)))?
                } else {
                    DataObject::Array(elements)
                }
            }
            AxdrTag::Structure => DataObject::Structure(self.decode_sequence()?),
            AxdrTag::Date => {
                let bytes = self.decode_fixed_bytes(CosemDate::LENGTH)?;
                DataObject::Date(CosemDate::decode(bytes).map_err(Self::to_decode_error)?)
            }
            AxdrTag::Time => {
                let bytes = self.decode_fixed_bytes(CosemTime::LENGTH)?;
                DataObject::Time(CosemTime::decode(bytes).map_err(Self::to_decode_error)?)
            }
            AxdrTag::DateTime => {
                let bytes = self.decode_fixed_bytes(CosemDateTime::LENGTH)?;
                DataObject::DateTime(CosemDateTime::decode(bytes).map_err(Self::to_decode_error)?)
            }
        };
        Ok(value)
    }

    fn to_decode_error(err: DlmsError) -> DlmsError {
        match err {
            DlmsError::Decode(_) => err,
            other => DlmsError::Decode(other.to_string()),
        }
    }

    /// Decode a tag
    pub fn decode_tag(&mut self) -> DlmsResult<AxdrTag> {
        let byte = self.read_byte()?;
        AxdrTag::from_u8(byte)
    }

    /// Decode a boolean; any non-zero octet is true
    pub fn decode_bool(&mut self) -> DlmsResult<bool> {
        Ok(self.read_byte()? != 0x00)
    }

    /// Decode a u8
    pub fn decode_u8(&mut self) -> DlmsResult<u8> {
        self.read_byte()
    }

    /// Decode an object-count / length prefix
    pub fn decode_length(&mut self) -> DlmsResult<usize> {
        let (len_enc, consumed) = LengthEncoding::decode(&self.buffer[self.position..])?;
        self.position += consumed;
        Ok(len_enc.value())
    }

    /// Decode an octet string
    pub fn decode_octet_string(&mut self) -> DlmsResult<&'a [u8]> {
        let len = self.decode_length()?;
        self.decode_fixed_bytes(len)
    }

    fn decode_text(&mut self) -> DlmsResult<String> {
        let bytes = self.decode_octet_string()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| DlmsError::Decode(format!("Invalid string payload: {}", e)))
    }

    /// Decode a bit string
    pub fn decode_bit_string(&mut self) -> DlmsResult<BitString> {
        let num_bits = self.decode_length()?;
        let bytes = self.decode_fixed_bytes(num_bits.div_ceil(8))?;
        BitString::new(bytes.to_vec(), num_bits).map_err(Self::to_decode_error)
    }

    /// Decode the element count and every element of an array or structure
    pub fn decode_sequence(&mut self) -> DlmsResult<Vec<DataObject>> {
        let len = self.decode_length()?;
        // Each element needs at least its tag byte
        if len > self.remaining() {
            return Err(DlmsError::Decode(format!(
                "Element count {} exceeds the {} remaining bytes",
                len,
                self.remaining()
            )));
        }
        if self.depth >= MAX_DEPTH {
            return Err(DlmsError::Decode(format!(
                "Nesting deeper than {} levels",
                MAX_DEPTH
            )));
        }

        self.depth += 1;
        let mut elements = Vec::with_capacity(len);
        for _ in 0..len {
            match self.decode_data_object() {
                Ok(element) => elements.push(element),
                Err(e) => {
                    self.depth -= 1;
                    return Err(e);
                }
            }
        }
        self.depth -= 1;
        Ok(elements)
    }

    /// Decode fixed-length bytes
    pub fn decode_fixed_bytes(&mut self, len: usize) -> DlmsResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| {
                DlmsError::Decode(format!(
                    "Not enough bytes: need {}, have {}",
                    len,
                    self.remaining()
                ))
            })?;

        let result = &self.buffer[self.position..end];
        self.position = end;
        Ok(result)
    }

    fn read_array<const N: usize>(&mut self) -> DlmsResult<[u8; N]> {
        let bytes = self.decode_fixed_bytes(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    /// Read a single byte
    fn read_byte(&mut self) -> DlmsResult<u8> {
        let byte = *self
            .buffer
            .get(self.position)
            .ok_or_else(|| DlmsError::Decode("Not enough bytes".to_string()))?;
        self.position += 1;
        Ok(byte)
    }

    /// Get current position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_null() {
        let bytes = [0x00];
        let mut decoder = AxdrDecoder::new(&bytes);
        let tag = decoder.decode_tag().unwrap();
        assert_eq!(tag, AxdrTag::Null);
    }

    #[test]
    fn test_decode_boolean() {
        let bytes = [0x03, 0xFF];
        let mut decoder = AxdrDecoder::new(&bytes);
        let obj = decoder.decode_data_object().unwrap();
        assert_eq!(obj, DataObject::Boolean(true));
    }

    #[test]
    fn test_decode_integer32() {
        let bytes = [0x05, 0x12, 0x34, 0x56, 0x78];
        let mut decoder = AxdrDecoder::new(&bytes);
        let obj = decoder.decode_data_object().unwrap();
        assert_eq!(obj, DataObject::Integer32(0x12345678));
        assert_eq!(decoder.remaining(), 0);
    }

    #[test]
    fn test_decode_truncated_is_error() {
        let cases: [&[u8]; 5] = [
            &[0x05, 0x12, 0x34],
            &[0x09, 0x06, 0x00, 0x00],
            &[0x02, 0x02, 0x11, 0x01],
            &[0x19, 0x07, 0xE8],
            &[],
        ];
        for bytes in cases {
            let mut decoder = AxdrDecoder::new(bytes);
            assert!(matches!(
                decoder.decode_data_object(),
                Err(DlmsError::Decode(_))
            ));
        }
    }

    #[test]
    fn test_decode_huge_count_is_error() {
        let bytes = [0x01, 0x84, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
        let mut decoder = AxdrDecoder::new(&bytes);
        assert!(decoder.decode_data_object().is_err());
    }

    #[test]
    fn test_decode_strict_arrays() {
        let bytes = [0x01, 0x02, 0x11, 0x01, 0x03, 0x00];

        let mut decoder = AxdrDecoder::new(&bytes);
        assert!(decoder.decode_data_object().is_ok());

        let mut decoder = AxdrDecoder::new(&bytes).with_strict_arrays(true);
        assert!(matches!(
            decoder.decode_data_object(),
            Err(DlmsError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_nesting_limit() {
        let mut bytes = Vec::new();
        for _ in 0..=MAX_DEPTH {
            bytes.extend_from_slice(&[0x02, 0x01]);
        }
        bytes.push(0x00);
        let mut decoder = AxdrDecoder::new(&bytes);
        assert!(decoder.decode_data_object().is_err());
    }
}
