//! A-XDR encoder for DLMS/COSEM

use crate::axdr::types::{AxdrTag, LengthEncoding};
use dlms_core::datatypes::*;

/// A-XDR encoder for encoding DLMS/COSEM data types
///
/// Every value is written as its tag followed by the payload. Numbers are
/// fixed-width big-endian, strings and arrays carry an object-count prefix.
#[derive(Debug)]
pub struct AxdrEncoder {
    buffer: Vec<u8>,
}

impl AxdrEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a DataObject, recursing into structures and arrays
    pub fn encode_data_object(&mut self, obj: &DataObject) {
        self.encode_tag(AxdrTag::for_type(obj.get_type()));
        match obj {
            DataObject::Null => {}
            DataObject::Boolean(b) => self.encode_bool(*b),
            DataObject::Integer8(i) => self.encode_i8(*i),
            DataObject::Integer16(i) => self.encode_bytes(&i.to_be_bytes()),
            DataObject::Integer32(i) => self.encode_bytes(&i.to_be_bytes()),
            DataObject::Integer64(i) => self.encode_bytes(&i.to_be_bytes()),
            DataObject::Unsigned8(u) | DataObject::Enumerate(u) | DataObject::Bcd(u) => {
                self.encode_u8(*u)
            }
            DataObject::Unsigned16(u) => self.encode_bytes(&u.to_be_bytes()),
            DataObject::Unsigned32(u) => self.encode_bytes(&u.to_be_bytes()),
            DataObject::Unsigned64(u) => self.encode_bytes(&u.to_be_bytes()),
            DataObject::Float32(f) => self.encode_bytes(&f.to_bits().to_be_bytes()),
            DataObject::Float64(f) => self.encode_bytes(&f.to_bits().to_be_bytes()),
            DataObject::OctetString(s) => self.encode_octet_string(s),
            DataObject::VisibleString(s) | DataObject::Utf8String(s) => {
                self.encode_octet_string(s.as_bytes())
            }
            DataObject::BitString(bs) => self.encode_bit_string(bs),
            DataObject::Array(elements) | DataObject::Structure(elements) => {
                self.encode_sequence(elements)
            }
            DataObject::Date(d) => self.encode_bytes(&d.encode()),
            DataObject::Time(t) => self.encode_bytes(&t.encode()),
            DataObject::DateTime(dt) => self.encode_bytes(&dt.encode()),
        }
    }

    /// Encode a tag
    pub fn encode_tag(&mut self, tag: AxdrTag) {
        self.buffer.push(tag.to_u8());
    }

    /// Encode a boolean
    pub fn encode_bool(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    /// Encode an i8
    pub fn encode_i8(&mut self, value: i8) {
        self.buffer.push(value as u8);
    }

    /// Encode a u8
    pub fn encode_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Encode an object-count / length prefix
    pub fn encode_length(&mut self, len: usize) {
        self.buffer.extend_from_slice(&LengthEncoding::of(len).encode());
    }

    /// Encode an octet string
    pub fn encode_octet_string(&mut self, value: &[u8]) {
        self.encode_length(value.len());
        self.buffer.extend_from_slice(value);
    }

    /// Encode a bit string: bit count, then the packed bytes
    pub fn encode_bit_string(&mut self, bit_string: &BitString) {
        self.encode_length(bit_string.num_bits());
        self.buffer.extend_from_slice(bit_string.as_bytes());
    }

    /// Encode the element count and every element of an array or structure
    pub fn encode_sequence(&mut self, elements: &[DataObject]) {
        self.encode_length(elements.len());
        for obj in elements {
            self.encode_data_object(obj);
        }
    }

    /// Encode raw bytes
    pub fn encode_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Get the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Clear the encoder buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for AxdrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(obj: &DataObject) -> Vec<u8> {
        let mut encoder = AxdrEncoder::new();
        encoder.encode_data_object(obj);
        encoder.into_bytes()
    }

    #[test]
    fn test_encode_null() {
        assert_eq!(encode(&DataObject::Null), vec![0x00]);
    }

    #[test]
    fn test_encode_boolean() {
        assert_eq!(encode(&DataObject::Boolean(true)), vec![0x03, 0x01]);
        assert_eq!(encode(&DataObject::Boolean(false)), vec![0x03, 0x00]);
    }

    #[test]
    fn test_encode_integer32() {
        assert_eq!(
            encode(&DataObject::Integer32(0x12345678)),
            vec![0x05, 0x12, 0x34, 0x56, 0x78]
        );
        assert_eq!(encode(&DataObject::Integer16(-2)), vec![0x10, 0xFF, 0xFE]);
    }

    #[test]
    fn test_encode_strings() {
        assert_eq!(
            encode(&DataObject::OctetString(vec![0, 0, 1, 0, 0, 255])),
            vec![0x09, 0x06, 0, 0, 1, 0, 0, 255]
        );
        assert_eq!(
            encode(&DataObject::new_visible_string("FW1")),
            vec![0x0A, 0x03, b'F', b'W', b'1']
        );
    }

    #[test]
    fn test_encode_bit_string() {
        let bits = BitString::from_bit_str("1010000011").unwrap();
        assert_eq!(
            encode(&DataObject::BitString(bits)),
            vec![0x04, 0x0A, 0xA0, 0xC0]
        );
    }

    #[test]
    fn test_encode_structure_of_array() {
        let value = DataObject::Structure(vec![
            DataObject::Unsigned16(300),
            DataObject::Array(vec![DataObject::Enumerate(1), DataObject::Enumerate(2)]),
        ]);
        assert_eq!(
            encode(&value),
            vec![0x02, 0x02, 0x12, 0x01, 0x2C, 0x01, 0x02, 0x16, 0x01, 0x16, 0x02]
        );
    }

    #[test]
    fn test_encode_long_octet_string_uses_long_length() {
        let bytes = encode(&DataObject::OctetString(vec![0xAB; 200]));
        assert_eq!(&bytes[..3], &[0x09, 0x81, 200]);
        assert_eq!(bytes.len(), 3 + 200);
    }
}
