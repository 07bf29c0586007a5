//! Bit string type for DLMS/COSEM protocol

use crate::error::{DlmsError, DlmsResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arbitrary string of bits (zeros and ones)
///
/// A bit string value can have any length including zero.
///
/// Bits are numbered from the most significant bit of the first octet, as on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitString {
    bytes: Vec<u8>,
    num_bits: usize,
}

impl BitString {
    /// Construct a new bit string object.
    ///
    /// # Arguments
    ///
    /// * `bit_string` - The bit string as a byte array
    /// * `num_bits` - The number of bits
    ///
    /// # Errors
    ///
    /// Returns an error if `num_bits > bit_string.len() * 8`
    pub fn new(mut bit_string: Vec<u8>, num_bits: usize) -> DlmsResult<Self> {
        if num_bits > bit_string.len() * 8 {
            return Err(DlmsError::InvalidData(format!(
                "bit_string is too short to hold all bits. Need {} bytes for {} bits",
                num_bits.div_ceil(8),
                num_bits
            )));
        }
        bit_string.truncate(num_bits.div_ceil(8));
        let mut bit_string = Self {
            bytes: bit_string,
            num_bits,
        };
        bit_string.clear_padding();
        Ok(bit_string)
    }

    /// A bit string of `num_bits` cleared bits
    pub fn zeros(num_bits: usize) -> Self {
        Self {
            bytes: vec![0; num_bits.div_ceil(8)],
            num_bits,
        }
    }

    /// Parse a textual bit string such as `"10110"`
    pub fn from_bit_str(bits: &str) -> DlmsResult<Self> {
        let mut bit_string = Self::zeros(bits.len());
        for (index, c) in bits.chars().enumerate() {
            match c {
                '0' => {}
                '1' => bit_string.set_bit(index, true)?,
                other => {
                    return Err(DlmsError::InvalidData(format!(
                        "Invalid character '{}' in bit string",
                        other
                    )))
                }
            }
        }
        Ok(bit_string)
    }

    /// Get the bit string as byte array.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The number of bits in the byte array.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    /// Get the bit at a specific position
    ///
    /// # Arguments
    /// * `index` - The bit index (0-based)
    ///
    /// # Returns
    /// * `true` if the bit is set, `false` otherwise
    /// * `Err` if the index is out of bounds
    pub fn get_bit(&self, index: usize) -> DlmsResult<bool> {
        if index >= self.num_bits {
            return Err(DlmsError::InvalidData(format!(
                "Bit index {} out of bounds (num_bits: {})",
                index, self.num_bits
            )));
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8); // MSB first
        Ok((self.bytes[byte_index] >> bit_index) & 1 == 1)
    }

    /// Set the bit at a specific position
    ///
    /// # Arguments
    /// * `index` - The bit index (0-based)
    /// * `value` - The value to set (true = 1, false = 0)
    ///
    /// # Returns
    /// * `Err` if the index is out of bounds
    pub fn set_bit(&mut self, index: usize, value: bool) -> DlmsResult<()> {
        if index >= self.num_bits {
            return Err(DlmsError::InvalidData(format!(
                "Bit index {} out of bounds (num_bits: {})",
                index, self.num_bits
            )));
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8); // MSB first
        if value {
            self.bytes[byte_index] |= 1 << bit_index;
        } else {
            self.bytes[byte_index] &= !(1 << bit_index);
        }
        Ok(())
    }

    /// Grow (with cleared bits) or shrink the bit string to `num_bits`
    pub fn resize(&mut self, num_bits: usize) {
        self.bytes.resize(num_bits.div_ceil(8), 0);
        self.num_bits = num_bits;
        self.clear_padding();
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Index of the first cleared bit, or `num_bits` when every bit is set
    pub fn first_zero(&self) -> usize {
        (0..self.num_bits)
            .find(|&index| matches!(self.get_bit(index), Ok(false)))
            .unwrap_or(self.num_bits)
    }

    fn clear_padding(&mut self) {
        let used = self.num_bits % 8;
        if used != 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last &= 0xFFu8 << (8 - used);
            }
        }
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in 0..self.num_bits {
            let set = matches!(self.get_bit(index), Ok(true));
            f.write_str(if set { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_string_new() {
        let bytes = vec![0xFF, 0x00, 0xAA];
        let bit_string = BitString::new(bytes.clone(), 24).unwrap();
        assert_eq!(bit_string.as_bytes(), &bytes);
        assert_eq!(bit_string.num_bits(), 24);
    }

    #[test]
    fn test_bit_string_invalid() {
        let bytes = vec![0xFF];
        let result = BitString::new(bytes, 16);
        assert!(result.is_err());
    }

    #[test]
    fn test_bit_string_partial_byte() {
        let bytes = vec![0xFF];
        let bit_string = BitString::new(bytes, 4).unwrap();
        assert_eq!(bit_string.num_bits(), 4);
        assert_eq!(bit_string.as_bytes(), &[0xF0]);
        assert_eq!(bit_string.to_string(), "1111");
    }

    #[test]
    fn test_bit_string_text_form() {
        let bit_string = BitString::from_bit_str("10110").unwrap();
        assert_eq!(bit_string.to_string(), "10110");
        assert_eq!(bit_string.count_ones(), 3);
        assert_eq!(bit_string.first_zero(), 1);
        assert!(BitString::from_bit_str("10x").is_err());
    }

    #[test]
    fn test_bit_string_resize() {
        let mut bit_string = BitString::from_bit_str("1111").unwrap();
        bit_string.resize(10);
        assert_eq!(bit_string.to_string(), "1111000000");
        assert_eq!(bit_string.first_zero(), 4);
        bit_string.resize(2);
        assert_eq!(bit_string.count_ones(), 2);
        assert_eq!(bit_string.first_zero(), 2);
    }
}
