//! COSEM Time type for DLMS/COSEM protocol

use crate::error::{DlmsError, DlmsResult};
use crate::datatypes::cosem_date::{CosemDateFormat, Field, NOT_SPECIFIED};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class representing a COSEM Time
///
/// Four octets: hour, minute, second, hundredths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CosemTime {
    octet_string: [u8; 4],
}

impl CosemTime {
    pub const LENGTH: usize = 4;

    /// Constructs a COSEM Time
    ///
    /// # Arguments
    ///
    /// * `hour` - The hour from 0 to 23, or 0xff if not specified
    /// * `minute` - The minute from 0 to 59, or 0xff if not specified
    /// * `second` - The second from 0 to 59, or 0xff if not specified
    pub fn new(hour: u8, minute: u8, second: u8) -> DlmsResult<Self> {
        Self::new_with_hundredths(hour, minute, second, NOT_SPECIFIED)
    }

    /// Constructs a COSEM Time with hundredths
    ///
    /// # Arguments
    ///
    /// * `hour` - The hour from 0 to 23, or 0xff if not specified
    /// * `minute` - The minute from 0 to 59, or 0xff if not specified
    /// * `second` - The second from 0 to 59, or 0xff if not specified
    /// * `hundredths` - The hundredths seconds from 0 to 99, or 0xff if not specified
    pub fn new_with_hundredths(
        hour: u8,
        minute: u8,
        second: u8,
        hundredths: u8,
    ) -> DlmsResult<Self> {
        Self::verify(hour, "Hour", 0, 23)?;
        Self::verify(minute, "Minute", 0, 59)?;
        Self::verify(second, "Second", 0, 59)?;
        Self::verify(hundredths, "Hundredths", 0, 99)?;

        Ok(Self {
            octet_string: [hour, minute, second, hundredths],
        })
    }

    /// A time with every field set to "not specified"
    pub fn unspecified() -> Self {
        Self {
            octet_string: [NOT_SPECIFIED; 4],
        }
    }

    /// Constructs a time of day, truncated to hundredths
    pub fn from_naive_time(time: NaiveTime) -> Self {
        let hundredths = (time.nanosecond() % 1_000_000_000) / 10_000_000;
        Self {
            octet_string: [
                time.hour() as u8,
                time.minute() as u8,
                time.second() as u8,
                hundredths as u8,
            ],
        }
    }

    /// Decode a COSEM Time from a byte array
    pub fn decode(octet_string: &[u8]) -> DlmsResult<Self> {
        let octet_string: [u8; 4] = octet_string.try_into().map_err(|_| {
            DlmsError::InvalidData(format!(
                "Wrong size. Expected {}, got {}",
                Self::LENGTH,
                octet_string.len()
            ))
        })?;
        Ok(Self { octet_string })
    }

    pub fn hour(&self) -> u8 {
        self.octet_string[0]
    }

    pub fn minute(&self) -> u8 {
        self.octet_string[1]
    }

    pub fn second(&self) -> u8 {
        self.octet_string[2]
    }

    pub fn hundredths(&self) -> u8 {
        self.octet_string[3]
    }

    /// Time of day; unspecified seconds and hundredths count as zero
    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        let or_zero = |value: u8| if value == NOT_SPECIFIED { 0 } else { u32::from(value) };
        if self.hour() == NOT_SPECIFIED || self.minute() == NOT_SPECIFIED {
            return None;
        }
        NaiveTime::from_hms_milli_opt(
            u32::from(self.hour()),
            u32::from(self.minute()),
            or_zero(self.second()),
            or_zero(self.hundredths()) * 10,
        )
    }

    fn verify(value: u8, name: &str, lower_bound: u8, upper_bound: u8) -> DlmsResult<()> {
        if (value < lower_bound || value > upper_bound) && value != NOT_SPECIFIED {
            Err(DlmsError::InvalidData(format!(
                "{} is out of range [{}, {}], got {}",
                name, lower_bound, upper_bound, value
            )))
        } else {
            Ok(())
        }
    }
}

impl Default for CosemTime {
    fn default() -> Self {
        Self::unspecified()
    }
}

impl CosemDateFormat for CosemTime {
    fn encode(&self) -> Vec<u8> {
        self.octet_string.to_vec()
    }

    fn length(&self) -> usize {
        Self::LENGTH
    }

    fn get(&self, field: Field) -> Result<u32, DlmsError> {
        match field {
            Field::Hour => Ok(u32::from(self.hour())),
            Field::Minute => Ok(u32::from(self.minute())),
            Field::Second => Ok(u32::from(self.second())),
            Field::Hundredths => Ok(u32::from(self.hundredths())),
            _ => Err(DlmsError::InvalidData(format!(
                "Field {:?} not found in CosemTime",
                field
            ))),
        }
    }
}

impl fmt::Display for CosemTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour(), self.minute(), self.second())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosem_time_new() {
        let time = CosemTime::new(14, 30, 45).unwrap();
        assert_eq!(time.get(Field::Hour).unwrap(), 14);
        assert_eq!(time.get(Field::Minute).unwrap(), 30);
        assert_eq!(time.get(Field::Second).unwrap(), 45);
    }

    #[test]
    fn test_cosem_time_decode() {
        let bytes = [0x0E, 0x1E, 0x2D, 0xFF]; // 14:30:45
        let time = CosemTime::decode(&bytes).unwrap();
        assert_eq!(time.get(Field::Hour).unwrap(), 14);
        assert_eq!(
            time.to_naive_time(),
            NaiveTime::from_hms_opt(14, 30, 45)
        );
    }

    #[test]
    fn test_cosem_time_invalid() {
        assert!(CosemTime::new(24, 0, 0).is_err());
        assert!(CosemTime::new(0, 60, 0).is_err());
        assert!(CosemTime::new(0, 0, 60).is_err());
    }

    #[test]
    fn test_cosem_time_unspecified_has_no_naive_time() {
        assert_eq!(CosemTime::unspecified().to_naive_time(), None);
    }
}
