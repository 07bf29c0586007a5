//! COSEM DateTime type for DLMS/COSEM protocol

use crate::error::{DlmsError, DlmsResult};
use crate::datatypes::cosem_date::{CosemDate, CosemDateFormat, Field};
use crate::datatypes::cosem_time::CosemTime;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deviation value meaning "not specified" (0x8000 on the wire)
pub const DEVIATION_NOT_SPECIFIED: i16 = i16::MIN;

/// Clock status flags for COSEM DateTime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStatus {
    InvalidValue = 0x01,
    DoubtfulValue = 0x02,
    DifferentClockBase = 0x04,
    InvalidClockStatus = 0x08,
    DaylightSavingActive = 0x80,
}

impl ClockStatus {
    const ALL: [ClockStatus; 5] = [
        ClockStatus::InvalidValue,
        ClockStatus::DoubtfulValue,
        ClockStatus::DifferentClockBase,
        ClockStatus::InvalidClockStatus,
        ClockStatus::DaylightSavingActive,
    ];

    /// Convert clock status flags to a byte
    pub fn to_byte(statuses: &[ClockStatus]) -> u8 {
        statuses.iter().fold(0u8, |byte, status| byte | *status as u8)
    }

    /// Parse clock status from a byte
    pub fn from_byte(byte: u8) -> Vec<ClockStatus> {
        Self::ALL
            .iter()
            .copied()
            .filter(|status| byte & *status as u8 != 0)
            .collect()
    }
}

/// Class representing a COSEM DateTime
///
/// Twelve octets: date (5), time (4), deviation (i16, minutes), clock status.
/// The deviation follows the DLMS convention `UTC = local + deviation`, so a
/// clock running at UTC+02:00 carries -120.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CosemDateTime {
    date: CosemDate,
    time: CosemTime,
    deviation: i16,
    clock_status: u8,
}

impl CosemDateTime {
    pub const LENGTH: usize = 12;

    /// Constructs a COSEM DateTime
    ///
    /// # Arguments
    ///
    /// * `year` - The year from 0 to 0xffff
    /// * `month` - The month from 1 to 12, or 0xff if not specified
    /// * `day_of_month` - The day of the month from 1 to 31, or special values
    /// * `hour` - The hour from 0 to 23, or 0xff if not specified
    /// * `minute` - The minute from 0 to 59, or 0xff if not specified
    /// * `second` - The second from 0 to 59, or 0xff if not specified
    /// * `deviation` - The deviation in minutes from local time to GMT (-720 to 720), or
    ///   [`DEVIATION_NOT_SPECIFIED`]
    /// * `clock_status` - Clock status flags
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: u16,
        month: u8,
        day_of_month: u8,
        hour: u8,
        minute: u8,
        second: u8,
        deviation: i16,
        clock_status: &[ClockStatus],
    ) -> DlmsResult<Self> {
        let date = CosemDate::new(year, month, day_of_month)?;
        let time = CosemTime::new(hour, minute, second)?;
        Self::from_date_time(date, time, deviation, clock_status)
    }

    /// Constructs a COSEM DateTime from date and time
    pub fn from_date_time(
        date: CosemDate,
        time: CosemTime,
        deviation: i16,
        clock_status: &[ClockStatus],
    ) -> DlmsResult<Self> {
        Self::validate_deviation(deviation)?;

        Ok(Self {
            date,
            time,
            deviation,
            clock_status: ClockStatus::to_byte(clock_status),
        })
    }

    /// A date-time with every field set to "not specified"
    pub fn unspecified() -> Self {
        Self {
            date: CosemDate::unspecified(),
            time: CosemTime::unspecified(),
            deviation: DEVIATION_NOT_SPECIFIED,
            clock_status: 0xff,
        }
    }

    /// Decode a COSEM DateTime from a byte array
    pub fn decode(octet_string: &[u8]) -> DlmsResult<Self> {
        if octet_string.len() != Self::LENGTH {
            return Err(DlmsError::InvalidData(format!(
                "Array has an invalid length. Expected {}, got {}",
                Self::LENGTH,
                octet_string.len()
            )));
        }

        let date = CosemDate::decode(&octet_string[0..5])?;
        let time = CosemTime::decode(&octet_string[5..9])?;
        let deviation = i16::from_be_bytes([octet_string[9], octet_string[10]]);
        let clock_status = octet_string[11];

        Ok(Self {
            date,
            time,
            deviation,
            clock_status,
        })
    }

    /// Build a fully specified value from a chrono timestamp
    ///
    /// With `utc_to_normal_time` the deviation is stored with the ordinary
    /// sign (UTC+02:00 is +120) instead of the DLMS one.
    pub fn from_chrono(
        value: &DateTime<FixedOffset>,
        utc_to_normal_time: bool,
    ) -> DlmsResult<Self> {
        let local = value.naive_local();
        let offset_minutes = value.offset().local_minus_utc() / 60;
        let deviation = if utc_to_normal_time {
            offset_minutes
        } else {
            -offset_minutes
        };
        let deviation = i16::try_from(deviation).map_err(|_| {
            DlmsError::InvalidData(format!("Offset of {} minutes is out of range", deviation))
        })?;
        Self::from_date_time(
            CosemDate::from_naive_date(local.date())?,
            CosemTime::from_naive_time(local.time()),
            deviation,
            &[],
        )
    }

    /// Convert to a chrono timestamp
    ///
    /// An unspecified deviation is read as UTC. Fails when the date or the time
    /// of day carries wildcards.
    pub fn to_chrono(&self, utc_to_normal_time: bool) -> DlmsResult<DateTime<FixedOffset>> {
        let date = self.date.to_naive_date().ok_or_else(|| {
            DlmsError::InvalidData(format!("Date {} is not fully specified", self.date))
        })?;
        let time = self.time.to_naive_time().ok_or_else(|| {
            DlmsError::InvalidData(format!("Time {} is not fully specified", self.time))
        })?;
        let offset_minutes = match self.deviation {
            DEVIATION_NOT_SPECIFIED => 0,
            deviation if utc_to_normal_time => i32::from(deviation),
            deviation => -i32::from(deviation),
        };
        let offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
            DlmsError::InvalidData(format!("Deviation {} is out of range", self.deviation))
        })?;
        date.and_time(time)
            .and_local_timezone(offset)
            .single()
            .ok_or_else(|| DlmsError::InvalidData(format!("Ambiguous local time {}", self)))
    }

    fn validate_deviation(deviation: i16) -> DlmsResult<()> {
        if !(-720..=720).contains(&deviation) && deviation != DEVIATION_NOT_SPECIFIED {
            Err(DlmsError::InvalidData(format!(
                "Deviation is out of range [-720, 720], got {}",
                deviation
            )))
        } else {
            Ok(())
        }
    }

    /// Get the date component
    pub fn date(&self) -> &CosemDate {
        &self.date
    }

    /// Get the time component
    pub fn time(&self) -> &CosemTime {
        &self.time
    }

    /// Get the deviation
    pub fn deviation(&self) -> i16 {
        self.deviation
    }

    /// Get the clock status flags
    pub fn clock_status(&self) -> Vec<ClockStatus> {
        ClockStatus::from_byte(self.clock_status)
    }

    pub fn set_clock_status(&mut self, clock_status: &[ClockStatus]) {
        self.clock_status = ClockStatus::to_byte(clock_status);
    }

    /// Raw status octet, including bits without a named flag
    pub fn status_byte(&self) -> u8 {
        self.clock_status
    }

    pub fn set_status_byte(&mut self, status: u8) {
        self.clock_status = status;
    }
}

impl Default for CosemDateTime {
    fn default() -> Self {
        Self::unspecified()
    }
}

impl CosemDateFormat for CosemDateTime {
    fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(Self::LENGTH);
        result.extend_from_slice(&self.date.encode());
        result.extend_from_slice(&self.time.encode());
        result.extend_from_slice(&self.deviation.to_be_bytes());
        result.push(self.clock_status);
        result
    }

    fn length(&self) -> usize {
        Self::LENGTH
    }

    fn get(&self, field: Field) -> Result<u32, DlmsError> {
        match field {
            Field::Year | Field::Month | Field::DayOfMonth | Field::DayOfWeek => {
                self.date.get(field)
            }
            Field::Hour | Field::Minute | Field::Second | Field::Hundredths => self.time.get(field),
            Field::Deviation => {
                let deviation = if self.deviation == DEVIATION_NOT_SPECIFIED {
                    0
                } else {
                    self.deviation as u32
                };
                Ok(deviation)
            }
            Field::ClockStatus => Ok(self.clock_status as u32),
        }
    }
}

impl fmt::Display for CosemDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosem_date_time_new() {
        let dt = CosemDateTime::new(2024, 1, 15, 14, 30, 45, 0, &[]).unwrap();
        assert_eq!(dt.get(Field::Year).unwrap(), 2024);
        assert_eq!(dt.get(Field::Hour).unwrap(), 14);
        assert!(CosemDateTime::new(2024, 1, 15, 14, 30, 45, 721, &[]).is_err());
    }

    #[test]
    fn test_cosem_date_time_decode() {
        let bytes = [
            0x07, 0xE8, 0x01, 0x0F, 0xFF, // Date: 2024-01-15
            0x0E, 0x1E, 0x2D, 0xFF,       // Time: 14:30:45
            0xFF, 0x88,                    // Deviation: -120
            0x80,                          // Clock status: DST active
        ];
        let dt = CosemDateTime::decode(&bytes).unwrap();
        assert_eq!(dt.get(Field::Year).unwrap(), 2024);
        assert_eq!(dt.deviation(), -120);
        assert_eq!(dt.clock_status(), vec![ClockStatus::DaylightSavingActive]);
        assert_eq!(dt.encode(), bytes.to_vec());
    }

    #[test]
    fn test_cosem_date_time_chrono_deviation_sign() {
        let value = DateTime::parse_from_rfc3339("2024-06-01T12:00:00+02:00").unwrap();

        let dt = CosemDateTime::from_chrono(&value, false).unwrap();
        assert_eq!(dt.deviation(), -120);
        assert_eq!(dt.get(Field::Hour).unwrap(), 12);
        assert_eq!(dt.to_chrono(false).unwrap(), value);

        let dt = CosemDateTime::from_chrono(&value, true).unwrap();
        assert_eq!(dt.deviation(), 120);
        assert_eq!(dt.to_chrono(true).unwrap(), value);
    }

    #[test]
    fn test_cosem_date_time_wildcards_do_not_convert() {
        assert!(CosemDateTime::unspecified().to_chrono(false).is_err());
        let encoded = CosemDateTime::unspecified().encode();
        assert_eq!(&encoded[9..11], &[0x80, 0x00]);
    }
}
