//! COSEM date/time types for DLMS/COSEM protocol

use crate::error::{DlmsError, DlmsResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field types for COSEM date/time formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Year,
    Month,
    DayOfMonth,
    DayOfWeek,
    Hour,
    Minute,
    Second,
    Hundredths,
    Deviation,
    ClockStatus,
}

/// Trait for COSEM date/time format types
pub trait CosemDateFormat {
    /// Encode the date/time to a byte array
    fn encode(&self) -> Vec<u8>;

    /// Get the length of the encoded byte array
    fn length(&self) -> usize;

    /// Get a field value
    fn get(&self, field: Field) -> Result<u32, DlmsError>;
}

pub(crate) const NOT_SPECIFIED: u8 = 0xff;
const YEAR_NOT_SPECIFIED: u16 = 0xffff;
/// Month wildcards: daylight savings end (0xfd) and begin (0xfe)
const MONTH_WILDCARDS: [u8; 3] = [0xfd, 0xfe, NOT_SPECIFIED];
/// Day wildcards: second last (0xfd) and last (0xfe) day of the month
const DAY_WILDCARDS: [u8; 3] = [0xfd, 0xfe, NOT_SPECIFIED];

/// Class representing a COSEM Date
///
/// Five octets: year (big-endian), month, day of month, day of week.
/// Every field may carry the "not specified" wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CosemDate {
    octet_string: [u8; 5],
}

impl CosemDate {
    pub const LENGTH: usize = 5;

    /// Constructs a COSEM Date
    ///
    /// # Arguments
    ///
    /// * `year` - The year from 0 to 0xffff
    /// * `month` - The month from 1 to 12, or 0xff if not specified
    /// * `day_of_month` - The day of the month from 1 to 31, or special values:
    ///   - 0xfe for the last day of a month
    ///   - 0xfd for the second last day of a month
    ///   - 0xff if not specified
    ///
    /// # Errors
    ///
    /// Returns an error if parameters are out of range
    pub fn new(year: u16, month: u8, day_of_month: u8) -> DlmsResult<Self> {
        Self::new_with_day_of_week(year, month, day_of_month, NOT_SPECIFIED)
    }

    /// Constructs a COSEM Date with day of week
    ///
    /// # Arguments
    ///
    /// * `year` - The year from 0 to 0xffff
    /// * `month` - The month from 1 to 12, or 0xff if not specified
    /// * `day_of_month` - The day of the month from 1 to 31, or special values
    /// * `day_of_week` - The day of week from 1 to 7 (1 is Monday), or 0xff if not specified
    pub fn new_with_day_of_week(
        year: u16,
        month: u8,
        day_of_month: u8,
        day_of_week: u8,
    ) -> DlmsResult<Self> {
        Self::check_field("month", month, 1..=12, &MONTH_WILDCARDS)?;
        Self::check_field("day of month", day_of_month, 1..=31, &DAY_WILDCARDS)?;
        Self::check_field("day of week", day_of_week, 1..=7, &[NOT_SPECIFIED])?;

        let [year_high, year_low] = year.to_be_bytes();
        Ok(Self {
            octet_string: [year_high, year_low, month, day_of_month, day_of_week],
        })
    }

    /// A date with every field set to "not specified"
    pub fn unspecified() -> Self {
        Self {
            octet_string: [NOT_SPECIFIED; 5],
        }
    }

    /// Constructs a fully specified date from a calendar date
    pub fn from_naive_date(date: NaiveDate) -> DlmsResult<Self> {
        let year = u16::try_from(date.year()).map_err(|_| {
            DlmsError::InvalidData(format!("Year {} cannot be represented", date.year()))
        })?;
        Self::new_with_day_of_week(
            year,
            date.month() as u8,
            date.day() as u8,
            date.weekday().number_from_monday() as u8,
        )
    }

    /// Decode a COSEM Date from a byte array
    pub fn decode(octet_string: &[u8]) -> DlmsResult<Self> {
        let octet_string: [u8; 5] = octet_string.try_into().map_err(|_| {
            DlmsError::InvalidData(format!(
                "Wrong size. Expected {}, got {}",
                Self::LENGTH,
                octet_string.len()
            ))
        })?;
        Ok(Self { octet_string })
    }

    pub fn year(&self) -> u16 {
        u16::from_be_bytes([self.octet_string[0], self.octet_string[1]])
    }

    pub fn month(&self) -> u8 {
        self.octet_string[2]
    }

    pub fn day_of_month(&self) -> u8 {
        self.octet_string[3]
    }

    pub fn day_of_week(&self) -> u8 {
        self.octet_string[4]
    }

    /// Calendar date, when year, month and day are all plain values
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        if self.year() == YEAR_NOT_SPECIFIED || self.month() > 12 || self.day_of_month() > 31 {
            return None;
        }
        NaiveDate::from_ymd_opt(
            i32::from(self.year()),
            u32::from(self.month()),
            u32::from(self.day_of_month()),
        )
    }

    /// `value` must lie in `range` or be one of `wildcards`
    fn check_field(
        name: &str,
        value: u8,
        range: std::ops::RangeInclusive<u8>,
        wildcards: &[u8],
    ) -> DlmsResult<()> {
        if range.contains(&value) || wildcards.contains(&value) {
            return Ok(());
        }
        Err(DlmsError::InvalidData(format!(
            "Parameter {} is out of range [{}, {}], got {}",
            name,
            range.start(),
            range.end(),
            value
        )))
    }
}

impl Default for CosemDate {
    fn default() -> Self {
        Self::unspecified()
    }
}

impl CosemDateFormat for CosemDate {
    fn encode(&self) -> Vec<u8> {
        self.octet_string.to_vec()
    }

    fn length(&self) -> usize {
        Self::LENGTH
    }

    fn get(&self, field: Field) -> Result<u32, DlmsError> {
        match field {
            Field::Year => Ok(u32::from(self.year())),
            Field::Month => Ok(u32::from(self.month())),
            Field::DayOfMonth => Ok(u32::from(self.day_of_month())),
            Field::DayOfWeek => Ok(u32::from(self.day_of_week())),
            _ => Err(DlmsError::InvalidData(format!(
                "Field {:?} not found in CosemDate",
                field
            ))),
        }
    }
}

impl fmt::Display for CosemDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.year(),
            self.month(),
            self.day_of_month()
        )
    }
}
