//! Clock interface class (Class ID: 8)
//!
//! The Clock interface class represents a real-time clock in the meter.
//! It provides the current date/time, timezone, and DST information.
//!
//! # Attributes
//!
//! - Attribute 1: logical_name (OBIS code) - The logical name of the object
//! - Attribute 2: time - Current date and time (octet-string(12), shown as date-time)
//! - Attribute 3: time_zone - Deviation of local time from UTC in minutes
//! - Attribute 4: status - Clock status bits
//! - Attribute 5: daylight_savings_begin - DST begin (octet-string(12))
//! - Attribute 6: daylight_savings_end - DST end (octet-string(12))
//! - Attribute 7: daylight_savings_deviation - DST deviation in minutes
//! - Attribute 8: daylight_savings_enabled - Whether DST is enabled
//! - Attribute 9: clock_base - Clock base identifier
//!
//! # Methods
//!
//! - Method 1: adjust_to_quarter - Round the time to the nearest quarter of an hour
//! - Method 2: adjust_to_measuring_period - Not supported
//! - Method 3: adjust_to_minute - Round the time to the nearest minute
//! - Method 4: adjust_to_preset_time - Activate the preset time
//! - Method 5: preset_adjusting_time - Store a preset time and its validity interval
//! - Method 6: shift_time(long) - Shift the time by -900..=900 seconds

use crate::context::Context;
use crate::cosem_object::{expect_no_parameters, method_denied, required_parameters, CosemObject};
use crate::object::ObjectBase;
use crate::object_type::ObjectType;
use crate::persistence::{PersistReader, PersistWriter};
use crate::schema::{AttributeDef, ClassSchema, MethodDef};
use chrono::{DateTime, FixedOffset, TimeDelta, Timelike};
use dlms_core::datatypes::{CosemDateFormat, CosemDateTime};
use dlms_core::{DataObject, DataObjectType, DlmsError, DlmsResult, ObisCode};

static SCHEMA: ClassSchema = ClassSchema {
    object_type: ObjectType::Clock,
    max_version: 0,
    attributes: &[
        AttributeDef::logical_name(),
        AttributeDef::new("Time", DataObjectType::OctetString).ui(DataObjectType::DateTime),
        AttributeDef::new("TimeZone", DataObjectType::LongInteger).fixed(),
        AttributeDef::new("Status", DataObjectType::Unsigned).read_only(),
        AttributeDef::new("Begin", DataObjectType::OctetString)
            .ui(DataObjectType::DateTime)
            .fixed(),
        AttributeDef::new("End", DataObjectType::OctetString)
            .ui(DataObjectType::DateTime)
            .fixed(),
        AttributeDef::new("Deviation", DataObjectType::Integer).fixed(),
        AttributeDef::new("Enabled", DataObjectType::Boolean).fixed(),
        AttributeDef::new("ClockBase", DataObjectType::Enumerate)
            .read_only()
            .fixed(),
    ],
    methods: &[
        MethodDef::new("AdjustToQuarter"),
        MethodDef::new("AdjustToMeasuringPeriod"),
        MethodDef::new("AdjustToMinute"),
        MethodDef::new("AdjustToPresetTime"),
        MethodDef::new("PresetAdjustingTime"),
        MethodDef::new("ShiftTime"),
    ],
};

/// Largest shift accepted by `shift_time`, in seconds
const MAX_SHIFT_SECONDS: i16 = 900;

/// Clock base (attribute 9)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockBase {
    None = 0,
    Crystal = 1,
    Frequency50 = 2,
    Frequency60 = 3,
    Gps = 4,
    Radio = 5,
}

impl ClockBase {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::None,
            1 => Self::Crystal,
            2 => Self::Frequency50,
            3 => Self::Frequency60,
            4 => Self::Gps,
            5 => Self::Radio,
            _ => return None,
        })
    }
}

/// Preset time with the interval in which `adjust_to_preset_time` may apply it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetTime {
    pub time: CosemDateTime,
    pub validity_start: CosemDateTime,
    pub validity_end: CosemDateTime,
}

/// Clock interface class (Class ID: 8)
///
/// Default OBIS: 0-0:1.0.0.255
#[derive(Debug)]
pub struct Clock {
    base: ObjectBase,
    time: CosemDateTime,
    /// Kept in the DLMS sign convention (UTC = local + time_zone)
    time_zone: i16,
    status: u8,
    begin: CosemDateTime,
    end: CosemDateTime,
    deviation: i8,
    enabled: bool,
    clock_base: u8,
    preset: Option<PresetTime>,
}

impl Clock {
    pub const ATTR_TIME: u8 = 2;
    pub const ATTR_TIME_ZONE: u8 = 3;
    pub const ATTR_STATUS: u8 = 4;
    pub const ATTR_DAYLIGHT_SAVINGS_BEGIN: u8 = 5;
    pub const ATTR_DAYLIGHT_SAVINGS_END: u8 = 6;
    pub const ATTR_DAYLIGHT_SAVINGS_DEVIATION: u8 = 7;
    pub const ATTR_DAYLIGHT_SAVINGS_ENABLED: u8 = 8;
    pub const ATTR_CLOCK_BASE: u8 = 9;

    pub const METHOD_ADJUST_TO_QUARTER: u8 = 1;
    pub const METHOD_ADJUST_TO_MEASURING_PERIOD: u8 = 2;
    pub const METHOD_ADJUST_TO_MINUTE: u8 = 3;
    pub const METHOD_ADJUST_TO_PRESET_TIME: u8 = 4;
    pub const METHOD_PRESET_ADJUSTING_TIME: u8 = 5;
    pub const METHOD_SHIFT_TIME: u8 = 6;

    /// Default OBIS code for Clock (0-0:1.0.0.255)
    pub fn default_obis() -> ObisCode {
        ObisCode::new(0, 0, 1, 0, 0, 255)
    }

    pub fn new(logical_name: ObisCode) -> Self {
        Self {
            base: ObjectBase::initial(&SCHEMA, Some(logical_name)),
            time: CosemDateTime::unspecified(),
            time_zone: 0,
            status: 0,
            begin: CosemDateTime::unspecified(),
            end: CosemDateTime::unspecified(),
            deviation: 0,
            enabled: false,
            clock_base: ClockBase::None as u8,
            preset: None,
        }
    }

    pub fn with_default_obis() -> Self {
        Self::new(Self::default_obis())
    }

    pub fn time(&self) -> &CosemDateTime {
        &self.time
    }

    /// Current time as a chrono timestamp
    pub fn time_as_chrono(&self, ctx: &Context<'_>) -> DlmsResult<DateTime<FixedOffset>> {
        self.time.to_chrono(ctx.settings.use_utc_to_normal_time)
    }

    /// Time zone in the DLMS convention (UTC+01:00 is -60)
    pub fn time_zone(&self) -> i16 {
        self.time_zone
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn daylight_savings_begin(&self) -> &CosemDateTime {
        &self.begin
    }

    pub fn daylight_savings_end(&self) -> &CosemDateTime {
        &self.end
    }

    pub fn daylight_savings_deviation(&self) -> i8 {
        self.deviation
    }

    pub fn daylight_savings_enabled(&self) -> bool {
        self.enabled
    }

    pub fn clock_base(&self) -> Option<ClockBase> {
        ClockBase::from_u8(self.clock_base)
    }

    pub fn preset(&self) -> Option<&PresetTime> {
        self.preset.as_ref()
    }

    /// Apply `f` to the current time, keeping its deviation and status octet
    fn adjust<F>(&mut self, ctx: &Context<'_>, f: F) -> DlmsResult<()>
    where
        F: FnOnce(DateTime<FixedOffset>) -> DateTime<FixedOffset>,
    {
        let normal = ctx.settings.use_utc_to_normal_time;
        let current = self.time.to_chrono(normal).map_err(|e| {
            DlmsError::InconsistentClass(format!("Clock time cannot be adjusted: {}", e))
        })?;
        let adjusted = CosemDateTime::from_chrono(&f(current), normal)?;
        let mut time = CosemDateTime::from_date_time(
            adjusted.date().clone(),
            adjusted.time().clone(),
            self.time.deviation(),
            &[],
        )?;
        time.set_status_byte(self.time.status_byte());
        log::debug!("Clock {:?} adjusted from {} to {}", self.base.logical_name(), self.time, time);
        self.time = time;
        Ok(())
    }

    fn adjust_to_preset(&mut self, ctx: &Context<'_>) -> DlmsResult<()> {
        let preset = self.preset.clone().ok_or_else(|| {
            DlmsError::InconsistentClass("No preset time has been set".to_string())
        })?;
        let normal = ctx.settings.use_utc_to_normal_time;
        let inconsistent =
            |e: DlmsError| DlmsError::InconsistentClass(format!("Preset cannot be applied: {}", e));
        let now = self.time.to_chrono(normal).map_err(inconsistent)?;
        let start = preset.validity_start.to_chrono(normal).map_err(inconsistent)?;
        let end = preset.validity_end.to_chrono(normal).map_err(inconsistent)?;
        if now < start || now > end {
            return Err(DlmsError::InconsistentClass(format!(
                "Clock time {} is outside the preset validity interval",
                self.time
            )));
        }
        self.time = preset.time;
        self.preset = None;
        Ok(())
    }
}

/// Date-time carried either as octet-string(12) or as a typed value
pub(crate) fn parse_date_time(value: &DataObject) -> DlmsResult<CosemDateTime> {
    match value {
        DataObject::DateTime(dt) => Ok(dt.clone()),
        DataObject::OctetString(bytes) if bytes.is_empty() => Ok(CosemDateTime::unspecified()),
        DataObject::OctetString(bytes) => CosemDateTime::decode(bytes).map_err(|_| {
            DlmsError::type_mismatch("OctetString(12)", format!("OctetString({})", bytes.len()))
        }),
        other => Err(DlmsError::type_mismatch(DataObjectType::OctetString, other.get_type())),
    }
}

pub(crate) fn encode_date_time(value: &CosemDateTime) -> DataObject {
    DataObject::OctetString(value.encode())
}

/// Round `seconds` past the hour to the nearest multiple of `step`
fn round_to(time: DateTime<FixedOffset>, step: i64) -> DateTime<FixedOffset> {
    let whole = time - TimeDelta::nanoseconds(i64::from(time.nanosecond()));
    let seconds = i64::from(whole.minute()) * 60 + i64::from(whole.second());
    let rounded = (seconds + step / 2) / step * step;
    whole + TimeDelta::seconds(rounded - seconds)
}

impl CosemObject for Clock {
    fn schema(&self) -> &'static ClassSchema {
        &SCHEMA
    }

    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_attribute(&self, ctx: &Context<'_>, index: u8) -> DlmsResult<DataObject> {
        Ok(match index {
            Self::ATTR_TIME => encode_date_time(&self.time),
            Self::ATTR_TIME_ZONE if ctx.settings.use_utc_to_normal_time => {
                DataObject::Integer16(self.time_zone.saturating_neg())
            }
            Self::ATTR_TIME_ZONE => DataObject::Integer16(self.time_zone),
            Self::ATTR_STATUS => DataObject::Unsigned8(self.status),
            Self::ATTR_DAYLIGHT_SAVINGS_BEGIN => encode_date_time(&self.begin),
            Self::ATTR_DAYLIGHT_SAVINGS_END => encode_date_time(&self.end),
            Self::ATTR_DAYLIGHT_SAVINGS_DEVIATION => DataObject::Integer8(self.deviation),
            Self::ATTR_DAYLIGHT_SAVINGS_ENABLED => DataObject::Boolean(self.enabled),
            _ => DataObject::Enumerate(self.clock_base),
        })
    }

    fn set_attribute(&mut self, ctx: &Context<'_>, index: u8, value: DataObject) -> DlmsResult<()> {
        match index {
            Self::ATTR_TIME => self.time = parse_date_time(&value)?,
            Self::ATTR_TIME_ZONE => {
                let time_zone = value.to_i16()?;
                self.time_zone = if ctx.settings.use_utc_to_normal_time {
                    time_zone.saturating_neg()
                } else {
                    time_zone
                };
            }
            Self::ATTR_STATUS => self.status = value.to_u8()?,
            Self::ATTR_DAYLIGHT_SAVINGS_BEGIN => self.begin = parse_date_time(&value)?,
            Self::ATTR_DAYLIGHT_SAVINGS_END => self.end = parse_date_time(&value)?,
            Self::ATTR_DAYLIGHT_SAVINGS_DEVIATION => self.deviation = value.to_i8()?,
            Self::ATTR_DAYLIGHT_SAVINGS_ENABLED => self.enabled = value.as_bool()?,
            _ => self.clock_base = value.to_u8()?,
        }
        Ok(())
    }

    fn invoke_method(
        &mut self,
        ctx: &Context<'_>,
        index: u8,
        parameters: Option<DataObject>,
    ) -> DlmsResult<Option<DataObject>> {
        match index {
            Self::METHOD_ADJUST_TO_QUARTER => {
                expect_no_parameters(&parameters)?;
                self.adjust(ctx, |time| round_to(time, 15 * 60))?;
            }
            Self::METHOD_ADJUST_TO_MINUTE => {
                expect_no_parameters(&parameters)?;
                self.adjust(ctx, |time| round_to(time, 60))?;
            }
            Self::METHOD_ADJUST_TO_PRESET_TIME => {
                expect_no_parameters(&parameters)?;
                self.adjust_to_preset(ctx)?;
            }
            Self::METHOD_PRESET_ADJUSTING_TIME => {
                let parameters = required_parameters(parameters)?;
                let fields = parameters.as_structure_of(3)?;
                self.preset = Some(PresetTime {
                    time: parse_date_time(&fields[0])?,
                    validity_start: parse_date_time(&fields[1])?,
                    validity_end: parse_date_time(&fields[2])?,
                });
            }
            Self::METHOD_SHIFT_TIME => {
                let shift = required_parameters(parameters)?.to_i16()?;
                if !(-MAX_SHIFT_SECONDS..=MAX_SHIFT_SECONDS).contains(&shift) {
                    log::warn!("Clock shift of {} s rejected", shift);
                    return Err(DlmsError::InconsistentClass(format!(
                        "Shift must be within ±{} seconds, got {}",
                        MAX_SHIFT_SECONDS, shift
                    )));
                }
                self.adjust(ctx, |time| time + TimeDelta::seconds(i64::from(shift)))?;
            }
            _ => return Err(method_denied(ObjectType::Clock, index)),
        }
        Ok(None)
    }

    fn save(&self, writer: &mut PersistWriter) -> DlmsResult<()> {
        writer.write_bytes("Time", &self.time.encode())?;
        writer.write("TimeZone", &self.time_zone)?;
        writer.write("Status", &self.status)?;
        writer.write_bytes("Begin", &self.begin.encode())?;
        writer.write_bytes("End", &self.end.encode())?;
        writer.write("Deviation", &self.deviation)?;
        writer.write("Enabled", &self.enabled)?;
        writer.write("ClockBase", &self.clock_base)
    }

    fn load(&mut self, reader: &PersistReader<'_>) -> DlmsResult<()> {
        let date_time = |name: &str| -> DlmsResult<CosemDateTime> {
            let bytes = reader.read_bytes(name)?;
            if bytes.is_empty() {
                return Ok(CosemDateTime::unspecified());
            }
            CosemDateTime::decode(&bytes)
                .map_err(|e| {
                    DlmsError::Persistence(format!("Element {} is malformed: {}", name, e))
                })
        };
        let time = date_time("Time")?;
        let begin = date_time("Begin")?;
        let end = date_time("End")?;
        let time_zone = reader.read("TimeZone")?;
        let status = reader.read("Status")?;
        let deviation = reader.read("Deviation")?;
        let enabled = reader.read("Enabled")?;
        let clock_base = reader.read("ClockBase")?;

        self.time = time;
        self.time_zone = time_zone;
        self.status = status;
        self.begin = begin;
        self.end = end;
        self.deviation = deviation;
        self.enabled = enabled;
        self.clock_base = clock_base;
        Ok(())
    }
}
