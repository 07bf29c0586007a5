//! Auto Answer interface class (Class ID: 28)
//!
//! The Auto Answer interface class manages how a modem answers incoming calls.
//!
//! # Attributes
//!
//! - Attribute 1: logical_name (OBIS code) - The logical name of the object
//! - Attribute 2: mode - Line type the device answers on
//! - Attribute 3: listening_window - Array of start/end date-time pairs
//! - Attribute 4: status - Inactive, active or locked
//! - Attribute 5: number_of_calls - Calls answered per listening window
//! - Attribute 6: number_of_rings - Rings before answering, inside and outside a window
//! - Attribute 7: list_of_allowed_callers - Since version 2
//!
//! # Methods
//!
//! None

use crate::clock::{encode_date_time, parse_date_time};
use crate::context::Context;
use crate::cosem_object::{method_denied, CosemObject};
use crate::object::ObjectBase;
use crate::object_type::ObjectType;
use crate::persistence::{PersistReader, PersistWriter};
use crate::schema::{AttributeDef, ClassSchema};
use dlms_core::datatypes::{CosemDateFormat, CosemDateTime};
use dlms_core::{DataObject, DataObjectType, DlmsError, DlmsResult, ObisCode};

static SCHEMA: ClassSchema = ClassSchema {
    object_type: ObjectType::AutoAnswer,
    max_version: 2,
    attributes: &[
        AttributeDef::logical_name(),
        AttributeDef::new("Mode", DataObjectType::Enumerate).fixed(),
        AttributeDef::new("ListeningWindow", DataObjectType::Array).fixed(),
        AttributeDef::new("Status", DataObjectType::Enumerate).read_only(),
        AttributeDef::new("NumberOfCalls", DataObjectType::Unsigned).fixed(),
        AttributeDef::new("NumberOfRings", DataObjectType::Structure).fixed(),
        AttributeDef::new("AllowedCallers", DataObjectType::Array)
            .fixed()
            .since(2),
    ],
    methods: &[],
};

/// Auto answer status (attribute 4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AutoAnswerStatus {
    #[default]
    Inactive = 0,
    Active = 1,
    Locked = 2,
}

impl AutoAnswerStatus {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Inactive,
            1 => Self::Active,
            2 => Self::Locked,
            _ => return None,
        })
    }
}

/// Period during which calls are answered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListeningWindow {
    pub start: CosemDateTime,
    pub end: CosemDateTime,
}

impl ListeningWindow {
    pub fn new(start: CosemDateTime, end: CosemDateTime) -> Self {
        Self { start, end }
    }

    fn to_data_object(&self) -> DataObject {
        DataObject::Structure(vec![encode_date_time(&self.start), encode_date_time(&self.end)])
    }

    fn from_data_object(value: &DataObject) -> DlmsResult<Self> {
        let fields = value.as_structure_of(2)?;
        Ok(Self {
            start: parse_date_time(&fields[0])?,
            end: parse_date_time(&fields[1])?,
        })
    }
}

/// Caller allowed to reach the device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedCaller {
    pub caller_id: Vec<u8>,
    /// 0 normal call, 1 wake-up request
    pub call_type: u8,
}

/// Auto Answer interface class (Class ID: 28)
///
/// Default OBIS: 0-0:2.2.0.255
#[derive(Debug)]
pub struct AutoAnswer {
    base: ObjectBase,
    mode: u8,
    listening_window: Vec<ListeningWindow>,
    status: AutoAnswerStatus,
    number_of_calls: u8,
    rings_in_window: u8,
    rings_out_of_window: u8,
    allowed_callers: Vec<AllowedCaller>,
}

impl AutoAnswer {
    pub const ATTR_MODE: u8 = 2;
    pub const ATTR_LISTENING_WINDOW: u8 = 3;
    pub const ATTR_STATUS: u8 = 4;
    pub const ATTR_NUMBER_OF_CALLS: u8 = 5;
    pub const ATTR_NUMBER_OF_RINGS: u8 = 6;
    pub const ATTR_ALLOWED_CALLERS: u8 = 7;

    pub fn default_obis() -> ObisCode {
        ObisCode::new(0, 0, 2, 2, 0, 255)
    }

    pub fn new(logical_name: ObisCode) -> Self {
        Self::from_base(ObjectBase::initial(&SCHEMA, Some(logical_name)))
    }

    /// Auto answer object of schema `version` (0..=2)
    pub fn with_version(logical_name: ObisCode, version: u8) -> DlmsResult<Self> {
        Ok(Self::from_base(ObjectBase::from_schema(&SCHEMA, Some(logical_name), version)?))
    }

    fn from_base(base: ObjectBase) -> Self {
        Self {
            base,
            mode: 0,
            listening_window: Vec::new(),
            status: AutoAnswerStatus::Inactive,
            number_of_calls: 0,
            rings_in_window: 0,
            rings_out_of_window: 0,
            allowed_callers: Vec::new(),
        }
    }

    pub fn mode(&self) -> u8 {
        self.mode
    }

    pub fn listening_window(&self) -> &[ListeningWindow] {
        &self.listening_window
    }

    pub fn status(&self) -> AutoAnswerStatus {
        self.status
    }

    pub fn number_of_calls(&self) -> u8 {
        self.number_of_calls
    }

    /// Rings before answering inside and outside the listening window
    pub fn number_of_rings(&self) -> (u8, u8) {
        (self.rings_in_window, self.rings_out_of_window)
    }

    pub fn allowed_callers(&self) -> &[AllowedCaller] {
        &self.allowed_callers
    }
}

impl CosemObject for AutoAnswer {
    fn schema(&self) -> &'static ClassSchema {
        &SCHEMA
    }

    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_attribute(&self, _ctx: &Context<'_>, index: u8) -> DlmsResult<DataObject> {
        Ok(match index {
            Self::ATTR_MODE => DataObject::Enumerate(self.mode),
            Self::ATTR_LISTENING_WINDOW => DataObject::Array(
                self.listening_window
                    .iter()
                    .map(ListeningWindow::to_data_object)
                    .collect(),
            ),
            Self::ATTR_STATUS => DataObject::Enumerate(self.status as u8),
            Self::ATTR_NUMBER_OF_CALLS => DataObject::Unsigned8(self.number_of_calls),
            Self::ATTR_NUMBER_OF_RINGS => DataObject::Structure(vec![
                DataObject::Unsigned8(self.rings_in_window),
                DataObject::Unsigned8(self.rings_out_of_window),
            ]),
            _ => DataObject::Array(
                self.allowed_callers
                    .iter()
                    .map(|caller| {
                        DataObject::Structure(vec![
                            DataObject::OctetString(caller.caller_id.clone()),
                            DataObject::Enumerate(caller.call_type),
                        ])
                    })
                    .collect(),
            ),
        })
    }

    fn set_attribute(
        &mut self,
        _ctx: &Context<'_>,
        index: u8,
        value: DataObject,
    ) -> DlmsResult<()> {
        match index {
            Self::ATTR_MODE => self.mode = value.to_u8()?,
            Self::ATTR_LISTENING_WINDOW => {
                self.listening_window = value
                    .as_array()?
                    .iter()
                    .map(ListeningWindow::from_data_object)
                    .collect::<DlmsResult<_>>()?;
            }
            Self::ATTR_STATUS => {
                let code = value.to_u8()?;
                self.status = AutoAnswerStatus::from_u8(code).ok_or_else(|| {
                    DlmsError::type_mismatch("AutoAnswerStatus", format!("Enumerate({})", code))
                })?;
            }
            Self::ATTR_NUMBER_OF_CALLS => self.number_of_calls = value.to_u8()?,
            Self::ATTR_NUMBER_OF_RINGS => {
                let rings = value.as_structure_of(2)?;
                let inside = rings[0].to_u8()?;
                self.rings_out_of_window = rings[1].to_u8()?;
                self.rings_in_window = inside;
            }
            _ => {
                self.allowed_callers = value
                    .as_array()?
                    .iter()
                    .map(|item| {
                        let fields = item.as_structure_of(2)?;
                        Ok(AllowedCaller {
                            caller_id: fields[0].as_octet_string()?.to_vec(),
                            call_type: fields[1].to_u8()?,
                        })
                    })
                    .collect::<DlmsResult<_>>()?;
            }
        }
        Ok(())
    }

    fn invoke_method(
        &mut self,
        _ctx: &Context<'_>,
        index: u8,
        _parameters: Option<DataObject>,
    ) -> DlmsResult<Option<DataObject>> {
        Err(method_denied(ObjectType::AutoAnswer, index))
    }

    fn save(&self, writer: &mut PersistWriter) -> DlmsResult<()> {
        writer.write("Mode", &self.mode)?;
        writer.write_list("ListeningWindow", &self.listening_window, |item, window| {
            item.write_bytes("Start", &window.start.encode())?;
            item.write_bytes("End", &window.end.encode())
        })?;
        writer.write("Status", &(self.status as u8))?;
        writer.write("NumberOfCalls", &self.number_of_calls)?;
        writer.write("NumberOfRingsInListeningWindow", &self.rings_in_window)?;
        writer.write("NumberOfRingsOutListeningWindow", &self.rings_out_of_window)?;
        if self.version() >= 2 {
            writer.write_list("AllowedCallers", &self.allowed_callers, |item, caller| {
                item.write_bytes("CallerId", &caller.caller_id)?;
                item.write("CallType", &caller.call_type)
            })?;
        }
        Ok(())
    }

    fn load(&mut self, reader: &PersistReader<'_>) -> DlmsResult<()> {
        let date_time = |item: &PersistReader<'_>, name: &str| -> DlmsResult<CosemDateTime> {
            parse_date_time(&DataObject::OctetString(item.read_bytes(name)?))
                .map_err(|e| {
                    DlmsError::Persistence(format!("Element {} is malformed: {}", name, e))
                })
        };
        let mode = reader.read("Mode")?;
        let listening_window = reader.read_list("ListeningWindow", |item| {
            Ok(ListeningWindow::new(date_time(item, "Start")?, date_time(item, "End")?))
        })?;
        let code: u8 = reader.read("Status")?;
        let status = AutoAnswerStatus::from_u8(code)
            .ok_or_else(|| DlmsError::Persistence(format!("Unknown auto answer status {}", code)))?;
        let number_of_calls = reader.read("NumberOfCalls")?;
        let rings_in_window = reader.read("NumberOfRingsInListeningWindow")?;
        let rings_out_of_window = reader.read("NumberOfRingsOutListeningWindow")?;
        let allowed_callers = reader.read_list("AllowedCallers", |item| {
            Ok(AllowedCaller {
                caller_id: item.read_bytes("CallerId")?,
                call_type: item.read("CallType")?,
            })
        })?;

        self.mode = mode;
        self.listening_window = listening_window;
        self.status = status;
        self.number_of_calls = number_of_calls;
        self.rings_in_window = rings_in_window;
        self.rings_out_of_window = rings_out_of_window;
        self.allowed_callers = allowed_callers;
        Ok(())
    }
}
