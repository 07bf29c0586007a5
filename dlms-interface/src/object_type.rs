//! COSEM interface class identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interface class id of a COSEM object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum ObjectType {
    Data = 1,
    Register = 3,
    ExtendedRegister = 4,
    DemandRegister = 5,
    ProfileGeneric = 7,
    Clock = 8,
    ScriptTable = 9,
    Schedule = 10,
    SpecialDaysTable = 11,
    AssociationShortName = 12,
    AssociationLogicalName = 15,
    ImageTransfer = 18,
    ActivityCalendar = 20,
    RegisterMonitor = 21,
    SingleActionSchedule = 22,
    IecHdlcSetup = 23,
    AutoAnswer = 28,
    AutoConnect = 29,
    PushSetup = 40,
    SecuritySetup = 64,
    DisconnectControl = 70,
    Limiter = 71,
}

impl ObjectType {
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            1 => ObjectType::Data,
            3 => ObjectType::Register,
            4 => ObjectType::ExtendedRegister,
            5 => ObjectType::DemandRegister,
            7 => ObjectType::ProfileGeneric,
            8 => ObjectType::Clock,
            9 => ObjectType::ScriptTable,
            10 => ObjectType::Schedule,
            11 => ObjectType::SpecialDaysTable,
            12 => ObjectType::AssociationShortName,
            15 => ObjectType::AssociationLogicalName,
            18 => ObjectType::ImageTransfer,
            20 => ObjectType::ActivityCalendar,
            21 => ObjectType::RegisterMonitor,
            22 => ObjectType::SingleActionSchedule,
            23 => ObjectType::IecHdlcSetup,
            28 => ObjectType::AutoAnswer,
            29 => ObjectType::AutoConnect,
            40 => ObjectType::PushSetup,
            64 => ObjectType::SecuritySetup,
            70 => ObjectType::DisconnectControl,
            71 => ObjectType::Limiter,
            _ => return None,
        })
    }

    /// Class id on the wire
    pub fn id(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.id())
    }
}
