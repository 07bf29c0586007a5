//! Data types used in DLMS/COSEM protocol

pub mod data_object;
pub mod bit_string;
pub mod cosem_date;
pub mod cosem_time;
pub mod cosem_date_time;

// Re-export types
pub use bit_string::BitString;
pub use cosem_date::{CosemDate, CosemDateFormat, Field};
pub use cosem_time::CosemTime;
pub use cosem_date_time::{ClockStatus, CosemDateTime, DEVIATION_NOT_SPECIFIED};
pub use data_object::{DataObject, DataObjectType};
