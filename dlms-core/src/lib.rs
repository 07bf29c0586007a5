//! Core types and utilities for the DLMS/COSEM object model
//!
//! This crate provides the fundamental types shared by the codec and the
//! object framework: logical names, the tagged value universe, date/time
//! types and error handling.

pub mod error;
pub mod obis_code;
pub mod datatypes;

pub use error::{ActionResult, DataAccessResult, DlmsError, DlmsResult};
pub use obis_code::ObisCode;
pub use datatypes::{DataObject, DataObjectType};
