//! Value codec for the DLMS/COSEM object model
//!
//! This crate turns [`DataObject`](dlms_core::DataObject) values into the
//! tagged A-XDR wire format and back. Structures and arrays nest to any
//! depth; decoding is strict and never guesses on malformed input.

pub mod axdr;

pub use axdr::{decode_data, decode_data_with, encode_data};
pub use axdr::{AxdrDecoder, AxdrEncoder};
pub use axdr::types::{AxdrTag, LengthEncoding};
