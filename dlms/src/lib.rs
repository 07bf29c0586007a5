//! Rust implementation of the DLMS/COSEM object model
//!
//! This library models the objects of a DLMS/COSEM logical device and the
//! tagged A-XDR encoding of their attribute values.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `dlms-core`: Core types (logical names, values, date/time), error handling
//! - `dlms-asn1`: A-XDR encoding/decoding of values
//! - `dlms-interface`: Object framework, persistence and interface classes
//!
//! Transport, session, ciphering and request scheduling are not part of
//! this library. They drive objects through [`interface::CosemObject`].
//!
//! # Usage
//!
//! ```
//! use dlms::interface::{Context, CosemObject, Register};
//! use dlms::{decode_data, encode_data, DataObject, ObisCode};
//!
//! let ctx = Context::default();
//! let mut register = Register::new(ObisCode::new(1, 0, 1, 8, 0, 255));
//!
//! // A value received from a meter, as it appears on the wire
//! let bytes = encode_data(&DataObject::Unsigned32(42));
//! assert_eq!(bytes, [0x06, 0x00, 0x00, 0x00, 0x2A]);
//! register.set_encoded(&ctx, 2, &bytes).unwrap();
//!
//! assert_eq!(register.value(), &DataObject::Unsigned32(42));
//! let encoded = register.get_encoded(&ctx, 2).unwrap();
//! assert_eq!(decode_data(&encoded).unwrap(), DataObject::Unsigned32(42));
//! ```

// Re-export core types
pub use dlms_core::datatypes::*;
pub use dlms_core::{ActionResult, DataAccessResult, DlmsError, DlmsResult, ObisCode};

// Re-export the value codec
pub use dlms_asn1::{decode_data, decode_data_with, encode_data};

// Re-export interface classes
pub mod interface {
    pub use dlms_interface::*;
}
