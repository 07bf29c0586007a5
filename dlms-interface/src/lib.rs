//! COSEM interface classes for DLMS/COSEM
//!
//! This crate provides the object framework shared by every interface class
//! and a set of representative class adapters built on it.
//!
//! Every object carries a logical name, an interface class id and version,
//! and a per-attribute access table. Values travel as [`DataObject`]s; the
//! framework serves attribute 1 (the logical name) and delegates the other
//! indices to the class adapter. Attribute state (unread, cached, dirty)
//! drives which attributes need to be fetched from a device.
//!
//! # Example
//!
//! ```
//! use dlms_core::{DataObject, ObisCode};
//! use dlms_interface::{Context, CosemObject, Register};
//!
//! let ctx = Context::default();
//! let mut register = Register::new(ObisCode::new(1, 0, 1, 8, 0, 255));
//! register.set_value(&ctx, 2, DataObject::Unsigned32(1234)).unwrap();
//! assert_eq!(register.get_value(&ctx, 2).unwrap(), DataObject::Unsigned32(1234));
//! assert!(register.base().is_read(2));
//! ```
//!
//! [`DataObject`]: dlms_core::DataObject

pub mod attribute;
pub mod collection;
pub mod context;
pub mod cosem_object;
pub mod factory;
pub mod object;
pub mod object_type;
pub mod persistence;
pub mod scaler_unit;
pub mod schema;

pub mod auto_answer;
pub mod clock;
pub mod data;
pub mod image_transfer;
pub mod register;
pub mod register_monitor;
pub mod security_setup;

pub use attribute::{AccessMode, AttributeTable, MethodAccessMode};
pub use collection::{ObjectCollection, ObjectHandle};
pub use context::{Context, ContextSettings, ObjectResolver};
pub use cosem_object::CosemObject;
pub use factory::{create_object, supported_types};
pub use object::{AttributeChange, AttributeState, ObjectBase};
pub use object_type::ObjectType;
pub use persistence::{load_object, save_object, PersistReader, PersistWriter};
pub use scaler_unit::{ScalerUnit, UnitId};
pub use schema::{AttributeDef, ClassSchema, MethodDef};

pub use auto_answer::AutoAnswer;
pub use clock::Clock;
pub use data::Data;
pub use image_transfer::ImageTransfer;
pub use register::Register;
pub use register_monitor::RegisterMonitor;
pub use security_setup::SecuritySetup;
