//! Construction of interface class objects by class id

use crate::auto_answer::AutoAnswer;
use crate::clock::Clock;
use crate::cosem_object::CosemObject;
use crate::data::Data;
use crate::image_transfer::ImageTransfer;
use crate::object_type::ObjectType;
use crate::register::Register;
use crate::register_monitor::RegisterMonitor;
use crate::security_setup::SecuritySetup;
use dlms_core::{DlmsError, DlmsResult, ObisCode};

/// Create an empty object of `object_type` at schema `version`
///
/// # Errors
///
/// Returns [`DlmsError::InvalidData`] if the class has no adapter or does not
/// know `version`.
pub fn create_object(
    object_type: ObjectType,
    logical_name: ObisCode,
    version: u8,
) -> DlmsResult<Box<dyn CosemObject>> {
    let object: Box<dyn CosemObject> = match object_type {
        ObjectType::Data => Box::new(Data::new(logical_name)),
        ObjectType::Register => Box::new(Register::new(logical_name)),
        ObjectType::Clock => Box::new(Clock::new(logical_name)),
        ObjectType::ImageTransfer => Box::new(ImageTransfer::new(logical_name)),
        ObjectType::RegisterMonitor => Box::new(RegisterMonitor::new(logical_name)),
        ObjectType::AutoAnswer => {
            return Ok(Box::new(AutoAnswer::with_version(logical_name, version)?));
        }
        ObjectType::SecuritySetup => {
            return Ok(Box::new(SecuritySetup::with_version(logical_name, version)?));
        }
        other => {
            return Err(DlmsError::InvalidData(format!(
                "Interface class {} ({}) is not supported",
                other,
                other.id()
            )));
        }
    };
    if version != object.version() {
        return Err(DlmsError::InvalidData(format!(
            "{} supports versions up to {}, got {}",
            object_type,
            object.schema().max_version,
            version
        )));
    }
    Ok(object)
}

/// Interface classes [`create_object`] can build
pub fn supported_types() -> &'static [ObjectType] {
    &[
        ObjectType::Data,
        ObjectType::Register,
        ObjectType::Clock,
        ObjectType::ImageTransfer,
        ObjectType::RegisterMonitor,
        ObjectType::AutoAnswer,
        ObjectType::SecuritySetup,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_every_supported_type() {
        let ln = ObisCode::new(0, 0, 1, 0, 0, 255);
        for &object_type in supported_types() {
            let object = create_object(object_type, ln, 0).unwrap();
            assert_eq!(object.object_type(), object_type);
            assert_eq!(object.logical_name(), Some(ln));
            assert_eq!(object.version(), 0);
        }
    }

    #[test]
    fn test_create_checks_version() {
        let ln = ObisCode::new(0, 0, 1, 0, 0, 255);
        assert!(matches!(
            create_object(ObjectType::Register, ln, 1),
            Err(DlmsError::InvalidData(_))
        ));
        let auto_answer = create_object(ObjectType::AutoAnswer, ln, 2).unwrap();
        assert_eq!(auto_answer.attribute_count(), 7);
        assert!(create_object(ObjectType::SecuritySetup, ln, 2).is_err());
    }

    #[test]
    fn test_create_unsupported_type() {
        let ln = ObisCode::new(1, 0, 99, 1, 0, 255);
        assert!(matches!(
            create_object(ObjectType::ProfileGeneric, ln, 1),
            Err(DlmsError::InvalidData(_))
        ));
    }
}
