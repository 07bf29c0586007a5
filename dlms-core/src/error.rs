use thiserror::Error;

/// Main error type for COSEM object model operations
///
/// Variants fall in two groups. Protocol-level conditions (`ReadWriteDenied`,
/// `InconsistentClass`, `TypeMismatch`, `Decode`) are reported to the peer as a
/// wire-level result code and the session continues. `InvalidIndex` means a caller
/// or adapter broke the object contract and has no wire-level mapping.
#[derive(Error, Debug)]
pub enum DlmsError {
    #[error("Invalid index {index} for interface class {class_id}")]
    InvalidIndex { class_id: u16, index: u8 },

    #[error("Read-write denied: {0}")]
    ReadWriteDenied(String),

    #[error("Object class inconsistent: {0}")]
    InconsistentClass(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("A-XDR decoding error: {0}")]
    Decode(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DlmsError {
    /// Shorthand for a type mismatch between a declared and a received value type
    pub fn type_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        DlmsError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Whether this error is a reportable protocol condition
    ///
    /// Protocol conditions are mapped to a wire result code and the session goes on.
    /// Everything else (contract violations, persistence and I/O failures) must be
    /// propagated to the caller.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            DlmsError::ReadWriteDenied(_)
                | DlmsError::InconsistentClass(_)
                | DlmsError::TypeMismatch { .. }
                | DlmsError::Decode(_)
        )
    }

    /// Wire-level result for a failed GET/SET, if this is a protocol condition
    pub fn data_access_result(&self) -> Option<DataAccessResult> {
        match self {
            DlmsError::ReadWriteDenied(_) => Some(DataAccessResult::ReadWriteDenied),
            DlmsError::InconsistentClass(_) => Some(DataAccessResult::ObjectClassInconsistent),
            DlmsError::TypeMismatch { .. } => Some(DataAccessResult::TypeUnmatched),
            DlmsError::Decode(_) => Some(DataAccessResult::OtherReason),
            _ => None,
        }
    }

    /// Wire-level result for a failed ACTION, if this is a protocol condition
    pub fn action_result(&self) -> Option<ActionResult> {
        match self {
            DlmsError::ReadWriteDenied(_) => Some(ActionResult::ReadWriteDenied),
            DlmsError::InconsistentClass(_) => Some(ActionResult::ObjectClassInconsistent),
            DlmsError::TypeMismatch { .. } => Some(ActionResult::TypeUnmatched),
            DlmsError::Decode(_) => Some(ActionResult::OtherReason),
            _ => None,
        }
    }
}

/// Result type alias for COSEM object model operations
pub type DlmsResult<T> = Result<T, DlmsError>;

/// Data-Access-Result codes returned for GET and SET
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataAccessResult {
    Success = 0,
    HardwareFault = 1,
    TemporaryFailure = 2,
    ReadWriteDenied = 3,
    ObjectUndefined = 4,
    ObjectClassInconsistent = 9,
    ObjectUnavailable = 11,
    TypeUnmatched = 12,
    ScopeOfAccessViolated = 13,
    DataBlockUnavailable = 14,
    LongGetAborted = 15,
    NoLongGetInProgress = 16,
    LongSetAborted = 17,
    NoLongSetInProgress = 18,
    DataBlockNumberInvalid = 19,
    OtherReason = 250,
}

impl DataAccessResult {
    /// Convert a wire code into a result, `None` for unassigned codes
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Success,
            1 => Self::HardwareFault,
            2 => Self::TemporaryFailure,
            3 => Self::ReadWriteDenied,
            4 => Self::ObjectUndefined,
            9 => Self::ObjectClassInconsistent,
            11 => Self::ObjectUnavailable,
            12 => Self::TypeUnmatched,
            13 => Self::ScopeOfAccessViolated,
            14 => Self::DataBlockUnavailable,
            15 => Self::LongGetAborted,
            16 => Self::NoLongGetInProgress,
            17 => Self::LongSetAborted,
            18 => Self::NoLongSetInProgress,
            19 => Self::DataBlockNumberInvalid,
            250 => Self::OtherReason,
            _ => return None,
        })
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Action-Result codes returned for ACTION
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActionResult {
    Success = 0,
    HardwareFault = 1,
    TemporaryFailure = 2,
    ReadWriteDenied = 3,
    ObjectUndefined = 4,
    ObjectClassInconsistent = 9,
    ObjectUnavailable = 11,
    TypeUnmatched = 12,
    ScopeOfAccessViolated = 13,
    DataBlockUnavailable = 14,
    LongActionAborted = 15,
    NoLongActionInProgress = 16,
    OtherReason = 250,
}

impl ActionResult {
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_errors_map_to_wire_codes() {
        let err = DlmsError::ReadWriteDenied("attribute 6".to_string());
        assert!(err.is_protocol_error());
        assert_eq!(err.data_access_result(), Some(DataAccessResult::ReadWriteDenied));
        assert_eq!(err.action_result(), Some(ActionResult::ReadWriteDenied));

        let err = DlmsError::type_mismatch("Unsigned32", "Structure");
        assert_eq!(err.data_access_result(), Some(DataAccessResult::TypeUnmatched));
        assert_eq!(
            err.to_string(),
            "Type mismatch: expected Unsigned32, found Structure"
        );
    }

    #[test]
    fn test_invalid_index_has_no_wire_code() {
        let err = DlmsError::InvalidIndex { class_id: 8, index: 12 };
        assert!(!err.is_protocol_error());
        assert_eq!(err.data_access_result(), None);
        assert_eq!(err.action_result(), None);
    }

    #[test]
    fn test_data_access_result_from_u8() {
        assert_eq!(DataAccessResult::from_u8(3), Some(DataAccessResult::ReadWriteDenied));
        assert_eq!(DataAccessResult::from_u8(250), Some(DataAccessResult::OtherReason));
        assert_eq!(DataAccessResult::from_u8(5), None);
        assert_eq!(DataAccessResult::TypeUnmatched.to_u8(), 12);
    }
}
