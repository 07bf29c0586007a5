//! Attribute and method access metadata
//!
//! Every object owns an [`AttributeTable`]: a sparse map from attribute index to
//! its access mode, wire type, display type and "static" flag. Entries are
//! created on demand with permissive defaults. Index range checks belong to the
//! object contract, not to this table.

use dlms_core::DataObjectType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute access right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AccessMode {
    NoAccess = 0,
    Read = 1,
    Write = 2,
    #[default]
    ReadWrite = 3,
    AuthenticatedRead = 4,
    AuthenticatedWrite = 5,
    AuthenticatedReadWrite = 6,
}

impl AccessMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AccessMode::NoAccess),
            1 => Some(AccessMode::Read),
            2 => Some(AccessMode::Write),
            3 => Some(AccessMode::ReadWrite),
            4 => Some(AccessMode::AuthenticatedRead),
            5 => Some(AccessMode::AuthenticatedWrite),
            6 => Some(AccessMode::AuthenticatedReadWrite),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Whether a local write may be sent to the device
    pub fn can_write(self) -> bool {
        matches!(
            self,
            AccessMode::Write
                | AccessMode::ReadWrite
                | AccessMode::AuthenticatedWrite
                | AccessMode::AuthenticatedReadWrite
        )
    }
}

/// Method access right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum MethodAccessMode {
    NoAccess = 0,
    #[default]
    Access = 1,
    AuthenticatedAccess = 2,
}

impl MethodAccessMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(MethodAccessMode::NoAccess),
            1 => Some(MethodAccessMode::Access),
            2 => Some(MethodAccessMode::AuthenticatedAccess),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Metadata of one attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMetadata {
    pub index: u8,
    pub access: AccessMode,
    /// Wire type reported by the device, overriding the class schema
    pub data_type: Option<DataObjectType>,
    /// Display type, e.g. DateTime for a time carried as an octet string
    pub ui_type: Option<DataObjectType>,
    pub is_static: bool,
}

impl AttributeMetadata {
    fn new(index: u8) -> Self {
        Self {
            index,
            access: if index == 1 {
                AccessMode::Read
            } else {
                AccessMode::default()
            },
            data_type: None,
            ui_type: None,
            is_static: false,
        }
    }
}

/// Per-object attribute and method metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTable {
    attributes: BTreeMap<u8, AttributeMetadata>,
    methods: BTreeMap<u8, MethodAccessMode>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `index`, created with permissive defaults when absent
    pub fn get_or_create(&mut self, index: u8) -> &mut AttributeMetadata {
        self.attributes
            .entry(index)
            .or_insert_with(|| AttributeMetadata::new(index))
    }

    pub fn get(&self, index: u8) -> Option<&AttributeMetadata> {
        self.attributes.get(&index)
    }

    pub fn access(&self, index: u8) -> AccessMode {
        if index == 1 {
            return AccessMode::Read;
        }
        self.attributes
            .get(&index)
            .map_or(AccessMode::default(), |meta| meta.access)
    }

    /// Set the access mode; the logical name always stays read-only
    pub fn set_access(&mut self, index: u8, access: AccessMode) {
        if index == 1 {
            return;
        }
        self.get_or_create(index).access = access;
    }

    pub fn data_type(&self, index: u8) -> Option<DataObjectType> {
        self.attributes.get(&index).and_then(|meta| meta.data_type)
    }

    pub fn set_data_type(&mut self, index: u8, data_type: DataObjectType) {
        self.get_or_create(index).data_type = Some(data_type);
    }

    pub fn ui_data_type(&self, index: u8) -> Option<DataObjectType> {
        self.attributes.get(&index).and_then(|meta| meta.ui_type)
    }

    pub fn set_ui_data_type(&mut self, index: u8, ui_type: DataObjectType) {
        self.get_or_create(index).ui_type = Some(ui_type);
    }

    pub fn is_static(&self, index: u8) -> bool {
        self.attributes
            .get(&index)
            .is_some_and(|meta| meta.is_static)
    }

    pub fn set_static(&mut self, index: u8, is_static: bool) {
        self.get_or_create(index).is_static = is_static;
    }

    pub fn method_access(&self, index: u8) -> MethodAccessMode {
        self.methods.get(&index).copied().unwrap_or_default()
    }

    pub fn set_method_access(&mut self, index: u8, access: MethodAccessMode) {
        self.methods.insert(index, access);
    }

    /// Attributes with an entry, in index order
    pub fn iter(&self) -> impl Iterator<Item = &AttributeMetadata> {
        self.attributes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_permissive() {
        let table = AttributeTable::new();
        assert_eq!(table.access(7), AccessMode::ReadWrite);
        assert_eq!(table.method_access(3), MethodAccessMode::Access);
        assert!(!table.is_static(7));
        assert_eq!(table.data_type(7), None);
    }

    #[test]
    fn test_logical_name_stays_read_only() {
        let mut table = AttributeTable::new();
        assert_eq!(table.get_or_create(1).access, AccessMode::Read);
        table.set_access(1, AccessMode::ReadWrite);
        assert_eq!(table.access(1), AccessMode::Read);
    }

    #[test]
    fn test_set_and_get_metadata() {
        let mut table = AttributeTable::new();
        table.set_access(2, AccessMode::AuthenticatedRead);
        table.set_data_type(2, DataObjectType::OctetString);
        table.set_ui_data_type(2, DataObjectType::DateTime);
        table.set_static(2, true);

        let meta = table.get(2).unwrap();
        assert_eq!(meta.access, AccessMode::AuthenticatedRead);
        assert_eq!(meta.data_type, Some(DataObjectType::OctetString));
        assert_eq!(meta.ui_type, Some(DataObjectType::DateTime));
        assert!(meta.is_static);
        assert!(!AccessMode::AuthenticatedRead.can_write());
    }

    #[test]
    fn test_access_mode_codes() {
        for code in 0..=6 {
            assert_eq!(AccessMode::from_u8(code).unwrap().to_u8(), code);
        }
        assert_eq!(AccessMode::from_u8(7), None);
        assert_eq!(MethodAccessMode::from_u8(3), None);
    }
}
