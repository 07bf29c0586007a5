//! Identity and per-attribute bookkeeping shared by every object

use crate::attribute::{AccessMode, AttributeTable};
use crate::object_type::ObjectType;
use crate::schema::ClassSchema;
use chrono::{DateTime, Utc};
use dlms_core::{DataObject, DlmsError, DlmsResult, ObisCode};
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};

/// A dirty/clean transition of one attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    pub index: u8,
    pub dirty: bool,
    /// Pending value when the attribute became dirty
    pub value: Option<DataObject>,
}

/// Observable state of one attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeState {
    /// Never fetched from the device
    Unread,
    /// Fetched; the object's fields hold the device value
    Cached,
    /// Locally modified, carrying the value waiting to be committed
    Dirty(DataObject),
}

#[derive(Debug, Clone, PartialEq)]
struct DirtyRecord {
    pending: DataObject,
    previous: DataObject,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AttributeSlot {
    read_at: Option<DateTime<Utc>>,
    dirty: Option<DirtyRecord>,
}

/// Identity, access metadata, read times and dirty tracking of an object
#[derive(Debug)]
pub struct ObjectBase {
    logical_name: Option<ObisCode>,
    short_name: Option<u16>,
    object_type: ObjectType,
    version: u8,
    description: String,
    attributes: AttributeTable,
    slots: BTreeMap<u8, AttributeSlot>,
    subscribers: Vec<Sender<AttributeChange>>,
}

impl ObjectBase {
    /// Base with permissive access and no schema seeding
    pub fn new(object_type: ObjectType, logical_name: Option<ObisCode>, version: u8) -> Self {
        Self {
            logical_name,
            short_name: None,
            object_type,
            version,
            description: String::new(),
            attributes: AttributeTable::new(),
            slots: BTreeMap::new(),
            subscribers: Vec::new(),
        }
    }

    /// Base whose attribute table is seeded from the declared schema
    ///
    /// # Errors
    ///
    /// Returns an error if `version` is newer than the schema knows
    pub fn from_schema(
        schema: &ClassSchema,
        logical_name: Option<ObisCode>,
        version: u8,
    ) -> DlmsResult<Self> {
        if !schema.supports_version(version) {
            return Err(DlmsError::InvalidData(format!(
                "{} supports versions up to {}, got {}",
                schema.object_type, schema.max_version, version
            )));
        }
        Ok(Self::seeded(schema, logical_name, version))
    }

    /// Version 0 base seeded from the schema; every schema knows version 0
    pub fn initial(schema: &ClassSchema, logical_name: Option<ObisCode>) -> Self {
        Self::seeded(schema, logical_name, 0)
    }

    fn seeded(schema: &ClassSchema, logical_name: Option<ObisCode>, version: u8) -> Self {
        let mut base = Self::new(schema.object_type, logical_name, version);
        for (index, def) in (1u8..).zip(schema.attributes) {
            if def.since > version {
                break;
            }
            let meta = base.attributes.get_or_create(index);
            if index != 1 {
                meta.access = def.access;
            }
            meta.is_static = def.is_static;
            meta.ui_type = def.ui_type;
        }
        for (index, def) in (1u8..).zip(schema.methods) {
            if def.since > version {
                break;
            }
            base.attributes.set_method_access(index, def.access);
        }
        base
    }

    pub fn logical_name(&self) -> Option<ObisCode> {
        self.logical_name
    }

    /// Set the logical name; once set it can only be set again to the same value
    pub fn set_logical_name(&mut self, logical_name: ObisCode) -> DlmsResult<()> {
        match self.logical_name {
            Some(current) if current != logical_name => Err(DlmsError::ReadWriteDenied(format!(
                "Logical name {} cannot be changed to {}",
                current, logical_name
            ))),
            _ => {
                self.logical_name = Some(logical_name);
                Ok(())
            }
        }
    }

    pub fn short_name(&self) -> Option<u16> {
        self.short_name
    }

    pub fn set_short_name(&mut self, short_name: Option<u16>) {
        self.short_name = short_name;
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeTable {
        &mut self.attributes
    }

    pub fn access(&self, index: u8) -> AccessMode {
        self.attributes.access(index)
    }

    pub fn can_read(&self, index: u8) -> bool {
        self.access(index) != AccessMode::NoAccess
    }

    /// True when there is nothing to wait for: unreadable, or fetched at least once
    pub fn is_read(&self, index: u8) -> bool {
        !self.can_read(index) || self.read_at(index).is_some()
    }

    pub fn read_at(&self, index: u8) -> Option<DateTime<Utc>> {
        self.slots.get(&index).and_then(|slot| slot.read_at)
    }

    pub fn mark_read(&mut self, index: u8, timestamp: DateTime<Utc>) {
        self.slots.entry(index).or_default().read_at = Some(timestamp);
    }

    /// Forget that the attribute was fetched so it is requested again
    pub fn clear_read(&mut self, index: u8) {
        if let Some(slot) = self.slots.get_mut(&index) {
            slot.read_at = None;
        }
    }

    /// Record a pending local value and notify subscribers
    ///
    /// When the attribute is already dirty the first recorded previous value is kept.
    pub fn mark_dirty(
        &mut self,
        index: u8,
        pending: DataObject,
        previous: DataObject,
    ) -> AttributeChange {
        let slot = self.slots.entry(index).or_default();
        let previous = match slot.dirty.take() {
            Some(record) => record.previous,
            None => previous,
        };
        slot.dirty = Some(DirtyRecord {
            pending: pending.clone(),
            previous,
        });

        let change = AttributeChange {
            index,
            dirty: true,
            value: Some(pending),
        };
        self.notify(&change);
        change
    }

    /// Drop the pending value of `index`; `None` when it was not dirty
    pub fn clear_dirty(&mut self, index: u8) -> Option<AttributeChange> {
        self.take_dirty(index)?;
        let change = AttributeChange {
            index,
            dirty: false,
            value: None,
        };
        self.notify(&change);
        Some(change)
    }

    /// Remove the dirty record without notifying, returning the previous value
    pub(crate) fn take_dirty(&mut self, index: u8) -> Option<DataObject> {
        self.slots
            .get_mut(&index)
            .and_then(|slot| slot.dirty.take())
            .map(|record| record.previous)
    }

    /// Value the pending write of `index` replaced
    pub(crate) fn dirty_previous(&self, index: u8) -> Option<&DataObject> {
        self.slots
            .get(&index)
            .and_then(|slot| slot.dirty.as_ref())
            .map(|record| &record.previous)
    }

    pub fn is_dirty(&self, index: u8) -> bool {
        self.dirty_value(index).is_some()
    }

    pub fn dirty_value(&self, index: u8) -> Option<&DataObject> {
        self.slots
            .get(&index)
            .and_then(|slot| slot.dirty.as_ref())
            .map(|record| &record.pending)
    }

    /// Dirty attribute indices in ascending order
    pub fn dirty_indices(&self) -> Vec<u8> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.dirty.is_some())
            .map(|(index, _)| *index)
            .collect()
    }

    pub fn state(&self, index: u8) -> AttributeState {
        match self.slots.get(&index) {
            Some(AttributeSlot {
                dirty: Some(record),
                ..
            }) => AttributeState::Dirty(record.pending.clone()),
            Some(AttributeSlot {
                read_at: Some(_), ..
            }) => AttributeState::Cached,
            _ => AttributeState::Unread,
        }
    }

    /// Open a channel receiving every subsequent change of this object
    pub fn subscribe(&mut self) -> Receiver<AttributeChange> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    pub(crate) fn notify(&mut self, change: &AttributeChange) {
        self.subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }
}
