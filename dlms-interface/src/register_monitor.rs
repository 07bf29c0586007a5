//! Register Monitor interface class (Class ID: 21)
//!
//! The Register Monitor interface class watches one attribute of another object
//! and triggers scripts when the value crosses a threshold.
//!
//! # Attributes
//!
//! - Attribute 1: logical_name (OBIS code) - The logical name of the object
//! - Attribute 2: thresholds - Array of values of the monitored attribute's type
//! - Attribute 3: monitored_value - structure { class_id, logical_name, attribute_index }
//! - Attribute 4: actions - One action_up/action_down pair per threshold
//!
//! # Methods
//!
//! None
//!
//! The monitored object is referenced by logical name and resolved to a handle
//! of the owning collection, at set time when a resolver is available and again
//! after a persisted collection has been loaded.

use crate::collection::ObjectHandle;
use crate::context::{Context, ObjectResolver};
use crate::cosem_object::{method_denied, CosemObject};
use crate::object::ObjectBase;
use crate::object_type::ObjectType;
use crate::persistence::{PersistReader, PersistWriter};
use crate::schema::{AttributeDef, ClassSchema};
use dlms_core::{DataObject, DataObjectType, DlmsError, DlmsResult, ObisCode};

static SCHEMA: ClassSchema = ClassSchema {
    object_type: ObjectType::RegisterMonitor,
    max_version: 0,
    attributes: &[
        AttributeDef::logical_name(),
        AttributeDef::new("Thresholds", DataObjectType::Array),
        AttributeDef::new("MonitoredValue", DataObjectType::Structure).fixed(),
        AttributeDef::new("Actions", DataObjectType::Array).fixed(),
    ],
    methods: &[],
};

/// Reference to the monitored attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredValue {
    pub class_id: u16,
    pub logical_name: ObisCode,
    pub attribute_index: i8,
}

impl Default for MonitoredValue {
    fn default() -> Self {
        Self {
            class_id: 0,
            logical_name: ObisCode::new(0, 0, 0, 0, 0, 0),
            attribute_index: 0,
        }
    }
}

impl MonitoredValue {
    fn to_data_object(&self) -> DataObject {
        DataObject::Structure(vec![
            DataObject::Unsigned16(self.class_id),
            DataObject::OctetString(self.logical_name.to_bytes().to_vec()),
            DataObject::Integer8(self.attribute_index),
        ])
    }

    fn from_data_object(value: &DataObject) -> DlmsResult<Self> {
        let fields = value.as_structure_of(3)?;
        Ok(Self {
            class_id: fields[0].to_u16()?,
            logical_name: logical_name_from(&fields[1])?,
            attribute_index: fields[2].to_i8()?,
        })
    }

    fn resolve(&self, resolver: Option<&dyn ObjectResolver>) -> Option<ObjectHandle> {
        let object_type = ObjectType::from_u16(self.class_id)?;
        resolver?.resolve(object_type, &self.logical_name)
    }
}

/// Script executed when a threshold is crossed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptAction {
    pub script_logical_name: ObisCode,
    pub script_selector: u16,
}

impl Default for ScriptAction {
    fn default() -> Self {
        Self {
            script_logical_name: ObisCode::new(0, 0, 0, 0, 0, 0),
            script_selector: 0,
        }
    }
}

impl ScriptAction {
    fn to_data_object(&self) -> DataObject {
        DataObject::Structure(vec![
            DataObject::OctetString(self.script_logical_name.to_bytes().to_vec()),
            DataObject::Unsigned16(self.script_selector),
        ])
    }

    fn from_data_object(value: &DataObject) -> DlmsResult<Self> {
        let fields = value.as_structure_of(2)?;
        Ok(Self {
            script_logical_name: logical_name_from(&fields[0])?,
            script_selector: fields[1].to_u16()?,
        })
    }

    fn save(&self, writer: &mut PersistWriter) -> DlmsResult<()> {
        writer.write("LogicalName", &self.script_logical_name.to_string())?;
        writer.write("Selector", &self.script_selector)
    }

    fn load(reader: &PersistReader<'_>) -> DlmsResult<Self> {
        Ok(Self {
            script_logical_name: read_logical_name(reader, "LogicalName")?,
            script_selector: reader.read("Selector")?,
        })
    }
}

/// Scripts of one threshold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet {
    pub up: ScriptAction,
    pub down: ScriptAction,
}

fn logical_name_from(value: &DataObject) -> DlmsResult<ObisCode> {
    let bytes = value.as_octet_string()?;
    ObisCode::from_bytes(bytes).map_err(|_| {
        DlmsError::type_mismatch("OctetString(6)", format!("OctetString({})", bytes.len()))
    })
}

fn read_logical_name(reader: &PersistReader<'_>, name: &str) -> DlmsResult<ObisCode> {
    let text: String = reader.read(name)?;
    if text.is_empty() {
        return Ok(ObisCode::new(0, 0, 0, 0, 0, 0));
    }
    ObisCode::from_string(&text)
        .map_err(|e| DlmsError::Persistence(format!("Element {} is malformed: {}", name, e)))
}

/// Register Monitor interface class (Class ID: 21)
#[derive(Debug)]
pub struct RegisterMonitor {
    base: ObjectBase,
    thresholds: Vec<DataObject>,
    monitored_value: MonitoredValue,
    actions: Vec<ActionSet>,
    target: Option<ObjectHandle>,
}

impl RegisterMonitor {
    pub const ATTR_THRESHOLDS: u8 = 2;
    pub const ATTR_MONITORED_VALUE: u8 = 3;
    pub const ATTR_ACTIONS: u8 = 4;

    pub fn new(logical_name: ObisCode) -> Self {
        Self {
            base: ObjectBase::initial(&SCHEMA, Some(logical_name)),
            thresholds: Vec::new(),
            monitored_value: MonitoredValue::default(),
            actions: Vec::new(),
            target: None,
        }
    }

    pub fn thresholds(&self) -> &[DataObject] {
        &self.thresholds
    }

    pub fn monitored_value(&self) -> &MonitoredValue {
        &self.monitored_value
    }

    pub fn actions(&self) -> &[ActionSet] {
        &self.actions
    }

    /// Handle of the monitored object, once resolved
    pub fn target(&self) -> Option<ObjectHandle> {
        self.target
    }

    /// Scripts triggered by the monitored value moving from `previous` to `current`
    ///
    /// A threshold is crossed upwards when `previous < threshold <= current` and
    /// downwards when `previous >= threshold > current`.
    pub fn triggered_actions(
        &self,
        previous: &DataObject,
        current: &DataObject,
    ) -> DlmsResult<Vec<&ScriptAction>> {
        let previous = previous.to_f64()?;
        let current = current.to_f64()?;
        let mut triggered = Vec::new();
        for (threshold, actions) in self.thresholds.iter().zip(&self.actions) {
            let threshold = threshold.to_f64()?;
            if previous < threshold && threshold <= current {
                triggered.push(&actions.up);
            } else if previous >= threshold && threshold > current {
                triggered.push(&actions.down);
            }
        }
        Ok(triggered)
    }
}

impl CosemObject for RegisterMonitor {
    fn schema(&self) -> &'static ClassSchema {
        &SCHEMA
    }

    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_attribute(&self, _ctx: &Context<'_>, index: u8) -> DlmsResult<DataObject> {
        Ok(match index {
            Self::ATTR_THRESHOLDS => DataObject::Array(self.thresholds.clone()),
            Self::ATTR_MONITORED_VALUE => self.monitored_value.to_data_object(),
            _ => DataObject::Array(
                self.actions
                    .iter()
                    .map(|set| {
                        DataObject::Structure(vec![
                            set.up.to_data_object(),
                            set.down.to_data_object(),
                        ])
                    })
                    .collect(),
            ),
        })
    }

    fn set_attribute(&mut self, ctx: &Context<'_>, index: u8, value: DataObject) -> DlmsResult<()> {
        match index {
            Self::ATTR_THRESHOLDS => {
                self.thresholds = value.as_array()?.to_vec();
            }
            Self::ATTR_MONITORED_VALUE => {
                let monitored_value = MonitoredValue::from_data_object(&value)?;
                self.target = monitored_value.resolve(ctx.resolver());
                self.monitored_value = monitored_value;
            }
            _ => {
                self.actions = value
                    .as_array()?
                    .iter()
                    .map(|item| {
                        let pair = item.as_structure_of(2)?;
                        Ok(ActionSet {
                            up: ScriptAction::from_data_object(&pair[0])?,
                            down: ScriptAction::from_data_object(&pair[1])?,
                        })
                    })
                    .collect::<DlmsResult<_>>()?;
            }
        }
        Ok(())
    }

    fn invoke_method(
        &mut self,
        _ctx: &Context<'_>,
        index: u8,
        _parameters: Option<DataObject>,
    ) -> DlmsResult<Option<DataObject>> {
        Err(method_denied(ObjectType::RegisterMonitor, index))
    }

    fn save(&self, writer: &mut PersistWriter) -> DlmsResult<()> {
        writer.write_list("Thresholds", &self.thresholds, |item, threshold| {
            item.write("Value", threshold)
        })?;
        writer.write_group("MonitoredValue", |group| {
            group.write("ObjectType", &self.monitored_value.class_id)?;
            group.write("LogicalName", &self.monitored_value.logical_name.to_string())?;
            group.write("Index", &self.monitored_value.attribute_index)
        })?;
        writer.write_list("Actions", &self.actions, |item, set| {
            item.write_group("Up", |up| set.up.save(up))?;
            item.write_group("Down", |down| set.down.save(down))
        })
    }

    fn load(&mut self, reader: &PersistReader<'_>) -> DlmsResult<()> {
        let thresholds =
            reader.read_list("Thresholds", |item| item.read_or("Value", DataObject::Null))?;
        let monitored_value = reader.read_group("MonitoredValue", |group| {
            Ok(MonitoredValue {
                class_id: group.read("ObjectType")?,
                logical_name: read_logical_name(group, "LogicalName")?,
                attribute_index: group.read("Index")?,
            })
        })?;
        let actions = reader.read_list("Actions", |item| {
            Ok(ActionSet {
                up: item.read_group("Up", ScriptAction::load)?,
                down: item.read_group("Down", ScriptAction::load)?,
            })
        })?;

        self.thresholds = thresholds;
        self.monitored_value = monitored_value;
        self.actions = actions;
        self.target = None;
        Ok(())
    }

    fn post_load(&mut self, resolver: &dyn ObjectResolver) -> DlmsResult<()> {
        self.target = self.monitored_value.resolve(Some(resolver));
        if self.target.is_none() && self.monitored_value.class_id != 0 {
            log::warn!(
                "Monitored object {} of class {} is not in the collection",
                self.monitored_value.logical_name,
                self.monitored_value.class_id
            );
        }
        Ok(())
    }
}
