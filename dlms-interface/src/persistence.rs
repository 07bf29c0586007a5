//! Element-per-attribute persistence of object state
//!
//! Objects write named elements into a JSON object through [`PersistWriter`]
//! and read them back through [`PersistReader`]. Structured attributes become
//! nested groups and lists rather than encoded wire bytes. A missing element
//! yields the type's default so documents written by older schema versions
//! still load; a present but malformed element fails the whole load.

use crate::attribute::{AccessMode, MethodAccessMode};
use crate::cosem_object::CosemObject;
use crate::factory::create_object;
use crate::object_type::ObjectType;
use dlms_core::{DlmsError, DlmsResult, ObisCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Writer of named elements
#[derive(Debug, Default)]
pub struct PersistWriter {
    elements: Map<String, Value>,
}

impl PersistWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> DlmsResult<()> {
        self.elements
            .insert(name.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Octet strings are stored as hex text
    pub fn write_bytes(&mut self, name: &str, bytes: &[u8]) -> DlmsResult<()> {
        self.write(name, &hex::encode_upper(bytes))
    }

    /// Nested element holding child elements
    pub fn write_group<F>(&mut self, name: &str, f: F) -> DlmsResult<()>
    where
        F: FnOnce(&mut PersistWriter) -> DlmsResult<()>,
    {
        let mut child = PersistWriter::new();
        f(&mut child)?;
        self.elements
            .insert(name.to_string(), Value::Object(child.elements));
        Ok(())
    }

    /// Parent element with one child element per item
    pub fn write_list<I, F>(&mut self, name: &str, items: I, mut f: F) -> DlmsResult<()>
    where
        I: IntoIterator,
        F: FnMut(&mut PersistWriter, I::Item) -> DlmsResult<()>,
    {
        let mut list = Vec::new();
        for item in items {
            let mut child = PersistWriter::new();
            f(&mut child, item)?;
            list.push(Value::Object(child.elements));
        }
        self.elements.insert(name.to_string(), Value::Array(list));
        Ok(())
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.elements
    }
}

/// Reader of named elements
#[derive(Debug, Clone, Copy)]
pub struct PersistReader<'a> {
    elements: &'a Map<String, Value>,
}

impl<'a> PersistReader<'a> {
    pub fn new(elements: &'a Map<String, Value>) -> Self {
        Self { elements }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.elements.get(name).is_some_and(|value| !value.is_null())
    }

    /// Element value, or `T::default()` when it is missing
    pub fn read<T: DeserializeOwned + Default>(&self, name: &str) -> DlmsResult<T> {
        self.read_or(name, T::default())
    }

    /// Element value, or `default` when it is missing
    pub fn read_or<T: DeserializeOwned>(&self, name: &str, default: T) -> DlmsResult<T> {
        match self.elements.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => T::deserialize(value).map_err(|e| {
                DlmsError::Persistence(format!("Element {} is malformed: {}", name, e))
            }),
        }
    }

    /// Hex-encoded octet string, empty when missing
    pub fn read_bytes(&self, name: &str) -> DlmsResult<Vec<u8>> {
        let text: String = self.read(name)?;
        hex::decode(&text).map_err(|e| {
            DlmsError::Persistence(format!("Element {} is not hex: {}", name, e))
        })
    }

    /// Nested element; a missing group reads as an empty one
    pub fn read_group<T, F>(&self, name: &str, f: F) -> DlmsResult<T>
    where
        F: FnOnce(&PersistReader<'_>) -> DlmsResult<T>,
    {
        match self.elements.get(name) {
            None | Some(Value::Null) => f(&PersistReader::new(&Map::new())),
            Some(Value::Object(child)) => f(&PersistReader::new(child)),
            Some(_) => Err(DlmsError::Persistence(format!(
                "Element {} is not a group",
                name
            ))),
        }
    }

    /// Child elements of a list; a missing list reads as empty
    pub fn read_list<T, F>(&self, name: &str, mut f: F) -> DlmsResult<Vec<T>>
    where
        F: FnMut(&PersistReader<'_>) -> DlmsResult<T>,
    {
        match self.elements.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::Object(child) => f(&PersistReader::new(child)),
                    _ => Err(DlmsError::Persistence(format!(
                        "Item of {} is not a group",
                        name
                    ))),
                })
                .collect(),
            Some(_) => Err(DlmsError::Persistence(format!(
                "Element {} is not a list",
                name
            ))),
        }
    }
}

/// Write one object, header elements first
pub fn save_object(object: &dyn CosemObject) -> DlmsResult<Map<String, Value>> {
    let base = object.base();
    let mut writer = PersistWriter::new();
    writer.write("ObjectType", &object.class_id())?;
    writer.write("Version", &base.version())?;
    writer.write(
        "LogicalName",
        &base.logical_name().map(|ln| ln.to_string()).unwrap_or_default(),
    )?;
    writer.write("ShortName", &base.short_name())?;
    writer.write("Description", base.description())?;

    let access: String = (1..=object.attribute_count())
        .map(|index| char::from(b'0' + base.access(index).to_u8()))
        .collect();
    writer.write("Access", &access)?;
    let method_access: String = (1..=object.method_count())
        .map(|index| char::from(b'0' + base.attributes().method_access(index).to_u8()))
        .collect();
    writer.write("MethodAccess", &method_access)?;

    object.save(&mut writer)?;
    Ok(writer.into_map())
}

/// Build a fresh object from one saved element
///
/// Cross-object references stay unresolved until `post_load`.
pub fn load_object(elements: &Map<String, Value>) -> DlmsResult<Box<dyn CosemObject>> {
    let reader = PersistReader::new(elements);

    let class_id: u16 = reader.read("ObjectType")?;
    let object_type = ObjectType::from_u16(class_id).ok_or_else(|| {
        DlmsError::Persistence(format!("Unknown object type {}", class_id))
    })?;
    let version: u8 = reader.read("Version")?;
    let logical_name: String = reader.read("LogicalName")?;
    let logical_name = ObisCode::from_string(&logical_name)
        .map_err(|e| DlmsError::Persistence(format!("Bad logical name: {}", e)))?;

    let mut object = create_object(object_type, logical_name, version)?;
    let base = object.base_mut();
    base.set_short_name(reader.read("ShortName")?);
    base.set_description(reader.read::<String>("Description")?);

    let access: String = reader.read("Access")?;
    for (index, digit) in (1u8..).zip(access.bytes()) {
        let mode = digit
            .checked_sub(b'0')
            .and_then(AccessMode::from_u8)
            .ok_or_else(|| DlmsError::Persistence(format!("Bad access digit {}", digit as char)))?;
        base.attributes_mut().set_access(index, mode);
    }
    let method_access: String = reader.read("MethodAccess")?;
    for (index, digit) in (1u8..).zip(method_access.bytes()) {
        let mode = digit
            .checked_sub(b'0')
            .and_then(MethodAccessMode::from_u8)
            .ok_or_else(|| {
                DlmsError::Persistence(format!("Bad method access digit {}", digit as char))
            })?;
        base.attributes_mut().set_method_access(index, mode);
    }

    object.load(&reader)?;
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_elements_default() {
        let map = Map::new();
        let reader = PersistReader::new(&map);
        assert_eq!(reader.read::<u32>("BlockSize").unwrap(), 0);
        assert_eq!(reader.read_or("BlockSize", 256u32).unwrap(), 256);
        assert!(reader.read_bytes("Title").unwrap().is_empty());
        assert!(reader.read_list("Windows", |_| Ok(())).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_element_fails() {
        let mut writer = PersistWriter::new();
        writer.write("BlockSize", "many").unwrap();
        writer.write("Title", "zz").unwrap();
        writer.write("Windows", &3).unwrap();
        let map = writer.into_map();
        let reader = PersistReader::new(&map);
        assert!(matches!(reader.read::<u32>("BlockSize"), Err(DlmsError::Persistence(_))));
        assert!(reader.read_bytes("Title").is_err());
        assert!(reader.read_list("Windows", |_| Ok(())).is_err());
    }

    #[test]
    fn test_groups_and_lists() {
        let mut writer = PersistWriter::new();
        writer
            .write_list("ListeningWindow", [(1u8, 2u8), (3, 4)], |w, (start, end)| {
                w.write("Start", &start)?;
                w.write("End", &end)
            })
            .unwrap();
        writer
            .write_group("NumberOfRings", |w| w.write("InWindow", &2u8))
            .unwrap();
        writer.write_bytes("Title", &[0xAB, 0x01]).unwrap();
        let map = writer.into_map();
        assert_eq!(map["Title"], Value::from("AB01"));

        let reader = PersistReader::new(&map);
        let windows = reader
            .read_list("ListeningWindow", |r| Ok((r.read::<u8>("Start")?, r.read::<u8>("End")?)))
            .unwrap();
        assert_eq!(windows, vec![(1, 2), (3, 4)]);
        let rings = reader
            .read_group("NumberOfRings", |r| r.read::<u8>("InWindow"))
            .unwrap();
        assert_eq!(rings, 2);
        assert_eq!(reader.read_bytes("Title").unwrap(), vec![0xAB, 0x01]);
    }
}
