//! Owning collection of COSEM objects
//!
//! Objects live in an arena and are addressed by [`ObjectHandle`]. Cross-object
//! references store a handle, never a pointer, so they can be resolved after the
//! whole collection has been loaded.

use crate::context::ObjectResolver;
use crate::cosem_object::CosemObject;
use crate::object_type::ObjectType;
use crate::persistence::{load_object, save_object};
use dlms_core::{DlmsError, DlmsResult, ObisCode};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Index of an object inside its [`ObjectCollection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(usize);

impl ObjectHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

type NameIndex = HashMap<(ObjectType, ObisCode), ObjectHandle>;

/// Objects of one logical device, indexed by type and logical name
#[derive(Debug, Default)]
pub struct ObjectCollection {
    objects: Vec<Box<dyn CosemObject>>,
    by_name: NameIndex,
}

impl ObjectCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object and return its handle
    ///
    /// # Errors
    ///
    /// Returns an error if the object has no logical name or an object of the
    /// same type and logical name is already present
    pub fn add(&mut self, object: Box<dyn CosemObject>) -> DlmsResult<ObjectHandle> {
        let logical_name = object.logical_name().ok_or_else(|| {
            DlmsError::InvalidData(format!(
                "{} without logical name cannot be added",
                object.object_type()
            ))
        })?;
        let key = (object.object_type(), logical_name);
        if self.by_name.contains_key(&key) {
            return Err(DlmsError::InvalidData(format!(
                "{} {} is already in the collection",
                key.0, logical_name
            )));
        }
        let handle = ObjectHandle::new(self.objects.len());
        log::debug!("Adding {} {} as {:?}", key.0, logical_name, handle);
        self.objects.push(object);
        self.by_name.insert(key, handle);
        Ok(handle)
    }

    pub fn find(&self, object_type: ObjectType, logical_name: &ObisCode) -> Option<ObjectHandle> {
        self.by_name.get(&(object_type, *logical_name)).copied()
    }

    /// Every object carrying `logical_name`, whatever its type
    pub fn find_by_ln(&self, logical_name: &ObisCode) -> Vec<ObjectHandle> {
        self.handles()
            .filter(|&handle| self.objects[handle.0].logical_name() == Some(*logical_name))
            .collect()
    }

    pub fn find_by_type(&self, object_type: ObjectType) -> Vec<ObjectHandle> {
        self.handles()
            .filter(|&handle| self.objects[handle.0].object_type() == object_type)
            .collect()
    }

    pub fn find_by_short_name(&self, short_name: u16) -> Option<ObjectHandle> {
        self.handles()
            .find(|&handle| self.objects[handle.0].base().short_name() == Some(short_name))
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&dyn CosemObject> {
        self.objects.get(handle.0).map(|object| object.as_ref())
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut (dyn CosemObject + 'static)> {
        self.objects.get_mut(handle.0).map(|object| object.as_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectHandle, &dyn CosemObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(index, object)| (ObjectHandle::new(index), object.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn handles(&self) -> impl Iterator<Item = ObjectHandle> {
        (0..self.objects.len()).map(ObjectHandle::new)
    }

    /// Persistence document: a JSON array with one element group per object
    pub fn save_to_string(&self) -> DlmsResult<String> {
        let documents = self
            .objects
            .iter()
            .map(|object| save_object(object.as_ref()).map(Value::Object))
            .collect::<DlmsResult<Vec<_>>>()?;
        Ok(serde_json::to_string_pretty(&Value::Array(documents))?)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> DlmsResult<()> {
        fs::write(path, self.save_to_string()?)?;
        Ok(())
    }

    /// Rebuild a collection from a persistence document
    ///
    /// Every object is loaded before any cross-object reference is resolved.
    /// Nothing is returned unless the whole document loads.
    pub fn load_from_str(text: &str) -> DlmsResult<Self> {
        let document: Value = serde_json::from_str(text)?;
        let Value::Array(items) = document else {
            return Err(DlmsError::Persistence(
                "Document must be an array of objects".to_string(),
            ));
        };

        let mut collection = Self::new();
        for item in &items {
            let Value::Object(elements) = item else {
                return Err(DlmsError::Persistence(
                    "Object entry must be a group".to_string(),
                ));
            };
            collection.add(load_object(elements)?)?;
        }

        let resolver = IndexResolver(&collection.by_name);
        for object in &mut collection.objects {
            object.post_load(&resolver)?;
        }
        log::debug!("Loaded {} objects", collection.len());
        Ok(collection)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> DlmsResult<Self> {
        Self::load_from_str(&fs::read_to_string(path)?)
    }
}

impl ObjectResolver for ObjectCollection {
    fn resolve(&self, object_type: ObjectType, logical_name: &ObisCode) -> Option<ObjectHandle> {
        self.find(object_type, logical_name)
    }
}

/// Resolver over the name index alone, usable while the objects are borrowed mutably
struct IndexResolver<'a>(&'a NameIndex);

impl ObjectResolver for IndexResolver<'_> {
    fn resolve(&self, object_type: ObjectType, logical_name: &ObisCode) -> Option<ObjectHandle> {
        self.0.get(&(object_type, *logical_name)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Data;
    use crate::register::Register;

    fn sample() -> ObjectCollection {
        let mut collection = ObjectCollection::new();
        collection
            .add(Box::new(Data::new(ObisCode::new(0, 0, 96, 1, 0, 255))))
            .unwrap();
        collection
            .add(Box::new(Register::new(ObisCode::new(1, 0, 1, 8, 0, 255))))
            .unwrap();
        collection
    }

    #[test]
    fn test_add_and_find() {
        let collection = sample();
        assert_eq!(collection.len(), 2);
        let ln = ObisCode::new(1, 0, 1, 8, 0, 255);
        let handle = collection.find(ObjectType::Register, &ln).unwrap();
        assert_eq!(handle, ObjectHandle::new(1));
        assert_eq!(collection.get(handle).unwrap().class_id(), 3);
        assert!(collection.find(ObjectType::Data, &ln).is_none());
        assert_eq!(collection.find_by_ln(&ln), vec![handle]);
        assert_eq!(collection.find_by_type(ObjectType::Data), vec![ObjectHandle::new(0)]);
        assert_eq!(collection.resolve(ObjectType::Register, &ln), Some(handle));
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut collection = sample();
        let result = collection.add(Box::new(Data::new(ObisCode::new(0, 0, 96, 1, 0, 255))));
        assert!(result.is_err());
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_find_by_short_name() {
        let mut collection = sample();
        let handle = ObjectHandle::new(0);
        collection
            .get_mut(handle)
            .unwrap()
            .base_mut()
            .set_short_name(Some(0xFA00));
        assert_eq!(collection.find_by_short_name(0xFA00), Some(handle));
        assert_eq!(collection.find_by_short_name(0xFA08), None);
    }

    #[test]
    fn test_load_rejects_non_array_document() {
        assert!(ObjectCollection::load_from_str("{}").is_err());
        assert!(ObjectCollection::load_from_str("[1]").is_err());
        assert!(ObjectCollection::load_from_str("[]").unwrap().is_empty());
    }
}
