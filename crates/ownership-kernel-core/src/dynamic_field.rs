//! Typed, per-object extensible fields.
//!
//! Objects can carry extra attributes that were not part of their original
//! layout. A field is keyed by its name *and* the canonical type name of its
//! value, so two modules can use the same slot name without clobbering each
//! other. The value type is always known at the call site; values are stored
//! as CBOR.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::TypeIdentity;

/// Key of a dynamic field: slot name plus value type tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    pub name: String,
    pub type_name: String,
}

impl FieldKey {
    fn of<V: TypeIdentity>(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: V::TYPE_NAME.to_string(),
        }
    }
}

/// A heterogeneous map of typed fields attached to one object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicFields {
    entries: BTreeMap<FieldKey, Vec<u8>>,
}

impl DynamicFields {
    /// Create an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new field. Fails if a field with the same name and value type
    /// already exists.
    pub fn add<V>(&mut self, name: &str, value: &V) -> Result<(), CoreError>
    where
        V: TypeIdentity + Serialize,
    {
        let key = FieldKey::of::<V>(name);
        if self.entries.contains_key(&key) {
            return Err(CoreError::FieldExists {
                name: key.name,
                type_name: key.type_name,
            });
        }

        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        self.entries.insert(key, buf);
        Ok(())
    }

    /// Detach a field and return its value.
    pub fn remove<V>(&mut self, name: &str) -> Result<V, CoreError>
    where
        V: TypeIdentity + DeserializeOwned,
    {
        let key = FieldKey::of::<V>(name);
        let bytes = self.entries.remove(&key).ok_or(CoreError::FieldNotFound {
            name: key.name,
            type_name: key.type_name,
        })?;
        decode(&bytes)
    }

    /// Read a copy of a field's value.
    pub fn borrow<V>(&self, name: &str) -> Result<V, CoreError>
    where
        V: TypeIdentity + DeserializeOwned,
    {
        let key = FieldKey::of::<V>(name);
        match self.entries.get(&key) {
            Some(bytes) => decode(bytes),
            None => Err(CoreError::FieldNotFound {
                name: key.name,
                type_name: key.type_name,
            }),
        }
    }

    /// Whether a field with this name and value type exists.
    pub fn exists<V: TypeIdentity>(&self, name: &str) -> bool {
        self.entries.contains_key(&FieldKey::of::<V>(name))
    }

    /// Whether any field with this name exists, whatever its type.
    pub fn exists_any(&self, name: &str) -> bool {
        self.entries.keys().any(|k| k.name == name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn decode<V: DeserializeOwned>(bytes: &[u8]) -> Result<V, CoreError> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}
