//! Insertion-ordered object table
//!
//! Maps `"{Kind}.{id}"` keys to entities, remembering the order in which
//! keys were first inserted. Its serde form is a JSON object in that order,
//! which is also the file backend's on-disk format.

use hbnb_types::{Entity, EntityKind};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectTable {
    entries: Vec<(String, Entity)>,
    index: HashMap<String, usize>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under the entity's own key. An existing entry is replaced in
    /// place and returned.
    pub fn insert(&mut self, entity: Entity) -> Option<Entity> {
        let key = entity.key();
        match self.index.get(&key) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position].1, entity)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, entity));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Entity> {
        let position = self.index.remove(key)?;
        let (_, entity) = self.entries.remove(position);
        for (shifted, (key, _)) in self.entries.iter().enumerate().skip(position) {
            self.index.insert(key.clone(), shifted);
        }
        Some(entity)
    }

    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    pub fn lookup(&self, kind: EntityKind, id: &str) -> Option<&Entity> {
        self.get(&kind.key(id))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entity)> {
        self.entries
            .iter()
            .map(|(key, entity)| (key.as_str(), entity))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Entity> {
        self.entries.iter().map(|(_, entity)| entity)
    }

    /// Entities in insertion order for in-place edits; ids must not change
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entries.iter_mut().map(|(_, entity)| entity)
    }

    pub fn into_values(self) -> impl Iterator<Item = Entity> {
        self.entries.into_iter().map(|(_, entity)| entity)
    }

    /// Copy out one kind, or every kind in canonical order
    pub fn select(&self, kind: Option<EntityKind>) -> ObjectTable {
        let kinds: &[EntityKind] = match kind {
            Some(ref kind) => std::slice::from_ref(kind),
            None => &EntityKind::ALL,
        };
        kinds
            .iter()
            .flat_map(|kind| self.values().filter(move |e| e.kind() == *kind))
            .cloned()
            .collect()
    }
}

impl FromIterator<Entity> for ObjectTable {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut table = ObjectTable::new();
        for entity in iter {
            table.insert(entity);
        }
        table
    }
}

impl Extend<Entity> for ObjectTable {
    fn extend<I: IntoIterator<Item = Entity>>(&mut self, iter: I) {
        for entity in iter {
            self.insert(entity);
        }
    }
}

impl IntoIterator for ObjectTable {
    type Item = (String, Entity);
    type IntoIter = std::vec::IntoIter<(String, Entity)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ObjectTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entity) in &self.entries {
            map.serialize_entry(key, entity)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ObjectTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TableVisitor)
    }
}

struct TableVisitor;

impl<'de> Visitor<'de> for TableVisitor {
    type Value = ObjectTable;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a map of \"Kind.id\" keys to entities")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = ObjectTable::new();
        while let Some((key, entity)) = access.next_entry::<String, Entity>()? {
            if key != entity.key() {
                return Err(serde::de::Error::custom(format!(
                    "key {} does not match entity {}",
                    key,
                    entity.key()
                )));
            }
            table.insert(entity);
        }
        Ok(table)
    }
}
