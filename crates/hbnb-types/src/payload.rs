//! Building and updating entities from client payloads
//!
//! Each kind has an explicit allow-list of client-settable fields with their
//! JSON types. Server-managed keys (identity, timestamps, the type tag and
//! foreign keys) are ignored when a client sends them; any other key outside
//! the allow-list is rejected. A payload is validated in full before any
//! field is assigned.

use crate::entity::{BaseModel, Entity};
use crate::kind::EntityKind;
use serde_json::{Map, Value};
use thiserror::Error;

/// Keys no client can set, on any kind
pub const SERVER_MANAGED: &[&str] = &["id", "created_at", "updated_at", "__class__"];

/// JSON shape accepted for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    OptionalText,
    Integer,
    OptionalFloat,
}

impl FieldType {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::Text => value.is_string(),
            FieldType::OptionalText => value.is_string() || value.is_null(),
            FieldType::Integer => value.is_i64(),
            FieldType::OptionalFloat => value.is_number() || value.is_null(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn field(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec { name, ty }
}

const NAMED: &[FieldSpec] = &[field("name", FieldType::Text)];

const USER: &[FieldSpec] = &[
    field("email", FieldType::Text),
    field("password", FieldType::Text),
    field("first_name", FieldType::OptionalText),
    field("last_name", FieldType::OptionalText),
];

const PLACE: &[FieldSpec] = &[
    field("name", FieldType::Text),
    field("description", FieldType::OptionalText),
    field("number_rooms", FieldType::Integer),
    field("number_bathrooms", FieldType::Integer),
    field("max_guest", FieldType::Integer),
    field("price_by_night", FieldType::Integer),
    field("latitude", FieldType::OptionalFloat),
    field("longitude", FieldType::OptionalFloat),
];

const REVIEW: &[FieldSpec] = &[field("text", FieldType::Text)];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("Missing {0}")]
    MissingField(&'static str),

    #[error("Unknown field {0}")]
    UnknownField(String),

    #[error("Invalid {0}")]
    InvalidField(String),

    #[error("Malformed {kind}: {message}")]
    Malformed { kind: EntityKind, message: String },
}

impl EntityKind {
    /// Client-settable fields
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            EntityKind::State | EntityKind::City | EntityKind::Amenity => NAMED,
            EntityKind::User => USER,
            EntityKind::Place => PLACE,
            EntityKind::Review => REVIEW,
        }
    }

    /// Fields a create payload must carry, in the order they are checked
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::State | EntityKind::City | EntityKind::Amenity | EntityKind::Place => {
                &["name"]
            }
            EntityKind::User => &["email", "password"],
            EntityKind::Review => &["text"],
        }
    }

    /// Foreign keys and relation fields, set by the server only
    pub fn links(self) -> &'static [&'static str] {
        match self {
            EntityKind::State | EntityKind::Amenity | EntityKind::User => &[],
            EntityKind::City => &["state_id"],
            EntityKind::Place => &["city_id", "user_id", "amenity_ids"],
            EntityKind::Review => &["place_id", "user_id"],
        }
    }

    fn is_server_managed(self, key: &str) -> bool {
        SERVER_MANAGED.contains(&key) || self.links().contains(&key)
    }

    /// Keep the allow-listed entries of `payload`, dropping server-managed
    /// keys. Fails on the first unknown key or mistyped value.
    pub fn accepted_fields<'a>(
        self,
        payload: &'a Map<String, Value>,
    ) -> Result<Vec<(&'a str, &'a Value)>, PayloadError> {
        let specs = self.fields();
        let mut accepted = Vec::with_capacity(payload.len());
        for (key, value) in payload {
            if self.is_server_managed(key) {
                continue;
            }
            let spec = specs
                .iter()
                .find(|spec| spec.name == key)
                .ok_or_else(|| PayloadError::UnknownField(key.clone()))?;
            if !spec.ty.accepts(value) {
                return Err(PayloadError::InvalidField(key.clone()));
            }
            accepted.push((key.as_str(), value));
        }
        Ok(accepted)
    }
}

impl Entity {
    /// Build a new entity of `kind` from a client payload.
    ///
    /// `links` supplies the foreign keys, which the caller has already
    /// resolved. The result has a fresh identity.
    pub fn create(
        kind: EntityKind,
        payload: &Map<String, Value>,
        links: &[(&str, &str)],
    ) -> Result<Entity, PayloadError> {
        if let Some(missing) = kind
            .required_fields()
            .iter()
            .copied()
            .find(|name| !payload.contains_key(*name))
        {
            return Err(PayloadError::MissingField(missing));
        }
        let accepted = kind.accepted_fields(payload)?;

        let mut doc = match serde_json::to_value(BaseModel::new()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        doc.insert("__class__".to_string(), Value::from(kind.name()));
        for (key, value) in links {
            doc.insert(key.to_string(), Value::from(*value));
        }
        for (key, value) in accepted {
            doc.insert(key.to_string(), value.clone());
        }

        serde_json::from_value(Value::Object(doc)).map_err(|e| PayloadError::Malformed {
            kind,
            message: e.to_string(),
        })
    }

    /// Apply an update payload and bump `updated_at`.
    ///
    /// Leaves the entity untouched when the payload is rejected.
    pub fn apply_update(&mut self, payload: &Map<String, Value>) -> Result<(), PayloadError> {
        let kind = self.kind();
        let accepted = kind.accepted_fields(payload)?;

        let mut doc = match serde_json::to_value(&*self) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                return Err(PayloadError::Malformed {
                    kind,
                    message: "entity did not serialize to an object".to_string(),
                })
            }
        };
        for (key, value) in accepted {
            doc.insert(key.to_string(), value.clone());
        }

        let mut updated: Entity =
            serde_json::from_value(Value::Object(doc)).map_err(|e| PayloadError::Malformed {
                kind,
                message: e.to_string(),
            })?;
        updated.touch();
        *self = updated;
        Ok(())
    }
}
