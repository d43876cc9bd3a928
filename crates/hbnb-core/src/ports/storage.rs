//! Storage port: the uniform CRUD contract every backend implements

use crate::table::ObjectTable;
use crate::Result;
use async_trait::async_trait;
use hbnb_types::{Entity, EntityKind};

/// Object store.
///
/// One instance is created at startup, restored with [`Storage::reload`] and
/// shared by every request. Mutations made with [`Storage::new`] and
/// [`Storage::delete`] become durable only on [`Storage::save`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Every entity, or every entity of one kind, keyed `"{Kind}.{id}"`.
    ///
    /// Kinds come in canonical order; within a kind, entities come in
    /// insertion order.
    async fn all(&self, kind: Option<EntityKind>) -> Result<ObjectTable>;

    /// The entity of `kind` with identifier `id`, if any
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>>;

    /// Register an entity. Registering an existing key replaces the stored
    /// value and keeps its position.
    async fn new(&self, entity: Entity) -> Result<()>;

    /// Durably persist everything registered or deleted so far
    async fn save(&self) -> Result<()>;

    /// Remove an entity; `None` or an entity that is not stored is a no-op
    async fn delete(&self, entity: Option<&Entity>) -> Result<()>;

    /// Restore the store from its durable form
    async fn reload(&self) -> Result<()>;

    /// Release per-request resources, discarding unsaved changes where the
    /// backend keeps them apart
    async fn close(&self) -> Result<()>;

    async fn count(&self, kind: Option<EntityKind>) -> Result<usize> {
        Ok(self.all(kind).await?.len())
    }
}
