//! File-backed object store
//!
//! The whole store lives in memory as an [`ObjectTable`]; `save` rewrites
//! the JSON document on disk and `reload` reads it back.

use async_trait::async_trait;
use hbnb_core::{Entity, EntityKind, ObjectTable, Result, Storage, StorageError};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

pub struct FileStorage {
    path: PathBuf,
    objects: RwLock<ObjectTable>,
}

impl FileStorage {
    /// Empty store bound to `path`; call `reload` to read existing data
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            objects: RwLock::new(ObjectTable::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn all(&self, kind: Option<EntityKind>) -> Result<ObjectTable> {
        Ok(self.objects.read().await.select(kind))
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        Ok(self.objects.read().await.lookup(kind, id).cloned())
    }

    async fn new(&self, entity: Entity) -> Result<()> {
        self.objects.write().await.insert(entity);
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        let encoded = serde_json::to_vec(&*self.objects.read().await)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write beside the target, then swap it in
        let staging = self.staging_path();
        tokio::fs::write(&staging, &encoded).await?;
        tokio::fs::rename(&staging, &self.path).await?;

        debug!(
            "Saved {} bytes to {}",
            encoded.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn delete(&self, entity: Option<&Entity>) -> Result<()> {
        let Some(entity) = entity else {
            return Ok(());
        };
        let mut objects = self.objects.write().await;
        objects.remove(&entity.key());

        // Drop links to the amenity; the places' timestamps stay as they are
        if let Entity::Amenity(amenity) = entity {
            for stored in objects.values_mut() {
                if let Entity::Place(place) = stored {
                    place.amenity_ids.retain(|id| *id != amenity.base.id);
                }
            }
        }
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let table = match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice::<ObjectTable>(&bytes)
                .map_err(|e| StorageError::Corrupt(format!("{}: {}", self.path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No store at {}, starting empty", self.path.display());
                ObjectTable::new()
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Loaded {} objects from {}",
            table.len(),
            self.path.display()
        );
        *self.objects.write().await = table;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
