//! Storage backends
//!
//! A JSON file loaded into memory, or SQLite through sqlx. Exactly one is
//! opened per process, chosen by `storage.type`.

pub mod db;
pub mod file;

pub use db::DbStorage;
pub use file::FileStorage;

use crate::config::{Backend, RunMode, Settings};
use anyhow::{Context, Result};
use hbnb_core::Storage;
use std::sync::Arc;

/// Open the configured backend and restore its contents
pub async fn open(settings: &Settings) -> Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match settings.storage.backend {
        Backend::File => Arc::new(FileStorage::new(&settings.storage.file_path)),
        Backend::Db => Arc::new(
            DbStorage::connect(
                &settings.storage.database_url,
                settings.storage.max_connections,
                settings.env == RunMode::Test,
            )
            .await
            .with_context(|| {
                format!(
                    "Failed to open database at: {}",
                    settings.storage.database_url
                )
            })?,
        ),
    };

    storage
        .reload()
        .await
        .context("Failed to load storage")?;

    Ok(storage)
}
