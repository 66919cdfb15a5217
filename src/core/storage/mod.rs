//! Object-store capability for uploading archives.
//!
//! The store is acquired once per pipeline run through [`create_store`];
//! construction failure and per-file upload failure are distinct failure
//! modes and are kept apart in [`StorageError`].

mod memory;
mod oss;

pub use memory::MemoryStore;
pub use oss::OssStore;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::config::{AppConfig, StorageDriver};

#[derive(Debug, Error)]
pub enum StorageError {
    /// The store client could not be constructed. Fatal to the run that
    /// requested it; no uploads are attempted.
    #[error("failed to construct object store: {0}")]
    Construction(String),

    /// A single upload failed. The run records the failure and continues
    /// with the next target.
    #[error("failed to upload {key}: {reason}")]
    Upload { key: String, reason: String },
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads the file at `local_path` under the remote `key`.
    async fn put(&self, key: &str, local_path: &Path) -> Result<(), StorageError>;
}

/// Builds the store selected by `storage_driver`.
pub fn create_store(config: &AppConfig) -> Result<Box<dyn ObjectStore>, StorageError> {
    match config.storage_driver {
        StorageDriver::Oss => Ok(Box::new(OssStore::new(&config.oss)?)),
    }
}
