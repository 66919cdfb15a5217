//! In-memory object store used by tests in place of a real remote.
//!
//! Records every uploaded object and can be told to reject uploads whose key
//! contains a given fragment, to exercise the pipeline's partial-failure
//! handling.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{ObjectStore, StorageError};

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    objects: Vec<(String, Vec<u8>)>,
    failing_fragments: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future `put` whose key contains `fragment` fail.
    pub async fn fail_uploads_containing(&self, fragment: &str) {
        let mut state = self.inner.lock().await;
        state.failing_fragments.push(fragment.to_string());
    }

    /// Keys of every stored object, in upload order.
    pub async fn keys(&self) -> Vec<String> {
        let state = self.inner.lock().await;
        state.objects.iter().map(|(key, _)| key.clone()).collect()
    }

    /// The stored bytes for `key`, if an object was uploaded under it.
    pub async fn object(&self, key: &str) -> Option<Vec<u8>> {
        let state = self.inner.lock().await;
        state
            .objects
            .iter()
            .find(|(stored, _)| stored == key)
            .map(|(_, bytes)| bytes.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, local_path: &Path) -> Result<(), StorageError> {
        {
            let state = self.inner.lock().await;
            if state
                .failing_fragments
                .iter()
                .any(|fragment| key.contains(fragment.as_str()))
            {
                return Err(StorageError::Upload {
                    key: key.to_string(),
                    reason: "simulated upload failure".to_string(),
                });
            }
        }

        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|err| StorageError::Upload {
                key: key.to_string(),
                reason: format!("failed to read {}: {err}", local_path.display()),
            })?;

        let mut state = self.inner.lock().await;
        state.objects.push((key.to_string(), bytes));
        Ok(())
    }
}
