//! Byte store addressed by `{projectId}/{relativePath}` keys.
//!
//! No transactional guarantees across keys. Two backends ship with the crate:
//! a filesystem store for the server and an in-memory store for tests and embedding.

pub mod fs_store;
pub mod memory;

use std::future::Future;

use crate::errors::StoreError;

pub use fs_store::FsContentStore;
pub use memory::MemoryContentStore;

/// A stored object together with the content type recorded at write time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Storage backend for captured pages and assets
pub trait ContentStore: Send + Sync {
    fn write(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn read(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;

    fn read_with_metadata(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<StoredObject>, StoreError>> + Send;

    /// Deleting a missing key is not an error
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All keys under `{project_id}/`, sorted
    fn list(&self, project_id: &str) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}

/// Compose an asset key from a project id and a project-relative path
#[must_use]
pub fn asset_key(project_id: &str, relative_path: &str) -> String {
    format!("{project_id}/{}", relative_path.trim_start_matches('/'))
}

/// Project-relative part of an asset key, if it belongs to `project_id`
#[must_use]
pub fn relative_path<'a>(project_id: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(project_id)?.strip_prefix('/')
}

/// Reject keys that could escape the store root
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.contains('\0')
        || key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
