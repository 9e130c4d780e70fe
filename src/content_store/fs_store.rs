//! Filesystem content store with atomic writes
//!
//! Layout under the root directory:
//! ```text
//! objects/{projectId}/{relativePath}        # raw bytes
//! meta/{projectId}/{relativePath}.json      # { "content_type": ... }
//! ```
//! Writes use the write-to-temp-then-rename pattern so readers never observe
//! a partially written object.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{ContentStore, StoredObject, validate_key};
use crate::errors::StoreError;
use crate::utils::mime::DEFAULT_CONTENT_TYPE;

const OBJECTS_DIR: &str = "objects";
const META_DIR: &str = "meta";

#[derive(Debug, Serialize, Deserialize)]
struct ObjectMeta {
    content_type: String,
}

/// Content store backed by a directory tree
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(OBJECTS_DIR).join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(META_DIR).join(format!("{key}.json"))
    }
}

fn io_err(key: &str) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        key: key.to_string(),
        source,
    }
}

/// Write `bytes` to `path` atomically: temp file, sync, rename
pub(crate) async fn atomic_write(path: &Path, bytes: &[u8], key: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(io_err(key))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    let mut file = fs::File::create(&temp_path).await.map_err(io_err(key))?;
    file.write_all(bytes).await.map_err(io_err(key))?;
    file.sync_all().await.map_err(io_err(key))?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(io_err(key)(e));
    }
    Ok(())
}

async fn read_optional(path: &Path, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(key)(e)),
    }
}

impl ContentStore for FsContentStore {
    async fn write(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        validate_key(key)?;

        let meta = serde_json::to_vec(&ObjectMeta {
            content_type: content_type.to_string(),
        })
        .map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })?;

        atomic_write(&self.object_path(key), &bytes, key).await?;
        atomic_write(&self.meta_path(key), &meta, key).await?;

        log::trace!("Stored {key} ({} bytes, {content_type})", bytes.len());
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_key(key)?;
        read_optional(&self.object_path(key), key).await
    }

    async fn read_with_metadata(&self, key: &str) -> Result<Option<StoredObject>, StoreError> {
        validate_key(key)?;
        let Some(bytes) = read_optional(&self.object_path(key), key).await? else {
            return Ok(None);
        };

        let content_type = match read_optional(&self.meta_path(key), key).await? {
            Some(raw) => {
                serde_json::from_slice::<ObjectMeta>(&raw)
                    .map_err(|source| StoreError::Serialization {
                        key: key.to_string(),
                        source,
                    })?
                    .content_type
            }
            None => {
                log::warn!("Missing metadata for {key}, serving as {DEFAULT_CONTENT_TYPE}");
                DEFAULT_CONTENT_TYPE.to_string()
            }
        };

        Ok(Some(StoredObject {
            bytes,
            content_type,
        }))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        for path in [self.object_path(key), self.meta_path(key)] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_err(key)(e)),
            }
        }
        Ok(())
    }

    async fn list(&self, project_id: &str) -> Result<Vec<String>, StoreError> {
        validate_key(project_id)?;
        let base = self.root.join(OBJECTS_DIR);
        let mut pending = vec![base.join(project_id)];
        let mut keys = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(io_err(project_id)(e)),
            };

            while let Some(entry) = entries.next_entry().await.map_err(io_err(project_id))? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(io_err(project_id))?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                // Temp files from in-flight writes
                if entry.file_name().to_string_lossy().ends_with(".tmp") {
                    continue;
                }
                if let Ok(relative) = path.strip_prefix(&base) {
                    keys.push(relative.to_string_lossy().replace('\\', "/"));
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fs_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FsContentStore::new(dir.path());

        store
            .write("p1/css/site.css", b"body{}".to_vec(), "text/css; charset=utf-8")
            .await
            .unwrap();
        store.write("p1/logo.png", vec![0x89, 0x50], "image/png").await.unwrap();

        assert!(dir.path().join("objects/p1/css/site.css").is_file());
        let sidecar = std::fs::read_to_string(dir.path().join("meta/p1/css/site.css.json")).unwrap();
        assert!(sidecar.contains("text/css; charset=utf-8"), "{sidecar}");

        let object = store.read_with_metadata("p1/css/site.css").await.unwrap().unwrap();
        assert_eq!(object.bytes, b"body{}");
        assert_eq!(object.content_type, "text/css; charset=utf-8");

        assert_eq!(
            store.list("p1").await.unwrap(),
            vec!["p1/css/site.css".to_string(), "p1/logo.png".to_string()]
        );

        store.delete("p1/logo.png").await.unwrap();
        store.delete("p1/logo.png").await.unwrap();
        assert!(store.read("p1/logo.png").await.unwrap().is_none());
        assert!(store.list("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fs_store_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = FsContentStore::new(dir.path());
        let err = store.write("p1/../../x", vec![], "text/plain").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
