//! Project metadata persistence
//!
//! `FsProjectStore` keeps one JSON document per project plus an append-only
//! `index.json` listing finalized projects, written with the same atomic
//! temp-then-rename pattern as the content store.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::types::Project;
use crate::content_store::fs_store::atomic_write;
use crate::errors::StoreError;

/// Metadata store for projects and the listing index
pub trait ProjectStore: Send + Sync {
    fn get(&self, id: &str) -> impl Future<Output = Result<Option<Project>, StoreError>> + Send;

    fn set(&self, project: &Project) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove the project record and its index entry
    fn remove(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Finalized project ids in listing order
    fn list_index(&self) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Append an id to the listing index; appending twice is a no-op
    fn append_index(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// In-memory project store
#[derive(Debug, Clone, Default)]
pub struct MemoryProjectStore {
    projects: Arc<RwLock<HashMap<String, Project>>>,
    index: Arc<RwLock<Vec<String>>>,
}

impl MemoryProjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryProjectStore {
    async fn get(&self, id: &str) -> Result<Option<Project>, StoreError> {
        Ok(self.projects.read().await.get(id).cloned())
    }

    async fn set(&self, project: &Project) -> Result<(), StoreError> {
        self.projects
            .write()
            .await
            .insert(project.id.clone(), project.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.projects.write().await.remove(id);
        self.index.write().await.retain(|entry| entry != id);
        Ok(())
    }

    async fn list_index(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.index.read().await.clone())
    }

    async fn append_index(&self, id: &str) -> Result<(), StoreError> {
        let mut index = self.index.write().await;
        if !index.iter().any(|entry| entry == id) {
            index.push(id.to_string());
        }
        Ok(())
    }
}

/// JSON-file project store rooted at a directory
#[derive(Debug, Clone)]
pub struct FsProjectStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles on `index.json`
    index_lock: Arc<Mutex<()>>,
}

impl FsProjectStore {
    const INDEX_FILENAME: &'static str = "index.json";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_lock: Arc::new(Mutex::new(())),
        }
    }

    fn project_path(&self, id: &str) -> PathBuf {
        self.root.join("projects").join(format!("{id}.json"))
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(Self::INDEX_FILENAME)
    }

    async fn read_index(&self) -> Result<Vec<String>, StoreError> {
        let path = self.index_path();
        match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw).map_err(|source| StoreError::Serialization {
                key: Self::INDEX_FILENAME.to_string(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(StoreError::Io {
                key: Self::INDEX_FILENAME.to_string(),
                source,
            }),
        }
    }

    async fn write_index(&self, index: &[String]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(index).map_err(|source| StoreError::Serialization {
            key: Self::INDEX_FILENAME.to_string(),
            source,
        })?;
        atomic_write(&self.index_path(), &json, Self::INDEX_FILENAME).await
    }
}

fn validate_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(StoreError::InvalidKey(id.to_string()));
    }
    Ok(())
}

impl ProjectStore for FsProjectStore {
    async fn get(&self, id: &str) -> Result<Option<Project>, StoreError> {
        validate_id(id)?;
        match tokio::fs::read(self.project_path(id)).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|source| StoreError::Serialization {
                    key: id.to_string(),
                    source,
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: id.to_string(),
                source,
            }),
        }
    }

    async fn set(&self, project: &Project) -> Result<(), StoreError> {
        validate_id(&project.id)?;
        let json =
            serde_json::to_vec_pretty(project).map_err(|source| StoreError::Serialization {
                key: project.id.clone(),
                source,
            })?;
        atomic_write(&self.project_path(&project.id), &json, &project.id).await
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        validate_id(id)?;
        match tokio::fs::remove_file(self.project_path(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StoreError::Io {
                    key: id.to_string(),
                    source,
                });
            }
        }

        let _guard = self.index_lock.lock().await;
        let mut index = self.read_index().await?;
        let before = index.len();
        index.retain(|entry| entry != id);
        if index.len() != before {
            self.write_index(&index).await?;
        }
        Ok(())
    }

    async fn list_index(&self) -> Result<Vec<String>, StoreError> {
        self.read_index().await
    }

    async fn append_index(&self, id: &str) -> Result<(), StoreError> {
        validate_id(id)?;
        let _guard = self.index_lock.lock().await;
        let mut index = self.read_index().await?;
        if !index.iter().any(|entry| entry == id) {
            index.push(id.to_string());
            self.write_index(&index).await?;
        }
        Ok(())
    }
}
