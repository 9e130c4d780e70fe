use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{ContentStore, StoredObject, validate_key};
use crate::errors::StoreError;

/// In-memory content store, cheap to clone (clones share the same map)
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
}

impl MemoryContentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl ContentStore for MemoryContentStore {
    async fn write(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.objects.read().await.get(key).map(|o| o.bytes.clone()))
    }

    async fn read_with_metadata(&self, key: &str) -> Result<Option<StoredObject>, StoreError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, project_id: &str) -> Result<Vec<String>, StoreError> {
        let prefix = format!("{project_id}/");
        Ok(self
            .objects
            .read()
            .await
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_list_delete() {
        let store = MemoryContentStore::new();
        store.write("p1/a.css", b"body{}".to_vec(), "text/css").await.unwrap();
        store.write("p1/img/b.png", vec![1, 2, 3], "image/png").await.unwrap();
        store.write("p10/c.js", vec![], "application/javascript").await.unwrap();

        let object = store.read_with_metadata("p1/a.css").await.unwrap().unwrap();
        assert_eq!(object.content_type, "text/css");
        assert_eq!(store.list("p1").await.unwrap(), vec!["p1/a.css", "p1/img/b.png"]);

        store.delete("p1/a.css").await.unwrap();
        assert!(store.read("p1/a.css").await.unwrap().is_none());
        assert_eq!(store.len().await, 2);
    }
}
