//! Windowed concurrent storage writes with per-item failure isolation
//!
//! Writes are buffered until a batch is full, then issued concurrently with
//! `join_all`. One failed write never cancels its siblings; it is reported as a
//! warning and its key is left out of the inventory.

use futures::future::join_all;

use crate::content_store::ContentStore;
use crate::errors::{CaptureWarning, SkipReason};

/// One pending object write
#[derive(Debug, Clone)]
pub struct PendingWrite {
    /// Item label used in warnings (archive path, upload filename)
    pub item: String,
    pub key: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Batched uploader bound to one content store
pub struct BatchUploader<'a, S: ContentStore> {
    store: &'a S,
    batch_size: usize,
    pending: Vec<PendingWrite>,
    written: Vec<String>,
    warnings: Vec<CaptureWarning>,
}

/// Outcome of all batches
#[derive(Debug, Default)]
pub struct UploadReport {
    /// Keys written successfully, in submission order
    pub written: Vec<String>,
    pub warnings: Vec<CaptureWarning>,
}

impl<'a, S: ContentStore> BatchUploader<'a, S> {
    pub fn new(store: &'a S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            written: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Queue a write, flushing when the batch window is full
    pub async fn push(&mut self, write: PendingWrite) {
        self.pending.push(write);
        if self.pending.len() >= self.batch_size {
            self.flush().await;
        }
    }

    /// Issue all pending writes concurrently and wait for every one to settle
    pub async fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let batch = std::mem::take(&mut self.pending);
        let store = self.store;
        let results = join_all(batch.into_iter().map(|write| async move {
            let outcome = store
                .write(&write.key, write.bytes, &write.content_type)
                .await;
            (write.item, write.key, outcome)
        }))
        .await;

        for (item, key, outcome) in results {
            match outcome {
                Ok(()) => self.written.push(key),
                Err(e) => {
                    log::warn!("Failed to store {item} as {key}: {e}");
                    self.warnings
                        .push(CaptureWarning::new(item, SkipReason::Storage(e.to_string())));
                }
            }
        }
    }

    /// Flush the tail batch and return the combined report
    pub async fn finish(mut self) -> UploadReport {
        self.flush().await;
        UploadReport {
            written: self.written,
            warnings: self.warnings,
        }
    }
}
