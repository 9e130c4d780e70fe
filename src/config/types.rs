//! Core configuration types for capture operations
//!
//! `MirrorConfig` carries the resource budgets of a live-site mirror run and
//! `IngestConfig` the knobs of archive ingestion. Both serialize so a server can
//! load them from a settings file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::{
    CHROME_USER_AGENT, DEFAULT_ASSET_TIMEOUT_MS, DEFAULT_BIND_ADDR, DEFAULT_MAX_ASSET_BYTES, DEFAULT_MAX_ASSET_COUNT,
    DEFAULT_SEED_TIMEOUT_MS, DEFAULT_TOTAL_BUDGET_MS, DEFAULT_UPLOAD_BATCH_SIZE,
};

/// Budgets for one mirror run
///
/// Checks are applied in a fixed order for each queued asset: count ceiling,
/// then elapsed-time ceiling, then the fetch itself under `asset_timeout_ms`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MirrorConfig {
    /// Maximum number of assets accepted (stored) per run
    pub(crate) max_asset_count: usize,

    /// Maximum size of a single asset in bytes
    ///
    /// Enforced on the declared Content-Length and again while streaming.
    pub(crate) max_asset_bytes: usize,

    /// Wall-clock budget for the whole run, measured from the seed fetch
    pub(crate) total_budget_ms: u64,

    /// Deadline for the seed page fetch; expiry fails the run
    pub(crate) seed_timeout_ms: u64,

    /// Deadline for each asset fetch; expiry skips the asset
    pub(crate) asset_timeout_ms: u64,

    /// User agent sent with every fetch
    pub(crate) user_agent: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            max_asset_count: DEFAULT_MAX_ASSET_COUNT,
            max_asset_bytes: DEFAULT_MAX_ASSET_BYTES,
            total_budget_ms: DEFAULT_TOTAL_BUDGET_MS,
            seed_timeout_ms: DEFAULT_SEED_TIMEOUT_MS,
            asset_timeout_ms: DEFAULT_ASSET_TIMEOUT_MS,
            user_agent: CHROME_USER_AGENT.to_string(),
        }
    }
}

impl MirrorConfig {
    #[must_use]
    pub fn total_budget(&self) -> Duration {
        Duration::from_millis(self.total_budget_ms)
    }

    #[must_use]
    pub fn seed_timeout(&self) -> Duration {
        Duration::from_millis(self.seed_timeout_ms)
    }

    #[must_use]
    pub fn asset_timeout(&self) -> Duration {
        Duration::from_millis(self.asset_timeout_ms)
    }
}

/// Settings for archive ingestion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// Concurrent storage writes per batch
    pub(crate) upload_batch_size: usize,

    /// Entries whose uncompressed size exceeds this are skipped
    pub(crate) max_entry_bytes: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            upload_batch_size: DEFAULT_UPLOAD_BATCH_SIZE,
            max_entry_bytes: 50 * 1024 * 1024,
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn with_upload_batch_size(mut self, size: usize) -> Self {
        self.upload_batch_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_max_entry_bytes(mut self, bytes: u64) -> Self {
        self.max_entry_bytes = bytes;
        self
    }

    #[must_use]
    pub fn upload_batch_size(&self) -> usize {
        self.upload_batch_size.max(1)
    }

    #[must_use]
    pub fn max_entry_bytes(&self) -> u64 {
        self.max_entry_bytes
    }
}

/// Settings for the HTTP server binary
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Listen address (`host:port`)
    pub(crate) bind_addr: String,

    /// Root directory for stored objects and project metadata
    pub(crate) storage_dir: PathBuf,

    /// Public base URL that rewritten page references point at
    ///
    /// Defaults to `http://{bind_addr}` when unset.
    pub(crate) api_base: Option<String>,

    pub(crate) mirror: MirrorConfig,
    pub(crate) ingest: IngestConfig,
}

impl ServerConfig {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            storage_dir: storage_dir.into(),
            api_base: None,
            mirror: MirrorConfig::default(),
            ingest: IngestConfig::default(),
        }
    }

    #[must_use]
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    #[must_use]
    pub fn with_api_base(mut self, base: Option<String>) -> Self {
        self.api_base = base.filter(|b| !b.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_mirror(mut self, mirror: MirrorConfig) -> Self {
        self.mirror = mirror;
        self
    }

    #[must_use]
    pub fn with_ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    #[must_use]
    pub fn storage_dir(&self) -> &std::path::Path {
        &self.storage_dir
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn api_base(&self) -> String {
        match &self.api_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.bind_addr),
        }
    }

    #[must_use]
    pub fn mirror(&self) -> &MirrorConfig {
        &self.mirror
    }

    #[must_use]
    pub fn ingest(&self) -> &IngestConfig {
        &self.ingest
    }
}
