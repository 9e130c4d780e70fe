//! Error types for capture and serving operations
//!
//! Hard failures surface as `CaptureError`. Soft failures (a skipped asset,
//! a dropped archive entry) never become errors; they are collected as
//! `CaptureWarning`s and returned alongside a successful result.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Error types for capture, ingestion and serving
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Seed URL could not be parsed or uses an unsupported scheme
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Corrupt archive, unparsable payload or otherwise unusable input
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Seed fetch did not complete within its deadline
    #[error("Timed out fetching {url} after {timeout_ms} ms")]
    SeedTimeout { url: String, timeout_ms: u64 },

    /// Seed fetch returned a non-success status
    #[error("Upstream returned {status} for {url}")]
    Upstream { url: String, status: u16 },

    /// Seed fetch failed at the network level
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// Content or project store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Requested project, page or asset does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl CaptureError {
    /// Whether the caller sent something unusable (maps to a 4xx response)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CaptureError::InvalidUrl { .. } | CaptureError::MalformedInput(_) | CaptureError::NotFound(_)
        )
    }

    pub(crate) fn invalid_url(url: &str, reason: impl fmt::Display) -> Self {
        CaptureError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised by content and project store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Keys must be relative, slash-separated and free of `..` segments
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Why a resource was left out of a capture run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Accepted-asset ceiling reached
    CountBudget,
    /// Overall wall-clock budget exhausted
    TimeBudget,
    /// Not http(s)
    UnsupportedScheme,
    /// Extension outside the accepted asset set
    UnsupportedExtension,
    /// Per-fetch deadline expired
    Timeout,
    /// Upstream answered with a non-success status
    HttpStatus(u16),
    /// Declared or streamed size above the per-asset limit
    TooLarge(u64),
    /// Upstream content type not acceptable
    ContentType(String),
    /// Network or decoding failure
    Fetch(String),
    /// Text asset was not valid UTF-8
    Decode(String),
    /// Storage write failed for this item
    Storage(String),
    /// Archive page had an empty or missing `<body>`
    EmptyBody,
    /// Input item rejected, e.g. a non-image mockup or a canonical path clash
    Rejected(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountBudget => write!(f, "asset count budget reached"),
            Self::TimeBudget => write!(f, "time budget exhausted"),
            Self::UnsupportedScheme => write!(f, "unsupported scheme"),
            Self::UnsupportedExtension => write!(f, "unsupported extension"),
            Self::Timeout => write!(f, "fetch timed out"),
            Self::HttpStatus(status) => write!(f, "upstream status {status}"),
            Self::TooLarge(size) => write!(f, "too large ({size} bytes)"),
            Self::ContentType(ct) => write!(f, "unacceptable content type '{ct}'"),
            Self::Fetch(msg) => write!(f, "fetch failed: {msg}"),
            Self::Decode(msg) => write!(f, "decode failed: {msg}"),
            Self::Storage(msg) => write!(f, "storage write failed: {msg}"),
            Self::EmptyBody => write!(f, "page body is empty"),
            Self::Rejected(msg) => write!(f, "rejected: {msg}"),
        }
    }
}

/// One skipped or failed item reported back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureWarning {
    /// URL or archive path of the affected item
    pub item: String,
    pub reason: SkipReason,
}

impl CaptureWarning {
    pub fn new(item: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            item: item.into(),
            reason,
        }
    }
}

impl fmt::Display for CaptureWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.reason)
    }
}
