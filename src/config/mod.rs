//! Configuration module for capture operations
//!
//! This module provides `MirrorConfig` with its builder, `IngestConfig` for
//! archive ingestion and `ServerConfig` for the HTTP binary, with validation
//! and defaults from `utils::constants`.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::MirrorConfigBuilder;
pub use types::{IngestConfig, MirrorConfig, ServerConfig};
