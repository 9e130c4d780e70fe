//! Shared configuration constants for sitecapture
//!
//! Default values used throughout the codebase to ensure consistency and
//! avoid magic numbers. Budgets are defaults only; `MirrorConfig` can override them.

/// Default maximum number of accepted assets per mirror run
pub const DEFAULT_MAX_ASSET_COUNT: usize = 120;

/// Default maximum bytes for a single mirrored asset: 15 MB
///
/// Enforced twice: against the declared Content-Length before streaming,
/// and against the running total while streaming.
pub const DEFAULT_MAX_ASSET_BYTES: usize = 15 * 1024 * 1024;

/// Default wall-clock budget for a whole mirror run, in milliseconds
pub const DEFAULT_TOTAL_BUDGET_MS: u64 = 8_000;

/// Default timeout for the seed page fetch, in milliseconds
pub const DEFAULT_SEED_TIMEOUT_MS: u64 = 6_000;

/// Default timeout for each asset fetch, in milliseconds
pub const DEFAULT_ASSET_TIMEOUT_MS: u64 = 3_500;

/// Number of concurrent storage writes per batch during archive ingestion
pub const DEFAULT_UPLOAD_BATCH_SIZE: usize = 4;

/// Long-lived cache directive for immutable asset responses
pub const ASSET_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Request body ceiling for upload endpoints: 200 MB
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Default listen address for the HTTP server
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";

/// Chrome user agent string sent with mirror fetches
///
/// Some CDNs refuse or degrade responses for unknown agents, so fetches
/// present themselves as a current stable Chrome.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
