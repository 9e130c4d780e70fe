//! Getter methods for `MirrorConfig`

use super::types::MirrorConfig;

impl MirrorConfig {
    #[must_use]
    pub fn max_asset_count(&self) -> usize {
        self.max_asset_count
    }

    #[must_use]
    pub fn max_asset_bytes(&self) -> usize {
        self.max_asset_bytes
    }

    #[must_use]
    pub fn total_budget_ms(&self) -> u64 {
        self.total_budget_ms
    }

    #[must_use]
    pub fn seed_timeout_ms(&self) -> u64 {
        self.seed_timeout_ms
    }

    #[must_use]
    pub fn asset_timeout_ms(&self) -> u64 {
        self.asset_timeout_ms
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
