//! Fluent builder for `MirrorConfig`
//!
//! Every field has a default, so the builder only validates the relationships
//! between budgets when `build()` is called.

use anyhow::{Result, bail};

use super::types::MirrorConfig;

#[derive(Debug, Clone, Default)]
pub struct MirrorConfigBuilder {
    config: MirrorConfig,
}

impl MirrorConfig {
    /// Create a builder starting from the default budgets
    #[must_use]
    pub fn builder() -> MirrorConfigBuilder {
        MirrorConfigBuilder::default()
    }
}

impl MirrorConfigBuilder {
    #[must_use]
    pub fn max_asset_count(mut self, count: usize) -> Self {
        self.config.max_asset_count = count;
        self
    }

    #[must_use]
    pub fn max_asset_bytes(mut self, bytes: usize) -> Self {
        self.config.max_asset_bytes = bytes;
        self
    }

    #[must_use]
    pub fn total_budget_ms(mut self, ms: u64) -> Self {
        self.config.total_budget_ms = ms;
        self
    }

    #[must_use]
    pub fn seed_timeout_ms(mut self, ms: u64) -> Self {
        self.config.seed_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn asset_timeout_ms(mut self, ms: u64) -> Self {
        self.config.asset_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Validate and produce the config
    ///
    /// # Errors
    ///
    /// Fails when a timeout is zero, the per-asset byte limit is zero, or the
    /// user agent is blank. A zero asset count is allowed and mirrors the page alone.
    pub fn build(self) -> Result<MirrorConfig> {
        let config = self.config;

        if config.max_asset_bytes == 0 {
            bail!("max_asset_bytes must be greater than zero");
        }
        if config.seed_timeout_ms == 0 || config.asset_timeout_ms == 0 || config.total_budget_ms == 0 {
            bail!("mirror timeouts must be greater than zero");
        }
        if config.user_agent.trim().is_empty() {
            bail!("user_agent must not be blank");
        }
        if config.asset_timeout_ms > config.total_budget_ms {
            log::warn!(
                "asset timeout ({} ms) exceeds total budget ({} ms); single fetches may overrun the run budget",
                config.asset_timeout_ms,
                config.total_budget_ms
            );
        }

        Ok(config)
    }
}
