// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scanner Configuration
 * Per-scan tunables with env-var overrides
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::rate_limiter::RateLimiterConfig;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Scanner configuration. A value of this lives inside each ScanContext;
/// it is cloned per scan, never shared mutably.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum retries for transient request failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Overall scan budget in seconds
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,

    /// Per-technique budget in seconds (one vulnerability class on one URL)
    #[serde(default = "default_technique_timeout")]
    pub technique_timeout_secs: u64,

    /// Starting worker count; the feedback controller moves it between
    /// min_concurrency and max_concurrency
    #[serde(default = "default_concurrency")]
    pub initial_concurrency: usize,

    #[serde(default = "default_min_concurrency")]
    pub min_concurrency: usize,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Starting URL chunk size for the orchestrator
    #[serde(default = "default_chunk_size")]
    pub initial_chunk_size: usize,

    #[serde(default)]
    pub rate_limiter: RateLimiterConfig,
}

fn default_request_timeout() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    3
}

fn default_scan_timeout() -> u64 {
    300
}

fn default_technique_timeout() -> u64 {
    120
}

fn default_concurrency() -> usize {
    10
}

fn default_min_concurrency() -> usize {
    2
}

fn default_max_concurrency() -> usize {
    20
}

fn default_chunk_size() -> usize {
    20
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            scan_timeout_secs: default_scan_timeout(),
            technique_timeout_secs: default_technique_timeout(),
            initial_concurrency: default_concurrency(),
            min_concurrency: default_min_concurrency(),
            max_concurrency: default_max_concurrency(),
            initial_chunk_size: default_chunk_size(),
            rate_limiter: RateLimiterConfig::default(),
        }
    }
}

impl ScannerConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("PISTIN_REQUEST_TIMEOUT") {
            config.request_timeout_secs = v.parse()?;
        }
        if let Ok(v) = std::env::var("PISTIN_SCAN_TIMEOUT") {
            config.scan_timeout_secs = v.parse()?;
        }
        if let Ok(v) = std::env::var("PISTIN_MAX_CONCURRENCY") {
            config.max_concurrency = v.parse()?;
        }
        if let Ok(v) = std::env::var("PISTIN_RATE_LIMIT") {
            config.rate_limiter.base_rate = v.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_concurrency == 0 {
            bail!("min_concurrency must be at least 1");
        }
        if self.min_concurrency > self.max_concurrency {
            bail!(
                "min_concurrency ({}) exceeds max_concurrency ({})",
                self.min_concurrency,
                self.max_concurrency
            );
        }
        if self.initial_concurrency < self.min_concurrency
            || self.initial_concurrency > self.max_concurrency
        {
            bail!("initial_concurrency outside [min, max] bounds");
        }
        if self.request_timeout_secs == 0 || self.scan_timeout_secs == 0 {
            bail!("timeouts must be non-zero");
        }
        self.rate_limiter.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ScannerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_concurrency_bounds() {
        let config = ScannerConfig {
            min_concurrency: 50,
            max_concurrency: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeouts() {
        let config = ScannerConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
