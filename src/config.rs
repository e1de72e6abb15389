// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// How often observation re-runs and the sync loop re-applies every record
    pub resync_interval: Duration,
    /// First retry delay for a failing sync record
    pub sync_initial_backoff: Duration,
    /// Upper bound of the sync retry delay
    pub sync_max_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            resync_interval: Duration::from_secs(60),
            sync_initial_backoff: Duration::from_secs(1),
            sync_max_backoff: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{} must be a whole number of seconds, got {:?}", key, raw)),
                None => Ok(default),
            }
        };

        let config = Config {
            resync_interval: secs("RESYNC_INTERVAL_SECS", defaults.resync_interval)?,
            sync_initial_backoff: secs("SYNC_INITIAL_BACKOFF_SECS", defaults.sync_initial_backoff)?,
            sync_max_backoff: secs("SYNC_MAX_BACKOFF_SECS", defaults.sync_max_backoff)?,
        };

        anyhow::ensure!(
            !config.resync_interval.is_zero(),
            "RESYNC_INTERVAL_SECS must be greater than zero"
        );
        anyhow::ensure!(
            !config.sync_initial_backoff.is_zero(),
            "SYNC_INITIAL_BACKOFF_SECS must be greater than zero"
        );
        anyhow::ensure!(
            config.sync_initial_backoff <= config.sync_max_backoff,
            "SYNC_INITIAL_BACKOFF_SECS must not exceed SYNC_MAX_BACKOFF_SECS"
        );

        Ok(config)
    }
}
