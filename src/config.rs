// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::requeue;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Restrict watches to a single namespace; all namespaces when unset
    pub watch_namespace: Option<String>,
    pub resync_interval: Duration,
    pub error_requeue: Duration,
    pub conflict_requeue: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            watch_namespace: None,
            resync_interval: Duration::from_secs(requeue::RESYNC_INTERVAL_SECS),
            error_requeue: Duration::from_secs(requeue::ERROR_REQUEUE_SECS),
            conflict_requeue: Duration::from_secs(requeue::CONFLICT_REQUEUE_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.is_empty());
        let seconds = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{} must be a number of seconds, got '{}'", key, raw)),
                None => Ok(default),
            }
        };

        Ok(Config {
            watch_namespace,
            resync_interval: seconds("RESYNC_INTERVAL_SECS", defaults.resync_interval)?,
            error_requeue: seconds("ERROR_REQUEUE_SECS", defaults.error_requeue)?,
            conflict_requeue: seconds("CONFLICT_REQUEUE_SECS", defaults.conflict_requeue)?,
        })
    }
}
