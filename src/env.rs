// src/env.rs
use anyhow::{Context, Result};
use dotenv::dotenv;
use std::env;

use crate::config::ManagerConfig;

/// Environment overrides on top of the configuration file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub timeout_ms: Option<u64>,
    pub max_pending: Option<usize>,
}

impl EnvOverrides {
    /// Reads `REQUEST_TIMEOUT_MS` and `REQUEST_MAX_PENDING`, loading `.env`
    /// first if there is one.
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(EnvOverrides {
            timeout_ms: match lookup("REQUEST_TIMEOUT_MS") {
                Some(val) => Some(val.parse::<u64>().context("REQUEST_TIMEOUT_MS must be an integer")?),
                None => None,
            },
            max_pending: match lookup("REQUEST_MAX_PENDING") {
                Some(val) => Some(val.parse::<usize>().context("REQUEST_MAX_PENDING must be an integer")?),
                None => None,
            },
        })
    }

    pub fn apply(&self, config: &mut ManagerConfig) {
        if let Some(timeout_ms) = self.timeout_ms {
            config.requests.default_timeout_ms = timeout_ms;
        }
        if let Some(max_pending) = self.max_pending {
            config.requests.max_pending = max_pending;
        }
    }
}
