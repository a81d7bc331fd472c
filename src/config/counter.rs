//! Counter configuration.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{
    AgencyConfig, AppResult, ShiftTiming, DEFAULT_AGENCY_COUNT, DEFAULT_FIRST_CLIENT_ID,
    DEFAULT_POOL_SIZE, DEFAULT_QUEUE_CAPACITY,
};

/// Prefix of environment variables read by [`CounterConfig::from_env`].
pub const ENV_PREFIX: &str = "COUNTER_";

/// Counter configuration. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Maximum clients waiting in line.
    pub queue_capacity: usize,
    /// Units in the inventory pool.
    pub pool_size: usize,
    /// Agency worker threads.
    pub agency_count: usize,
    /// Wait for a client before a shift is declared starved, in milliseconds.
    pub starve_timeout_ms: u64,
    /// Simulated service time per sale, in milliseconds.
    pub service_delay_ms: u64,
    /// First id handed out for bulk admissions.
    pub first_client_id: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            pool_size: DEFAULT_POOL_SIZE,
            agency_count: DEFAULT_AGENCY_COUNT,
            starve_timeout_ms: 2_000,
            service_delay_ms: 100,
            first_client_id: DEFAULT_FIRST_CLIENT_ID,
        }
    }
}

impl CounterConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".into());
        }
        if self.pool_size == 0 {
            return Err("pool_size must be greater than 0".into());
        }
        if self.agency_count == 0 {
            return Err("agency_count must be greater than 0".into());
        }
        if self.starve_timeout_ms == 0 {
            return Err("starve_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `COUNTER_*` environment variables, loading a
    /// `.env` file first if one exists.
    ///
    /// # Errors
    ///
    /// Fails when a variable is not a valid number or the result does not validate.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (`COUNTER_POOL_SIZE`, ...).
    ///
    /// # Errors
    ///
    /// Fails when a value is not a valid number or the result does not validate.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| -> AppResult<Option<u64>> {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .with_context(|| format!("{key} is not a number: {raw:?}"))
                })
                .transpose()
        };
        let to_usize = |v: u64| usize::try_from(v).context("value out of range");

        let mut cfg = Self::default();
        if let Some(v) = read("QUEUE_CAPACITY")? {
            cfg.queue_capacity = to_usize(v)?;
        }
        if let Some(v) = read("POOL_SIZE")? {
            cfg.pool_size = to_usize(v)?;
        }
        if let Some(v) = read("AGENCY_COUNT")? {
            cfg.agency_count = to_usize(v)?;
        }
        if let Some(v) = read("STARVE_TIMEOUT_MS")? {
            cfg.starve_timeout_ms = v;
        }
        if let Some(v) = read("SERVICE_DELAY_MS")? {
            cfg.service_delay_ms = v;
        }
        if let Some(v) = read("FIRST_CLIENT_ID")? {
            cfg.first_client_id = v;
        }
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }

    /// Starve timeout as a duration.
    #[must_use]
    pub const fn starve_timeout(&self) -> Duration {
        Duration::from_millis(self.starve_timeout_ms)
    }

    /// Per-sale pacing as a duration.
    #[must_use]
    pub const fn service_delay(&self) -> Duration {
        Duration::from_millis(self.service_delay_ms)
    }

    /// Timing for shift processors.
    #[must_use]
    pub const fn shift_timing(&self) -> ShiftTiming {
        ShiftTiming {
            starve_timeout: self.starve_timeout(),
            service_delay: self.service_delay(),
        }
    }

    /// Settings for agency pools.
    #[must_use]
    pub const fn agency_config(&self) -> AgencyConfig {
        AgencyConfig {
            agencies: self.agency_count,
            wait_timeout: self.starve_timeout(),
            service_delay: self.service_delay(),
        }
    }
}
