/*!
 * Core Configuration
 *
 * Runtime knobs read once at construction time: which activity-fact
 * implementation records use, importance tracing, and the default bound on
 * network-acknowledgement waits.
 */

use super::errors::{ConfigError, ConfigResult};
use super::limits::DEFAULT_NETWORK_WAIT_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// How activity-related facts reach a process record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactMode {
    /// Lazily pulled from the info provider and cached until invalidated
    #[default]
    Pull,
    /// Written directly by the driver; the provider is never consulted
    Push,
}

impl std::str::FromStr for FactMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pull" => Ok(Self::Pull),
            "push" => Ok(Self::Push),
            other => Err(ConfigError::InvalidValue {
                key: "fact_mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CoreConfig {
    pub fact_mode: FactMode,
    /// Emit a trace event on every adj-type change
    pub trace_importance: bool,
    pub network_wait_timeout_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            fact_mode: FactMode::Pull,
            trace_importance: false,
            network_wait_timeout_ms: DEFAULT_NETWORK_WAIT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl CoreConfig {
    /// Configuration with push-mode activity facts
    #[inline]
    #[must_use]
    pub fn push() -> Self {
        Self {
            fact_mode: FactMode::Push,
            ..Self::default()
        }
    }

    /// Build from environment variables, falling back to defaults
    ///
    /// - PROCSTATE_FACT_MODE: `pull` or `push`
    /// - PROCSTATE_TRACE_IMPORTANCE: `1`/`true` to trace adj-type changes
    /// - PROCSTATE_NETWORK_WAIT_MS: acknowledgement wait bound in ms
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Ok(mode) = std::env::var("PROCSTATE_FACT_MODE") {
            config.fact_mode = mode.parse()?;
        }

        if let Ok(trace) = std::env::var("PROCSTATE_TRACE_IMPORTANCE") {
            config.trace_importance = trace == "1" || trace.eq_ignore_ascii_case("true");
        }

        if let Ok(ms) = std::env::var("PROCSTATE_NETWORK_WAIT_MS") {
            config.network_wait_timeout_ms =
                ms.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "network_wait_timeout_ms",
                    value: ms.clone(),
                })?;
        }

        debug!(?config, "core config loaded from environment");
        Ok(config)
    }

    /// Load from a JSON file; missing keys take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        debug!(path = %path.as_ref().display(), ?config, "core config loaded from file");
        Ok(config)
    }

    #[inline]
    pub fn network_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.network_wait_timeout_ms)
    }
}
