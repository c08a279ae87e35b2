/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of an info-provider query
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result of loading configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures reported by an [`InfoProvider`](crate::process::InfoProvider)
///
/// A failed pull leaves the cached fact unset; the getter reports the fact as
/// unknown instead of caching a guess.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProviderError {
    #[error("Fact unavailable: {0}")]
    #[diagnostic(
        code(provider::unavailable),
        help("The backing process model could not answer right now. The fact stays unknown until the next pull.")
    )]
    Unavailable(String),

    #[error("Unknown compatibility change id: {0}")]
    #[diagnostic(
        code(provider::unknown_compat_change),
        help("Valid ids are 0..CompatChange::COUNT.")
    )]
    UnknownCompatChange(u32),
}

/// Configuration loading errors
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    #[diagnostic(code(config::io), help("Check the path and file permissions."))]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    #[diagnostic(code(config::parse), help("The config file must be a JSON object."))]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    #[diagnostic(code(config::invalid_value))]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_serde_tagging() {
        let err = ProviderError::UnknownCompatChange(7);
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"error_type\":\"unknown_compat_change\""));
        assert_eq!(err.to_string(), "Unknown compatibility change id: 7");
    }
}
