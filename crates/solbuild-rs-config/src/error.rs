//! Error types for config loading and validation.

use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a config file failed.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// The record is not valid JSON5.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// Converting the validated record into typed models failed.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A field is missing or fails a structural check.
    #[error("malformed config at {path}: {message}")]
    MalformedConfig { path: String, message: String },
    /// The toolchain cannot provide the requested compiler version.
    #[error("unsupported compiler version {version} (available: {available})")]
    UnsupportedVersion { version: String, available: String },
}

impl ConfigError {
    /// True for syntactic and structural defects in the record itself.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ConfigError::ParseFailed(_)
                | ConfigError::DecodeFailed(_)
                | ConfigError::MalformedConfig { .. }
        )
    }
}
