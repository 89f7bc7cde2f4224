//! Core error types for Verity.
//!
//! This module defines the central error type shared by the workspace crates.
//! Client-level failures (rate limiting, probe errors) live in `verity-client`.

use thiserror::Error;

/// Errors raised outside the probe pipeline: setup, input and config.
#[derive(Error, Debug)]
pub enum VerityError {
    /// Configuration could not be loaded, saved or accepted
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// Malformed input such as a bad proxy, pattern or timestamp
    #[error("invalid input: {0}")]
    Validation(String),

    /// HTTP client or proxy setup failed
    #[error("network setup failed: {0}")]
    Network(String),

    /// Filesystem access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from loading, saving and validating `config.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The platform offers no per-user configuration directory
    #[error("no per-user configuration directory on this platform")]
    NoConfigDir,

    /// An explicitly requested file does not exist
    #[error("no config file at {path}")]
    NotFound {
        /// Requested location
        path: String,
    },

    /// The file is not valid TOML for `AppConfig`
    #[error("config is not valid TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The config could not be rendered as TOML
    #[error("config could not be rendered as TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Reading or writing the file failed
    #[error("config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A value parsed but is unusable
    #[error("{field} {reason}")]
    InvalidValue {
        /// Dotted key, e.g. `client.rate_limit_per_minute`
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Result alias for setup-level operations.
pub type Result<T> = std::result::Result<T, VerityError>;

/// Result alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
