//! Verity Core - Foundation crate for the Verity probe client.
//!
//! This crate provides the shared types, error handling and configuration
//! management that the client, the HTTP probe and the CLI shell depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared newtypes (`ProbeKey`, `ProxyConfig`, `ProbeResult`, `Timestamp`)
//!
//! # Example
//!
//! ```rust
//! use verity_core::{AppConfig, ProbeKey, ProxyConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.client.rate_limit_per_minute, 30);
//!
//! let key = ProbeKey::new("user@example.com");
//! let proxy = ProxyConfig::parse("127.0.0.1:8080")?;
//! assert_eq!(proxy.url(), "http://127.0.0.1:8080");
//! # let _ = key;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BatchConfig, ClientConfig, ProbeConfig};
pub use error::{ConfigError, ConfigResult, Result, VerityError};
pub use types::{is_valid_email, ProbeKey, ProbeResult, ProxyConfig, Timestamp};
