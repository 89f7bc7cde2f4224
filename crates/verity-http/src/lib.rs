//! Verity HTTP - Form-posting probe implementation.
//!
//! [`HttpProbe`] posts the identifier to a configured endpoint and turns the
//! response into a verdict by matching the body against configurable
//! "not found" and "found" patterns.
//!
//! # Example
//!
//! ```rust,ignore
//! use verity_core::AppConfig;
//! use verity_http::HttpProbe;
//!
//! let config = AppConfig::load_with_env(None)?;
//! let probe = HttpProbe::new(&config.probe)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod classify;
pub mod probe;

pub use classify::ResponsePatterns;
pub use probe::HttpProbe;
