//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Verity CLI
#[derive(Parser, Debug)]
#[command(name = "verity")]
#[command(about = "Check whether identifiers are registered with a remote service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ~/.config/verity/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a single email address
    Check(CheckArgs),

    /// Check a list of email addresses sequentially
    Batch(BatchArgs),

    /// Print the effective configuration as TOML
    Config,
}

/// Single check arguments
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Email address to check
    pub email: String,

    /// Proxy as host:port or a URL
    #[arg(long)]
    pub proxy: Option<String>,
}

/// Batch arguments
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Inline list separated by commas or newlines
    #[arg(long, required_unless_present = "file")]
    pub list: Option<String>,

    /// File with one email per line, or a CSV whose first column is the email
    #[arg(long, conflicts_with = "list")]
    pub file: Option<PathBuf>,

    /// Delay between items in milliseconds (default: batch.delay_ms)
    #[arg(long)]
    pub delay: Option<u64>,

    /// Proxy to use; repeat to rotate round-robin across items
    #[arg(long = "proxy")]
    pub proxies: Vec<String>,

    /// Halt after the first failed item
    #[arg(long, default_value_t = false)]
    pub stop_on_error: bool,

    /// Keep going after failed items, overriding `batch.stop_on_error`
    #[arg(long, default_value_t = false, conflicts_with = "stop_on_error")]
    pub continue_on_error: bool,

    /// Print results as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl BatchArgs {
    /// Stop-on-error policy requested on the command line, if any.
    #[must_use]
    pub fn stop_policy(&self) -> Option<bool> {
        if self.stop_on_error {
            Some(true)
        } else if self.continue_on_error {
            Some(false)
        } else {
            None
        }
    }
}
