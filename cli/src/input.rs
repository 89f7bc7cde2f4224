//! Identifier input normalization.
//!
//! Inputs are cleaned the same way whatever their source: trimmed, cut at the
//! first `:` (so `email:password` lines work), dropped when not a valid email,
//! and de-duplicated case-insensitively keeping the first spelling.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use verity_core::{is_valid_email, ProbeKey};

/// Input loading errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// Input file missing
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that was requested
        path: PathBuf,
    },

    /// Input file unreadable
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path that was requested
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Nothing usable after normalization
    #[error("no valid email addresses provided")]
    Empty,

    /// More identifiers than one batch accepts
    #[error("too many identifiers: {count} (maximum {max} per batch)")]
    TooMany {
        /// Identifiers after normalization
        count: usize,
        /// Configured ceiling
        max: usize,
    },
}

/// Trim and drop anything after the first `:`.
#[must_use]
pub fn clean_identifier(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.split_once(':') {
        Some((head, _)) => head.trim(),
        None => trimmed,
    }
}

/// Clean, validate and de-duplicate identifiers, preserving input order.
pub fn normalize<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<ProbeKey> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(clean_identifier)
        .filter(|candidate| !candidate.is_empty() && is_valid_email(candidate))
        .filter(|candidate| seen.insert(candidate.to_lowercase()))
        .map(ProbeKey::new)
        .collect()
}

/// Split an inline list on newlines and commas.
#[must_use]
pub fn parse_inline_list(text: &str) -> Vec<ProbeKey> {
    normalize(text.split(['\n', ',']))
}

/// First column of every CSV line.
#[must_use]
pub fn parse_csv(content: &str) -> Vec<ProbeKey> {
    normalize(
        content
            .lines()
            .map(|line| line.split(',').next().unwrap_or_default()),
    )
}

/// One identifier per line.
#[must_use]
pub fn parse_txt(content: &str) -> Vec<ProbeKey> {
    normalize(content.lines())
}

/// Load identifiers from a `.csv` or plain text file.
pub fn load_from_file(path: &Path) -> Result<Vec<ProbeKey>, InputError> {
    if !path.exists() {
        return Err(InputError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let keys = if is_csv {
        parse_csv(&content)
    } else {
        parse_txt(&content)
    };

    tracing::debug!(path = %path.display(), count = keys.len(), "Loaded identifiers");
    Ok(keys)
}

/// Reject empty and oversized batches.
pub fn check_batch_size(keys: &[ProbeKey], max: usize) -> Result<(), InputError> {
    if keys.is_empty() {
        return Err(InputError::Empty);
    }
    if keys.len() > max {
        return Err(InputError::TooMany {
            count: keys.len(),
            max,
        });
    }
    Ok(())
}
