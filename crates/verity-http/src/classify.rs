//! Response classification.
//!
//! A response is judged in a fixed order: a "not found" pattern wins over a
//! "found" pattern, and a bare HTTP 200 counts as found. Anything else is
//! indeterminate.

use regex::{Regex, RegexBuilder};
use verity_core::{ProbeConfig, ProbeResult, Result, VerityError};

/// Compiled body patterns for one endpoint.
#[derive(Debug, Clone, Default)]
pub struct ResponsePatterns {
    not_found: Vec<Regex>,
    found: Vec<Regex>,
}

impl ResponsePatterns {
    /// Compile the case-insensitive patterns of a probe configuration.
    ///
    /// # Errors
    /// Returns [`VerityError::Validation`] naming the first invalid pattern.
    pub fn compile(config: &ProbeConfig) -> Result<Self> {
        Ok(Self {
            not_found: compile_all(&config.not_found_patterns)?,
            found: compile_all(&config.found_patterns)?,
        })
    }

    /// Turn an HTTP status and body into a verdict.
    #[must_use]
    pub fn classify(&self, status: u16, body: &str) -> ProbeResult {
        if self.not_found.iter().any(|re| re.is_match(body)) {
            return ProbeResult::not_registered("Identifier is not registered", Some(status));
        }

        if status == 200 || self.found.iter().any(|re| re.is_match(body)) {
            return ProbeResult::registered("Identifier is registered", Some(status));
        }

        ProbeResult::indeterminate("Unable to verify identifier (try again later)", Some(status))
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| VerityError::Validation(format!("invalid pattern '{pattern}': {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> ResponsePatterns {
        let config = ProbeConfig {
            not_found_patterns: vec![
                "we can't find an account".to_string(),
                "no account found".to_string(),
            ],
            found_patterns: vec!["enter your password".to_string()],
            ..ProbeConfig::default()
        };
        ResponsePatterns::compile(&config).expect("compile patterns")
    }

    #[test]
    fn test_not_found_wins_over_status() {
        let result = patterns().classify(200, "<p>We can't find an account with that email</p>");
        assert!(!result.is_registered);
        assert_eq!(result.status_code, ProbeResult::STATUS_NOT_FOUND);
        assert_eq!(result.response_code, Some(200));
    }

    #[test]
    fn test_not_found_wins_over_found() {
        let result = patterns().classify(302, "No Account Found. Enter your password");
        assert_eq!(result.status_code, ProbeResult::STATUS_NOT_FOUND);
    }

    #[test]
    fn test_found_pattern_on_non_200() {
        let result = patterns().classify(302, "Please ENTER YOUR PASSWORD");
        assert!(result.is_registered);
        assert_eq!(result.status_code, ProbeResult::STATUS_REGISTERED);
        assert_eq!(result.response_code, Some(302));
    }

    #[test]
    fn test_plain_200_is_registered() {
        let result = patterns().classify(200, "<html></html>");
        assert!(result.is_registered);
    }

    #[test]
    fn test_other_status_is_indeterminate() {
        let result = patterns().classify(503, "Service Unavailable");
        assert!(!result.is_registered);
        assert_eq!(result.status_code, ProbeResult::STATUS_INDETERMINATE);
        assert_eq!(result.response_code, Some(503));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = ProbeConfig {
            found_patterns: vec!["(unclosed".to_string()],
            ..ProbeConfig::default()
        };
        let err = ResponsePatterns::compile(&config).expect_err("bad regex");
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_empty_patterns_fall_back_to_status() {
        let patterns = ResponsePatterns::default();
        assert!(patterns.classify(200, "anything").is_registered);
        assert_eq!(
            patterns.classify(404, "anything").status_code,
            ProbeResult::STATUS_INDETERMINATE
        );
    }
}
