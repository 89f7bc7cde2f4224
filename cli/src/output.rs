//! Human-readable rendering of verdicts, batch tables and stats.

use std::fmt::Write as _;
use verity_client::{BatchResult, BatchSummary, ClientStats};
use verity_core::{ProbeKey, ProbeResult};

const MAX_IDENTIFIER_WIDTH: usize = 64;

fn status_label(result: &ProbeResult, error: bool) -> &'static str {
    if error {
        "ERROR"
    } else if result.is_registered {
        "OK"
    } else {
        "NOT-FOUND"
    }
}

/// One-line verdict for a single check.
#[must_use]
pub fn single_line(key: &ProbeKey, result: &ProbeResult) -> String {
    format!(
        "{:<11} | {:<4} | {} | {}",
        status_label(result, false),
        result.status_code,
        key,
        result.message
    )
}

/// Numbered table of batch results.
#[must_use]
pub fn batch_table(results: &[BatchResult]) -> String {
    if results.is_empty() {
        return "No results to display.\n".to_string();
    }

    let width = results
        .iter()
        .map(|r| r.identifier.as_str().chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_IDENTIFIER_WIDTH);

    let header = format!(
        "{:<3} | {:<11} | {:<4} | {:<width$} | Message",
        "#", "Status", "Code", "Email"
    );
    let mut out = String::new();
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "{}", "-".repeat(header.len()));

    for r in results {
        let identifier: String = r.identifier.as_str().chars().take(width).collect();
        let _ = writeln!(
            out,
            "{:<3} | {:<11} | {:<4} | {:<width$} | {}",
            r.index + 1,
            status_label(&r.result, r.error),
            r.result.status_code,
            identifier,
            r.result.message
        );
    }
    out
}

/// Summary block for a finished batch.
#[must_use]
pub fn summary_block(summary: &BatchSummary) -> String {
    format!(
        "Summary\n-------\nTotal          : {}\nRegistered     : {}\nNot registered : {}\nErrors         : {}\n",
        summary.total, summary.registered, summary.not_registered, summary.errors
    )
}

/// Client counters.
#[must_use]
pub fn stats_block(stats: &ClientStats) -> String {
    format!(
        "Stats\n-----\nCache entries      : {}\nLog entries        : {}\nRequests last 60s  : {}\nAdmissions last 60s: {}\n",
        stats.cache_size, stats.log_size, stats.requests_this_minute, stats.admissions_this_minute
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize, identifier: &str, result: ProbeResult, error: bool) -> BatchResult {
        BatchResult {
            index,
            identifier: ProbeKey::new(identifier),
            result,
            error,
        }
    }

    #[test]
    fn test_single_line() {
        let line = single_line(
            &ProbeKey::new("a@x.com"),
            &ProbeResult::not_registered("Identifier is not registered", Some(200)),
        );
        assert_eq!(line, "NOT-FOUND   | 404  | a@x.com | Identifier is not registered");
    }

    #[test]
    fn test_batch_table_rows() {
        let results = vec![
            row(0, "a@x.com", ProbeResult::registered("found", Some(200)), false),
            row(1, "longer@example.com", ProbeResult::indeterminate("network error: reset", None), true),
        ];
        let table = batch_table(&results);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "#   | Status      | Code | Email              | Message");
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[2], "1   | OK          | 200  | a@x.com            | found");
        assert_eq!(lines[3], "2   | ERROR       | 500  | longer@example.com | network error: reset");
    }

    #[test]
    fn test_batch_table_empty() {
        assert_eq!(batch_table(&[]), "No results to display.\n");
    }

    #[test]
    fn test_summary_block() {
        let block = summary_block(&BatchSummary {
            total: 4,
            registered: 2,
            not_registered: 1,
            errors: 1,
        });
        assert!(block.contains("Total          : 4"));
        assert!(block.contains("Not registered : 1"));
        assert!(block.contains("Errors         : 1"));
    }

    #[test]
    fn test_stats_block() {
        let block = stats_block(&ClientStats {
            cache_size: 3,
            log_size: 12,
            requests_this_minute: 9,
            admissions_this_minute: 3,
        });
        assert!(block.contains("Cache entries      : 3"));
        assert!(block.contains("Admissions last 60s: 3"));
    }
}
