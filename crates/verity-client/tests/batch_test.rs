//! Integration tests for batch scheduling: ordering, pacing, proxy rotation
//! and the stop-on-error policy.

mod common;

use common::{client_with, config, key, Behavior, ScriptedProbe};
use std::time::Duration;
use tokio::time::Instant;
use verity_client::{BatchOptions, BatchSummary, LogLevel};
use verity_core::{ClientConfig, ProbeKey, ProbeResult, ProxyConfig};

fn keys(names: &[&str]) -> Vec<ProbeKey> {
    names.iter().map(|n| key(n)).collect()
}

fn no_retry() -> ClientConfig {
    ClientConfig {
        max_retries: 0,
        ..config()
    }
}

#[tokio::test(start_paused = true)]
async fn test_batch_preserves_order_and_paces() {
    let probe = ScriptedProbe::new();
    let mut client = client_with(&probe, config());
    let options = BatchOptions::default().with_delay(Duration::from_millis(500));

    let start = Instant::now();
    let results = client
        .validate_batch(&keys(&["a@x.com", "b@x.com", "c@x.com"]), &options)
        .await;
    let elapsed = start.elapsed();

    let order: Vec<(usize, &str)> = results
        .iter()
        .map(|r| (r.index, r.identifier.as_str()))
        .collect();
    assert_eq!(order, vec![(0, "a@x.com"), (1, "b@x.com"), (2, "c@x.com")]);
    assert!(results.iter().all(|r| !r.error));

    let calls = probe.calls();
    for pair in calls.windows(2) {
        assert!(pair[1].at - pair[0].at >= Duration::from_millis(500));
    }
    // Two delays, none after the last item
    assert!(elapsed >= Duration::from_millis(1_000));
    assert!(elapsed < Duration::from_millis(1_500));
}

#[tokio::test(start_paused = true)]
async fn test_batch_rotates_proxies() {
    let probe = ScriptedProbe::new();
    let mut client = client_with(&probe, config());
    let options = BatchOptions::default()
        .with_delay(Duration::from_millis(10))
        .with_proxies(vec![
            ProxyConfig::parse("10.0.0.1:8080").expect("valid proxy"),
            ProxyConfig::parse("10.0.0.2:8080").expect("valid proxy"),
        ]);

    client
        .validate_batch(
            &keys(&["1@x.com", "2@x.com", "3@x.com", "4@x.com", "5@x.com"]),
            &options,
        )
        .await;

    let proxies: Vec<String> = probe
        .calls()
        .into_iter()
        .map(|c| c.proxy.expect("proxy used"))
        .collect();
    assert_eq!(
        proxies,
        vec![
            "http://10.0.0.1:8080",
            "http://10.0.0.2:8080",
            "http://10.0.0.1:8080",
            "http://10.0.0.2:8080",
            "http://10.0.0.1:8080",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_on_error_truncates() {
    let probe = ScriptedProbe::new();
    probe.set("b@x.com", Behavior::AlwaysFail);
    let mut client = client_with(&probe, no_retry());
    let options = BatchOptions::default()
        .with_delay(Duration::from_millis(500))
        .with_stop_on_error(true);

    let start = Instant::now();
    let results = client
        .validate_batch(&keys(&["a@x.com", "b@x.com", "c@x.com", "d@x.com"]), &options)
        .await;
    let elapsed = start.elapsed();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].index, 0);
    assert!(!results[0].error);
    assert_eq!(results[1].index, 1);
    assert!(results[1].error);
    assert!(!results[1].result.is_registered);
    assert_eq!(results[1].result.status_code, 500);
    assert!(results[1].result.message.contains("connection refused"));

    assert_eq!(probe.call_count(), 2);
    // Only the delay after the first item; none after the halting error
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_millis(1_000));

    let halted = client
        .logs(Some(LogLevel::Warn))
        .iter()
        .any(|e| e.message == "Batch validation stopped on error" && e.data["stoppedAt"] == 1);
    assert!(halted);
}

#[tokio::test(start_paused = true)]
async fn test_errors_are_represented_without_stop() {
    let probe = ScriptedProbe::new();
    probe.set("b@x.com", Behavior::AlwaysFail);
    probe.set(
        "c@x.com",
        Behavior::Answer(ProbeResult::not_registered("no account", Some(200))),
    );
    let mut client = client_with(&probe, no_retry());
    let options = BatchOptions::default().with_delay(Duration::from_millis(100));

    let results = client
        .validate_batch(&keys(&["a@x.com", "b@x.com", "c@x.com", "d@x.com"]), &options)
        .await;

    assert_eq!(results.len(), 4);
    let errors: Vec<usize> = results.iter().filter(|r| r.error).map(|r| r.index).collect();
    assert_eq!(errors, vec![1]);

    assert_eq!(
        BatchSummary::from_results(&results),
        BatchSummary {
            total: 4,
            registered: 2,
            not_registered: 1,
            errors: 1,
        }
    );

    let complete = client
        .logs(Some(LogLevel::Info))
        .into_iter()
        .find(|e| e.message == "Batch validation complete")
        .expect("completion logged");
    assert_eq!(complete.data["errors"], 1);
    assert_eq!(complete.data["registered"], 2);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_inside_batch_becomes_error_result() {
    let probe = ScriptedProbe::new();
    let mut client = client_with(
        &probe,
        ClientConfig {
            rate_limit_per_minute: 2,
            ..config()
        },
    );
    let options = BatchOptions::default().with_delay(Duration::from_millis(10));

    let results = client
        .validate_batch(&keys(&["a@x.com", "b@x.com", "c@x.com"]), &options)
        .await;

    assert_eq!(results.len(), 3);
    assert!(results[2].error);
    assert_eq!(results[2].result.status_code, 500);
    assert!(results[2].result.message.starts_with("rate limit exceeded"));
    assert_eq!(probe.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_identifiers_hit_cache() {
    let probe = ScriptedProbe::new();
    let mut client = client_with(&probe, config());
    let options = BatchOptions::default().with_delay(Duration::from_millis(10));

    let results = client
        .validate_batch(&keys(&["a@x.com", "a@x.com"]), &options)
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].result, results[1].result);
    assert_eq!(probe.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_batch() {
    let probe = ScriptedProbe::new();
    let mut client = client_with(&probe, config());

    let start = Instant::now();
    let results = client.validate_batch(&[], &BatchOptions::default()).await;

    assert!(results.is_empty());
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(probe.call_count(), 0);
}
