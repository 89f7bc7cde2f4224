//! Shared test doubles for the client integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use verity_client::{Probe, ProbeClient, ProbeError};
use verity_core::{ClientConfig, ProbeKey, ProbeResult, ProxyConfig};

/// Scripted behaviour for one key.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Resolve with this verdict
    Answer(ProbeResult),
    /// Fail with a network error this many times, then answer "registered"
    FailTimes(u32),
    /// Always fail with a network error
    AlwaysFail,
}

/// One recorded probe invocation.
#[derive(Debug, Clone)]
pub struct ProbeCall {
    pub key: String,
    pub proxy: Option<String>,
    pub at: Instant,
}

/// Probe double answering "registered" unless a key is scripted otherwise.
#[derive(Default)]
pub struct ScriptedProbe {
    behaviors: Mutex<HashMap<String, Behavior>>,
    calls: Mutex<Vec<ProbeCall>>,
}

impl ScriptedProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, key: &str, behavior: Behavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(key.to_string(), behavior);
    }

    pub fn calls(&self) -> Vec<ProbeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(
        &self,
        key: &ProbeKey,
        proxy: Option<&ProxyConfig>,
    ) -> Result<ProbeResult, ProbeError> {
        self.calls.lock().unwrap().push(ProbeCall {
            key: key.as_str().to_string(),
            proxy: proxy.map(|p| p.url().to_string()),
            at: Instant::now(),
        });

        let mut behaviors = self.behaviors.lock().unwrap();
        match behaviors.get_mut(key.as_str()) {
            None => Ok(ProbeResult::registered("account found", Some(200))),
            Some(Behavior::Answer(result)) => Ok(result.clone()),
            Some(Behavior::AlwaysFail) => Err(ProbeError::Network(format!(
                "connection refused for {key}"
            ))),
            Some(Behavior::FailTimes(remaining)) => {
                if *remaining == 0 {
                    Ok(ProbeResult::registered("account found", Some(200)))
                } else {
                    *remaining -= 1;
                    Err(ProbeError::Network("connection reset".to_string()))
                }
            }
        }
    }

    fn probe_id(&self) -> &str {
        "scripted"
    }
}

/// Client over `probe` with a fast retry base so tests stay short.
pub fn client_with(probe: &Arc<ScriptedProbe>, config: ClientConfig) -> ProbeClient {
    ProbeClient::new(probe.clone(), config)
}

pub fn config() -> ClientConfig {
    ClientConfig {
        retry_base_delay_ms: 100,
        ..ClientConfig::default()
    }
}

pub fn key(s: &str) -> ProbeKey {
    ProbeKey::new(s)
}
