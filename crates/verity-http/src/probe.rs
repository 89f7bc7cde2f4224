//! HTTP form probe.

use crate::classify::ResponsePatterns;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, REFERER};
use reqwest::{Client, Proxy};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use verity_client::{Probe, ProbeError};
use verity_core::{is_valid_email, ProbeConfig, ProbeKey, ProbeResult, ProxyConfig, Result, VerityError};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Probe that posts the identifier as a form and classifies the response.
///
/// The direct client is built once. Proxied clients are built on first use
/// and kept per proxy URL, so a rotation reuses one connection pool per
/// proxy. Environment proxy variables are never consulted.
pub struct HttpProbe {
    endpoint: String,
    config: ProbeConfig,
    patterns: ResponsePatterns,
    client: Client,
    /// Proxied clients, indexed by proxy URL
    proxied: RwLock<HashMap<String, Client>>,
}

impl HttpProbe {
    /// Create a probe from the `[probe]` configuration section.
    ///
    /// # Errors
    /// Returns error if no endpoint is configured, a pattern does not
    /// compile, or the HTTP client cannot be created.
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| VerityError::Validation("probe.endpoint is not configured".to_string()))?;

        Ok(Self {
            endpoint,
            patterns: ResponsePatterns::compile(config)?,
            client: build_http_client(config, None)?,
            proxied: RwLock::new(HashMap::new()),
            config: config.clone(),
        })
    }

    /// Endpoint the identifier is posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Form fields sent for `key`: the identifier first, then the constants.
    fn form_fields<'a>(&'a self, key: &'a ProbeKey) -> Vec<(&'a str, &'a str)> {
        std::iter::once((self.config.identifier_field.as_str(), key.as_str()))
            .chain(
                self.config
                    .extra_fields
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            )
            .collect()
    }

    fn client_for(&self, proxy: Option<&ProxyConfig>) -> std::result::Result<Client, ProbeError> {
        let Some(proxy) = proxy else {
            return Ok(self.client.clone());
        };

        let cached = self
            .proxied
            .read()
            .map_err(|_| ProbeError::Internal("proxied client map poisoned".to_string()))?
            .get(proxy.url())
            .cloned();
        if let Some(client) = cached {
            return Ok(client);
        }

        let client = build_http_client(&self.config, Some(proxy))
            .map_err(|e| ProbeError::Internal(e.to_string()))?;
        let mut proxied = self
            .proxied
            .write()
            .map_err(|_| ProbeError::Internal("proxied client map poisoned".to_string()))?;
        tracing::debug!(proxy = %proxy, "Built proxied HTTP client");
        Ok(proxied
            .entry(proxy.url().to_string())
            .or_insert(client)
            .clone())
    }

    fn transport_error(&self, error: &reqwest::Error) -> ProbeError {
        if error.is_timeout() {
            ProbeError::Timeout {
                seconds: self.config.timeout_secs,
            }
        } else {
            ProbeError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(
        &self,
        key: &ProbeKey,
        proxy: Option<&ProxyConfig>,
    ) -> std::result::Result<ProbeResult, ProbeError> {
        if !is_valid_email(key.as_str()) {
            return Ok(ProbeResult::invalid("Invalid email format"));
        }

        let client = self.client_for(proxy)?;
        let mut request = client
            .post(&self.endpoint)
            .header(ACCEPT, ACCEPT_HTML)
            .form(&self.form_fields(key));
        if let Some(referer) = &self.config.referer {
            request = request.header(REFERER, referer);
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            proxy = proxy.map(ProxyConfig::url),
            "Posting probe request"
        );

        let response = request.send().await.map_err(|e| self.transport_error(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.transport_error(&e))?;

        let result = self.patterns.classify(status, &body);
        tracing::debug!(
            status,
            verdict = result.status_code,
            body_len = body.len(),
            "Classified probe response"
        );
        Ok(result)
    }

    fn probe_id(&self) -> &str {
        "http"
    }
}

/// Build an HTTP client with the probe's timeout and user agent.
fn build_http_client(config: &ProbeConfig, proxy: Option<&ProxyConfig>) -> Result<Client> {
    let builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.as_str());

    let builder = match proxy {
        Some(proxy) => builder.proxy(
            Proxy::all(proxy.url())
                .map_err(|e| VerityError::Network(format!("invalid proxy {proxy}: {e}")))?,
        ),
        None => builder.no_proxy(),
    };

    builder
        .build()
        .map_err(|e| VerityError::Network(format!("failed to create HTTP client: {e}")))
}
