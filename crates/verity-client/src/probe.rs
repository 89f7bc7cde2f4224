//! The probe collaborator seam.

use crate::error::ProbeError;
use async_trait::async_trait;
use verity_core::{ProbeKey, ProbeResult, ProxyConfig};

/// One outbound check for one identifier.
///
/// Implementations must be thread-safe (Send + Sync) for use in async
/// contexts. An `Err` is treated as transient and retried by the client; an
/// `Ok` is a terminal verdict and is cached, whatever its status.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Check `key`, routing through `proxy` when one is given.
    ///
    /// # Errors
    /// Returns error on transport failures and timeouts.
    async fn probe(
        &self,
        key: &ProbeKey,
        proxy: Option<&ProxyConfig>,
    ) -> Result<ProbeResult, ProbeError>;

    /// Short identifier used in logs.
    fn probe_id(&self) -> &str {
        "probe"
    }
}
