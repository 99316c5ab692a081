//! Source-arbitration and verification engine.
//!
//! # Data Flow
//! ```text
//! caller (http / cli)
//!     → Engine operation (tip.rs, block.rs, fees.rs, transaction.rs)
//!     → fallback.rs: node first, then providers one at a time
//!         → backend (trusted, spawn_blocking)
//!         → providers::ProviderClient (semi-trusted, verified where possible)
//!     → trust_cache.rs (height → verified hash, consulted for linkage)
//! ```
//!
//! # Design Decisions
//! - The node, when configured, is always tried first and never re-verified
//! - Providers are tried sequentially in a fresh random order per call
//! - Every source gets exactly one attempt per call; no retries
//! - The trust cache is owned by the engine instance

pub mod block;
pub mod error;
pub mod fallback;
pub mod fees;
pub mod tip;
pub mod transaction;
pub mod trust_cache;

use std::sync::Arc;

use crate::backend::{AuthoritativeBackend, BackendResult};
use crate::chain::Network;
use crate::config::TrustedcoinConfig;
use crate::providers::{ProviderClient, ProviderRegistry, Source};

pub use error::{EngineError, EngineResult, SourceError, VerificationError};
pub use fallback::{Attempt, FallbackLimits, Outcome};
pub use fees::{ChannelFeeRates, FeeEstimates, FeeRateEntry, FeeRateTable, FeeSource};
pub use trust_cache::TrustCache;

/// Everything one arbitrated lookup needs. Cheap to share behind an `Arc`.
pub struct Engine {
    network: Network,
    backend: Option<Arc<dyn AuthoritativeBackend>>,
    registry: ProviderRegistry,
    client: ProviderClient,
    trust: TrustCache,
    limits: FallbackLimits,
}

impl Engine {
    pub fn new(
        network: Network,
        backend: Option<Arc<dyn AuthoritativeBackend>>,
        registry: ProviderRegistry,
        client: ProviderClient,
        trust: TrustCache,
        limits: FallbackLimits,
    ) -> Self {
        Self {
            network,
            backend,
            registry,
            client,
            trust,
            limits,
        }
    }

    /// Build an engine from configuration. The backend is injected so it can
    /// be absent or substituted.
    pub fn from_config(
        config: &TrustedcoinConfig,
        backend: Option<Arc<dyn AuthoritativeBackend>>,
    ) -> Result<Self, reqwest::Error> {
        let client = ProviderClient::new(config.timeouts.connect(), config.timeouts.attempt())?;
        let limits = FallbackLimits {
            attempt: config.timeouts.attempt(),
            deadline: config.timeouts.operation_deadline(),
        };
        Ok(Self::new(
            config.network,
            backend,
            ProviderRegistry::new(config.network, &config.providers),
            client,
            TrustCache::new(config.trust_cache.capacity),
            limits,
        ))
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn trust_cache(&self) -> &TrustCache {
        &self.trust
    }

    /// Node (when configured) followed by esplora endpoints in random order.
    fn sources(&self) -> Vec<Source> {
        let mut sources = Vec::new();
        if self.backend.is_some() {
            sources.push(Source::Node);
        }
        sources.extend(self.registry.esplora_sources());
        sources
    }

    /// Run a blocking node call on the blocking pool.
    async fn call_backend<T, F>(&self, call: &'static str, f: F) -> Attempt<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn AuthoritativeBackend) -> BackendResult<T> + Send + 'static,
    {
        let Some(backend) = self.backend.clone() else {
            return Attempt::Miss;
        };
        match tokio::task::spawn_blocking(move || f(backend.as_ref())).await {
            Ok(Ok(value)) => Attempt::Found(value),
            Ok(Err(e)) => {
                tracing::debug!(call, error = %e, "Node call failed, falling through to providers");
                Attempt::Failed(SourceError::unavailable(Source::Node, e))
            }
            Err(e) => Attempt::Failed(SourceError::unavailable(Source::Node, format!("{} task failed: {}", call, e))),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("network", &self.network)
            .field("backend", &self.backend.is_some())
            .field("registry", &self.registry)
            .field("trusted_heights", &self.trust.len())
            .field("limits", &self.limits)
            .finish()
    }
}
