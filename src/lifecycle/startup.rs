//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated configuration into a ready engine
//! - Build the optional node connection once; it is never rebuilt
//!
//! # Design Decisions
//! - Building the node client does not contact the node
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;
use thiserror::Error;

use crate::backend::{AuthoritativeBackend, BackendError, BitcoindBackend};
use crate::config::TrustedcoinConfig;
use crate::engine::Engine;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("bitcoind client: {0}")]
    Backend(#[from] BackendError),

    #[error("HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Build the engine, with a bitcoind backend when credentials are configured.
pub fn build_engine(config: &TrustedcoinConfig) -> Result<Engine, StartupError> {
    let backend = match BitcoindBackend::from_config(&config.bitcoind, config.network)? {
        Some(backend) => {
            tracing::info!(endpoint = backend.endpoint(), "Using bitcoind as authoritative backend");
            Some(Arc::new(backend) as Arc<dyn AuthoritativeBackend>)
        }
        None => {
            tracing::info!("No bitcoind credentials, using public providers only");
            None
        }
    };

    let engine = Engine::from_config(config, backend)?;
    tracing::info!(
        network = %config.network,
        trust_cache_capacity = config.trust_cache.capacity,
        "Engine ready"
    );
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BitcoindConfig;

    #[test]
    fn test_build_without_node() {
        let engine = build_engine(&TrustedcoinConfig::default()).unwrap();
        assert!(!engine.has_backend());
        assert_eq!(engine.trust_cache().capacity(), 1024);
    }

    #[test]
    fn test_build_with_node() {
        let config = TrustedcoinConfig {
            bitcoind: BitcoindConfig {
                rpc_user: Some("user".into()),
                rpc_password: Some("pass".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let engine = build_engine(&config).unwrap();
        assert!(engine.has_backend());
    }
}
