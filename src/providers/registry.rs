//! Provider registry.
//!
//! # Responsibilities
//! - Hold the esplora endpoints configured for the network
//! - Produce a freshly shuffled traversal order on every call
//! - Decide which raw-block sources apply to the network, and in which order

use rand::seq::SliceRandom;

use crate::chain::Network;
use crate::config::ProvidersConfig;
use crate::providers::{ProviderEndpoint, Source};

/// Ordered provider lists for one network.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    network: Network,
    esplora: Vec<ProviderEndpoint>,
    blockchain_info: Option<String>,
    blockchair: Option<String>,
}

impl ProviderRegistry {
    pub fn new(network: Network, config: &ProvidersConfig) -> Self {
        let esplora = config
            .esplora_endpoints(network)
            .into_iter()
            .map(ProviderEndpoint::new)
            .collect();
        Self {
            network,
            esplora,
            blockchain_info: config
                .blockchain_info
                .then(|| config.blockchain_info_url.trim_end_matches('/').to_string()),
            blockchair: config
                .blockchair
                .then(|| config.blockchair_url.trim_end_matches('/').to_string()),
        }
    }

    /// Esplora endpoints in a new random order. Empty means no fallback exists.
    pub fn endpoints(&self) -> Vec<ProviderEndpoint> {
        let mut endpoints = self.esplora.clone();
        endpoints.shuffle(&mut rand::thread_rng());
        endpoints
    }

    /// Esplora endpoints as fallback sources.
    pub fn esplora_sources(&self) -> Vec<Source> {
        self.endpoints().into_iter().map(Source::Esplora).collect()
    }

    /// Raw-block sources for the network, in the order they are tried.
    pub fn block_sources(&self) -> Vec<Source> {
        let mut sources = Vec::new();
        match self.network {
            Network::Bitcoin => {
                if let Some(base) = &self.blockchain_info {
                    sources.push(Source::BlockchainInfo(base.clone()));
                }
                if let Some(base) = &self.blockchair {
                    sources.push(Source::Blockchair(base.clone()));
                }
                sources.extend(self.esplora_sources());
            }
            Network::Testnet => {
                sources.extend(self.esplora_sources());
                if let Some(base) = &self.blockchair {
                    sources.push(Source::Blockchair(base.clone()));
                }
            }
            Network::Signet | Network::Liquid => {
                sources.extend(self.esplora_sources());
            }
        }
        sources
    }
}
