//! Public data providers.
//!
//! # Data Flow
//! ```text
//! ProvidersConfig + Network
//!     → registry.rs (esplora endpoints, shuffled per call; raw-block sources per network)
//!     → client.rs (one HTTP attempt against one source → Attempt<T>)
//!     → engine (verification, fallback order)
//! ```
//!
//! # Design Decisions
//! - Providers are semi-trusted; nothing fetched here is verified here
//! - Shuffling spreads load, it is not a trust mechanism
//! - A missing resource (404, short body) is a soft miss, not a failure

pub mod client;
pub mod registry;

use std::fmt;

use crate::engine::fallback::SourceLabel;

pub use client::{EsploraTx, EsploraVout, ProviderClient};
pub use registry::ProviderRegistry;

/// Base URL of an esplora-compatible HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderEndpoint(String);

impl ProviderEndpoint {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self(base.trim_end_matches('/').to_string())
    }

    /// Full URL for `path` (which starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an answer can come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// The authoritative local node.
    Node,
    /// An esplora instance.
    Esplora(ProviderEndpoint),
    /// blockchain.info raw block API (base URL).
    BlockchainInfo(String),
    /// blockchair raw block API (base URL).
    Blockchair(String),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Node => f.write_str("bitcoind"),
            Source::Esplora(endpoint) => write!(f, "{}", endpoint),
            Source::BlockchainInfo(base) => write!(f, "blockchain.info ({})", base),
            Source::Blockchair(base) => write!(f, "blockchair ({})", base),
        }
    }
}

impl SourceLabel for Source {
    fn kind(&self) -> &'static str {
        match self {
            Source::Node => "bitcoind",
            Source::Esplora(_) => "esplora",
            Source::BlockchainInfo(_) => "blockchain_info",
            Source::Blockchair(_) => "blockchair",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let ep = ProviderEndpoint::new("https://mempool.space/api/");
        assert_eq!(ep.url("/blocks/tip/height"), "https://mempool.space/api/blocks/tip/height");
    }

    #[test]
    fn test_source_labels() {
        assert_eq!(Source::Node.to_string(), "bitcoind");
        assert_eq!(Source::Esplora(ProviderEndpoint::new("http://x")).kind(), "esplora");
        assert_eq!(Source::Blockchair("https://api.blockchair.com".into()).kind(), "blockchair");
    }
}
