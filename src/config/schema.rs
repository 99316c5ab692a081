//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::chain::Network;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TrustedcoinConfig {
    /// Chain served by this process.
    pub network: Network,

    /// Optional local node connection.
    pub bitcoind: BitcoindConfig,

    /// Public data providers.
    pub providers: ProvidersConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Height→hash trust cache settings.
    pub trust_cache: TrustCacheConfig,

    /// Fee output settings.
    pub fees: FeeConfig,

    /// HTTP API listener.
    pub listener: ListenerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Local node RPC settings. The node is used only when both user and
/// password are present.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BitcoindConfig {
    /// Hostname or IP of the node (default 127.0.0.1).
    pub rpc_connect: Option<String>,

    /// RPC port (default depends on network).
    pub rpc_port: Option<u16>,

    pub rpc_user: Option<String>,

    pub rpc_password: Option<String>,
}

impl BitcoindConfig {
    /// Whether enough is configured to talk to a node.
    pub fn is_configured(&self) -> bool {
        self.rpc_user.is_some() && self.rpc_password.is_some()
    }

    /// RPC endpoint URL for the given network.
    pub fn endpoint(&self, network: Network) -> String {
        let host = self.rpc_connect.as_deref().unwrap_or("127.0.0.1");
        let port = self.rpc_port.unwrap_or_else(|| network.default_rpc_port());
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host.trim_end_matches('/'), port)
        } else {
            format!("http://{}:{}", host, port)
        }
    }
}

/// Public data provider settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Esplora base URLs. Absent means the network defaults; an empty list
    /// means no esplora fallback at all.
    pub esplora: Option<Vec<String>>,

    /// Use blockchain.info as a raw block source (main chain only).
    pub blockchain_info: bool,

    pub blockchain_info_url: String,

    /// Use blockchair as a raw block source (main chain and testnet).
    pub blockchair: bool,

    pub blockchair_url: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            esplora: None,
            blockchain_info: true,
            blockchain_info_url: "https://blockchain.info".to_string(),
            blockchair: true,
            blockchair_url: "https://api.blockchair.com".to_string(),
        }
    }
}

impl ProvidersConfig {
    /// Esplora endpoints effective for `network`.
    pub fn esplora_endpoints(&self, network: Network) -> Vec<String> {
        match &self.esplora {
            Some(configured) => configured.clone(),
            None => network
                .default_esplora_endpoints()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upper bound for one attempt against one source, in seconds.
    pub attempt_secs: u64,

    /// Upper bound for a whole fallback chain, in seconds.
    pub operation_deadline_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            attempt_secs: 10,
            operation_deadline_secs: 60,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn attempt(&self) -> Duration {
        Duration::from_secs(self.attempt_secs)
    }

    pub fn operation_deadline(&self) -> Duration {
        Duration::from_secs(self.operation_deadline_secs)
    }
}

/// Trust cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrustCacheConfig {
    /// Number of verified heights retained.
    pub capacity: usize,
}

impl Default for TrustCacheConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Which estimate shape the host expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeShape {
    /// `feerate_floor` plus a list of `{blocks, feerate}`.
    #[default]
    FeerateTable,
    /// Per channel-lifecycle stage rates.
    Channel,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FeeConfig {
    pub shape: FeeShape,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8338").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8338".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config: TrustedcoinConfig = toml::from_str("network = \"testnet\"").unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert!(!config.bitcoind.is_configured());
        assert_eq!(config.timeouts.attempt_secs, 10);
        assert_eq!(config.trust_cache.capacity, 1024);
        assert_eq!(config.fees.shape, FeeShape::FeerateTable);
    }

    #[test]
    fn test_esplora_override() {
        let mut providers = ProvidersConfig::default();
        assert_eq!(providers.esplora_endpoints(Network::Signet).len(), 2);

        providers.esplora = Some(vec!["http://127.0.0.1:3002".into()]);
        assert_eq!(
            providers.esplora_endpoints(Network::Bitcoin),
            vec!["http://127.0.0.1:3002".to_string()]
        );
    }

    #[test]
    fn test_empty_esplora_list_disables_fallback() {
        let config: TrustedcoinConfig = toml::from_str("[providers]\nesplora = []").unwrap();
        assert_eq!(config.providers.esplora, Some(Vec::new()));
        assert!(config.providers.esplora_endpoints(Network::Bitcoin).is_empty());

        let config: TrustedcoinConfig = toml::from_str("[providers]\nblockchair = false").unwrap();
        assert_eq!(
            config.providers.esplora_endpoints(Network::Bitcoin).len(),
            Network::Bitcoin.default_esplora_endpoints().len()
        );
    }

    #[test]
    fn test_bitcoind_endpoint() {
        let mut cfg = BitcoindConfig::default();
        assert_eq!(cfg.endpoint(Network::Bitcoin), "http://127.0.0.1:8332");

        cfg.rpc_connect = Some("10.0.0.2".into());
        cfg.rpc_port = Some(9999);
        assert_eq!(cfg.endpoint(Network::Signet), "http://10.0.0.2:9999");

        cfg.rpc_connect = Some("https://node.example/".into());
        assert_eq!(cfg.endpoint(Network::Signet), "https://node.example:9999");
    }

    #[test]
    fn test_fee_shape_parsing() {
        let config: TrustedcoinConfig = toml::from_str("[fees]\nshape = \"channel\"").unwrap();
        assert_eq!(config.fees.shape, FeeShape::Channel);
    }
}
