//! Supported chains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chain selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Bitcoin main chain.
    #[default]
    Bitcoin,
    /// Bitcoin testnet3.
    Testnet,
    /// Bitcoin default signet.
    Signet,
    /// Liquid sidechain (Elements block encoding).
    Liquid,
}

impl Network {
    /// Default local node RPC port.
    pub fn default_rpc_port(self) -> u16 {
        match self {
            Network::Bitcoin => 8332,
            Network::Testnet => 18332,
            Network::Signet => 38332,
            Network::Liquid => 7041,
        }
    }

    /// Chain name as reported to the host (`getchaininfo`).
    pub fn chain_name(self) -> &'static str {
        match self {
            Network::Bitcoin => "main",
            Network::Testnet => "test",
            Network::Signet => "signet",
            Network::Liquid => "liquidv1",
        }
    }

    /// Public esplora mirrors used when the config does not override them.
    pub fn default_esplora_endpoints(self) -> &'static [&'static str] {
        match self {
            Network::Bitcoin => &[
                "https://mempool.space/api",
                "https://blockstream.info/api",
                "https://explorer.bullbitcoin.com/api",
                "https://mempool.emzy.de/api",
            ],
            Network::Testnet => &[
                "https://mempool.space/testnet/api",
                "https://blockstream.info/testnet/api",
            ],
            Network::Signet => &[
                "https://mempool.space/signet/api",
                "https://blockstream.info/signet/api",
            ],
            Network::Liquid => &[
                "https://blockstream.info/liquid/api",
                "https://liquid.network/api",
            ],
        }
    }

    /// Whether raw blocks on this chain decode with the Bitcoin consensus
    /// encoding (and can therefore be hash-verified).
    pub fn has_bitcoin_block_encoding(self) -> bool {
        !matches!(self, Network::Liquid)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Bitcoin => "bitcoin",
            Network::Testnet => "testnet",
            Network::Signet => "signet",
            Network::Liquid => "liquid",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bitcoin" | "main" | "mainnet" => Ok(Network::Bitcoin),
            "testnet" | "test" => Ok(Network::Testnet),
            "signet" => Ok(Network::Signet),
            "liquid" | "liquidv1" => Ok(Network::Liquid),
            other => Err(format!("unknown network '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Bitcoin);
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("liquidv1".parse::<Network>().unwrap(), Network::Liquid);
        assert!("regtest".parse::<Network>().is_err());
    }

    #[test]
    fn test_network_defaults() {
        assert_eq!(Network::Bitcoin.default_rpc_port(), 8332);
        assert_eq!(Network::Signet.chain_name(), "signet");
        assert_eq!(Network::Bitcoin.default_esplora_endpoints().len(), 4);
        assert!(!Network::Liquid.has_bitcoin_block_encoding());
    }

    #[test]
    fn test_serde_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            network: Network,
        }
        let w: Wrapper = toml::from_str("network = \"signet\"").unwrap();
        assert_eq!(w.network, Network::Signet);
    }
}
