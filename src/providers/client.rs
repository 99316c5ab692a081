//! HTTP client for public providers.
//!
//! # Responsibilities
//! - Issue exactly one request per call against one provider
//! - Classify the response as found, soft miss, or failure
//! - Parse provider formats (esplora REST, blockchain.info hex, blockchair JSON)
//!
//! Nothing here is verified against the chain; that is the engine's job.

use bitcoin::hex::FromHex;
use bitcoin::{BlockHash, Txid};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::chain::{Network, TxDetails, TxOutputView};
use crate::engine::error::SourceError;
use crate::engine::fallback::Attempt;
use crate::providers::ProviderEndpoint;

/// Esplora responses shorter than this are not real blocks.
const MIN_RAW_BLOCK_BYTES: usize = 200;
/// blockchain.info hex bodies shorter than this are error pages.
const MIN_BLOCKCHAIN_INFO_HEX: usize = 100;

/// Transaction as returned by esplora's `/tx/{txid}`.
#[derive(Debug, Clone, Deserialize)]
pub struct EsploraTx {
    pub txid: Txid,
    pub vout: Vec<EsploraVout>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EsploraVout {
    #[serde(rename = "scriptpubkey", alias = "scriptPubKey")]
    pub script_pubkey: String,
    pub value: u64,
}

impl EsploraTx {
    /// Convert into the common view, rejecting non-hex scripts.
    pub fn into_details(self) -> Result<TxDetails, String> {
        let mut outputs = Vec::with_capacity(self.vout.len());
        for (index, out) in self.vout.into_iter().enumerate() {
            if Vec::<u8>::from_hex(&out.script_pubkey).is_err() {
                return Err(format!("output {} has a non-hex script", index));
            }
            outputs.push(TxOutputView {
                value: out.value,
                script_pubkey: out.script_pubkey.to_lowercase(),
            });
        }
        Ok(TxDetails {
            txid: self.txid,
            outputs,
        })
    }
}

/// Shared HTTP client for every provider request.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
}

impl ProviderClient {
    /// Build a client. `request` bounds a single HTTP exchange.
    pub fn new(connect: Duration, request: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect)
            .timeout(request)
            .user_agent(concat!("trustedcoin/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    /// GET `url`; 404 is a soft miss, any other error status a failure.
    async fn get(&self, name: &str, url: &str) -> Attempt<reqwest::Response> {
        let response = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => return Attempt::Failed(SourceError::unavailable(name, e)),
        };
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Attempt::Miss;
        }
        if !status.is_success() {
            return Attempt::Failed(SourceError::unavailable(name, format!("status {}", status)));
        }
        Attempt::Found(response)
    }

    async fn get_text(&self, name: &str, url: &str) -> Attempt<String> {
        match self.get(name, url).await {
            Attempt::Found(response) => match response.text().await {
                Ok(body) => Attempt::Found(body),
                Err(e) => Attempt::Failed(SourceError::unavailable(name, e)),
            },
            Attempt::Miss => Attempt::Miss,
            Attempt::Failed(e) => Attempt::Failed(e),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, name: &str, url: &str) -> Attempt<T> {
        match self.get(name, url).await {
            Attempt::Found(response) => match response.json::<T>().await {
                Ok(value) => Attempt::Found(value),
                Err(e) => Attempt::Failed(SourceError::malformed(name, e)),
            },
            Attempt::Miss => Attempt::Miss,
            Attempt::Failed(e) => Attempt::Failed(e),
        }
    }

    /// `GET /block-height/{height}` → block hash.
    pub async fn block_hash(&self, endpoint: &ProviderEndpoint, height: u64) -> Attempt<BlockHash> {
        let name = endpoint.to_string();
        let url = endpoint.url(&format!("/block-height/{}", height));
        self.get_text(&name, &url).await.and_then(|body| {
            match BlockHash::from_str(body.trim()) {
                Ok(hash) => Attempt::Found(hash),
                Err(e) => Attempt::Failed(SourceError::malformed(&name, format!("bad block hash: {}", e))),
            }
        })
    }

    /// `GET /blocks/tip/height` → height.
    pub async fn tip_height(&self, endpoint: &ProviderEndpoint) -> Attempt<u64> {
        let name = endpoint.to_string();
        let url = endpoint.url("/blocks/tip/height");
        self.get_text(&name, &url).await.and_then(|body| match body.trim().parse::<u64>() {
            Ok(height) => Attempt::Found(height),
            Err(e) => Attempt::Failed(SourceError::malformed(&name, format!("bad tip height: {}", e))),
        })
    }

    /// `GET /block/{hash}/raw` → raw block bytes.
    pub async fn raw_block(&self, endpoint: &ProviderEndpoint, hash: &BlockHash) -> Attempt<Vec<u8>> {
        let name = endpoint.to_string();
        let url = endpoint.url(&format!("/block/{}/raw", hash));
        match self.get(&name, &url).await {
            Attempt::Found(response) => match response.bytes().await {
                Ok(bytes) if bytes.len() < MIN_RAW_BLOCK_BYTES => {
                    tracing::debug!(source = %name, len = bytes.len(), "Raw block too short, treating as missing");
                    Attempt::Miss
                }
                Ok(bytes) => Attempt::Found(bytes.to_vec()),
                Err(e) => Attempt::Failed(SourceError::unavailable(&name, e)),
            },
            Attempt::Miss => Attempt::Miss,
            Attempt::Failed(e) => Attempt::Failed(e),
        }
    }

    /// `GET /tx/{txid}` → transaction outputs.
    pub async fn transaction(&self, endpoint: &ProviderEndpoint, txid: &Txid) -> Attempt<EsploraTx> {
        let url = endpoint.url(&format!("/tx/{}", txid));
        self.get_json(endpoint.as_str(), &url).await
    }

    /// `GET /fee-estimates` → confirmation target (as string) to sat/vB.
    pub async fn fee_estimates(&self, endpoint: &ProviderEndpoint) -> Attempt<HashMap<String, f64>> {
        let url = endpoint.url("/fee-estimates");
        self.get_json(endpoint.as_str(), &url).await
    }

    /// `POST /tx` with the hex body. A refusal carries the provider's own text.
    pub async fn broadcast(&self, endpoint: &ProviderEndpoint, tx_hex: &str) -> Attempt<()> {
        let name = endpoint.to_string();
        let result = self
            .http
            .post(endpoint.url("/tx"))
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(tx_hex.to_string())
            .send()
            .await;
        let response = match result {
            Ok(r) => r,
            Err(e) => return Attempt::Failed(SourceError::unavailable(&name, e)),
        };
        let status = response.status();
        if status.is_success() {
            return Attempt::Found(());
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|e| format!("status {}: {}", status, e));
        Attempt::Failed(SourceError::Rejected {
            source_name: name,
            message,
        })
    }

    /// blockchain.info `GET /rawblock/{hash}?format=hex`.
    pub async fn blockchain_info_raw_block(&self, base: &str, hash: &BlockHash) -> Attempt<Vec<u8>> {
        let name = format!("blockchain.info ({})", base);
        let url = format!("{}/rawblock/{}?format=hex", base, hash);
        self.get_text(&name, &url).await.and_then(|body| {
            let body = body.trim();
            if body.len() < MIN_BLOCKCHAIN_INFO_HEX {
                return Attempt::Miss;
            }
            decode_hex(&name, body)
        })
    }

    /// blockchair `GET /bitcoin[/testnet]/raw/block/{hash}`.
    pub async fn blockchair_raw_block(&self, base: &str, network: Network, hash: &BlockHash) -> Attempt<Vec<u8>> {
        let name = format!("blockchair ({})", base);
        let chain = match network {
            Network::Testnet => "bitcoin/testnet",
            _ => "bitcoin",
        };
        let url = format!("{}/{}/raw/block/{}", base, chain, hash);
        let key = hash.to_string();
        self.get_json::<serde_json::Value>(&name, &url).await.and_then(|value| {
            match value["data"][key.as_str()]["raw_block"].as_str() {
                Some(hex) => decode_hex(&name, hex),
                None => Attempt::Miss,
            }
        })
    }
}

fn decode_hex(name: &str, hex: &str) -> Attempt<Vec<u8>> {
    match Vec::<u8>::from_hex(hex) {
        Ok(bytes) => Attempt::Found(bytes),
        Err(e) => Attempt::Failed(SourceError::malformed(name, format!("bad hex: {}", e))),
    }
}
