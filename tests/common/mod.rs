//! Shared utilities for integration tests.
#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use bitcoin::blockdata::constants::genesis_block;
use bitcoin::hex::DisplayHex;
use bitcoin::{Block, BlockHash, Transaction, Txid};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use trustedcoin::backend::{AuthoritativeBackend, BackendError, BackendResult, FeeEstimateMode};
use trustedcoin::chain::Network;
use trustedcoin::config::TrustedcoinConfig;
use trustedcoin::engine::Engine;

/// One request seen by a mock provider.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Default)]
struct MockState {
    responses: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    log: Mutex<Vec<Hit>>,
}

/// Programmable HTTP server on a loopback port. Each provider is a path
/// prefix on it, so one server can stand in for several providers.
pub struct MockProviders {
    addr: SocketAddr,
    state: Arc<MockState>,
}

async fn handle(State(state): State<Arc<MockState>>, method: Method, uri: Uri, body: Bytes) -> Response {
    let key = format!("{} {}", method, uri.path());
    state.log.lock().unwrap().push(Hit {
        method: method.to_string(),
        path: uri.path().to_string(),
        body: body.to_vec(),
    });
    match state.responses.lock().unwrap().get(&key).cloned() {
        Some((status, body)) => (StatusCode::from_u16(status).unwrap(), body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

impl MockProviders {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, state }
    }

    /// Base URL of the provider called `name`.
    pub fn base(&self, name: &str) -> String {
        format!("http://{}/{}", self.addr, name)
    }

    /// Answer `method` on `/{name}{path}` with `status` and `body`.
    pub fn respond(&self, name: &str, method: &str, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        let key = format!("{} /{}{}", method, name, path);
        self.state.responses.lock().unwrap().insert(key, (status, body.into()));
    }

    /// Serve a block at `height` the way esplora does.
    pub fn serve_block(&self, name: &str, height: u64, block: &Block) {
        let hash = block.block_hash();
        self.respond(name, "GET", &format!("/block-height/{}", height), 200, hash.to_string());
        self.respond(name, "GET", &format!("/block/{}/raw", hash), 200, bitcoin::consensus::serialize(block));
    }

    /// Every request received, in arrival order.
    pub fn log(&self) -> Vec<Hit> {
        self.state.log.lock().unwrap().clone()
    }

    /// Requests received by provider `name`.
    pub fn hits(&self, name: &str) -> Vec<Hit> {
        let prefix = format!("/{}/", name);
        self.log().into_iter().filter(|h| h.path.starts_with(&prefix)).collect()
    }
}

/// In-memory authoritative backend with scripted answers.
#[derive(Default)]
pub struct ScriptedBackend {
    pub blocks: Vec<Block>,
    /// BTC/kvB for targets 2, 6, 12, 100; `None` entries mean "no estimate".
    pub fees: Option<[Option<f64>; 4]>,
    pub transactions: Vec<Transaction>,
    /// Rejection text for broadcasts; `None` accepts.
    pub reject_broadcast: Option<String>,
    /// Fail every call as if the node were unreachable.
    pub down: bool,
    pub calls: AtomicUsize,
}

impl ScriptedBackend {
    fn enter(&self) -> BackendResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down {
            return Err(BackendError::Rpc("connection refused".into()));
        }
        Ok(())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AuthoritativeBackend for ScriptedBackend {
    fn header_count(&self) -> BackendResult<u64> {
        self.enter()?;
        Ok(self.blocks.len().saturating_sub(1) as u64)
    }

    fn block_hash(&self, height: u64) -> BackendResult<BlockHash> {
        self.enter()?;
        self.blocks
            .get(height as usize)
            .map(|b| b.block_hash())
            .ok_or_else(|| BackendError::NoData(format!("height {}", height)))
    }

    fn block(&self, hash: &BlockHash) -> BackendResult<Block> {
        self.enter()?;
        self.blocks
            .iter()
            .find(|b| &b.block_hash() == hash)
            .cloned()
            .ok_or_else(|| BackendError::NoData(format!("block {}", hash)))
    }

    fn estimate_smart_fee(&self, target: u16, _mode: FeeEstimateMode) -> BackendResult<Option<f64>> {
        self.enter()?;
        let fees = self.fees.ok_or_else(|| BackendError::Rpc("estimatesmartfee unsupported".into()))?;
        let index = match target {
            2 => 0,
            6 => 1,
            12 => 2,
            _ => 3,
        };
        Ok(fees[index])
    }

    fn raw_transaction(&self, txid: &Txid) -> BackendResult<Transaction> {
        self.enter()?;
        self.transactions
            .iter()
            .find(|tx| &tx.compute_txid() == txid)
            .cloned()
            .ok_or_else(|| BackendError::NoData(format!("tx {}", txid)))
    }

    fn send_raw_transaction(&self, tx: &Transaction) -> BackendResult<Txid> {
        self.enter()?;
        match &self.reject_broadcast {
            Some(reason) => Err(BackendError::Rpc(reason.clone())),
            None => Ok(tx.compute_txid()),
        }
    }
}

/// Main-chain genesis followed by `len - 1` descendants. Each descendant keeps
/// the genesis coinbase so its encoding is long enough to count as a block.
pub fn chain(len: usize) -> Vec<Block> {
    let mut blocks = vec![genesis_block(bitcoin::Network::Bitcoin)];
    while blocks.len() < len {
        let parent = blocks[blocks.len() - 1].clone();
        blocks.push(child_of(&parent, 0));
    }
    blocks
}

/// A block extending `parent`. Different `salt` values give competing siblings.
pub fn child_of(parent: &Block, salt: u32) -> Block {
    let mut block = parent.clone();
    block.header.prev_blockhash = parent.block_hash();
    block.header.time = parent.header.time + 600 + salt;
    block
}

/// Config pointing at the given esplora bases only, with short timeouts.
pub fn test_config(esplora: Vec<String>) -> TrustedcoinConfig {
    let mut config = TrustedcoinConfig::default();
    config.network = Network::Bitcoin;
    config.providers.esplora = Some(esplora);
    config.providers.blockchain_info = false;
    config.providers.blockchair = false;
    config.timeouts.connect_secs = 1;
    config.timeouts.attempt_secs = 2;
    config.timeouts.operation_deadline_secs = 10;
    config
}

pub fn engine(esplora: Vec<String>, backend: Option<Arc<dyn AuthoritativeBackend>>) -> Engine {
    Engine::from_config(&test_config(esplora), backend).unwrap()
}

/// Engine for `network` with blockchain.info at `/bci` and blockchair at
/// `/chair` on the mock, plus the given esplora bases.
pub fn engine_with_block_sources(network: Network, mock: &MockProviders, esplora: Vec<String>) -> Engine {
    let mut config = test_config(esplora);
    config.network = network;
    config.providers.blockchain_info = true;
    config.providers.blockchain_info_url = mock.base("bci");
    config.providers.blockchair = true;
    config.providers.blockchair_url = mock.base("chair");
    Engine::from_config(&config, None).unwrap()
}

/// Blockchair's JSON envelope around a raw block.
pub fn blockchair_body(block: &Block) -> String {
    let hash = block.block_hash().to_string();
    let raw = bitcoin::consensus::serialize(block).to_lower_hex_string();
    serde_json::json!({ "data": { hash: { "raw_block": raw } } }).to_string()
}
