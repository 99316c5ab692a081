//! bitcoind JSON-RPC adapter.

use bitcoin::{Block, BlockHash, Transaction, Txid};
use bitcoincore_rpc::json::EstimateMode;
use bitcoincore_rpc::{Auth, RpcApi as _};
use std::fmt;
use std::sync::Arc;

use crate::backend::{AuthoritativeBackend, BackendError, BackendResult, FeeEstimateMode};
use crate::config::BitcoindConfig;
use crate::chain::Network;

/// A bitcoind RPC connection, created once at startup.
#[derive(Clone)]
pub struct BitcoindBackend {
    inner: Arc<bitcoincore_rpc::Client>,
    endpoint: String,
}

impl BitcoindBackend {
    /// Build a client for `endpoint` ("http://host:port").
    ///
    /// This does not contact the node.
    pub fn new(endpoint: &str, user: String, password: String) -> BackendResult<Self> {
        let client = bitcoincore_rpc::Client::new(endpoint, Auth::UserPass(user, password))
            .map_err(|e| BackendError::Rpc(format!("invalid RPC endpoint {}: {}", endpoint, e)))?;
        Ok(Self {
            inner: Arc::new(client),
            endpoint: endpoint.to_string(),
        })
    }

    /// Build a client from configuration, or `None` when no credentials are set.
    pub fn from_config(config: &BitcoindConfig, network: Network) -> BackendResult<Option<Self>> {
        if !config.is_configured() {
            return Ok(None);
        }
        let endpoint = config.endpoint(network);
        let user = config.rpc_user.clone().unwrap_or_default();
        let password = config.rpc_password.clone().unwrap_or_default();
        Self::new(&endpoint, user, password).map(Some)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for BitcoindBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitcoindBackend")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

fn rpc_err(call: &str, e: bitcoincore_rpc::Error) -> BackendError {
    BackendError::Rpc(format!("{}: {}", call, e))
}

impl AuthoritativeBackend for BitcoindBackend {
    fn header_count(&self) -> BackendResult<u64> {
        self.inner
            .get_blockchain_info()
            .map(|info| info.headers)
            .map_err(|e| rpc_err("getblockchaininfo", e))
    }

    fn block_hash(&self, height: u64) -> BackendResult<BlockHash> {
        self.inner
            .get_block_hash(height)
            .map_err(|e| rpc_err("getblockhash", e))
    }

    fn block(&self, hash: &BlockHash) -> BackendResult<Block> {
        self.inner.get_block(hash).map_err(|e| rpc_err("getblock", e))
    }

    fn estimate_smart_fee(&self, target: u16, mode: FeeEstimateMode) -> BackendResult<Option<f64>> {
        let mode = match mode {
            FeeEstimateMode::Conservative => EstimateMode::Conservative,
            FeeEstimateMode::Economical => EstimateMode::Economical,
        };
        let result = self
            .inner
            .estimate_smart_fee(target, Some(mode))
            .map_err(|e| rpc_err("estimatesmartfee", e))?;
        if let Some(errors) = result.errors.filter(|errs| !errs.is_empty()) {
            tracing::debug!(target_blocks = target, errors = ?errors, "estimatesmartfee reported errors");
        }
        Ok(result.fee_rate.map(|rate| rate.to_btc()))
    }

    fn raw_transaction(&self, txid: &Txid) -> BackendResult<Transaction> {
        self.inner
            .get_raw_transaction(txid, None)
            .map_err(|e| rpc_err("getrawtransaction", e))
    }

    fn send_raw_transaction(&self, tx: &Transaction) -> BackendResult<Txid> {
        self.inner
            .send_raw_transaction(tx)
            .map_err(|e| rpc_err("sendrawtransaction", e))
    }
}
