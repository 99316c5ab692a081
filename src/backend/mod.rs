//! Authoritative backend (locally controlled full node).
//!
//! # Responsibilities
//! - Describe the node capabilities the engine consumes
//! - Wrap a bitcoind RPC connection behind that description
//!
//! # Design Decisions
//! - The node is trusted unconditionally; no answer from it is re-verified
//! - Any failure is reported as `BackendError` and the caller falls through to
//!   public providers for that single call; the handle is never rebuilt
//! - Calls are blocking; the engine moves them onto the blocking pool

pub mod bitcoind;

use bitcoin::{Block, BlockHash, Transaction, Txid};
use thiserror::Error;

pub use bitcoind::BitcoindBackend;

/// Fee estimation mode passed through to `estimatesmartfee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeEstimateMode {
    Conservative,
    Economical,
}

/// Errors surfaced by the authoritative backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection, transport or RPC-level failure.
    #[error("node RPC failed: {0}")]
    Rpc(String),

    /// The node answered but had nothing usable.
    #[error("node returned no data: {0}")]
    NoData(String),

    /// Input could not be turned into what the node expects.
    #[error("could not encode request: {0}")]
    Encoding(String),
}

/// Result type for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// The node operations the engine relies on.
pub trait AuthoritativeBackend: Send + Sync {
    /// Current header count (`getblockchaininfo.headers`).
    fn header_count(&self) -> BackendResult<u64>;

    fn block_hash(&self, height: u64) -> BackendResult<BlockHash>;

    fn block(&self, hash: &BlockHash) -> BackendResult<Block>;

    /// Fee rate for `target` blocks in BTC per kilo-vbyte, `None` when the
    /// node has not gathered enough data.
    fn estimate_smart_fee(&self, target: u16, mode: FeeEstimateMode) -> BackendResult<Option<f64>>;

    fn raw_transaction(&self, txid: &Txid) -> BackendResult<Transaction>;

    fn send_raw_transaction(&self, tx: &Transaction) -> BackendResult<Txid>;
}
