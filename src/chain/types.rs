//! Per-call value objects produced by the engine.

use bitcoin::hex::DisplayHex;
use bitcoin::{BlockHash, Transaction, Txid};
use serde::{Deserialize, Serialize};

/// A block that passed verification (or came from the trusted node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedBlock {
    pub height: u64,
    pub hash: BlockHash,
    /// Consensus-encoded block bytes.
    pub raw: Vec<u8>,
}

impl VerifiedBlock {
    /// Lowercase hex of the raw block, as the host expects it.
    pub fn raw_hex(&self) -> String {
        self.raw.to_lower_hex_string()
    }
}

/// The parts of a transaction output needed to answer "what does output N look like".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutputView {
    /// Value in satoshis.
    pub value: u64,
    /// Hex-encoded locking script.
    pub script_pubkey: String,
}

/// Transaction id plus its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxDetails {
    pub txid: Txid,
    pub outputs: Vec<TxOutputView>,
}

impl TxDetails {
    /// Build the view from a decoded transaction.
    pub fn from_transaction(tx: &Transaction) -> Self {
        let outputs = tx
            .output
            .iter()
            .map(|out| TxOutputView {
                value: out.value.to_sat(),
                script_pubkey: out.script_pubkey.to_hex_string(),
            })
            .collect();
        Self {
            txid: tx.compute_txid(),
            outputs,
        }
    }

    /// Output at `vout`, if the transaction has one.
    pub fn output(&self, vout: usize) -> Option<&TxOutputView> {
        self.outputs.get(vout)
    }
}

/// Outcome of a broadcast attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub success: bool,
    /// Rejection text surfaced verbatim from the last source that refused the transaction.
    pub errmsg: String,
}

impl BroadcastResult {
    pub fn accepted() -> Self {
        Self {
            success: true,
            errmsg: String::new(),
        }
    }

    pub fn rejected(errmsg: impl Into<String>) -> Self {
        Self {
            success: false,
            errmsg: errmsg.into(),
        }
    }
}
