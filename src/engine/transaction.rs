//! Transaction lookup and broadcast.
//!
//! Lookups are checked only for txid equality; transactions carry no link
//! to previously trusted data.

use bitcoin::hex::FromHex;
use bitcoin::{Transaction, Txid};
use std::str::FromStr;
use std::time::Instant;

use crate::backend::BackendError;
use crate::chain::{BroadcastResult, TxDetails, TxOutputView};
use crate::engine::error::{EngineError, EngineResult, SourceError};
use crate::engine::fallback::{first_success, Attempt, Outcome};
use crate::engine::Engine;
use crate::observability::metrics;
use crate::providers::Source;

fn parse_txid(txid: &str) -> EngineResult<Txid> {
    Txid::from_str(txid.trim()).map_err(|e| EngineError::InvalidInput(format!("bad txid {:?}: {}", txid, e)))
}

fn decode_transaction(tx_hex: &str) -> Result<Transaction, BackendError> {
    let bytes = Vec::<u8>::from_hex(tx_hex).map_err(|e| BackendError::Encoding(format!("bad hex: {}", e)))?;
    bitcoin::consensus::deserialize(&bytes).map_err(|e| BackendError::Encoding(format!("bad transaction: {}", e)))
}

impl Engine {
    /// Outputs of `txid`, from the node or the first esplora endpoint that knows it.
    pub async fn get_transaction(&self, txid: &str) -> EngineResult<TxDetails> {
        let txid = parse_txid(txid)?;
        let started = Instant::now();
        let outcome = first_success("get_transaction", self.sources(), self.limits, |source| async move {
            match source {
                Source::Node => self
                    .call_backend("getrawtransaction", move |b| b.raw_transaction(&txid))
                    .await
                    .map(|tx| TxDetails::from_transaction(&tx)),
                Source::Esplora(endpoint) => {
                    let name = endpoint.to_string();
                    self.client.transaction(&endpoint, &txid).await.and_then(|tx| {
                        if tx.txid != txid {
                            return Attempt::Failed(SourceError::malformed(
                                &name,
                                format!("asked for {} but got {}", txid, tx.txid),
                            ));
                        }
                        match tx.into_details() {
                            Ok(details) => Attempt::Found(details),
                            Err(reason) => Attempt::Failed(SourceError::malformed(&name, reason)),
                        }
                    })
                }
                _ => Attempt::Miss,
            }
        })
        .await;
        metrics::record_operation("get_transaction", started);

        outcome.into_result("get_transaction")?.ok_or(EngineError::Exhausted {
            operation: "get_transaction",
            last: None,
        })
    }

    /// Output `vout` of `txid`. An index past the last output is `None`.
    pub async fn get_output(&self, txid: &str, vout: u32) -> EngineResult<Option<TxOutputView>> {
        let details = self.get_transaction(txid).await?;
        Ok(details.output(vout as usize).cloned())
    }

    /// Submit a raw transaction: node first, then every esplora endpoint until
    /// one accepts. A refusal carries the refusing source's own text.
    pub async fn send_raw_transaction(&self, tx_hex: &str) -> BroadcastResult {
        let tx_hex = tx_hex.trim();
        if tx_hex.is_empty() {
            return BroadcastResult::rejected("empty transaction");
        }
        let started = Instant::now();
        let outcome = first_success("send_raw_transaction", self.sources(), self.limits, |source| async move {
            match source {
                Source::Node => {
                    let hex = tx_hex.to_string();
                    self.call_backend("sendrawtransaction", move |b| {
                        let tx = decode_transaction(&hex)?;
                        b.send_raw_transaction(&tx)
                    })
                    .await
                    .map(|txid| tracing::info!(txid = %txid, "Transaction accepted by node"))
                }
                Source::Esplora(endpoint) => {
                    let accepted = self.client.broadcast(&endpoint, tx_hex).await;
                    if let Attempt::Found(()) = accepted {
                        tracing::info!(provider = %endpoint, "Transaction accepted by provider");
                    }
                    accepted
                }
                _ => Attempt::Miss,
            }
        })
        .await;
        metrics::record_operation("send_raw_transaction", started);

        match outcome {
            Outcome::Found(()) => BroadcastResult::accepted(),
            Outcome::Exhausted(last) => BroadcastResult::rejected(last.message()),
            Outcome::NotFound => BroadcastResult::rejected("no broadcast source available"),
            Outcome::DeadlineExceeded { deadline, last } => {
                let err = EngineError::DeadlineExceeded {
                    operation: "send_raw_transaction",
                    deadline,
                    last,
                };
                BroadcastResult::rejected(err.to_string())
            }
        }
    }
}
