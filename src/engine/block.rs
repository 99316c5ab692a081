//! Block retrieval and verification.
//!
//! # Responsibilities
//! - Resolve height → hash (node first, then esplora endpoints)
//! - Fetch the raw block (node first, then the network's raw-block sources)
//! - Verify provider blocks: self-hash against the resolved hash, transactions
//!   against the header's merkle root and witness commitment, parent against
//!   the trust cache
//! - Record the verified hash for the next height's linkage check

use bitcoin::{Block, BlockHash};
use std::time::Instant;

use crate::chain::{Network, VerifiedBlock};
use crate::engine::error::{EngineError, EngineResult, SourceError, VerificationError};
use crate::engine::fallback::{first_success, Attempt, Outcome};
use crate::engine::Engine;
use crate::observability::metrics;
use crate::providers::Source;

/// Check a provider's raw block against the resolved hash and the trusted parent.
///
/// Liquid blocks use the Elements encoding and cannot be decoded here; they
/// are passed through unverified.
pub fn verify_raw_block(
    source_name: &str,
    network: Network,
    height: u64,
    expected: BlockHash,
    trusted_parent: Option<BlockHash>,
    raw: Vec<u8>,
) -> Result<VerifiedBlock, SourceError> {
    if !network.has_bitcoin_block_encoding() {
        tracing::warn!(
            height,
            hash = %expected,
            source = source_name,
            "Passing through unverified block, encoding not checkable"
        );
        return Ok(VerifiedBlock {
            height,
            hash: expected,
            raw,
        });
    }

    let block: Block = bitcoin::consensus::deserialize(&raw)
        .map_err(|e| SourceError::malformed(source_name, format!("undecodable block: {}", e)))?;

    let actual = block.block_hash();
    if actual != expected {
        return Err(SourceError::verification(
            source_name,
            VerificationError::HashMismatch {
                height,
                expected,
                actual,
            },
        ));
    }

    // The header hash does not cover the transaction list.
    if !block.check_merkle_root() {
        return Err(SourceError::verification(
            source_name,
            VerificationError::MerkleMismatch { height },
        ));
    }
    if !block.check_witness_commitment() {
        return Err(SourceError::verification(
            source_name,
            VerificationError::WitnessCommitmentMismatch { height },
        ));
    }

    if let Some(known) = trusted_parent {
        let declared = block.header.prev_blockhash;
        if declared != known {
            return Err(SourceError::verification(
                source_name,
                VerificationError::ParentMismatch {
                    height,
                    declared,
                    known,
                },
            ));
        }
    }

    Ok(VerifiedBlock {
        height,
        hash: actual,
        raw,
    })
}

impl Engine {
    /// Map `height` to a block hash.
    pub async fn get_block_hash(&self, height: u64) -> EngineResult<BlockHash> {
        let outcome = first_success("get_block_hash", self.sources(), self.limits, |source| async move {
            match source {
                Source::Node => {
                    self.call_backend("getblockhash", move |b| b.block_hash(height))
                        .await
                }
                Source::Esplora(endpoint) => self.client.block_hash(&endpoint, height).await,
                _ => Attempt::Miss,
            }
        })
        .await;

        match outcome {
            Outcome::Found(hash) => Ok(hash),
            Outcome::NotFound => Err(EngineError::UnresolvedHeight { height, last: None }),
            Outcome::Exhausted(last) => Err(EngineError::UnresolvedHeight {
                height,
                last: Some(last),
            }),
            Outcome::DeadlineExceeded { last, .. } => Err(EngineError::UnresolvedHeight { height, last }),
        }
    }

    /// Fetch the block at `height`. `Ok(None)` means no source has it yet.
    pub async fn get_block(&self, height: u64) -> EngineResult<Option<VerifiedBlock>> {
        let started = Instant::now();
        let result = self.fetch_block(height).await;
        metrics::record_operation("get_block", started);
        result
    }

    async fn fetch_block(&self, height: u64) -> EngineResult<Option<VerifiedBlock>> {
        let hash = self.get_block_hash(height).await?;

        let mut candidates = Vec::new();
        if self.has_backend() {
            candidates.push(Source::Node);
        }
        candidates.extend(self.registry.block_sources());

        let outcome = first_success("get_block", candidates, self.limits, |source| async move {
            let name = source.to_string();
            let raw = match source {
                Source::Node => {
                    // Trusted: no self-hash or linkage check.
                    return self
                        .call_backend("getblock", move |b| b.block(&hash))
                        .await
                        .map(|block| VerifiedBlock {
                            height,
                            hash,
                            raw: bitcoin::consensus::serialize(&block),
                        });
                }
                Source::BlockchainInfo(base) => self.client.blockchain_info_raw_block(&base, &hash).await,
                Source::Blockchair(base) => self.client.blockchair_raw_block(&base, self.network, &hash).await,
                Source::Esplora(endpoint) => self.client.raw_block(&endpoint, &hash).await,
            };
            let parent = height.checked_sub(1).and_then(|h| self.trust.get(h));
            raw.and_then(|raw| match verify_raw_block(&name, self.network, height, hash, parent, raw) {
                Ok(block) => Attempt::Found(block),
                Err(e) => Attempt::Failed(e),
            })
        })
        .await;

        let block = outcome.into_result("get_block")?;
        match &block {
            Some(block) => {
                self.trust.record(block.height, block.hash);
                tracing::debug!(height, hash = %block.hash, "Block served");
            }
            None => tracing::debug!(height, hash = %hash, "No source has the block yet"),
        }
        Ok(block)
    }
}
