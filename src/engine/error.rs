//! Error kinds for source attempts and engine operations.

use bitcoin::BlockHash;
use std::time::Duration;
use thiserror::Error;

/// Why a fetched block was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("block {height} hashes to {actual}, expected {expected}")]
    HashMismatch {
        height: u64,
        expected: BlockHash,
        actual: BlockHash,
    },

    #[error(
        "block {height} declares parent {declared} but block {} is known to be {known}",
        .height - 1
    )]
    ParentMismatch {
        height: u64,
        declared: BlockHash,
        known: BlockHash,
    },

    #[error("block {height} transactions do not match its merkle root")]
    MerkleMismatch { height: u64 },

    #[error("block {height} witness data does not match its coinbase commitment")]
    WitnessCommitmentMismatch { height: u64 },
}

impl VerificationError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            VerificationError::HashMismatch { .. } => "hash_mismatch",
            VerificationError::ParentMismatch { .. } => "parent_mismatch",
            VerificationError::MerkleMismatch { .. } => "merkle_mismatch",
            VerificationError::WitnessCommitmentMismatch { .. } => "witness_commitment_mismatch",
        }
    }
}

/// A failed attempt against one source. Every variant is non-fatal: the
/// engine moves on to the next source.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Network or connection failure, or an error status.
    #[error("{source_name} unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    /// Unparseable hash, JSON, hex or block encoding.
    #[error("malformed response from {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },

    /// The data parsed but did not check out.
    #[error("verification failed for {source_name}: {error}")]
    Verification {
        source_name: String,
        error: VerificationError,
    },

    /// The source understood the request and refused it (broadcasts).
    #[error("{source_name} rejected the request: {message}")]
    Rejected { source_name: String, message: String },

    /// The attempt did not finish within its deadline.
    #[error("{source_name} timed out after {elapsed:?}")]
    Timeout { source_name: String, elapsed: Duration },
}

impl SourceError {
    pub fn unavailable(source_name: impl ToString, reason: impl ToString) -> Self {
        SourceError::Unavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(source_name: impl ToString, reason: impl ToString) -> Self {
        SourceError::Malformed {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn verification(source_name: impl ToString, error: VerificationError) -> Self {
        SourceError::Verification {
            source_name: source_name.to_string(),
            error,
        }
    }

    /// Text to hand back to a caller that asked for the source's own words.
    pub fn message(&self) -> String {
        match self {
            SourceError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Label used for the `outcome` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Unavailable { .. } => "unavailable",
            SourceError::Malformed { .. } => "malformed",
            SourceError::Verification { .. } => "verification_failed",
            SourceError::Rejected { .. } => "rejected",
            SourceError::Timeout { .. } => "timeout",
        }
    }
}

/// Terminal errors returned to callers of the engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// No source could map the height to a hash.
    #[error("unresolved height {height}{}", describe_last(.last))]
    UnresolvedHeight {
        height: u64,
        last: Option<SourceError>,
    },

    /// Every source was tried and none produced a usable answer.
    #[error("all sources exhausted for {operation}{}", describe_last(.last))]
    Exhausted {
        operation: &'static str,
        last: Option<SourceError>,
    },

    /// The fallback chain ran out of time before a source answered.
    #[error("{operation} exceeded its {deadline:?} deadline{}", describe_last(.last))]
    DeadlineExceeded {
        operation: &'static str,
        deadline: Duration,
        last: Option<SourceError>,
    },

    /// The caller passed something that can never succeed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

fn describe_last(last: &Option<SourceError>) -> String {
    match last {
        Some(err) => format!(": {}", err),
        None => String::new(),
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
