//! Chain identity and the value objects handed back to callers.
//!
//! # Data Flow
//! ```text
//! config (network = "bitcoin")
//!     → network.rs (Network: provider defaults, RPC port, chain name)
//!     → types.rs (VerifiedBlock, TxOutputView, BroadcastResult)
//!     → returned by the engine, serialized by the HTTP layer
//! ```

pub mod network;
pub mod types;

pub use network::Network;
pub use types::{BroadcastResult, TxDetails, TxOutputView, VerifiedBlock};
