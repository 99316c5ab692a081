//! Host-facing HTTP API.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, trace + timeout layers, graceful shutdown)
//!     → handlers.rs (parse path/body, call the engine)
//!     → JSON shaped like the host's backend methods
//! ```
//!
//! # Design Decisions
//! - Data-plane failures become null fields, never HTTP errors; the host
//!   reads nulls as "not available yet"
//! - `getchaininfo` is the exception: without a tip the host cannot proceed

pub mod handlers;
pub mod server;

pub use handlers::{ChainInfoResponse, RawBlockResponse, SendRawTransactionRequest, UtxoResponse};
pub use server::{AppState, HttpServer};
