//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Apply CLI overrides → Validate → Build backend → Build engine
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Broadcast → HTTP server stops accepting → in-flight requests finish → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: an invalid config or an unbuildable RPC client is fatal
//! - An unreachable node is not fatal; calls fall through to providers

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{build_engine, StartupError};
