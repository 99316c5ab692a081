//! trustedcoin: Bitcoin chain data from a local node or public explorers,
//! verified before it is trusted.

pub mod backend;
pub mod chain;
pub mod config;
pub mod engine;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod providers;

pub use chain::Network;
pub use config::TrustedcoinConfig;
pub use engine::{Engine, EngineError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
