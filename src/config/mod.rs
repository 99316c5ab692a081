//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → TrustedcoinConfig (validated, immutable)
//!     → consumed once by lifecycle::startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the network never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::TrustedcoinConfig;
pub use schema::BitcoindConfig;
pub use schema::ProvidersConfig;
pub use schema::TimeoutConfig;
pub use schema::{FeeConfig, FeeShape};
pub use schema::{ListenerConfig, ObservabilityConfig, TrustCacheConfig};
