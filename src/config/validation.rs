//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, cache capacity > 0)
//! - Check that provider URLs and bind addresses parse
//! - Reject half-configured node credentials
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TrustedcoinConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::TrustedcoinConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.operation_deadline_secs ({deadline}) is shorter than timeouts.attempt_secs ({attempt})")]
    DeadlineShorterThanAttempt { deadline: u64, attempt: u64 },

    #[error("trust_cache.capacity must be greater than zero")]
    ZeroCacheCapacity,

    #[error("{field}: '{value}' is not an absolute http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("bitcoind.rpc_user and bitcoind.rpc_password must be set together")]
    IncompleteCredentials,
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    let ok = Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_addr(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &TrustedcoinConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let t = &config.timeouts;
    if t.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if t.attempt_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("attempt_secs"));
    }
    if t.operation_deadline_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("operation_deadline_secs"));
    } else if t.operation_deadline_secs < t.attempt_secs {
        errors.push(ValidationError::DeadlineShorterThanAttempt {
            deadline: t.operation_deadline_secs,
            attempt: t.attempt_secs,
        });
    }

    if config.trust_cache.capacity == 0 {
        errors.push(ValidationError::ZeroCacheCapacity);
    }

    for url in config.providers.esplora.iter().flatten() {
        check_url("providers.esplora", url, &mut errors);
    }
    if config.providers.blockchain_info {
        check_url("providers.blockchain_info_url", &config.providers.blockchain_info_url, &mut errors);
    }
    if config.providers.blockchair {
        check_url("providers.blockchair_url", &config.providers.blockchair_url, &mut errors);
    }

    check_addr("listener.bind_address", &config.listener.bind_address, &mut errors);
    if config.observability.metrics_enabled {
        check_addr("observability.metrics_address", &config.observability.metrics_address, &mut errors);
    }

    if config.bitcoind.rpc_user.is_some() != config.bitcoind.rpc_password.is_some() {
        errors.push(ValidationError::IncompleteCredentials);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
