//! Fee estimation.
//!
//! # Responsibilities
//! - Ask the node for four smart-fee estimates; use them only if all four exist
//! - Otherwise read an esplora fee table and normalize it to the same unit
//! - Present the result either as a feerate table or as channel-lifecycle rates
//!
//! All rates leaving this module are satoshis per kilo-vbyte.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

use crate::backend::{BackendError, FeeEstimateMode};
use crate::engine::error::{EngineError, EngineResult, SourceError};
use crate::engine::fallback::{first_success, Attempt};
use crate::engine::Engine;
use crate::observability::metrics;
use crate::providers::Source;

/// BTC/kvB → sat/kvB.
pub const SATS_PER_BTC: f64 = 100_000_000.0;
/// sat/vB → sat/kvB.
pub const PROVIDER_SCALE: f64 = 1_000.0;

/// Node confirmation targets, fastest first, with the mode used for each.
const NODE_TARGETS: [(u16, FeeEstimateMode); 4] = [
    (2, FeeEstimateMode::Conservative),
    (6, FeeEstimateMode::Economical),
    (12, FeeEstimateMode::Economical),
    (100, FeeEstimateMode::Economical),
];

/// Esplora fee-table buckets, fastest first. "504" is roughly one week.
const PROVIDER_BUCKETS: [u16; 4] = [2, 5, 10, 504];

/// Where a set of estimates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeSource {
    Node,
    Provider,
}

/// Four normalized rates in sat/kvB, fastest horizon first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimates {
    pub source: FeeSource,
    pub very_urgent: u64,
    pub urgent: u64,
    pub normal: u64,
    pub slow: u64,
}

impl FeeEstimates {
    /// Build from node estimates in BTC/kvB, fastest first.
    pub fn from_node(rates: [f64; 4]) -> Self {
        let [very_urgent, urgent, normal, slow] = rates.map(|r| (r * SATS_PER_BTC).round() as u64);
        Self {
            source: FeeSource::Node,
            very_urgent,
            urgent,
            normal,
            slow,
        }
    }

    /// Build from an esplora fee table (target → sat/vB).
    ///
    /// Returns the name of the first missing bucket on failure.
    pub fn from_provider_table(table: &HashMap<String, f64>) -> Result<Self, String> {
        let mut rates = [0u64; 4];
        for (slot, bucket) in rates.iter_mut().zip(PROVIDER_BUCKETS) {
            let key = bucket.to_string();
            let rate = table
                .get(&key)
                .copied()
                .filter(|r| r.is_finite() && *r >= 0.0)
                .ok_or(key)?;
            *slot = (rate * PROVIDER_SCALE) as u64;
        }
        let [very_urgent, urgent, normal, slow] = rates;
        Ok(Self {
            source: FeeSource::Provider,
            very_urgent,
            urgent,
            normal,
            slow,
        })
    }

    /// Confirmation targets the four rates correspond to.
    pub fn targets(&self) -> [u16; 4] {
        match self.source {
            FeeSource::Node => NODE_TARGETS.map(|(target, _)| target),
            FeeSource::Provider => PROVIDER_BUCKETS,
        }
    }

    /// Lowest rate worth paying; the slow horizon.
    pub fn floor(&self) -> u64 {
        self.slow
    }

    pub fn feerate_table(&self) -> FeeRateTable {
        let rates = [self.very_urgent, self.urgent, self.normal, self.slow];
        FeeRateTable {
            feerate_floor: Some(self.floor()),
            feerates: self
                .targets()
                .into_iter()
                .zip(rates)
                .map(|(blocks, feerate)| FeeRateEntry {
                    blocks: Some(blocks),
                    feerate: Some(feerate),
                })
                .collect(),
        }
    }

    /// Patience-tolerant stages draw from the slow horizon, urgency-sensitive
    /// ones from the faster ones.
    pub fn channel_rates(&self) -> ChannelFeeRates {
        ChannelFeeRates {
            opening: Some(self.slow),
            mutual_close: Some(self.normal),
            unilateral_close: Some(self.very_urgent),
            delayed_to_us: Some(self.slow),
            htlc_resolution: Some(self.normal),
            penalty: Some(self.urgent),
            min_acceptable: Some(self.slow / 2),
            max_acceptable: Some(self.very_urgent.saturating_mul(100)),
        }
    }
}

/// Node-facing shape: a floor plus per-target rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRateTable {
    pub feerate_floor: Option<u64>,
    pub feerates: Vec<FeeRateEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRateEntry {
    pub blocks: Option<u16>,
    pub feerate: Option<u64>,
}

impl FeeRateTable {
    /// All-null result. Means "unknown", never "free".
    pub fn unknown() -> Self {
        Self {
            feerate_floor: None,
            feerates: Vec::new(),
        }
    }
}

/// Channel-facing shape: one rate per lifecycle stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelFeeRates {
    pub opening: Option<u64>,
    pub mutual_close: Option<u64>,
    pub unilateral_close: Option<u64>,
    pub delayed_to_us: Option<u64>,
    pub htlc_resolution: Option<u64>,
    pub penalty: Option<u64>,
    pub min_acceptable: Option<u64>,
    pub max_acceptable: Option<u64>,
}

impl ChannelFeeRates {
    /// All-null result. Means "unknown", never "free".
    pub fn unknown() -> Self {
        Self::default()
    }
}

impl Engine {
    /// Current fee estimates from the node, else from an esplora fee table.
    pub async fn get_fee_rates(&self) -> EngineResult<FeeEstimates> {
        let started = Instant::now();
        let outcome = first_success("get_fee_rates", self.sources(), self.limits, |source| async move {
            match source {
                Source::Node => self
                    .call_backend("estimatesmartfee", |backend| {
                        let mut rates = [0f64; 4];
                        for (slot, (target, mode)) in rates.iter_mut().zip(NODE_TARGETS) {
                            *slot = backend.estimate_smart_fee(target, mode)?.ok_or_else(|| {
                                BackendError::NoData(format!("no fee estimate for {} blocks", target))
                            })?;
                        }
                        Ok(FeeEstimates::from_node(rates))
                    })
                    .await,
                Source::Esplora(endpoint) => {
                    let name = endpoint.to_string();
                    self.client
                        .fee_estimates(&endpoint)
                        .await
                        .and_then(|table| match FeeEstimates::from_provider_table(&table) {
                            Ok(estimates) => Attempt::Found(estimates),
                            Err(bucket) => Attempt::Failed(SourceError::malformed(
                                &name,
                                format!("fee table lacks bucket {}", bucket),
                            )),
                        })
                }
                _ => Attempt::Miss,
            }
        })
        .await;
        metrics::record_operation("get_fee_rates", started);

        let estimates = outcome.into_result("get_fee_rates")?.ok_or(EngineError::Exhausted {
            operation: "get_fee_rates",
            last: None,
        })?;
        tracing::debug!(source = ?estimates.source, slow = estimates.slow, "Fee estimates resolved");
        Ok(estimates)
    }
}
