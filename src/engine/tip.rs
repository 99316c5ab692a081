//! Chain tip lookup.

use std::time::Instant;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::fallback::{first_success, Attempt};
use crate::engine::Engine;
use crate::observability::metrics;
use crate::providers::Source;

impl Engine {
    /// Current best height: the node's header count, else an esplora tip.
    pub async fn get_tip(&self) -> EngineResult<u64> {
        let started = Instant::now();
        let outcome = first_success("get_tip", self.sources(), self.limits, |source| async move {
            match source {
                Source::Node => self.call_backend("getblockchaininfo", |b| b.header_count()).await,
                Source::Esplora(endpoint) => self.client.tip_height(&endpoint).await,
                _ => Attempt::Miss,
            }
        })
        .await;
        metrics::record_operation("get_tip", started);

        outcome.into_result("get_tip")?.ok_or(EngineError::Exhausted {
            operation: "get_tip",
            last: None,
        })
    }
}
