//! Ordered fallback across sources.
//!
//! # Responsibilities
//! - Try candidate sources one at a time, in the order given
//! - Bound every attempt and the whole chain with deadlines
//! - Tell soft misses ("not there yet") apart from hard failures
//!
//! # Design Decisions
//! - Sequential only; no fan-out across providers
//! - Exactly one attempt per source per call, no retries
//! - The last hard failure is what the caller sees when nothing succeeds

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::engine::error::{EngineError, SourceError};
use crate::observability::metrics;

/// Result of asking a single source.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The source produced a usable answer.
    Found(T),
    /// The source does not have the data (yet). Not an error.
    Miss,
    /// The source failed or lied.
    Failed(SourceError),
}

impl<T> Attempt<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attempt<U> {
        match self {
            Attempt::Found(v) => Attempt::Found(f(v)),
            Attempt::Miss => Attempt::Miss,
            Attempt::Failed(e) => Attempt::Failed(e),
        }
    }

    /// Chain a fallible step onto a found value.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Attempt<U>) -> Attempt<U> {
        match self {
            Attempt::Found(v) => f(v),
            Attempt::Miss => Attempt::Miss,
            Attempt::Failed(e) => Attempt::Failed(e),
        }
    }
}

/// Result of walking a whole candidate list.
#[derive(Debug)]
pub enum Outcome<T> {
    Found(T),
    /// Every source missed softly and none failed.
    NotFound,
    /// At least one source failed and none succeeded; carries the last failure.
    Exhausted(SourceError),
    /// The chain deadline expired before a source answered.
    DeadlineExceeded {
        deadline: Duration,
        last: Option<SourceError>,
    },
}

impl<T> Outcome<T> {
    /// Convert into the engine's result type, keeping soft misses as `None`.
    pub fn into_result(self, operation: &'static str) -> Result<Option<T>, EngineError> {
        match self {
            Outcome::Found(v) => Ok(Some(v)),
            Outcome::NotFound => Ok(None),
            Outcome::Exhausted(last) => Err(EngineError::Exhausted {
                operation,
                last: Some(last),
            }),
            Outcome::DeadlineExceeded { deadline, last } => Err(EngineError::DeadlineExceeded {
                operation,
                deadline,
                last,
            }),
        }
    }
}

/// Deadlines applied to a fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackLimits {
    /// Longest a single source may take.
    pub attempt: Duration,
    /// Longest the whole chain may take.
    pub deadline: Duration,
}

impl Default for FallbackLimits {
    fn default() -> Self {
        Self {
            attempt: Duration::from_secs(10),
            deadline: Duration::from_secs(60),
        }
    }
}

/// Label a candidate for logs and metrics.
pub trait SourceLabel: Display {
    /// Low-cardinality name for metrics.
    fn kind(&self) -> &'static str;
}

/// Try `candidates` in order until one yields [`Attempt::Found`].
pub async fn first_success<C, T, F, Fut>(
    operation: &'static str,
    candidates: impl IntoIterator<Item = C>,
    limits: FallbackLimits,
    mut attempt: F,
) -> Outcome<T>
where
    C: SourceLabel,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let started = Instant::now();
    let mut last: Option<SourceError> = None;

    for candidate in candidates {
        let elapsed = started.elapsed();
        if elapsed >= limits.deadline {
            tracing::warn!(
                operation,
                deadline = ?limits.deadline,
                "Fallback deadline reached before all sources were tried"
            );
            return Outcome::DeadlineExceeded {
                deadline: limits.deadline,
                last,
            };
        }
        let budget = limits.attempt.min(limits.deadline - elapsed);
        let name = candidate.to_string();
        let kind = candidate.kind();

        tracing::debug!(operation, source = %name, "Trying source");
        let attempt_started = Instant::now();

        match timeout(budget, attempt(candidate)).await {
            Ok(Attempt::Found(value)) => {
                metrics::record_attempt(operation, kind, "found");
                tracing::debug!(operation, source = %name, "Source answered");
                return Outcome::Found(value);
            }
            Ok(Attempt::Miss) => {
                metrics::record_attempt(operation, kind, "miss");
                tracing::debug!(operation, source = %name, "Source has no data yet");
            }
            Ok(Attempt::Failed(err)) => {
                metrics::record_attempt(operation, kind, err.kind());
                if let SourceError::Verification { error, .. } = &err {
                    metrics::record_verification_failure(error.kind());
                    tracing::warn!(operation, source = %name, error = %error, "verification_failed");
                } else {
                    tracing::warn!(operation, source = %name, error = %err, "Source failed, trying next");
                }
                last = Some(err);
            }
            Err(_) => {
                metrics::record_attempt(operation, kind, "timeout");
                let err = SourceError::Timeout {
                    source_name: name.clone(),
                    elapsed: attempt_started.elapsed(),
                };
                tracing::warn!(operation, source = %name, budget = ?budget, "Source timed out, trying next");
                last = Some(err);
            }
        }
    }

    match last {
        Some(err) => {
            tracing::warn!(operation, error = %err, "All sources exhausted");
            Outcome::Exhausted(err)
        }
        None => Outcome::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    struct Named(&'static str);

    impl fmt::Display for Named {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl SourceLabel for Named {
        fn kind(&self) -> &'static str {
            "test"
        }
    }

    fn sources(names: &[&'static str]) -> Vec<Named> {
        names.iter().copied().map(Named).collect()
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let calls = AtomicUsize::new(0);
        let outcome = first_success("op", sources(&["a", "b", "c"]), FallbackLimits::default(), |s| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match s.0 {
                    "a" => Attempt::Failed(SourceError::unavailable("a", "down")),
                    "b" => Attempt::Found(2),
                    _ => Attempt::Found(3),
                }
            }
        })
        .await;

        assert!(matches!(outcome, Outcome::Found(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_soft_misses_is_not_found() {
        let outcome: Outcome<u8> =
            first_success("op", sources(&["a", "b"]), FallbackLimits::default(), |_| async {
                Attempt::Miss
            })
            .await;
        assert!(matches!(outcome, Outcome::NotFound));
        assert!(matches!(outcome.into_result("op"), Ok(None)));
    }

    #[tokio::test]
    async fn test_last_failure_is_reported() {
        let outcome: Outcome<u8> = first_success(
            "op",
            sources(&["a", "b", "c"]),
            FallbackLimits::default(),
            |s| async move {
                match s.0 {
                    "b" => Attempt::Miss,
                    name => Attempt::Failed(SourceError::malformed(name, "garbage")),
                }
            },
        )
        .await;

        match outcome {
            Outcome::Exhausted(SourceError::Malformed { source_name, .. }) => assert_eq!(source_name, "c"),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_candidate_list() {
        let outcome: Outcome<u8> =
            first_success("op", Vec::<Named>::new(), FallbackLimits::default(), |_| async {
                Attempt::Found(1)
            })
            .await;
        assert!(matches!(outcome, Outcome::NotFound));
    }

    #[tokio::test]
    async fn test_slow_source_times_out_and_next_is_tried() {
        let limits = FallbackLimits {
            attempt: Duration::from_millis(50),
            deadline: Duration::from_secs(5),
        };
        let outcome = first_success("op", sources(&["slow", "fast"]), limits, |s| async move {
            if s.0 == "slow" {
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            Attempt::Found(s.0)
        })
        .await;
        assert!(matches!(outcome, Outcome::Found("fast")));
    }

    #[tokio::test]
    async fn test_chain_deadline() {
        let limits = FallbackLimits {
            attempt: Duration::from_millis(80),
            deadline: Duration::from_millis(100),
        };
        let outcome: Outcome<u8> = first_success("op", sources(&["a", "b", "c"]), limits, |_| async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Attempt::Miss
        })
        .await;

        match outcome {
            Outcome::DeadlineExceeded { last, .. } => {
                assert!(matches!(last, Some(SourceError::Timeout { .. })));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
