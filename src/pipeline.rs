use crate::config::Config;
use crate::engine::collector::{self, CollectProgress, Collection, StopReason};
use crate::engine::validator::{self, Violation};
use crate::error::{MalformedTimestampError, NavigationError};
use crate::feed::types::Item;
use crate::feed::Session;
use serde::Serialize;
use std::time::Instant;
use tokio::sync::watch;

/// Why a collection ended short of its quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ShortfallCause {
    /// The listing offered no further page.
    SourceExhausted { pages: u32 },
    /// A page came back with no entries; either the listing ended or the
    /// extractor no longer matches the markup.
    EmptyPage { page: u32 },
}

/// A run that finished but cannot be trusted as complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RunFailure {
    Shortfall {
        collected: usize,
        target: u32,
        cause: ShortfallCause,
    },
    MalformedTimestamp { position: usize, raw: String },
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunFailure::Shortfall {
                collected,
                target,
                cause,
            } => {
                write!(f, "collected {} of {} items: ", collected, target)?;
                match cause {
                    ShortfallCause::SourceExhausted { pages } => {
                        write!(f, "listing exhausted after {} page(s)", pages)
                    }
                    ShortfallCause::EmptyPage { page } => {
                        write!(f, "page {} returned no items", page)
                    }
                }
            }
            RunFailure::MalformedTimestamp { position, raw } => {
                write!(f, "item {} has unparseable timestamp {:?}", position, raw)
            }
        }
    }
}

impl From<MalformedTimestampError> for RunFailure {
    fn from(e: MalformedTimestampError) -> Self {
        RunFailure::MalformedTimestamp {
            position: e.position,
            raw: e.raw,
        }
    }
}

/// Outcome of one collect-and-validate pass.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub items: Vec<Item>,
    pub violations: Vec<Violation>,
    pub duration_ms: u64,
    pub success: bool,
    pub failure: Option<RunFailure>,
    pub pages_visited: u32,
    pub dropped: usize,
}

impl RunResult {
    /// Quota met and ordering held.
    pub fn passed(&self) -> bool {
        self.success && self.violations.is_empty()
    }
}

fn shortfall(collection: &Collection, target: u32) -> Option<RunFailure> {
    if collection.reached(target) {
        return None;
    }
    let cause = match collection.stop {
        StopReason::EmptyPage { page } => ShortfallCause::EmptyPage { page },
        StopReason::NoNextPage { page } => ShortfallCause::SourceExhausted { pages: page },
        StopReason::QuotaMet => ShortfallCause::SourceExhausted {
            pages: collection.pages_visited,
        },
    };
    Some(RunFailure::Shortfall {
        collected: collection.items.len(),
        target,
        cause,
    })
}

/// Collect, then validate. Only a navigation that exhausts its retries is
/// returned as an error; shortfall and malformed timestamps land in
/// `RunResult::failure`.
pub async fn run_validation<S>(
    session: &S,
    config: &Config,
    progress: &watch::Sender<CollectProgress>,
) -> Result<RunResult, NavigationError>
where
    S: Session + ?Sized,
{
    let started = Instant::now();
    let collection = collector::collect(session, config, progress).await?;

    let mut failure = shortfall(&collection, config.target_count);
    let violations = match validator::validate(&collection.items) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(position = e.position, raw = %e.raw, "malformed timestamp, run aborted");
            failure = Some(e.into());
            Vec::new()
        }
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    if let Some(f) = &failure {
        tracing::warn!(failure = %f, "run incomplete");
    }
    tracing::info!(
        items = collection.items.len(),
        violations = violations.len(),
        duration_ms,
        "validation finished"
    );

    Ok(RunResult {
        items: collection.items,
        violations,
        duration_ms,
        success: failure.is_none(),
        failure,
        pages_visited: collection.pages_visited,
        dropped: collection.dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(n: usize, stop: StopReason) -> Collection {
        let items = (0..n)
            .map(|i| Item {
                title: format!("item {}", i),
                timestamp: "2024-10-17T12:00:00".to_string(),
                relative_age: String::new(),
            })
            .collect();
        Collection {
            items,
            pages_visited: 2,
            dropped: 0,
            stop,
        }
    }

    #[test]
    fn test_no_shortfall_when_quota_met() {
        assert_eq!(shortfall(&collection(10, StopReason::QuotaMet), 10), None);
    }

    #[test]
    fn test_shortfall_distinguishes_causes() {
        let exhausted = shortfall(&collection(4, StopReason::NoNextPage { page: 2 }), 10);
        assert_eq!(
            exhausted,
            Some(RunFailure::Shortfall {
                collected: 4,
                target: 10,
                cause: ShortfallCause::SourceExhausted { pages: 2 },
            })
        );

        let empty = shortfall(&collection(0, StopReason::EmptyPage { page: 1 }), 10);
        assert!(matches!(
            empty,
            Some(RunFailure::Shortfall {
                cause: ShortfallCause::EmptyPage { page: 1 },
                ..
            })
        ));
    }

    #[test]
    fn test_failure_display() {
        let f = RunFailure::Shortfall {
            collected: 3,
            target: 100,
            cause: ShortfallCause::SourceExhausted { pages: 1 },
        };
        assert_eq!(f.to_string(), "collected 3 of 100 items: listing exhausted after 1 page(s)");
    }
}
