//! Observer trait for per-stage pipeline events.
//!
//! Inject an [`Arc<dyn PipelineObserver>`] via
//! [`crate::config::PipelineConfigBuilder::observer`] to receive events as a
//! run moves through download, classification, extraction and enrichment.
//! The CLI drives its spinner from these; a server could forward them to a
//! websocket or an audit log without the library knowing about either.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docenrich::{PipelineConfig, PipelineObserver, StepName};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct StageCounter(AtomicUsize);
//!
//! impl PipelineObserver for StageCounter {
//!     fn on_stage_start(&self, _step: StepName) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .observer(Arc::new(StageCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::StepName;
use crate::output::{ExtractionOutcome, PipelineResult};
use std::sync::Arc;

/// Receives pipeline events.
///
/// Implementations must be `Send + Sync`: [`crate::stream::run_stream`] runs
/// several documents at once and every run reports to the same observer.
/// All methods default to no-ops so callers only override what they need.
pub trait PipelineObserver: Send + Sync {
    /// Called when a named stage begins.
    fn on_stage_start(&self, step: StepName) {
        let _ = step;
    }

    /// Called after every extraction attempt, successful or not.
    fn on_attempt_complete(&self, outcome: &ExtractionOutcome) {
        let _ = outcome;
    }

    /// Called once with the final result of a run.
    fn on_run_complete(&self, result: &PipelineResult) {
        let _ = result;
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ObserverHandle = Arc<dyn PipelineObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::output::AttemptFailure;
    use crate::pipeline::strategy::{ExtractionAttempt, StrategyId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingObserver {
        stages: AtomicUsize,
        failed_attempts: AtomicUsize,
    }

    impl PipelineObserver for TrackingObserver {
        fn on_stage_start(&self, _step: StepName) {
            self.stages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_attempt_complete(&self, outcome: &ExtractionOutcome) {
            if !outcome.succeeded {
                self.failed_attempts.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        obs.on_stage_start(StepName::Download);
        obs.on_stage_start(StepName::Enrich);
    }

    #[test]
    fn tracking_observer_counts_failures() {
        let obs = TrackingObserver::default();
        obs.on_stage_start(StepName::Extract);

        let attempt = ExtractionAttempt {
            strategy: StrategyId::DocumentUnderstandingService,
            ordinal: 0,
        };
        obs.on_attempt_complete(&ExtractionOutcome::failure(
            attempt,
            AttemptFailure::new(ErrorKind::Unreachable, "timed out after 1s"),
        ));
        obs.on_attempt_complete(&ExtractionOutcome::success(
            ExtractionAttempt {
                strategy: StrategyId::PlaceholderDescription,
                ordinal: 1,
            },
            "text".into(),
        ));

        assert_eq!(obs.stages.load(Ordering::SeqCst), 1);
        assert_eq!(obs.failed_attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let obs: ObserverHandle = Arc::new(NoopObserver);
        obs.on_stage_start(StepName::Classify);
    }
}
