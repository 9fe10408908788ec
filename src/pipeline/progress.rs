// Progress reporting and cooperative cancellation.
//
// The pipeline never owns how progress is persisted or polled — it emits
// (stage, percent, message) tuples through an observer registered at
// invocation, and the surrounding job system does whatever it wants with
// them (webhook, polling table, log stream). Cancellation is the inverse
// channel: a shared flag the caller flips and the pipeline checks between
// stages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::error::Stage;

/// Observer for pipeline progress. Implementations must be cheap — the
/// pipeline calls this inline at stage checkpoints.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, stage: Stage, percent: u8, message: &str);
}

/// Sink that discards all progress. The default for callers that don't
/// track status.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_progress(&self, _stage: Stage, _percent: u8, _message: &str) {}
}

/// Shared cancellation flag, checked between stages (never mid-stage).
/// Clone freely — all clones observe the same flag.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_shared_across_clones() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let flag = CancelFlag::new();
        flag.cancel();
        flag.cancel();
        assert!(flag.is_cancelled());
    }
}
