//! Caller-visible processing stages and the client-side state machine.
//!
//! The visible stages are deliberately decoupled from server progress: the
//! server reports no substage boundaries, so `extracting` and `analyzing`
//! are synthetic client-local stages. The contract is only that `Complete`
//! is reached if and only if the analyze call succeeds, and `Failed` if and
//! only if it errors or the client-side timeout fires.
//!
//! # Observers
//!
//! Inject a [`StageObserver`] to receive transition events (a terminal
//! spinner or a log line, say). All methods have default no-op
//! implementations so callers only override what they care about, and the
//! trait is `Send + Sync` so one observer can be shared across tasks.

use std::sync::Arc;

/// One caller-visible processing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// No request in flight. Initial state, and the target of every reset.
    Idle,
    /// File selected, upload in progress.
    Uploading,
    /// OCR / PDF parsing (synthetic on the client side).
    Extracting,
    /// LLM analysis (synthetic on the client side).
    Analyzing,
    /// The analyze call succeeded. Terminal until reset.
    Complete,
    /// The analyze call failed or timed out. Terminal until reset.
    Failed,
}

impl ProcessingStage {
    /// Human-readable label for progress displays.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingStage::Idle => "Idle",
            ProcessingStage::Uploading => "Uploading Document",
            ProcessingStage::Extracting => "Extracting Text",
            ProcessingStage::Analyzing => "AI Processing",
            ProcessingStage::Complete => "Complete",
            ProcessingStage::Failed => "Failed",
        }
    }

    /// `Complete` and `Failed` stay put until the caller resets.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStage::Complete | ProcessingStage::Failed)
    }
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Receives stage-transition events from a [`StageTracker`].
pub trait StageObserver: Send + Sync {
    /// Called after every successful transition, including reset to `Idle`.
    fn on_stage(&self, stage: ProcessingStage) {
        let _ = stage;
    }

    /// Called when the tracker enters `Failed`, with the single
    /// caller-visible error message.
    fn on_failed(&self, message: &str) {
        let _ = message;
    }
}

/// The client-side processing state machine.
///
/// ```text
/// idle ─▶ uploading ─▶ extracting ─▶ analyzing ─▶ complete
///              │            │            │
///              └────────────┴────────────┴──▶ failed
/// ```
///
/// `reset()` returns to `idle` from anywhere, unconditionally clearing the
/// stage and error; an in-flight request is simply abandoned by the caller.
pub struct StageTracker {
    stage: ProcessingStage,
    error: Option<String>,
    observers: Vec<Arc<dyn StageObserver>>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            stage: ProcessingStage::Idle,
            error: None,
            observers: Vec::new(),
        }
    }

    /// Attach an observer; events fire in attachment order.
    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn stage(&self) -> ProcessingStage {
        self.stage
    }

    /// The single caller-visible error message, set only in `Failed`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `idle → uploading`, fired on file selection. Returns `false` (and
    /// does nothing) from any other stage: a terminal result must be
    /// explicitly reset before the next document.
    pub fn begin_upload(&mut self) -> bool {
        if self.stage != ProcessingStage::Idle {
            return false;
        }
        self.transition(ProcessingStage::Uploading);
        true
    }

    /// Advance one synthetic step: `uploading → extracting → analyzing →
    /// complete`. No-op (returning `false`) from `idle` and from terminal
    /// stages.
    pub fn advance(&mut self) -> bool {
        let next = match self.stage {
            ProcessingStage::Uploading => ProcessingStage::Extracting,
            ProcessingStage::Extracting => ProcessingStage::Analyzing,
            ProcessingStage::Analyzing => ProcessingStage::Complete,
            _ => return false,
        };
        self.transition(next);
        true
    }

    /// Move to `Failed` with the given message. Reachable from any in-flight
    /// stage; rejected from `idle` and from terminal stages.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        match self.stage {
            ProcessingStage::Uploading
            | ProcessingStage::Extracting
            | ProcessingStage::Analyzing => {
                let message = message.into();
                self.error = Some(message.clone());
                self.transition(ProcessingStage::Failed);
                for obs in &self.observers {
                    obs.on_failed(&message);
                }
                true
            }
            _ => false,
        }
    }

    /// Unconditional return to `idle`, always available, clearing stage and
    /// error state.
    pub fn reset(&mut self) {
        self.error = None;
        self.transition(ProcessingStage::Idle);
    }

    fn transition(&mut self, next: ProcessingStage) {
        self.stage = next;
        for obs in &self.observers {
            obs.on_stage(next);
        }
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingObserver {
        stages: AtomicUsize,
        failures: AtomicUsize,
    }

    impl StageObserver for CountingObserver {
        fn on_stage(&self, _stage: ProcessingStage) {
            self.stages.fetch_add(1, Ordering::SeqCst);
        }
        fn on_failed(&self, _message: &str) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn happy_path_walks_all_stages() {
        let mut t = StageTracker::new();
        assert_eq!(t.stage(), ProcessingStage::Idle);
        assert!(t.begin_upload());
        assert_eq!(t.stage(), ProcessingStage::Uploading);
        assert!(t.advance());
        assert_eq!(t.stage(), ProcessingStage::Extracting);
        assert!(t.advance());
        assert_eq!(t.stage(), ProcessingStage::Analyzing);
        assert!(t.advance());
        assert_eq!(t.stage(), ProcessingStage::Complete);
        assert!(t.stage().is_terminal());
    }

    #[test]
    fn complete_is_terminal_until_reset() {
        let mut t = StageTracker::new();
        t.begin_upload();
        t.advance();
        t.advance();
        t.advance();
        assert!(!t.advance(), "advance past Complete must be a no-op");
        assert!(!t.fail("late failure"), "fail after Complete must be rejected");
        assert!(!t.begin_upload(), "new upload requires reset first");
        t.reset();
        assert_eq!(t.stage(), ProcessingStage::Idle);
        assert!(t.begin_upload());
    }

    #[test]
    fn failure_reachable_from_every_inflight_stage() {
        for advances in 0..3 {
            let mut t = StageTracker::new();
            t.begin_upload();
            for _ in 0..advances {
                t.advance();
            }
            assert!(t.fail("boom"));
            assert_eq!(t.stage(), ProcessingStage::Failed);
            assert_eq!(t.error(), Some("boom"));
        }
    }

    #[test]
    fn fail_from_idle_rejected() {
        let mut t = StageTracker::new();
        assert!(!t.fail("nothing in flight"));
        assert_eq!(t.error(), None);
    }

    #[test]
    fn reset_clears_error_and_is_always_available() {
        let mut t = StageTracker::new();
        t.begin_upload();
        t.fail("boom");
        t.reset();
        assert_eq!(t.stage(), ProcessingStage::Idle);
        assert_eq!(t.error(), None);

        // reset mid-flight abandons the request
        t.begin_upload();
        t.advance();
        t.reset();
        assert_eq!(t.stage(), ProcessingStage::Idle);
    }

    #[test]
    fn observer_sees_transitions_and_failures() {
        let obs = Arc::new(CountingObserver {
            stages: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        });
        let mut t = StageTracker::new().with_observer(obs.clone());
        t.begin_upload();
        t.advance();
        t.fail("boom");
        assert_eq!(obs.stages.load(Ordering::SeqCst), 3);
        assert_eq!(obs.failures.load(Ordering::SeqCst), 1);
    }
}
