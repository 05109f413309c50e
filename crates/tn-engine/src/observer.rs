//! Scheduler observer trait for tracing and instrumentation.

use tn_core::RequestId;

use crate::request::PathOutcome;
use crate::scheduler::Phase;

/// Callbacks invoked by the [`Scheduler`](crate::Scheduler) as it works.
///
/// All methods have default no-op implementations.  Observers run on the
/// thread that drives the scheduler, which is the worker thread in
/// multithreaded mode.
///
/// # Example — phase counter
///
/// ```rust,ignore
/// struct PhaseCounter { transitions: usize }
///
/// impl SchedulerObserver for PhaseCounter {
///     fn on_phase(&mut self, _id: RequestId, _from: Phase, _to: Phase) {
///         self.transitions += 1;
///     }
/// }
/// ```
pub trait SchedulerObserver: Send {
    /// The active request moved from `from` to `to`.
    fn on_phase(&mut self, _id: RequestId, _from: Phase, _to: Phase) {}

    /// A request finished and its outcome is about to be published.
    fn on_complete(&mut self, _outcome: &PathOutcome) {}

    /// A request was found stopped and dropped without a result.
    fn on_cancel(&mut self, _id: RequestId) {}
}

/// A [`SchedulerObserver`] that does nothing.
pub struct NoopObserver;

impl SchedulerObserver for NoopObserver {}
