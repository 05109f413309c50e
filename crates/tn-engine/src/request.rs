//! Path requests, their handles, and their outcomes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tn_core::{Point, RequestId};
use tn_path::{PathPoint, path_length};
use tn_search::PathConstraints;

/// Why a request did not produce a complete path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PathFailure {
    /// The search ran out of nodes before reaching the goal.
    Unreachable,
    /// The request used more than `max_steps` node expansions.
    StepBudgetExceeded,
    /// The request was cancelled.  Never delivered to a callback.
    Cancelled,
    /// Rejected at submit: a flee range that is negative or not finite.
    InvalidRequest,
}

/// What a finished request hands to its callback.
#[derive(Clone, Debug)]
pub struct PathOutcome {
    pub id:      RequestId,
    /// Ordered path points.  For a failed request this is the best-effort
    /// partial route if the request opted in, otherwise empty.
    pub points:  Vec<PathPoint>,
    pub success: bool,
    pub failure: Option<PathFailure>,
    /// Total fine search cost of the route.
    pub cost:    u32,
}

impl PathOutcome {
    pub(crate) fn failed(id: RequestId, failure: PathFailure, points: Vec<PathPoint>, cost: u32) -> Self {
        Self { id, points, success: false, failure: Some(failure), cost }
    }

    /// Euclidean length of the route.
    pub fn length(&self) -> f32 {
        path_length(&self.points)
    }
}

/// Completion callback.  Runs on the thread that calls
/// [`Pathfinder::poll`](crate::Pathfinder::poll).
pub type PathCallback = Box<dyn FnOnce(PathOutcome) + Send + 'static>;

// ── Request ───────────────────────────────────────────────────────────────────

/// A path query as submitted by a movement consumer.
#[derive(Copy, Clone, Debug)]
pub struct PathRequest {
    pub src:         Point,
    pub dst:         Point,
    /// Any point within this distance of `dst` with a direct line to it is
    /// accepted as the goal.
    pub radius:      f32,
    pub constraints: PathConstraints,
    /// Jump the queue, behind earlier urgent requests.
    pub urgent:      bool,
}

impl PathRequest {
    pub fn new(src: Point, dst: Point) -> Self {
        Self { src, dst, radius: 0.0, constraints: PathConstraints::default(), urgent: false }
    }

    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = radius.max(0.0);
        self
    }

    pub fn constraints(mut self, constraints: PathConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn urgent(mut self, urgent: bool) -> Self {
        self.urgent = urgent;
        self
    }
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Lifecycle of a request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestState {
    Pending   = 0,
    Succeeded = 1,
    Failed    = 2,
    Stopped   = 3,
}

impl RequestState {
    fn from_u8(v: u8) -> RequestState {
        match v {
            0 => RequestState::Pending,
            1 => RequestState::Succeeded,
            2 => RequestState::Failed,
            _ => RequestState::Stopped,
        }
    }
}

/// Shared view of one request's state.  Cheap to clone.
#[derive(Clone, Debug)]
pub struct PathHandle {
    id:    RequestId,
    state: Arc<AtomicU8>,
}

impl PathHandle {
    pub(crate) fn new(id: RequestId) -> Self {
        Self { id, state: Arc::new(AtomicU8::new(RequestState::Pending as u8)) }
    }

    #[inline]
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn state(&self) -> RequestState {
        RequestState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.state() == RequestState::Pending
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.state() == RequestState::Stopped
    }

    /// Force the state to `Stopped`, returning the state it replaced.
    pub(crate) fn stop(&self) -> RequestState {
        RequestState::from_u8(self.state.swap(RequestState::Stopped as u8, Ordering::AcqRel))
    }

    /// Move `Pending → to`.  Returns `false` if the request already left
    /// `Pending`, e.g. because it was cancelled first.
    pub(crate) fn finish(&self, to: RequestState) -> bool {
        self.state
            .compare_exchange(
                RequestState::Pending as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// A queued request with everything needed to answer it.
pub(crate) struct Job {
    pub request:  PathRequest,
    pub handle:   PathHandle,
    pub callback: PathCallback,
}

impl Job {
    #[inline]
    pub fn id(&self) -> RequestId {
        self.handle.id()
    }
}

/// A finished job on its way back to the polling thread.
pub(crate) struct Completed {
    pub handle:   PathHandle,
    pub callback: PathCallback,
    pub outcome:  PathOutcome,
}
