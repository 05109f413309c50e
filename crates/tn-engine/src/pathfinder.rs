//! The served API: submit, cancel, poll, and the reservation calls.
//!
//! With `multithreaded = true` a dedicated worker thread owns the
//! [`Scheduler`] and all search state.  It sleeps on the queue's condition
//! variable while there is nothing to do.  Otherwise the scheduler lives
//! inside the `Pathfinder` and [`Pathfinder::poll`] drives it.
//!
//! Either way, results come back over a `crossbeam-channel` and callbacks run
//! on the thread that calls `poll`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, info, warn};

use tn_core::{EntityId, NodeRef, Point, PortalId, RequestId};
use tn_path::PathPoint;
use tn_reserve::{Claim, SharedReservations};
use tn_terrain::TerrainMap;

use crate::error::{EngineError, EngineResult};
use crate::observer::SchedulerObserver;
use crate::queue::RequestQueue;
use crate::request::{Completed, Job, PathCallback, PathFailure, PathHandle, PathOutcome, PathRequest, RequestState};
use crate::scheduler::{Env, Scheduler};

/// Scheduler ticks run per [`Pathfinder::poll`] in single-threaded mode.
const INLINE_TICKS_PER_POLL: usize = 16;

enum Driver {
    Threaded { worker: Option<JoinHandle<()>> },
    Inline { scheduler: Box<Scheduler> },
}

pub struct Pathfinder {
    terrain:      Arc<ArcSwap<TerrainMap>>,
    reservations: SharedReservations,
    queue:        Arc<RequestQueue>,
    results_tx:   Sender<Completed>,
    results:      Receiver<Completed>,
    driver:       Driver,
    next_id:      u64,
    /// Submitted requests whose callback has not run and that were not
    /// cancelled.
    in_flight:    usize,
}

impl Pathfinder {
    pub(crate) fn start(env: Env, observer: Box<dyn SchedulerObserver>) -> EngineResult<Self> {
        let terrain = Arc::clone(&env.terrain);
        let reservations = env.reservations.clone();
        let multithreaded = env.settings.multithreaded;
        let queue = Arc::new(RequestQueue::new());
        let (results_tx, results) = unbounded();
        let scheduler = Scheduler::new(env, Arc::clone(&queue), results_tx.clone(), observer);

        let driver = if multithreaded {
            let worker_queue = Arc::clone(&queue);
            let worker = thread::Builder::new()
                .name("tn-path-worker".to_string())
                .spawn(move || run_worker(scheduler, worker_queue))
                .map_err(EngineError::WorkerSpawn)?;
            Driver::Threaded { worker: Some(worker) }
        } else {
            info!("pathfinder running inline");
            Driver::Inline { scheduler: Box::new(scheduler) }
        };

        Ok(Self { terrain, reservations, queue, results_tx, results, driver, next_id: 0, in_flight: 0 })
    }

    // ── Requests ──────────────────────────────────────────────────────────

    /// Queue `request`.  `callback` runs inside a later [`poll`](Self::poll)
    /// unless the request is cancelled first.
    ///
    /// A non-flee request whose source and destination share a cell is
    /// answered at once without entering the queue, as is a flee request
    /// with an unusable range.
    pub fn submit(
        &mut self,
        request:  PathRequest,
        callback: impl FnOnce(PathOutcome) + Send + 'static,
    ) -> PathHandle {
        let id = self.allocate_id();
        let handle = PathHandle::new(id);
        let callback: PathCallback = Box::new(callback);
        self.in_flight += 1;

        if let Some(flee) = request.constraints.flee.filter(|f| !f.range.is_finite() || f.range < 0.0) {
            warn!(%id, range = flee.range, "flee range rejected");
            let outcome = PathOutcome::failed(id, PathFailure::InvalidRequest, Vec::new(), 0);
            self.answer_now(&handle, RequestState::Failed, callback, outcome);
            return handle;
        }
        if request.constraints.flee.is_none() && request.src.cell() == request.dst.cell() {
            debug!(%id, "trivial request answered without search");
            self.answer_now(&handle, RequestState::Succeeded, callback, trivial_outcome(id, request.dst));
            return handle;
        }

        self.queue.push(Job { request, handle: handle.clone(), callback });
        handle
    }

    /// Stop a request.  Its callback will not run.  Returns `false` if it
    /// was already cancelled.
    pub fn cancel(&mut self, handle: &PathHandle) -> bool {
        let previous = handle.stop();
        if previous == RequestState::Stopped {
            return false;
        }
        self.queue.remove(handle.id());
        // Finished results still travel through the channel and are counted
        // off there.
        if previous == RequestState::Pending {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        debug!(id = %handle.id(), "request cancelled");
        true
    }

    /// Run pending scheduler work (single-threaded mode) and deliver every
    /// finished result to its callback.  Returns the number of callbacks run.
    pub fn poll(&mut self) -> usize {
        if let Driver::Inline { scheduler } = &mut self.driver {
            for _ in 0..INLINE_TICKS_PER_POLL {
                if !scheduler.is_busy() && self.queue.is_empty() {
                    break;
                }
                scheduler.tick();
            }
        }

        let mut delivered = 0;
        while let Ok(done) = self.results.try_recv() {
            delivered += usize::from(self.deliver(done));
        }
        delivered
    }

    /// Poll until every submitted request has been delivered or cancelled,
    /// or until `timeout` passes.  Returns `true` if nothing is left.
    pub fn flush(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            match self.driver {
                Driver::Inline { .. } => {
                    self.poll();
                }
                Driver::Threaded { .. } => match self.results.recv_timeout(left) {
                    Ok(done) => {
                        self.deliver(done);
                    }
                    Err(_) => return self.in_flight == 0,
                },
            }
        }
        true
    }

    /// Publish an outcome decided at submit time.  It is delivered by the
    /// next `poll` like any other.
    fn answer_now(&self, handle: &PathHandle, state: RequestState, callback: PathCallback, outcome: PathOutcome) {
        handle.finish(state);
        // The receiver lives in `self`, so this cannot fail.
        let _ = self.results_tx.send(Completed { handle: handle.clone(), callback, outcome });
    }

    fn deliver(&mut self, done: Completed) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        if done.handle.is_stopped() {
            return false;
        }
        (done.callback)(done.outcome);
        true
    }

    fn allocate_id(&mut self) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Requests submitted but not yet delivered or cancelled.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Requests still waiting in the queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_multithreaded(&self) -> bool {
        matches!(self.driver, Driver::Threaded { .. })
    }

    // ── Terrain ───────────────────────────────────────────────────────────

    /// Current terrain snapshot.
    pub fn terrain(&self) -> Arc<TerrainMap> {
        self.terrain.load_full()
    }

    /// Swap in new terrain.  Requests already running keep the snapshot they
    /// started with; later requests see `map`.
    pub fn replace_terrain(&self, map: TerrainMap) {
        let (w, h) = (map.grid.width(), map.grid.height());
        self.terrain.store(Arc::new(map));
        info!(width = w, height = h, "terrain replaced");
    }

    // ── Reservations ──────────────────────────────────────────────────────

    /// Claim `point` for `entity`, replacing its previous claim.
    pub fn reserve(&self, entity: EntityId, point: Point, priority: u8, radius: f32, force_push: bool) {
        self.reservations.reserve(Claim { entity, point, priority, radius, force_push });
    }

    pub fn release(&self, entity: EntityId) -> bool {
        self.reservations.release(entity)
    }

    /// `true` if no claim covers `point`.
    pub fn can_occupy(&self, point: Point) -> bool {
        self.reservations.can_occupy(point)
    }

    /// Record `entity` on ladder `portal`.  Returns `false` if another mover
    /// is already there.
    pub fn occupy_portal(&self, portal: PortalId, entity: EntityId) -> bool {
        self.reservations.write().occupy_portal(portal, entity)
    }

    pub fn vacate_portal(&self, portal: PortalId, entity: EntityId) -> bool {
        self.reservations.write().vacate_portal(portal, entity)
    }

    pub fn reservations(&self) -> &SharedReservations {
        &self.reservations
    }
}

impl Drop for Pathfinder {
    fn drop(&mut self) {
        self.queue.shutdown();
        if let Driver::Threaded { worker } = &mut self.driver {
            if let Some(worker) = worker.take() {
                if worker.join().is_err() {
                    warn!("path worker panicked");
                }
            }
        }
    }
}

fn run_worker(mut scheduler: Scheduler, queue: Arc<RequestQueue>) {
    info!("path worker started");
    loop {
        if queue.is_shutdown() || (!scheduler.is_busy() && !queue.wait_for_work()) {
            break;
        }
        scheduler.tick();
    }
    info!("path worker stopped");
}

/// Single-point answer for a request that starts in its destination cell.
fn trivial_outcome(id: RequestId, dst: Point) -> PathOutcome {
    let points = vec![PathPoint::new(dst, NodeRef::Cell(dst.cell()))];
    PathOutcome { id, points, success: true, failure: None, cost: 0 }
}
