//! The phase state machine that answers one request at a time.
//!
//! # Phases
//!
//! ```text
//! Idle ─▶ NewPath ─┬──────────────────────────────────────────────▶ LowSteps   (flee)
//!                  └▶ FindUnreservedPoint ─┬──────────────────────▶ LowSteps   (near / low-level only)
//!                                          └▶ SetupHighGridPath
//!                                             ─▶ ModifyHighGridStart ─▶ ModifyHighGridDest
//!                                             ─▶ CalcHighGridPath ─▶ HighStep ─▶ LowSteps
//! LowSteps ─▶ Finished ─▶ Idle
//! ```
//!
//! Each [`Scheduler::tick`] does one bounded unit of work: a phase's setup,
//! or at most `steps_per_tick` node expansions.  A request that uses more
//! than `max_steps` expansions in total fails with
//! [`PathFailure::StepBudgetExceeded`].
//!
//! # Coarse-to-fine segments
//!
//! After the coarse search, the fine search solves the route a few coarse
//! waypoints at a time.  Each segment targets the representative cell of the
//! block `lookahead` waypoints ahead and is confined to the blocks it spans.
//! When a segment's real cost strays from the coarse estimate by more than
//! `lookahead_divergence`, the next segment looks only one waypoint ahead.
//! The final segment targets the real destination.  A segment that fails
//! inside its window is retried once over the whole grid, and so is the
//! single windowed search of a near, low-level-only or flee request.

use std::sync::Arc;

use arc_swap::ArcSwap;
use crossbeam_channel::Sender;
use tracing::{debug, trace};

use tn_core::{Cell, NodeRef, PathSettings, Point, PortalId, RequestId};
use tn_path::{PathPoint, Shaper, assemble};
use tn_reserve::{Claimant, ReservationGrid, SharedReservations, needs_resolution, resolve_unreserved};
use tn_search::{
    CostModel, HighSearch, LowSearch, LowStatus, LowTarget, PathConstraints, SearchContext, ThreatField, Waypoint,
    WeightPatch,
};
use tn_terrain::{Bounds, HighNode, TerrainMap};

use crate::observer::SchedulerObserver;
use crate::queue::RequestQueue;
use crate::request::{Completed, Job, PathFailure, PathOutcome, RequestState};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    NewPath,
    FindUnreservedPoint,
    SetupHighGridPath,
    ModifyHighGridStart,
    ModifyHighGridDest,
    CalcHighGridPath,
    HighStep,
    LowSteps,
    Finished,
}

/// How the running fine search relates to the request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mode {
    /// One fine search straight to the goal.
    Direct,
    /// Following a coarse route segment by segment.
    Coarse,
    /// Whole-grid search after the coarse level failed.
    Fallback,
}

/// Per-request state while the request is in the scheduler.
struct Active {
    job:           Job,
    /// Terrain snapshot taken when the request started.
    map:           Arc<TerrainMap>,
    phase:         Phase,
    src:           Point,
    dst:           Point,
    radius:        f32,
    start:         Cell,
    goal_portal:   Option<PortalId>,
    mode:          Mode,
    patches:       Vec<WeightPatch>,
    route:         Vec<Waypoint>,
    /// Route index the fine path has reached.
    at:            usize,
    /// Route index the running segment is heading for.
    target:        usize,
    lookahead:     usize,
    seg_start:     Cell,
    final_segment: bool,
    chains:        Vec<Vec<NodeRef>>,
    cost:          u32,
    steps:         u32,
    failure:       Option<PathFailure>,
}

impl Active {
    fn new(job: Job, map: Arc<TerrainMap>, lookahead: usize) -> Self {
        let start = job.request.src.cell();
        Self {
            map,
            phase: Phase::NewPath,
            src: job.request.src,
            dst: job.request.dst,
            radius: job.request.radius,
            start,
            goal_portal: None,
            mode: Mode::Direct,
            patches: Vec::new(),
            route: Vec::new(),
            at: 0,
            target: 0,
            lookahead,
            seg_start: start,
            final_segment: true,
            chains: Vec::new(),
            cost: 0,
            steps: 0,
            failure: None,
            job,
        }
    }

    #[inline]
    fn id(&self) -> RequestId {
        self.job.id()
    }
}

/// Shared inputs every search step reads.
pub(crate) struct Env {
    pub settings:     PathSettings,
    pub terrain:      Arc<ArcSwap<TerrainMap>>,
    pub reservations: SharedReservations,
    pub threat:       Arc<dyn ThreatField>,
}

impl Env {
    fn context<'a>(
        &'a self,
        map:          &'a TerrainMap,
        constraints:  &'a PathConstraints,
        reservations: &'a ReservationGrid,
    ) -> SearchContext<'a> {
        SearchContext {
            map,
            settings: &self.settings,
            constraints,
            reservations,
            threat: &*self.threat,
        }
    }
}

pub struct Scheduler {
    env:      Env,
    queue:    Arc<RequestQueue>,
    results:  Sender<Completed>,
    observer: Box<dyn SchedulerObserver>,
    low:      LowSearch,
    high:     HighSearch,
    /// Terrain the coarse overlay was last bound to.
    bound:    Option<Arc<TerrainMap>>,
    active:   Option<Active>,
}

impl Scheduler {
    pub(crate) fn new(
        env:      Env,
        queue:    Arc<RequestQueue>,
        results:  Sender<Completed>,
        observer: Box<dyn SchedulerObserver>,
    ) -> Self {
        Self {
            env,
            queue,
            results,
            observer,
            low: LowSearch::new(),
            high: HighSearch::new(),
            bound: None,
            active: None,
        }
    }

    /// Phase of the active request, or `Idle`.
    pub fn phase(&self) -> Phase {
        self.active.as_ref().map_or(Phase::Idle, |a| a.phase)
    }

    pub fn active_id(&self) -> Option<RequestId> {
        self.active.as_ref().map(Active::id)
    }

    /// `true` while a request is in progress.
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Perform one bounded unit of work.  Returns the phase afterwards.
    pub fn tick(&mut self) -> Phase {
        let Some(mut active) = self.active.take().or_else(|| self.next_job()) else {
            return Phase::Idle;
        };
        if active.job.handle.is_stopped() {
            self.drop_cancelled(active);
            return Phase::Idle;
        }

        let from = active.phase;
        let to = self.advance(&mut active);
        active.phase = to;
        if from != to {
            debug!(id = %active.id(), ?from, ?to, steps = active.steps, "phase change");
            self.observer.on_phase(active.id(), from, to);
        }

        if to == Phase::Finished {
            self.publish(active);
            return Phase::Idle;
        }
        self.active = Some(active);
        to
    }

    fn next_job(&mut self) -> Option<Active> {
        let job = self.queue.try_pop()?;
        let active = Active::new(job, self.env.terrain.load_full(), self.env.settings.steps_ahead.max(1));
        debug!(id = %active.id(), src = %active.src, dst = %active.dst, "request started");
        self.observer.on_phase(active.id(), Phase::Idle, Phase::NewPath);
        Some(active)
    }

    fn drop_cancelled(&mut self, mut active: Active) {
        restore_patches(&mut self.high, &mut active);
        debug!(id = %active.id(), phase = ?active.phase, "request cancelled; dropped");
        self.observer.on_cancel(active.id());
    }

    // ── Phase dispatch ────────────────────────────────────────────────────

    fn advance(&mut self, a: &mut Active) -> Phase {
        let map = Arc::clone(&a.map);
        let constraints = a.job.request.constraints;
        let reservations = self.env.reservations.read();
        let cost = CostModel::new(self.env.context(&map, &constraints, &reservations));
        let settings = &self.env.settings;
        let budget = settings.steps_per_tick.max(1);

        match a.phase {
            Phase::Idle | Phase::NewPath => {
                a.src = map.grid.clamp_point(a.src);
                a.dst = map.grid.clamp_point(a.dst);
                a.start = a.src.cell();
                a.seg_start = a.start;
                if let Some(flee) = constraints.flee {
                    // No window wider than the grid is ever needed.
                    let span = map.grid.width().max(map.grid.height());
                    let reach = (flee.range.ceil().clamp(0.0, span as f32) as i32).saturating_add(map.high.block_size());
                    let target = LowTarget::Flee { from: flee.from, range: flee.range };
                    self.low.start(&cost, a.start, target, Bounds::around(a.start, reach));
                    a.mode = Mode::Direct;
                    a.final_segment = true;
                    return Phase::LowSteps;
                }
                Phase::FindUnreservedPoint
            }

            Phase::FindUnreservedPoint => {
                let who = Claimant {
                    entity:   constraints.entity,
                    priority: constraints.priority,
                    radius:   constraints.radius,
                };
                let passable = |c: Cell| cost.passable(c);
                a.goal_portal = goal_portal(&map, a.dst);
                if a.goal_portal.is_none() && needs_resolution(&map.grid, &reservations, a.dst, &who, passable) {
                    match resolve_unreserved(&map.grid, &reservations, a.dst, &who, settings.resolver_window, passable) {
                        Some(r) => {
                            a.dst = r.point;
                            a.radius = (a.radius - r.moved).max(0.0);
                        }
                        None => debug!(id = %a.id(), dst = %a.dst, "destination stays contested"),
                    }
                }

                let (sb, gb) = (map.high.block_of(a.start), map.high.block_of(a.dst.cell()));
                if constraints.low_level_only || sb.chebyshev(gb) <= 1 {
                    let window = Bounds::spanning(a.start, a.dst.cell()).expand(2 * map.high.block_size());
                    start_final(&mut self.low, &cost, a, window, Mode::Direct);
                    return Phase::LowSteps;
                }
                Phase::SetupHighGridPath
            }

            Phase::SetupHighGridPath => {
                if !self.bound.as_ref().is_some_and(|m| Arc::ptr_eq(m, &map)) {
                    self.high.bind(&map);
                    self.bound = Some(Arc::clone(&map));
                    debug!(blocks = map.high.block_count(), "coarse overlay rebound");
                }
                Phase::ModifyHighGridStart
            }

            Phase::ModifyHighGridStart => {
                let patch = WeightPatch::start(&cost, self.high.overlay_mut(), a.start, settings.patch_tile_multiplier);
                a.patches.push(patch);
                Phase::ModifyHighGridDest
            }

            Phase::ModifyHighGridDest => {
                let dest = a.dst.cell();
                let patch = WeightPatch::dest(&cost, self.high.overlay_mut(), dest, settings.patch_tile_multiplier);
                a.patches.push(patch);
                Phase::CalcHighGridPath
            }

            Phase::CalcHighGridPath => {
                let (sb, gb) = (map.high.block_of(a.start), map.high.block_of(a.dst.cell()));
                self.high.start(&cost, sb, gb, a.dst);
                Phase::HighStep
            }

            Phase::HighStep => {
                let before = self.high.expanded();
                let status = self.high.step(&cost, budget);
                a.steps += self.high.expanded() - before;
                match status {
                    LowStatus::Found => {
                        restore_patches(&mut self.high, a);
                        a.route = self.high.route();
                        a.at = 0;
                        trace!(id = %a.id(), waypoints = a.route.len(), "coarse route found");
                        next_segment(&mut self.low, &cost, a);
                        Phase::LowSteps
                    }
                    LowStatus::Exhausted | LowStatus::Idle => {
                        restore_patches(&mut self.high, a);
                        debug!(id = %a.id(), "coarse search exhausted; searching the whole grid");
                        start_final(&mut self.low, &cost, a, map.grid.bounds(), Mode::Fallback);
                        Phase::LowSteps
                    }
                    LowStatus::Running if a.steps >= settings.max_steps => {
                        fail(&mut self.high, None, a, PathFailure::StepBudgetExceeded)
                    }
                    LowStatus::Running => Phase::HighStep,
                }
            }

            Phase::LowSteps => {
                let before = self.low.expanded();
                let status = self.low.step(&cost, budget);
                a.steps += self.low.expanded() - before;
                match status {
                    LowStatus::Found => {
                        let Some(end) = self.low.found() else {
                            return fail(&mut self.high, Some(&self.low), a, PathFailure::Unreachable);
                        };
                        let seg_cost = self.low.cost_of(end).unwrap_or(0);
                        a.cost = a.cost.saturating_add(seg_cost);
                        a.chains.push(self.low.chain_to(end));
                        if a.final_segment {
                            return Phase::Finished;
                        }
                        adjust_lookahead(a, seg_cost, settings);
                        a.at = a.target;
                        if let Some(c) = end.as_cell() {
                            a.seg_start = c;
                        }
                        next_segment(&mut self.low, &cost, a);
                        Phase::LowSteps
                    }
                    LowStatus::Exhausted | LowStatus::Idle if a.mode == Mode::Coarse => {
                        debug!(id = %a.id(), at = a.at, "segment exhausted in its window; searching the whole grid");
                        start_final(&mut self.low, &cost, a, map.grid.bounds(), Mode::Fallback);
                        Phase::LowSteps
                    }
                    LowStatus::Exhausted | LowStatus::Idle
                        if a.mode == Mode::Direct && self.low.window() != map.grid.bounds() =>
                    {
                        debug!(id = %a.id(), "direct search exhausted in its window; searching the whole grid");
                        match constraints.flee {
                            Some(flee) => {
                                let target = LowTarget::Flee { from: flee.from, range: flee.range };
                                self.low.start(&cost, a.start, target, map.grid.bounds());
                                a.mode = Mode::Fallback;
                            }
                            None => start_final(&mut self.low, &cost, a, map.grid.bounds(), Mode::Fallback),
                        }
                        Phase::LowSteps
                    }
                    LowStatus::Exhausted | LowStatus::Idle => fail(&mut self.high, Some(&self.low), a, PathFailure::Unreachable),
                    LowStatus::Running if a.steps >= settings.max_steps => {
                        fail(&mut self.high, Some(&self.low), a, PathFailure::StepBudgetExceeded)
                    }
                    LowStatus::Running => Phase::LowSteps,
                }
            }

            Phase::Finished => Phase::Finished,
        }
    }

    // ── Publishing ────────────────────────────────────────────────────────

    fn publish(&mut self, mut a: Active) {
        restore_patches(&mut self.high, &mut a);
        let outcome = self.build_outcome(&a);
        let state = if outcome.success { RequestState::Succeeded } else { RequestState::Failed };
        if !a.job.handle.finish(state) {
            debug!(id = %a.id(), "request cancelled before publishing; dropped");
            self.observer.on_cancel(a.id());
            return;
        }
        self.observer.on_complete(&outcome);
        trace!(id = %a.id(), points = outcome.points.len(), cost = outcome.cost, success = outcome.success, "request complete");
        let Job { handle, callback, .. } = a.job;
        if self.results.send(Completed { handle, callback, outcome }).is_err() {
            debug!("result receiver gone; outcome discarded");
        }
    }

    fn build_outcome(&self, a: &Active) -> PathOutcome {
        let id = a.id();
        let constraints = a.job.request.constraints;
        if let Some(failure) = a.failure {
            let points = if constraints.accept_partial { self.shape(a) } else { Vec::new() };
            return PathOutcome::failed(id, failure, points, a.cost);
        }
        PathOutcome { id, points: self.shape(a), success: true, failure: None, cost: a.cost }
    }

    fn shape(&self, a: &Active) -> Vec<PathPoint> {
        let constraints = a.job.request.constraints;
        let reservations = self.env.reservations.read();
        let cost = CostModel::new(self.env.context(&a.map, &constraints, &reservations));
        let passable = |c: Cell| cost.passable(c);
        let raw = assemble(&a.map, &a.chains, a.src, a.dst);
        Shaper::new(&a.map.grid, &passable, constraints.radius)
            .avoid_rivers(!constraints.allow_water)
            .shape(&raw, self.env.settings.smooth_passes, self.env.settings.clearance_blur_passes)
    }
}

// ── Segment helpers ───────────────────────────────────────────────────────────

/// Start the fine search that ends at the request's real destination.
fn start_final(low: &mut LowSearch, cost: &CostModel<'_>, a: &mut Active, window: Bounds, mode: Mode) {
    let target = LowTarget::Reach { point: a.dst, radius: a.radius, portal: a.goal_portal };
    low.start(cost, a.seg_start, target, window);
    a.mode = mode;
    a.final_segment = true;
    trace!(id = %a.id(), from = %a.seg_start, ?mode, "final segment started");
}

/// Start the fine search for the next coarse segment.
fn next_segment(low: &mut LowSearch, cost: &CostModel<'_>, a: &mut Active) {
    let map = cost.map();
    let Some(last) = a.route.len().checked_sub(1) else {
        start_final(low, cost, a, map.grid.bounds(), Mode::Fallback);
        return;
    };

    let mut k = (a.at + a.lookahead).min(last);
    while k < last && !matches!(a.route[k].node, HighNode::Block(_)) {
        k += 1;
    }
    a.target = k;

    let mut window = Bounds::spanning(a.seg_start, a.seg_start);
    for w in &a.route[a.at.min(k)..=k] {
        window = window.union(&node_bounds(map, w.node));
    }
    let window = window.expand(map.high.block_size());

    let rep = match a.route[k].node {
        HighNode::Block(b) if k < last => map.high.rep(b),
        _ => None,
    };
    let Some(rep) = rep else {
        start_final(low, cost, a, window, Mode::Coarse);
        return;
    };
    low.start(cost, a.seg_start, LowTarget::Reach { point: rep.center(), radius: 0.0, portal: None }, window);
    a.mode = Mode::Coarse;
    a.final_segment = false;
    trace!(id = %a.id(), from = %a.seg_start, to = %rep, waypoint = k, "segment started");
}

/// Shrink the look-ahead to one waypoint after a segment whose real cost
/// strayed from the coarse estimate; otherwise restore it.
fn adjust_lookahead(a: &mut Active, realised: u32, settings: &PathSettings) {
    let estimate = a.route[a.target].cost.saturating_sub(a.route[a.at].cost);
    let diverged = estimate > 0
        && (realised as f32 - estimate as f32).abs() / estimate as f32 > settings.lookahead_divergence;
    a.lookahead = if diverged { 1 } else { settings.steps_ahead.max(1) };
}

fn node_bounds(map: &TerrainMap, node: HighNode) -> Bounds {
    let span = |cells: &[Cell]| cells.iter().map(|&c| Bounds::spanning(c, c)).reduce(|a, b| a.union(&b));
    let bounds = match node {
        HighNode::Block(b) => Some(map.high.block_bounds(b)),
        HighNode::Portal(p) => map.portals.get(p).and_then(|p| span(&p.cells)),
        HighNode::Shortcut(s) => map.shortcuts.get(s).and_then(|l| span(&[l.from, l.to])),
    };
    bounds.unwrap_or_else(|| map.grid.bounds())
}

/// A destination on an impassable portal position (a ladder in a wall) is
/// reached by entering the portal itself.
fn goal_portal(map: &TerrainMap, dst: Point) -> Option<PortalId> {
    if map.grid.is_passable(dst.cell()) {
        return None;
    }
    map.portals.portals_near(dst, 0.5).into_iter().next()
}

/// Record `failure`, keeping the fine search's best-effort chain when the
/// request accepts partial routes.
fn fail(high: &mut HighSearch, low: Option<&LowSearch>, a: &mut Active, failure: PathFailure) -> Phase {
    restore_patches(high, a);
    if let Some(low) = low.filter(|_| a.job.request.constraints.accept_partial) {
        if let Some(best) = low.best_effort() {
            a.chains.push(low.chain_to(best));
            a.cost = a.cost.saturating_add(low.cost_of(best).unwrap_or(0));
        }
    }
    debug!(id = %a.id(), ?failure, steps = a.steps, "request failed");
    a.failure = Some(failure);
    Phase::Finished
}

fn restore_patches(high: &mut HighSearch, a: &mut Active) {
    while let Some(patch) = a.patches.pop() {
        patch.restore(high.overlay_mut());
    }
}
