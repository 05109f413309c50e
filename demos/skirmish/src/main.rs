//! skirmish — movers crossing a generated battlefield.
//!
//! Runs the same request mix through the worker-thread pathfinder and the
//! inline one, prints a summary of each, and checks the two agree.
//!
//! ```text
//! skirmish [settings.toml]
//! RUST_LOG=tn_engine=debug skirmish
//! ```

mod terrain;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use crossbeam_channel::unbounded;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tn_core::{Cell, EntityId, PathSettings, Point, RequestId};
use tn_engine::{
    PathFailure, PathOutcome, PathRequest, PathfinderBuilder, Phase, SchedulerObserver, high_grid_params,
};
use tn_search::{Flee, PathConstraints, ThreatField};

// ── Constants ─────────────────────────────────────────────────────────────────

const MOVERS:        usize    = 48;
const SEED:          u64      = 7;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(30);
const RALLY:         Point    = Point::new(60.0, 20.0);
const FRONT_BLOCK_X: i32      = 6;

const DEFAULT_SETTINGS: &str = include_str!("../settings.toml");

// ── Threat field ──────────────────────────────────────────────────────────────

/// Danger concentrated in one column of blocks.
struct Battlefront;

impl ThreatField for Battlefront {
    fn sample(&self, block: Cell) -> f32 {
        match (block.x - FRONT_BLOCK_X).abs() {
            0 => 1.0,
            1 => 0.4,
            _ => 0.0,
        }
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Counters {
    transitions: AtomicUsize,
    coarse:      AtomicUsize,
    completed:   AtomicUsize,
}

struct CountingObserver(Arc<Counters>);

impl SchedulerObserver for CountingObserver {
    fn on_phase(&mut self, _id: RequestId, _from: Phase, to: Phase) {
        self.0.transitions.fetch_add(1, Ordering::Relaxed);
        if to == Phase::HighStep {
            self.0.coarse.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn on_complete(&mut self, _outcome: &PathOutcome) {
        self.0.completed.fetch_add(1, Ordering::Relaxed);
    }
}

// ── Requests ──────────────────────────────────────────────────────────────────

struct Mover {
    entity:  EntityId,
    request: PathRequest,
    role:    &'static str,
}

#[derive(Clone, Debug, PartialEq)]
struct Summary {
    id:      RequestId,
    success: bool,
    failure: Option<PathFailure>,
    points:  usize,
    length:  f32,
    cost:    u32,
}

impl From<&PathOutcome> for Summary {
    fn from(o: &PathOutcome) -> Self {
        Summary {
            id:      o.id,
            success: o.success,
            failure: o.failure,
            points:  o.points.len(),
            length:  o.length(),
            cost:    o.cost,
        }
    }
}

fn random_walkable(rng: &mut SmallRng, map: &tn_terrain::TerrainMap) -> Point {
    loop {
        let c = Cell::new(rng.gen_range(0..terrain::WIDTH), rng.gen_range(0..terrain::HEIGHT));
        if map.grid.is_walkable(c) {
            return c.center();
        }
    }
}

fn plan_movers(settings: &PathSettings) -> Result<Vec<Mover>> {
    let map = terrain::build(SEED, high_grid_params(settings))?;
    let mut rng = SmallRng::seed_from_u64(SEED ^ 0x5eed);

    let movers = (0..MOVERS)
        .map(|i| {
            let entity = EntityId(i as u32);
            let src = random_walkable(&mut rng, &map);
            let mut constraints = PathConstraints {
                entity,
                priority: (i % 3) as u8,
                accept_partial: true,
                ..PathConstraints::default()
            };
            let (dst, role) = match i % 8 {
                0 => {
                    constraints.flee = Some(Flee { from: RALLY, range: 12.0 });
                    (src, "flee")
                }
                1 | 2 => (RALLY, "rally"),
                3 => {
                    constraints.allow_water = true;
                    (random_walkable(&mut rng, &map), "amphibious")
                }
                4 => {
                    constraints.avoid_threat = true;
                    (random_walkable(&mut rng, &map), "cautious")
                }
                5 => {
                    constraints.low_level_only = true;
                    (random_walkable(&mut rng, &map), "direct")
                }
                _ => (random_walkable(&mut rng, &map), "march"),
            };
            let request = PathRequest::new(src, dst)
                .radius(if role == "rally" { 2.0 } else { 0.0 })
                .constraints(constraints)
                .urgent(i % 7 == 0);
            Mover { entity, request, role }
        })
        .collect();
    Ok(movers)
}

// ── Runs ──────────────────────────────────────────────────────────────────────

fn run(settings: PathSettings, movers: &[Mover]) -> Result<Vec<Summary>> {
    let mode = if settings.multithreaded { "worker thread" } else { "inline" };
    let map = terrain::build(SEED, high_grid_params(&settings))?;
    let counters = Arc::new(Counters::default());
    let mut finder = PathfinderBuilder::new(map)
        .settings(settings)
        .threat(Battlefront)
        .observer(CountingObserver(Arc::clone(&counters)))
        .build()?;

    // Every mover holds its current spot; rally movers then contend for the
    // same destination and get steered apart.
    for m in movers {
        let c = m.request.constraints;
        finder.reserve(m.entity, m.request.src, c.priority, c.radius, c.force_push);
    }
    finder.reserve(EntityId(u32::MAX - 1), RALLY, 2, 1.5, false);

    let (tx, rx) = unbounded();
    let t0 = Instant::now();
    let mut handles = Vec::with_capacity(movers.len());
    for m in movers {
        let tx = tx.clone();
        handles.push(finder.submit(m.request, move |outcome| {
            let _ = tx.send(Summary::from(&outcome));
        }));
    }
    // The last mover changes its mind.
    if let Some(h) = handles.last() {
        finder.cancel(h);
    }
    if !finder.flush(FLUSH_TIMEOUT) {
        bail!("{} requests still in flight after {FLUSH_TIMEOUT:?}", finder.in_flight());
    }
    let elapsed = t0.elapsed();
    drop(tx);

    let mut summaries: Vec<Summary> = rx.try_iter().collect();
    summaries.sort_by_key(|s| s.id);
    info!(
        mode,
        elapsed_ms = elapsed.as_millis() as u64,
        delivered = summaries.len(),
        transitions = counters.transitions.load(Ordering::Relaxed),
        coarse = counters.coarse.load(Ordering::Relaxed),
        completed = counters.completed.load(Ordering::Relaxed),
        "run complete"
    );
    Ok(summaries)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => PathSettings::from_toml_file(Path::new(&path))?,
        None => PathSettings::from_toml_str(DEFAULT_SETTINGS)?,
    };

    println!("=== skirmish — tilenav pathfinding demo ===");
    println!("Map: {} × {}  |  Movers: {MOVERS}  |  Seed: {SEED}", terrain::WIDTH, terrain::HEIGHT);
    println!();

    let movers = plan_movers(&settings)?;
    let threaded = run(PathSettings { multithreaded: true, ..settings.clone() }, &movers)?;
    let inline = run(PathSettings { multithreaded: false, ..settings }, &movers)?;

    println!("{:<6} {:<11} {:<8} {:>7} {:>8} {:>7}", "Id", "Role", "Result", "Points", "Length", "Cost");
    println!("{}", "-".repeat(52));
    for s in &threaded {
        let role = movers.get(s.id.0 as usize).map_or("?", |m| m.role);
        let result = match (s.success, s.failure) {
            (true, _) => "ok",
            (false, Some(PathFailure::StepBudgetExceeded)) => "budget",
            (false, _) => "partial",
        };
        println!(
            "{:<6} {:<11} {:<8} {:>7} {:>8.1} {:>7}",
            s.id.0, role, result, s.points, s.length, s.cost
        );
    }
    println!();

    let ok = threaded.iter().filter(|s| s.success).count();
    println!("Delivered {} of {MOVERS} ({} cancelled), {ok} complete paths", threaded.len(), MOVERS - threaded.len());

    if threaded != inline {
        warn!("worker-thread and inline runs disagree");
        bail!("threading modes produced different paths");
    }
    println!("Worker-thread and inline runs agree.");
    Ok(())
}
