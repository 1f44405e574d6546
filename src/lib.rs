//! `memeroute` — a printed-circuit-board autorouter core: the pipeline that
//! turns a netlist of point-to-point connections on a bounded board with
//! obstacles into a set of non-crossing, manufacturable copper traces.
//!
//! The sole entry point is [`route`], which drives an eleven-stage
//! [`Pipeline`] (spec.md section 2) to completion. Every stage is a plain
//! transform over the previous stage's output; `Pipeline` itself is the one
//! piece of this crate that implements [`stage::Solver`], so the "step
//! repeatedly until solved/failed" driver model (spec.md section 5) applies
//! uniformly even though most individual stages are one-shot computations
//! rather than iterative searches.
//!
//! Input parsing, visualization, the external cache backend's storage
//! medium, the connectivity-map utility that groups pins into nets, and
//! emission to a host PCB format are out of scope (spec.md section 1) —
//! this crate only implements the geometric/combinatorial core between
//! "here is a netlist" and "here are traces".

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod name;
pub mod rng;
pub mod stage;

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{Cache, InMemoryCache, NullCache};
use crate::config::{CacheProvider, RouteConfig};
use crate::error::{FailureKind, Result};
use crate::model::board::{Board, Layer};
use crate::model::geom::Pt;
use crate::model::mesh::Mesh;
use crate::model::port::{PortPoint, PortPointIdx};
use crate::model::route::HighDensityRoute;
use crate::name::Id;
use crate::stage::capacity_pathing::{self, CapacityRoute};
use crate::stage::net_to_point_pairs::{self, PointPair};
use crate::stage::route_stitch::{self, StitchedRoute};
use crate::stage::segment_to_point;
use crate::stage::unravel;
use crate::stage::{edge_builder, edge_to_port_segments, high_density_routing, mesh_builder, trace_simplify};
use crate::stage::{dead_end_prune, Solver, Stats};

/// One output element of a finished trace, in board-output order (spec.md
/// section 6). Mirrors the host format's `pcb_trace.route` union exactly so
/// the (out-of-scope) emission step is a direct field copy.
#[derive(Debug, Clone)]
pub enum RouteElement {
    Wire { x: f64, y: f64, width: f64, layer: String },
    Via { x: f64, y: f64, from_layer: String, to_layer: String },
    Jumper { start: Pt, end: Pt, footprint: f64 },
}

/// The finished, simplified trace for one original net (spec.md section 6).
#[derive(Debug, Clone)]
pub struct PcbTrace {
    pub pcb_trace_id: String,
    pub connection_name: Id,
    pub route: Vec<RouteElement>,
    pub routed: bool,
}

/// The result of one `route()` call: every connection's trace plus
/// recoverable failures recorded along the way (spec.md section 7 — a
/// per-connection failure never aborts the run) and a board-level score
/// callers can gate on via `RouteConfig`/`MIN_ALLOWED_BOARD_SCORE`-style
/// thresholds of their own choosing.
#[derive(Debug, Clone, Default)]
pub struct RouteOutput {
    pub traces: Vec<PcbTrace>,
    pub failures: Vec<FailureKind>,
    pub board_score: f64,
    /// Via placements served from `config.cache` instead of recomputed
    /// (spec.md section 8, S6).
    pub cache_hits: u64,
}

fn layer_element(z: usize, layer_count: usize) -> String {
    Layer::name(z, layer_count)
}

fn to_route_elements(r: &StitchedRoute, layer_count: usize) -> Vec<RouteElement> {
    let mut out = Vec::with_capacity(r.polyline.len() + r.jumpers.len());
    for w in r.polyline.windows(2) {
        let (p0, z0) = w[0];
        let (p1, z1) = w[1];
        if z0 == z1 {
            out.push(RouteElement::Wire {
                x: p1.x,
                y: p1.y,
                width: r.trace_thickness,
                layer: layer_element(z0, layer_count),
            });
        } else {
            out.push(RouteElement::Via {
                x: p0.x,
                y: p0.y,
                from_layer: layer_element(z0, layer_count),
                to_layer: layer_element(z1, layer_count),
            });
        }
    }
    for &(start, end) in &r.jumpers {
        out.push(RouteElement::Jumper { start, end, footprint: 0.5 });
    }
    out
}

/// The tagged pipeline-step variant called for in spec.md section 9's
/// "class inheritance chain" redesign note: instead of a `BaseSolver`
/// subclass per stage, one enum tracks which stage runs next and each
/// `step()` call constructs that stage's output from the previous one's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NetToPointPairs,
    MeshBuilder,
    EdgeBuilder,
    DeadEndPrune,
    CapacityPathing,
    EdgeToPortSegments,
    SegmentToPoint,
    Unravel,
    HighDensityRouting,
    RouteStitch,
    TraceSimplify,
    Done,
}

impl Phase {
    fn next(self) -> Phase {
        use Phase::*;
        match self {
            NetToPointPairs => MeshBuilder,
            MeshBuilder => EdgeBuilder,
            EdgeBuilder => DeadEndPrune,
            DeadEndPrune => CapacityPathing,
            CapacityPathing => EdgeToPortSegments,
            EdgeToPortSegments => SegmentToPoint,
            SegmentToPoint => Unravel,
            Unravel => HighDensityRouting,
            HighDensityRouting => RouteStitch,
            RouteStitch => TraceSimplify,
            TraceSimplify => Done,
            Done => Done,
        }
    }
}

/// Drives the eleven pipeline stages (spec.md section 2) one at a time.
/// Owns every intermediate artifact so each stage reads the previous
/// stage's output and writes its own without reaching back into it (spec.md
/// section 3: "reshaping a stage's output is always a rebuild").
pub struct Pipeline<'a> {
    board: &'a Board,
    config: &'a RouteConfig,
    cache: Arc<dyn Cache>,
    phase: Phase,
    failed: bool,
    failures: Vec<FailureKind>,

    pairs: Vec<PointPair>,
    roots: HashMap<Id, Id>,
    mesh: Mesh,
    capacity_routes: Vec<CapacityRoute>,
    port_pool: Vec<PortPoint>,
    assignments: HashMap<Id, Vec<PortPointIdx>>,
    hdr: Vec<HighDensityRoute>,
    stitched: Vec<StitchedRoute>,
    simplified: Vec<StitchedRoute>,
    cache_hits: u64,
    /// Summed `-ln(1-pf)` failure cost contributed by every jumper placed
    /// in `HighDensityRouting` (spec.md 4.9/§7); folded into
    /// `into_output`'s `board_score` alongside the node-level Pf sum so
    /// jumper crossings are not scored as free.
    jumper_pf_cost: f64,

    iterations: u64,
}

impl<'a> Pipeline<'a> {
    pub fn new(board: &'a Board, config: &'a RouteConfig) -> Self {
        let cache: Arc<dyn Cache> = match config.cache {
            CacheProvider::None => Arc::new(NullCache),
            CacheProvider::InMemory => Arc::new(InMemoryCache::new()),
        };
        Self {
            board,
            config,
            cache,
            phase: Phase::NetToPointPairs,
            failed: false,
            failures: Vec::new(),
            pairs: Vec::new(),
            roots: HashMap::new(),
            mesh: Mesh::new(),
            capacity_routes: Vec::new(),
            port_pool: Vec::new(),
            assignments: HashMap::new(),
            hdr: Vec::new(),
            stitched: Vec::new(),
            simplified: Vec::new(),
            cache_hits: 0,
            jumper_pf_cost: 0.0,
            iterations: 0,
        }
    }

    pub fn into_output(self) -> RouteOutput {
        let layer_count = self.board.layer_count;
        let mut traces: Vec<PcbTrace> = self
            .simplified
            .iter()
            .enumerate()
            .map(|(i, r)| PcbTrace {
                pcb_trace_id: format!("trace_{i}"),
                connection_name: r.connection.clone(),
                route: to_route_elements(r, layer_count),
                routed: r.routed,
            })
            .collect();
        traces.sort_by(|a, b| a.connection_name.cmp(&b.connection_name));

        // Summed node failure-cost (spec.md section 7's scoring rule) plus
        // every placed jumper's failure cost (spec.md 4.9) plus one
        // full-failure unit per connection that never got a route, so a
        // board that routed nothing still scores strictly worse than one
        // that routed everything at high congestion.
        let board_score: f64 = unravel::board_pf_score(&self.mesh, &self.port_pool)
            + self.jumper_pf_cost
            + self.failures.iter().filter(|f| f.connection().is_some()).count() as f64;

        RouteOutput { traces, failures: self.failures, board_score, cache_hits: self.cache_hits }
    }
}

impl<'a> Solver for Pipeline<'a> {
    fn step(&mut self) -> Result<()> {
        if self.failed || self.phase == Phase::Done {
            return Ok(());
        }
        self.iterations += 1;
        log::debug!("pipeline: entering {:?}", self.phase);

        match self.phase {
            Phase::NetToPointPairs => {
                let (pairs, failures) = net_to_point_pairs::net_to_point_pairs(self.board);
                let fatal = failures.iter().any(FailureKind::is_fatal);
                self.failures.extend(failures);
                self.roots = pairs.iter().map(|p| (p.name.clone(), p.root.clone())).collect();
                self.pairs = pairs;
                if fatal {
                    self.failed = true;
                    return Ok(());
                }
            }
            Phase::MeshBuilder => {
                self.mesh = mesh_builder::build_mesh(self.board, self.config);
            }
            Phase::EdgeBuilder => {
                edge_builder::build_edges(&mut self.mesh);
            }
            Phase::DeadEndPrune => {
                dead_end_prune::prune_dead_ends(&mut self.mesh);
            }
            Phase::CapacityPathing => {
                let (mut routes, failures) =
                    capacity_pathing::route_greedy(&mut self.mesh, &self.pairs, self.config);
                let pairs_by_name: HashMap<Id, PointPair> =
                    self.pairs.iter().map(|p| (p.name.clone(), p.clone())).collect();
                capacity_pathing::reoptimize_sections(
                    &mut self.mesh,
                    &mut routes,
                    &pairs_by_name,
                    self.config,
                    self.config.expansion_degrees.max(1) * 4,
                );
                self.failures.extend(failures);
                self.capacity_routes = routes;
            }
            Phase::EdgeToPortSegments => {
                // Recorded as part of SegmentToPoint's input; this stage's
                // output is consumed immediately in the next phase rather
                // than stored, since nothing downstream of SegmentToPoint
                // needs raw crossings again.
            }
            Phase::SegmentToPoint => {
                let segments =
                    edge_to_port_segments::edge_to_port_segments(&self.mesh, &self.capacity_routes);
                let (pool, failures) = segment_to_point::build_port_point_pool(
                    &self.mesh,
                    &segments,
                    self.config,
                    self.board.min_trace_width,
                );
                self.failures.extend(failures);
                self.port_pool = pool;
            }
            Phase::Unravel => {
                let (assignments, failures) =
                    unravel::unravel(&self.mesh, &mut self.port_pool, &self.capacity_routes, self.config);
                self.failures.extend(failures);
                self.assignments = assignments;
            }
            Phase::HighDensityRouting => {
                let endpoints: HashMap<Id, (Pt, Pt)> =
                    self.pairs.iter().map(|p| (p.name.clone(), (p.a.p, p.b.p))).collect();
                let (hdr, hits, jumper_pf_cost) = high_density_routing::high_density_routing(
                    &self.mesh,
                    &self.port_pool,
                    &self.assignments,
                    &endpoints,
                    self.config,
                    self.board.min_via_diameter,
                    self.cache.as_ref(),
                );
                self.hdr = hdr;
                self.cache_hits += hits;
                self.jumper_pf_cost += jumper_pf_cost;
                self.append_unrouted_fallbacks();
            }
            Phase::RouteStitch => {
                let (stitched, warnings) = route_stitch::stitch_routes(&self.hdr, &self.roots);
                for w in warnings {
                    log::warn!("{w}");
                }
                self.stitched = stitched;
            }
            Phase::TraceSimplify => {
                self.simplified = trace_simplify::simplify_routes(&self.stitched, self.config);
            }
            Phase::Done => {}
        }

        self.phase = self.phase.next();
        Ok(())
    }

    fn solved(&self) -> bool {
        self.phase == Phase::Done
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn stats(&self) -> Stats {
        Stats { iterations: self.iterations, message: format!("{:?}", self.phase) }
    }
}

impl<'a> Pipeline<'a> {
    /// Every sub-connection that never got a `HighDensityRoute` (pathing or
    /// unraveling failed) still needs an output entry: a straight
    /// point-to-point line marked unrouted (spec.md section 7).
    fn append_unrouted_fallbacks(&mut self) {
        let routed: std::collections::HashSet<&Id> = self.hdr.iter().map(|r| &r.connection).collect();
        for pair in &self.pairs {
            if routed.contains(&pair.name) {
                continue;
            }
            self.hdr.push(HighDensityRoute::unrouted(
                pair.name.clone(),
                pair.a.p,
                pair.b.p,
                pair.a.layers.iter().next().map(|l| l.z()).unwrap_or(0),
                self.board.min_trace_width,
                self.board.min_via_diameter,
            ));
        }
    }
}

/// The sole public entry point (spec.md section 6): `route(board, config)`.
/// Runs the pipeline to completion (or `MAX_ITERATIONS` exhaustion) and
/// converts the final stage's output into the host-facing trace list.
/// Fatal failures (`FailureKind::is_fatal`) abort with `Err`; recoverable
/// per-connection failures are returned inside `RouteOutput::failures`
/// alongside whatever did route.
pub fn route(board: &Board, config: &RouteConfig) -> Result<RouteOutput> {
    let mut pipeline = Pipeline::new(board, config);
    stage::run(&mut pipeline, 32)?;

    if pipeline.failed {
        let fatal = pipeline.failures.iter().find(|f| f.is_fatal()).cloned();
        return Err(match fatal {
            Some(f) => error::eyre!("{f}"),
            None => error::eyre!("pipeline failed for an unrecorded reason"),
        });
    }

    let output = pipeline.into_output();
    if output.board_score > config.min_allowed_board_score {
        return Err(error::eyre!(
            "board score {} exceeds min_allowed_board_score {}",
            output.board_score,
            config.min_allowed_board_score
        ));
    }
    Ok(output)
}
