//! Rewrites each connection's coarse node-level path into a concrete
//! sequence of port-point crossings, minimizing probability of downstream
//! routing failure (spec.md 4.8 — the hardest single component). Port
//! points are pulled from and returned to a shared pool as connections are
//! assigned and ripped, so `UnravelState` owns that pool for the duration
//! of the stage.

use std::collections::HashMap;

use priority_queue::PriorityQueue;

use crate::config::RouteConfig;
use crate::error::FailureKind;
use crate::model::mesh::{Mesh, NodeIdx};
use crate::model::port::{PortPoint, PortPointIdx};
use crate::model::route::{Candidate, CandidateArena, CandidateIdx};
use crate::name::Id;
use crate::rng::rng_for;
use crate::stage::capacity_pathing::{expand_subgraph, CapacityRoute};

/// Saturating probability-of-failure model for one node (spec.md 4.8).
/// Each counted crossing type contributes independently and the result is
/// clamped away from 1 so `-ln(1 - pf)` stays finite.
pub fn node_pf(capacity: usize, same_layer: usize, layer_changes: usize, transition_crossings: usize) -> f64 {
    if capacity == 0 {
        return 1.0 - 1e-6;
    }
    let load = same_layer as f64 + 1.5 * layer_changes as f64 + 2.0 * transition_crossings as f64;
    let ratio = load / capacity as f64;
    // 1 - exp(-ratio) saturates towards 1 as load grows past capacity while
    // staying 0 at ratio == 0, matching "saturating function ... vs node
    // capacity, clipped to [0, 1-eps]".
    (1.0 - (-ratio).exp()).min(1.0 - 1e-6)
}

pub fn failure_cost(pf: f64) -> f64 {
    -(1.0 - pf).max(1e-12).ln()
}

/// Counts chord crossings among the port points a node currently has
/// assigned: two points of the same connection form a chord; chords cross
/// when their port points interleave around the node boundary ordering
/// (approximated here by simple index-order interleaving, since port
/// points are already ordered along each edge and edges are visited in a
/// stable order per node).
pub fn count_chords(assigned: &[(&PortPoint, Id)]) -> (usize, usize, usize) {
    let mut by_conn: HashMap<&Id, Vec<&PortPoint>> = HashMap::new();
    for (pp, conn) in assigned {
        by_conn.entry(conn).or_default().push(pp);
    }

    let mut same_layer = 0;
    let mut layer_changes = 0;
    let mut transition_crossings = 0;

    let chords: Vec<(&PortPoint, &PortPoint)> =
        by_conn.values().filter(|v| v.len() >= 2).map(|v| (v[0], v[1])).collect();

    for &(a, b) in &chords {
        if a.z != b.z {
            layer_changes += 1;
        }
    }

    for i in 0..chords.len() {
        for j in (i + 1)..chords.len() {
            let (a0, a1) = chords[i];
            let (b0, b1) = chords[j];
            if !chords_interleave(a0, a1, b0, b1) {
                continue;
            }
            if a0.z == a1.z && b0.z == b1.z && a0.z == b0.z {
                same_layer += 1;
            } else {
                transition_crossings += 1;
            }
        }
    }

    (same_layer, layer_changes, transition_crossings)
}

/// Two chords "cross" a node rectangle if their endpoints alternate around
/// the edge ordering; approximated by the d_centermost ordering of their
/// port points, which is monotone along each shared boundary.
pub(crate) fn chords_interleave(a0: &PortPoint, a1: &PortPoint, b0: &PortPoint, b1: &PortPoint) -> bool {
    let key = |p: &PortPoint| (p.edge.get(), p.d_centermost);
    let (ka0, ka1) = (key(a0), key(a1));
    let (kb0, kb1) = (key(b0), key(b1));
    if ka0.0 == kb0.0 && ka0.0 == ka1.0 && ka0.0 == kb1.0 {
        let lo_a = ka0.1.min(ka1.1);
        let hi_a = ka0.1.max(ka1.1);
        let lo_b = kb0.1.min(kb1.1);
        let hi_b = kb0.1.max(kb1.1);
        (lo_b > lo_a && lo_b < hi_a && hi_b > hi_a) || (lo_a > lo_b && lo_a < hi_b && hi_a > hi_b)
    } else {
        false
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Score(f64);
impl Eq for Score {}
impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Score {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.0.partial_cmp(&self.0).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Per-connection A* over port-point candidate states (spec.md 4.8).
/// Bounded by `max_iterations`, scaled by straight-line length at the call
/// site; exhaustion is reported, not panicked.
pub fn path_connection(
    mesh: &Mesh,
    pool: &[PortPoint],
    connection: &Id,
    root: &Id,
    start_node: NodeIdx,
    goal_node: NodeIdx,
    config: &RouteConfig,
    max_iterations: u64,
) -> Option<Vec<PortPointIdx>> {
    let mut arena = CandidateArena::new();
    let mut open: PriorityQueue<CandidateIdx, Score> = PriorityQueue::new();

    let root_candidate = arena.push(Candidate {
        idx: CandidateIdx::new(0),
        prev: None,
        port_point: None,
        node: start_node,
        p: mesh.node(start_node).center(),
        z: 0,
        g: 0.0,
        h: mesh.node(start_node).center().dist(mesh.node(goal_node).center()),
        distance_traveled: 0.0,
        touched_off_board: false,
    });
    open.push(root_candidate, Score(arena.get(root_candidate).f(config.greedy)));

    let mut iterations = 0u64;
    while let Some((current_idx, _)) = open.pop() {
        let current = arena.get(current_idx).clone();
        if current.node == goal_node {
            return Some(
                arena
                    .chain(current_idx)
                    .into_iter()
                    .filter_map(|c| c.port_point)
                    .collect(),
            );
        }
        iterations += 1;
        if iterations > max_iterations {
            return None;
        }

        for (_, next_node) in mesh.neighbors(current.node) {
            if arena.visits(current_idx, next_node) {
                continue;
            }
            let candidates = crate::stage::segment_to_point::port_points_for_edge(
                pool,
                edge_to(mesh, current.node, next_node),
            );
            for pp in candidates {
                if !pp.is_free() && pp.conflicts_with(root) {
                    continue;
                }
                let node_after = mesh.node(next_node);
                let current_node = mesh.node(current.node);
                let pf = if current.z == pp.z {
                    node_pf(current_node.capacity, 1, 0, 0)
                } else {
                    node_pf(current_node.capacity, 0, 1, 0)
                };
                let delta_cost = failure_cost(pf);
                let g = current.g + delta_cost + current.p.dist(pp.p());
                let h = node_after.center().dist(mesh.node(goal_node).center());
                let child = arena.push(Candidate {
                    idx: CandidateIdx::new(0),
                    prev: Some(current_idx),
                    port_point: Some(pp.idx),
                    node: next_node,
                    p: pp.p(),
                    z: pp.z,
                    g,
                    h,
                    distance_traveled: current.distance_traveled + current.p.dist(pp.p()),
                    touched_off_board: current.touched_off_board || node_after.off_board,
                });
                open.push(child, Score(arena.get(child).f(config.greedy)));
            }
        }
    }
    None
}

fn edge_to(mesh: &Mesh, a: NodeIdx, b: NodeIdx) -> crate::model::mesh::EdgeIdx {
    mesh.incident[a.index()]
        .iter()
        .find(|&&e| mesh.edge(e).other(a) == b)
        .copied()
        .expect("adjacent nodes must share an edge")
}

/// Every assigned port point touching `node`, paired with the connection
/// that claims it — the raw material for that node's chord graph (spec.md
/// 4.8: "given the multiset of port points assigned to a node").
fn node_assigned(pool: &[PortPoint], node: NodeIdx) -> Vec<(&PortPoint, Id)> {
    pool.iter()
        .filter(|pp| (pp.nodes.0 == node || pp.nodes.1 == node) && pp.assigned.is_some())
        .map(|pp| (pp, pp.assigned.as_ref().unwrap().connection.clone()))
        .collect()
}

fn node_pf_at(mesh: &Mesh, pool: &[PortPoint], node: NodeIdx) -> f64 {
    let capacity = mesh.node(node).capacity;
    if capacity == 0 {
        return 0.0;
    }
    let assigned = node_assigned(pool, node);
    let (same_layer, layer_changes, transition_crossings) = count_chords(&assigned);
    node_pf(capacity, same_layer, layer_changes, transition_crossings)
}

/// Sums `-ln(1-pf)` over every capacity-bearing node — the additive board
/// cost spec.md 4.8 calls the scoring rule. Lower is better.
pub fn board_pf_score(mesh: &Mesh, pool: &[PortPoint]) -> f64 {
    mesh.nodes
        .iter()
        .filter(|n| n.capacity > 0)
        .map(|n| failure_cost(node_pf_at(mesh, pool, n.idx)))
        .sum()
}

fn worst_node(mesh: &Mesh, pool: &[PortPoint]) -> Option<(NodeIdx, f64)> {
    mesh.nodes
        .iter()
        .filter(|n| n.capacity > 0)
        .map(|n| (n.idx, node_pf_at(mesh, pool, n.idx)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

/// Releases a connection's assigned port points back to the pool, returning
/// the prior path so it can be restored verbatim if the section's attempt
/// is reverted.
fn rip(pool: &mut [PortPoint], assignments: &mut HashMap<Id, Vec<PortPointIdx>>, connection: &Id) -> Vec<PortPointIdx> {
    let Some(path) = assignments.remove(connection) else { return Vec::new() };
    for &pp_idx in &path {
        pool[pp_idx.index()].release();
    }
    path
}

fn reassign(pool: &mut [PortPoint], assignments: &mut HashMap<Id, Vec<PortPointIdx>>, connection: Id, root: Id, path: Vec<PortPointIdx>) {
    for &pp_idx in &path {
        pool[pp_idx.index()].assign(connection.clone(), root.clone());
    }
    assignments.insert(connection, path);
}

/// Section re-optimization loop (spec.md 4.8): repeatedly find the
/// highest-Pf node, rip a fraction of the connections crossing its local
/// subgraph, reroute them under a small schedule of shuffled orderings, and
/// keep the result only if both the section's and the board's total score
/// strictly improve. Bounded by `config.max_section_attempts` rather than a
/// true fixpoint, matching spec.md 4.8's "section-attempt budget".
pub fn reoptimize_sections(
    mesh: &Mesh,
    pool: &mut Vec<PortPoint>,
    assignments: &mut HashMap<Id, Vec<PortPointIdx>>,
    routes: &[CapacityRoute],
    config: &RouteConfig,
) {
    let routes_by_name: HashMap<&Id, &CapacityRoute> = routes.iter().map(|r| (&r.connection, r)).collect();

    for attempt in 0..config.max_section_attempts {
        let Some((worst, pf)) = worst_node(mesh, pool) else { return };
        if pf <= config.acceptable_pf {
            return;
        }

        let subgraph = expand_subgraph(mesh, worst, config.expansion_degrees);
        let mut affected: Vec<Id> = assignments
            .iter()
            .filter(|(_, path)| path.iter().any(|&pp| subgraph.iter().any(|&n| pool[pp.index()].nodes.0 == n || pool[pp.index()].nodes.1 == n)))
            .map(|(name, _)| name.clone())
            .collect();
        if affected.is_empty() {
            continue;
        }
        affected.sort();

        let mut rng = rng_for(config.seed, "unravel_section", attempt as u64);
        use rand::seq::SliceRandom;
        affected.shuffle(&mut rng);
        let take = ((affected.len() as f64 * config.rip_fraction).ceil() as usize).clamp(1, affected.len());
        let to_rip: Vec<Id> = affected.into_iter().take(take).collect();

        let section_before: f64 = subgraph.iter().map(|&n| failure_cost(node_pf_at(mesh, pool, n))).sum();
        let board_before = board_pf_score(mesh, pool);

        let mut saved: Vec<(Id, Id, Vec<PortPointIdx>)> = Vec::new();
        for name in &to_rip {
            let Some(route) = routes_by_name.get(name) else { continue };
            let prior = rip(pool, assignments, name);
            saved.push((name.clone(), route.root.clone(), prior));
        }

        // Reroute each ripped connection with a greediness slightly
        // perturbed per attempt, matching spec.md 4.8's "schedule of
        // hyperparameter tuples (... x greediness x ...)" at a scale
        // appropriate for a single-threaded, non-concurrent scheduler.
        let mut section_config = config.clone();
        section_config.greedy = config.greedy * (0.75 + 0.5 * ((attempt % 3) as f64) / 2.0);

        let mut reran = false;
        for (name, root, _) in &saved {
            let Some(route) = routes_by_name.get(name) else { continue };
            if route.nodes.len() < 2 {
                continue;
            }
            let start = *route.nodes.first().unwrap();
            let goal = *route.nodes.last().unwrap();
            let budget = (config.max_iterations_per_path as f64
                * (mesh.node(start).center().dist(mesh.node(goal).center()) + 1.0))
                .min(config.max_iterations as f64) as u64;
            if let Some(path) = path_connection(mesh, pool, name, root, start, goal, &section_config, budget) {
                reassign(pool, assignments, name.clone(), root.clone(), path);
                reran = true;
            }
        }

        let section_after: f64 = subgraph.iter().map(|&n| failure_cost(node_pf_at(mesh, pool, n))).sum();
        let board_after = board_pf_score(mesh, pool);

        let improved = reran && section_after < section_before - 1e-9 && board_after < board_before - 1e-9;
        if !improved {
            // Revert: release whatever the reroute attempt assigned and
            // restore every ripped connection's original path exactly.
            for (name, _, _) in &saved {
                rip(pool, assignments, name);
            }
            for (name, root, prior) in saved {
                if prior.is_empty() {
                    continue;
                }
                reassign(pool, assignments, name, root, prior);
            }
        }
    }
}

/// Runs port-point pathing for every capacity route, assigning port points
/// in the shared pool as it goes. Failures are recorded and that
/// connection falls back to its coarse node path (handled by the caller).
/// Follows with the section-reoptimization loop (spec.md 4.8) over
/// whatever assigned, provided the result of the first pass left any node
/// above `config.acceptable_pf`.
pub fn unravel(
    mesh: &Mesh,
    pool: &mut Vec<PortPoint>,
    routes: &[CapacityRoute],
    config: &RouteConfig,
) -> (HashMap<Id, Vec<PortPointIdx>>, Vec<FailureKind>) {
    let mut assignments = HashMap::new();
    let mut failures = Vec::new();

    for route in routes {
        if route.nodes.len() < 2 {
            continue;
        }
        let start = *route.nodes.first().unwrap();
        let goal = *route.nodes.last().unwrap();
        let budget = (config.max_iterations_per_path as f64
            * (mesh.node(start).center().dist(mesh.node(goal).center()) + 1.0))
            .min(config.max_iterations as f64) as u64;

        match path_connection(mesh, pool, &route.connection, &route.root, start, goal, config, budget) {
            Some(path) => {
                for &pp_idx in &path {
                    pool[pp_idx.index()].assign(route.connection.clone(), route.root.clone());
                }
                assignments.insert(route.connection.clone(), path);
            }
            None => failures.push(FailureKind::IterationBudgetExceeded {
                connection: route.connection.clone(),
                stage: "unravel",
            }),
        }
    }

    reoptimize_sections(mesh, pool, &mut assignments, routes, config);
    (assignments, failures)
}
