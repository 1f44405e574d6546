//! Decomposes each multi-point net into a Euclidean minimum spanning tree
//! of two-point connections (spec.md 4.1). Grounded in the teacher's
//! `Router::ratsnest`, which builds a `petgraph::GraphMap` over a net's
//! pins and runs `petgraph::algo::min_spanning_tree` on it; here the graph
//! is over connection points instead of component pins, and the mutual
//! layer-compatibility weighting is dropped since no pin carries a single
//! fixed layer in this model.

use petgraph::algo::{min_spanning_tree, MinSpanningTree};
use petgraph::data::FromElements;
use petgraph::graphmap::GraphMap;
use petgraph::Undirected;

use crate::error::{eyre, FailureKind, Result};
use crate::model::board::{Board, Connection, ConnectionPoint};
use crate::name::Id;

type PointGraph = GraphMap<usize, f64, Undirected>;

/// One MST-derived two-point connection plus whichever endpoint(s) of the
/// original net sit off the board (spec.md 4.1: "mark the containing mesh
/// node as an off-board entry").
#[derive(Debug, Clone)]
pub struct PointPair {
    pub name: Id,
    pub root: Id,
    pub a: ConnectionPoint,
    pub b: ConnectionPoint,
    pub a_off_board: bool,
    pub b_off_board: bool,
}

/// Splits every net with k>=2 endpoints into k-1 MST-ordered point pairs.
/// Returns hard failures for nets with fewer than 2 reachable endpoints
/// rather than aborting the whole run, so the caller can decide whether one
/// bad net should fail the entire board (spec.md section 7 treats this as
/// fatal "invalid input", but the decomposition itself stays total so the
/// pipeline driver makes that call in one place).
pub fn net_to_point_pairs(board: &Board) -> (Vec<PointPair>, Vec<FailureKind>) {
    let mut pairs = Vec::new();
    let mut failures = Vec::new();

    for net in &board.connections {
        let reachable: Vec<&ConnectionPoint> = net.points.iter().collect();
        if reachable.len() < 2 {
            failures.push(FailureKind::InvalidInput(format!(
                "net {} has {} reachable endpoint(s), need >= 2",
                net.name,
                reachable.len()
            )));
            continue;
        }

        let mst = mst_edges(&reachable);
        for (n, (i, j)) in mst.into_iter().enumerate() {
            let a = reachable[i].clone();
            let b = reachable[j].clone();
            pairs.push(PointPair {
                name: Id::new(format!("{}_mst{n}", net.name)),
                root: net.root.clone(),
                a_off_board: board.is_off_board(a.p),
                b_off_board: board.is_off_board(b.p),
                a,
                b,
            });
        }
    }

    (pairs, failures)
}

/// Builds the complete graph over `points` weighted by Euclidean distance
/// and returns the MST as a list of (index, index) edges, same pattern as
/// `Router::ratsnest`'s `GraphMap::from_elements(min_spanning_tree(..))`.
fn mst_edges(points: &[&ConnectionPoint]) -> Vec<(usize, usize)> {
    let mut graph = PointGraph::new();
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let d = points[i].p.dist(points[j].p);
            graph.add_edge(i, j, d);
        }
    }
    let mst: MinSpanningTree<&PointGraph> = min_spanning_tree(&graph);
    let mstg: PointGraph = GraphMap::from_elements(mst);
    mstg.all_edges().map(|(a, b, _)| (a, b)).collect()
}

pub fn validate_connection(c: &Connection) -> Result<()> {
    if c.points.len() < 2 {
        return Err(eyre!("connection {} needs at least 2 points, has {}", c.name, c.points.len()));
    }
    Ok(())
}
