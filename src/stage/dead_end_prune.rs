//! Iteratively removes non-target nodes of degree <= 1 (spec.md 4.4). Runs
//! to a fixpoint: pruning one leaf can expose its former neighbor as a new
//! degree-1 node.

use std::collections::HashSet;

use crate::model::mesh::{Mesh, NodeIdx};

/// Runs to a fixpoint by construction: `remove_edge` only strips adjacency
/// entries (`Mesh::remove_edge`'s doc comment — node/edge vectors keep
/// stable indices, nothing is ever compacted), so a node already stripped to
/// degree 0 satisfies `degree <= 1` forever. `settled` tracks every node
/// that has already been fully stripped so it is never re-collected into
/// `dead`; each round either settles at least one new node or finds none
/// left, so the outer loop always terminates within `mesh.nodes.len()`
/// rounds.
pub fn prune_dead_ends(mesh: &mut Mesh) {
    let total = mesh.nodes.len();
    let mut pruned = 0usize;
    let mut settled: HashSet<NodeIdx> = mesh
        .nodes
        .iter()
        .filter(|n| !n.contains_target && mesh.degree(n.idx) == 0)
        .map(|n| n.idx)
        .collect();
    loop {
        let dead: Vec<_> = mesh
            .nodes
            .iter()
            .filter(|n| !n.contains_target && !settled.contains(&n.idx) && mesh.degree(n.idx) <= 1)
            .map(|n| n.idx)
            .collect();
        if dead.is_empty() {
            break;
        }
        pruned += dead.len();
        for n in dead {
            let edges: Vec<_> = mesh.incident[n.index()].clone();
            for e in edges {
                mesh.remove_edge(e);
            }
            settled.insert(n);
        }
    }
    if total > 0 && pruned * 2 > total {
        log::warn!("dead_end_prune: removed {pruned}/{total} mesh nodes' edges, mesh may be under-connected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::board::LayerSet;
    use crate::model::geom::{pt, rt};

    #[test]
    fn prunes_a_dangling_leaf() {
        let mut mesh = Mesh::new();
        let z = LayerSet::all();
        let a = mesh.add_node(rt(0.0, 0.0, 1.0, 1.0), z, 4);
        let b = mesh.add_node(rt(1.0, 0.0, 1.0, 1.0), z, 4);
        let c = mesh.add_node(rt(2.0, 0.0, 1.0, 1.0), z, 4);
        mesh.add_edge(a, b, (pt(1.0, 0.0), pt(1.0, 1.0)), z);
        mesh.add_edge(b, c, (pt(2.0, 0.0), pt(2.0, 1.0)), z);
        // a and c are leaves (degree 1), b has degree 2.
        prune_dead_ends(&mut mesh);
        assert_eq!(mesh.degree(a), 0);
        assert_eq!(mesh.degree(b), 0);
        assert_eq!(mesh.degree(c), 0);
    }

    #[test]
    fn target_node_is_never_dropped_from_the_mesh() {
        let mut mesh = Mesh::new();
        let z = LayerSet::all();
        let a = mesh.add_node(rt(0.0, 0.0, 1.0, 1.0), z, 4);
        let b = mesh.add_node(rt(1.0, 0.0, 1.0, 1.0), z, 4);
        let c = mesh.add_node(rt(2.0, 0.0, 1.0, 1.0), z, 4);
        mesh.node_mut(a).contains_target = true;
        mesh.add_edge(a, b, (pt(1.0, 0.0), pt(1.0, 1.0)), z);
        mesh.add_edge(b, c, (pt(2.0, 0.0), pt(2.0, 1.0)), z);
        // b and c are non-target; a is a target leaf that must survive as a
        // node even once its edge is pruned away.
        prune_dead_ends(&mut mesh);
        assert_eq!(mesh.nodes.len(), 3);
        assert!(mesh.node(a).contains_target);
    }

    /// A longer all-non-target line prunes every node to degree 0 in a
    /// bounded number of rounds instead of spinning forever re-collecting
    /// nodes it already stripped to degree 0 in a prior round.
    #[test]
    fn prunes_a_long_chain_without_looping_forever() {
        let mut mesh = Mesh::new();
        let z = LayerSet::all();
        let nodes: Vec<_> = (0..8).map(|i| mesh.add_node(rt(i as f64, 0.0, 1.0, 1.0), z, 4)).collect();
        for w in nodes.windows(2) {
            mesh.add_edge(w[0], w[1], (pt(0.0, 0.0), pt(0.0, 1.0)), z);
        }
        prune_dead_ends(&mut mesh);
        for n in nodes {
            assert_eq!(mesh.degree(n), 0);
        }
    }
}
