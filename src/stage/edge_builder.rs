//! Builds capacity edges between leaf cells sharing a boundary with
//! positive-length overlap and non-empty mutual `availableZ` (spec.md 4.3).
//! The spec calls for a spatial index (sweep/interval tree) over cell
//! boundaries; this uses a coordinate-bucketed sweep (cells grouped by
//! rounded boundary coordinate) to avoid the O(n^2) all-pairs scan while
//! staying within this crate's existing geometry primitives rather than
//! pulling in a dedicated interval-tree crate.

use std::collections::HashMap;

use crate::model::geom::math::quantize;
use crate::model::mesh::{Mesh, NodeIdx};

const BUCKET_QUANTUM: f64 = 1e-3;

pub fn build_edges(mesh: &mut Mesh) {
    let candidates = candidate_pairs(mesh);
    for (a, b) in candidates {
        if let Some((shared, z)) = shared_boundary(mesh, a, b) {
            mesh.add_edge(a, b, shared, z);
        }
    }
}

/// Groups node indices by the quantized x (for vertical boundaries) and y
/// (for horizontal boundaries) of their rect edges, so only cells aligned
/// on a shared boundary line are ever compared.
fn candidate_pairs(mesh: &Mesh) -> Vec<(NodeIdx, NodeIdx)> {
    let mut by_left: HashMap<i64, Vec<NodeIdx>> = HashMap::new();
    let mut by_right: HashMap<i64, Vec<NodeIdx>> = HashMap::new();
    let mut by_bottom: HashMap<i64, Vec<NodeIdx>> = HashMap::new();
    let mut by_top: HashMap<i64, Vec<NodeIdx>> = HashMap::new();

    for n in &mesh.nodes {
        by_left.entry(quantize(n.rt.x, BUCKET_QUANTUM)).or_default().push(n.idx);
        by_right.entry(quantize(n.rt.x + n.rt.w, BUCKET_QUANTUM)).or_default().push(n.idx);
        by_bottom.entry(quantize(n.rt.y, BUCKET_QUANTUM)).or_default().push(n.idx);
        by_top.entry(quantize(n.rt.y + n.rt.h, BUCKET_QUANTUM)).or_default().push(n.idx);
    }

    let mut pairs = Vec::new();
    for (k, rights) in &by_right {
        if let Some(lefts) = by_left.get(k) {
            for &a in rights {
                for &b in lefts {
                    if a != b {
                        pairs.push((a.min(b), a.max(b)));
                    }
                }
            }
        }
    }
    for (k, tops) in &by_top {
        if let Some(bottoms) = by_bottom.get(k) {
            for &a in tops {
                for &b in bottoms {
                    if a != b {
                        pairs.push((a.min(b), a.max(b)));
                    }
                }
            }
        }
    }
    pairs.sort();
    pairs.dedup();
    pairs
}

fn shared_boundary(
    mesh: &Mesh,
    a: NodeIdx,
    b: NodeIdx,
) -> Option<((crate::model::geom::Pt, crate::model::geom::Pt), crate::model::board::LayerSet)> {
    let na = mesh.node(a);
    let nb = mesh.node(b);
    let (p0, p1) = na.rt.shared_edge(&nb.rt)?;
    if p0.dist(p1) <= crate::model::geom::math::EDGE_EP {
        return None;
    }
    let z = na.available_z & nb.available_z;
    if z.is_empty() {
        return None;
    }
    Some(((p0, p1), z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::board::LayerSet;
    use crate::model::geom::rt;

    #[test]
    fn builds_edge_between_adjacent_cells() {
        let mut mesh = Mesh::new();
        mesh.add_node(rt(0.0, 0.0, 1.0, 1.0), LayerSet::all(), 4);
        mesh.add_node(rt(1.0, 0.0, 1.0, 1.0), LayerSet::all(), 4);
        build_edges(&mut mesh);
        assert_eq!(mesh.edges.len(), 1);
        assert_eq!(mesh.edges[0].len(), 1.0);
    }

    #[test]
    fn no_edge_without_mutual_layer() {
        let mut mesh = Mesh::new();
        mesh.add_node(rt(0.0, 0.0, 1.0, 1.0), LayerSet::only(crate::model::board::Layer::L0), 4);
        mesh.add_node(rt(1.0, 0.0, 1.0, 1.0), LayerSet::only(crate::model::board::Layer::L1), 4);
        build_edges(&mut mesh);
        assert!(mesh.edges.is_empty());
    }

    #[test]
    fn no_edge_for_diagonal_cells() {
        let mut mesh = Mesh::new();
        mesh.add_node(rt(0.0, 0.0, 1.0, 1.0), LayerSet::all(), 4);
        mesh.add_node(rt(1.0, 1.0, 1.0, 1.0), LayerSet::all(), 4);
        build_edges(&mut mesh);
        assert!(mesh.edges.is_empty());
    }
}
