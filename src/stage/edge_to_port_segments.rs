//! For each edge traversed by at least one connection, computes the
//! ordered list of crossings on that edge's shared boundary segment
//! (spec.md 4.6). Ordering follows the projection of the downstream node
//! centers along the segment.

use std::collections::HashMap;

use crate::model::mesh::{EdgeIdx, Mesh, NodeIdx};
use crate::model::geom::Segment;
use crate::name::Id;
use crate::stage::capacity_pathing::CapacityRoute;

#[derive(Debug, Clone)]
pub struct Crossing {
    pub connection: Id,
    pub root: Id,
    /// The node the traversal is heading towards when it crosses this edge;
    /// used to project and order crossings along the shared segment.
    pub downstream: NodeIdx,
}

#[derive(Debug, Clone)]
pub struct EdgeSegment {
    pub edge: EdgeIdx,
    pub seg: Segment,
    pub crossings: Vec<Crossing>,
}

pub fn edge_to_port_segments(mesh: &Mesh, routes: &[CapacityRoute]) -> Vec<EdgeSegment> {
    let mut by_edge: HashMap<EdgeIdx, Vec<Crossing>> = HashMap::new();

    for route in routes {
        for w in route.nodes.windows(2) {
            let (from, to) = (w[0], w[1]);
            if let Some(edge) = edge_between(mesh, from, to) {
                by_edge.entry(edge).or_default().push(Crossing {
                    connection: route.connection.clone(),
                    root: route.root.clone(),
                    downstream: to,
                });
            }
        }
    }

    let mut out = Vec::new();
    for (edge, mut crossings) in by_edge {
        let e = mesh.edge(edge);
        let seg = Segment::new(e.shared.0, e.shared.1);
        crossings.sort_by(|a, b| {
            let pa = mesh.node(a.downstream).center();
            let pb = mesh.node(b.downstream).center();
            seg.project(pa)
                .partial_cmp(&seg.project(pb))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.connection.cmp(&b.connection))
        });
        out.push(EdgeSegment { edge, seg, crossings });
    }
    out.sort_by_key(|s| s.edge.get());
    out
}

fn edge_between(mesh: &Mesh, a: NodeIdx, b: NodeIdx) -> Option<EdgeIdx> {
    mesh.incident[a.index()]
        .iter()
        .find(|&&e| mesh.edge(e).other(a) == b)
        .copied()
}
