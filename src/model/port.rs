use crate::model::mesh::{EdgeIdx, NodeIdx};
use crate::name::{Id, Idx};

pub struct PortPointKind;
pub type PortPointIdx = Idx<PortPointKind>;

/// A discrete crossing slot on a capacity edge's shared boundary segment.
#[derive(Debug, Clone)]
pub struct PortPoint {
    pub idx: PortPointIdx,
    pub x: f64,
    pub y: f64,
    pub z: usize,
    pub edge: EdgeIdx,
    pub nodes: (NodeIdx, NodeIdx),
    pub d_centermost: f64,
    pub assigned: Option<Assignment>,
}

/// Binds a port point to exactly one connection. `root` is the originating
/// net name; two port points on the same edge may share `root` but never
/// differ only in `connection` while sharing `root`'s electrical identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub connection: Id,
    pub root: Id,
}

impl PortPoint {
    pub fn new(idx: PortPointIdx, x: f64, y: f64, z: usize, edge: EdgeIdx, nodes: (NodeIdx, NodeIdx)) -> Self {
        Self { idx, x, y, z, edge, nodes, d_centermost: 0.0, assigned: None }
    }

    pub fn p(&self) -> crate::model::geom::Pt {
        crate::model::geom::pt(self.x, self.y)
    }

    pub fn is_free(&self) -> bool {
        self.assigned.is_none()
    }

    /// True if occupied by a different root net than `root` (spec.md
    /// section 3: two assigned port points on the same edge with different
    /// root nets are disjoint, i.e. mutually exclusive).
    pub fn conflicts_with(&self, root: &Id) -> bool {
        matches!(&self.assigned, Some(a) if &a.root != root)
    }

    pub fn assign(&mut self, connection: Id, root: Id) {
        self.assigned = Some(Assignment { connection, root });
    }

    pub fn release(&mut self) {
        self.assigned = None;
    }

    pub fn other_node(&self, n: NodeIdx) -> NodeIdx {
        if n == self.nodes.0 {
            self.nodes.1
        } else {
            self.nodes.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Idx;

    fn idx(i: u32) -> PortPointIdx {
        Idx::new(i)
    }

    #[test]
    fn assignment_conflict_detection() {
        let mut p = PortPoint::new(
            idx(0),
            0.0,
            0.0,
            0,
            Idx::new(0),
            (Idx::new(0), Idx::new(1)),
        );
        assert!(p.is_free());
        p.assign(Id::from("net_a_mst0"), Id::from("net_a"));
        assert!(!p.conflicts_with(&Id::from("net_a")));
        assert!(p.conflicts_with(&Id::from("net_b")));
        p.release();
        assert!(p.is_free());
    }

    #[test]
    fn other_node_returns_opposite_endpoint() {
        let p = PortPoint::new(idx(0), 0.0, 0.0, 0, Idx::new(0), (Idx::new(3), Idx::new(7)));
        assert_eq!(p.other_node(Idx::new(3)), Idx::new(7));
        assert_eq!(p.other_node(Idx::new(7)), Idx::new(3));
    }
}
