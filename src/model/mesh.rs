use crate::model::board::LayerSet;
use crate::model::geom::{Pt, Rt};
use crate::name::Idx;

pub struct NodeKind;
pub struct EdgeKind;

pub type NodeIdx = Idx<NodeKind>;
pub type EdgeIdx = Idx<EdgeKind>;

/// A leaf cell of the adaptive quadtree: a capacity node. `capacity` is the
/// number of simultaneous crossings this cell's geometry can hold, derived
/// once by `getTunedTotalCapacity1` at mesh-build time.
#[derive(Debug, Clone)]
pub struct CapacityNode {
    pub idx: NodeIdx,
    pub rt: Rt,
    pub available_z: LayerSet,
    pub contains_target: bool,
    pub contains_obstacle: bool,
    pub off_board: bool,
    pub capacity: usize,
    pub used: usize,
}

impl CapacityNode {
    pub fn new(idx: NodeIdx, rt: Rt, available_z: LayerSet, capacity: usize) -> Self {
        Self {
            idx,
            rt,
            available_z,
            contains_target: false,
            contains_obstacle: false,
            off_board: false,
            capacity,
            used: 0,
        }
    }

    pub fn center(&self) -> Pt {
        self.rt.center()
    }

    /// Residual capacity scaled by `max_capacity_factor` (spec.md 4.5); a
    /// factor > 1 permits temporary overload rather than hard failure.
    pub fn residual(&self, max_capacity_factor: f64) -> f64 {
        (self.capacity as f64) * max_capacity_factor - self.used as f64
    }

    pub fn congestion(&self, power: f64) -> f64 {
        if self.capacity == 0 {
            return f64::INFINITY;
        }
        (self.used as f64 / self.capacity as f64).powf(power)
    }
}

/// An undirected adjacency between two capacity nodes sharing a boundary
/// segment with overlapping `availableZ`.
#[derive(Debug, Clone)]
pub struct CapacityEdge {
    pub idx: EdgeIdx,
    pub a: NodeIdx,
    pub b: NodeIdx,
    pub shared: (Pt, Pt),
    pub available_z: LayerSet,
}

impl CapacityEdge {
    pub fn new(idx: EdgeIdx, a: NodeIdx, b: NodeIdx, shared: (Pt, Pt), available_z: LayerSet) -> Self {
        Self { idx, a, b, shared, available_z }
    }

    pub fn len(&self) -> f64 {
        self.shared.0.dist(self.shared.1)
    }

    pub fn other(&self, n: NodeIdx) -> NodeIdx {
        if n == self.a {
            self.b
        } else {
            self.a
        }
    }
}

/// The mesh produced by `MeshBuilder`/`EdgeBuilder`/`DeadEndPrune`: nodes
/// and edges addressed purely by `Idx`, plus each node's incident edges for
/// O(1) neighbor lookup during pathing.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub nodes: Vec<CapacityNode>,
    pub edges: Vec<CapacityEdge>,
    pub incident: Vec<Vec<EdgeIdx>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, rt: Rt, available_z: LayerSet, capacity: usize) -> NodeIdx {
        let idx = NodeIdx::new(self.nodes.len() as u32);
        self.nodes.push(CapacityNode::new(idx, rt, available_z, capacity));
        self.incident.push(Vec::new());
        idx
    }

    pub fn add_edge(&mut self, a: NodeIdx, b: NodeIdx, shared: (Pt, Pt), available_z: LayerSet) -> EdgeIdx {
        let idx = EdgeIdx::new(self.edges.len() as u32);
        self.edges.push(CapacityEdge::new(idx, a, b, shared, available_z));
        self.incident[a.index()].push(idx);
        self.incident[b.index()].push(idx);
        idx
    }

    pub fn node(&self, i: NodeIdx) -> &CapacityNode {
        &self.nodes[i.index()]
    }

    pub fn node_mut(&mut self, i: NodeIdx) -> &mut CapacityNode {
        &mut self.nodes[i.index()]
    }

    pub fn edge(&self, i: EdgeIdx) -> &CapacityEdge {
        &self.edges[i.index()]
    }

    pub fn neighbors(&self, n: NodeIdx) -> impl Iterator<Item = (EdgeIdx, NodeIdx)> + '_ {
        self.incident[n.index()].iter().map(move |&e| (e, self.edge(e).other(n)))
    }

    pub fn degree(&self, n: NodeIdx) -> usize {
        self.incident[n.index()].len()
    }

    /// Removes a node and its incident edges, leaving the freed `Idx` slots
    /// as tombstones (`removed` stays true in `nodes[idx]`... actually we
    /// compact by swap-remove of the incident list only; node/edge vectors
    /// keep stable indices so outstanding `Idx` values remain valid).
    pub fn remove_edge(&mut self, e: EdgeIdx) {
        let edge = self.edges[e.index()].clone();
        self.incident[edge.a.index()].retain(|&x| x != e);
        self.incident[edge.b.index()].retain(|&x| x != e);
    }
}
