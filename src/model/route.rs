use crate::model::geom::Pt;
use crate::model::mesh::NodeIdx;
use crate::model::port::PortPointIdx;
use crate::name::{Id, Idx};

pub struct CandidateKind;
pub type CandidateIdx = Idx<CandidateKind>;

/// An A* search node for port-point pathing (spec.md 4.8). `prev` is an
/// arena index rather than a pointer so the candidate chain can be walked
/// and dropped without reference cycles.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub idx: CandidateIdx,
    pub prev: Option<CandidateIdx>,
    pub port_point: Option<PortPointIdx>,
    pub node: NodeIdx,
    pub p: Pt,
    pub z: usize,
    pub g: f64,
    pub h: f64,
    pub distance_traveled: f64,
    pub touched_off_board: bool,
}

impl Candidate {
    pub fn f(&self, greedy: f64) -> f64 {
        self.g + greedy * self.h
    }
}

/// A chain of `Candidate`s rooted at a start state, stored in an arena so
/// predecessors are looked up by index rather than shared pointers.
#[derive(Debug, Default)]
pub struct CandidateArena {
    candidates: Vec<Candidate>,
}

impl CandidateArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut c: Candidate) -> CandidateIdx {
        let idx = CandidateIdx::new(self.candidates.len() as u32);
        c.idx = idx;
        self.candidates.push(c);
        idx
    }

    pub fn get(&self, idx: CandidateIdx) -> &Candidate {
        &self.candidates[idx.index()]
    }

    /// Walks the chain from `idx` back to its root, returning nodes in
    /// traversal order (root first).
    pub fn chain(&self, idx: CandidateIdx) -> Vec<&Candidate> {
        let mut out = Vec::new();
        let mut cur = Some(idx);
        while let Some(i) = cur {
            let c = self.get(i);
            out.push(c);
            cur = c.prev;
        }
        out.reverse();
        out
    }

    /// True if `node` already appears in the chain ending at `idx` — the
    /// no-node-revisit constraint (spec.md 4.8).
    pub fn visits(&self, idx: CandidateIdx, node: NodeIdx) -> bool {
        let mut cur = Some(idx);
        while let Some(i) = cur {
            let c = self.get(i);
            if c.node == node {
                return true;
            }
            cur = c.prev;
        }
        false
    }
}

/// A single wire/via/jumper element of a finished trace, in board-output
/// order (spec.md section 6).
#[derive(Debug, Clone)]
pub enum RouteSegment {
    Wire { x: f64, y: f64, width: f64, layer: usize },
    Via { x: f64, y: f64, from_layer: usize, to_layer: usize },
    Jumper { start: Pt, end: Pt, footprint: f64 },
}

/// The final output for one connection: an ordered polyline plus vias and
/// optional jumpers, or an unrouted fallback straight line.
#[derive(Debug, Clone)]
pub struct HighDensityRoute {
    pub connection: Id,
    pub polyline: Vec<(Pt, usize)>,
    pub vias: Vec<Pt>,
    pub trace_thickness: f64,
    pub via_diameter: f64,
    pub jumpers: Vec<(Pt, Pt)>,
    pub routed: bool,
}

impl HighDensityRoute {
    pub fn unrouted(connection: Id, from: Pt, to: Pt, z: usize, trace_thickness: f64, via_diameter: f64) -> Self {
        Self {
            connection,
            polyline: vec![(from, z), (to, z)],
            vias: Vec::new(),
            trace_thickness,
            via_diameter,
            jumpers: Vec::new(),
            routed: false,
        }
    }

    /// Invariant check (spec.md section 3): consecutive points differing in
    /// z must share (x,y) and have a via recorded at that point.
    pub fn layer_transitions_have_vias(&self) -> bool {
        self.polyline.windows(2).all(|w| {
            let (p0, z0) = w[0];
            let (p1, z1) = w[1];
            if z0 == z1 {
                true
            } else {
                crate::model::geom::math::pt_eq(p0, p1) && self.vias.iter().any(|&v| crate::model::geom::math::pt_eq(v, p0))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geom::pt;

    #[test]
    fn candidate_chain_walks_root_first() {
        let mut arena = CandidateArena::new();
        let root = arena.push(Candidate {
            idx: Idx::new(0),
            prev: None,
            port_point: None,
            node: Idx::new(0),
            p: pt(0.0, 0.0),
            z: 0,
            g: 0.0,
            h: 10.0,
            distance_traveled: 0.0,
            touched_off_board: false,
        });
        let child = arena.push(Candidate {
            idx: Idx::new(0),
            prev: Some(root),
            port_point: None,
            node: Idx::new(1),
            p: pt(1.0, 0.0),
            z: 0,
            g: 1.0,
            h: 9.0,
            distance_traveled: 1.0,
            touched_off_board: false,
        });
        let chain = arena.chain(child);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].node, Idx::new(0));
        assert_eq!(chain[1].node, Idx::new(1));
        assert!(arena.visits(child, Idx::new(0)));
        assert!(!arena.visits(child, Idx::new(2)));
    }

    #[test]
    fn route_detects_missing_via_on_layer_change() {
        let mut r = HighDensityRoute::unrouted(Id::from("n1"), pt(0.0, 0.0), pt(1.0, 0.0), 0, 0.2, 0.5);
        r.polyline = vec![(pt(0.0, 0.0), 0), (pt(0.0, 0.0), 1)];
        assert!(!r.layer_transitions_have_vias());
        r.vias.push(pt(0.0, 0.0));
        assert!(r.layer_transitions_have_vias());
    }
}
