use enumset::{EnumSet, EnumSetType};

use crate::name::Id;

/// A single copper layer. Boards support up to 32 layers (`EnumSet`'s
/// backing word); that comfortably exceeds any real stackup this crate
/// expects to route.
#[derive(Debug, EnumSetType)]
pub enum Layer {
    L0,
    L1,
    L2,
    L3,
    L4,
    L5,
    L6,
    L7,
    L8,
    L9,
    L10,
    L11,
    L12,
    L13,
    L14,
    L15,
}

pub type LayerSet = EnumSet<Layer>;

impl Layer {
    pub fn from_z(z: usize) -> Layer {
        use Layer::*;
        const ORDER: [Layer; 16] = [
            L0, L1, L2, L3, L4, L5, L6, L7, L8, L9, L10, L11, L12, L13, L14, L15,
        ];
        ORDER[z]
    }

    pub fn z(self) -> usize {
        self as usize
    }

    /// Maps a layer index to the wire naming convention: `top`, `bottom`,
    /// `inner1..innerN-2`. Deterministic given only the stackup's layer count.
    pub fn name(z: usize, layer_count: usize) -> String {
        if z == 0 {
            "top".to_owned()
        } else if z == layer_count - 1 {
            "bottom".to_owned()
        } else {
            format!("inner{z}")
        }
    }
}

use crate::model::geom::{Pt, Rt};

/// An axis-aligned keepout/copper-pour rectangle. Occupies a subset of
/// layers; routes on those layers belonging to a net outside
/// `connected_to` are illegal if they overlap it.
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub rt: Rt,
    pub layers: LayerSet,
    pub connected_to: Vec<Id>,
}

impl Obstacle {
    pub fn new(rt: Rt, layers: LayerSet, connected_to: Vec<Id>) -> Self {
        Self { rt, layers, connected_to }
    }

    pub fn blocks(&self, z: usize, net: &Id) -> bool {
        self.layers.contains(Layer::from_z(z)) && !self.connected_to.contains(net)
    }
}

/// One endpoint of a connection to be routed: a board location plus the
/// layers it may legally be reached on.
#[derive(Debug, Clone)]
pub struct ConnectionPoint {
    pub p: Pt,
    pub layers: LayerSet,
}

impl ConnectionPoint {
    pub fn new(p: Pt, layers: LayerSet) -> Self {
        Self { p, layers }
    }
}

/// A net to route: a name and its endpoints. `root` is `self.name` for an
/// original net, or the original net's name for a synthetic MST segment
/// produced by the net-to-point-pairs stage.
#[derive(Debug, Clone)]
pub struct Connection {
    pub name: Id,
    pub root: Id,
    pub points: Vec<ConnectionPoint>,
}

impl Connection {
    pub fn new(name: Id, points: Vec<ConnectionPoint>) -> Self {
        let root = name.clone();
        Self { name, root, points }
    }

    pub fn with_root(name: Id, root: Id, points: Vec<ConnectionPoint>) -> Self {
        Self { name, root, points }
    }
}

/// Board-level routing parameters. `outline` defaults to the bounding
/// rectangle when absent.
#[derive(Debug, Clone)]
pub struct Board {
    pub bounds: Rt,
    pub layer_count: usize,
    pub min_trace_width: f64,
    pub min_via_diameter: f64,
    pub outline: Option<crate::model::geom::Polygon>,
    pub obstacles: Vec<Obstacle>,
    pub connections: Vec<Connection>,
}

impl Board {
    pub fn new(bounds: Rt, layer_count: usize, min_trace_width: f64, min_via_diameter: f64) -> Self {
        assert!(layer_count >= 1);
        Self {
            bounds,
            layer_count,
            min_trace_width,
            min_via_diameter,
            outline: None,
            obstacles: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn all_layers(&self) -> LayerSet {
        (0..self.layer_count).map(Layer::from_z).collect()
    }

    pub fn contains(&self, p: Pt) -> bool {
        match &self.outline {
            Some(poly) => poly.contains_pt(p),
            None => self.bounds.contains(p),
        }
    }

    /// A point is off-board if outside the bounds/outline, or sitting on an
    /// obstacle declared as an off-board keepout (layers covering every
    /// layer and connected to no net).
    pub fn is_off_board(&self, p: Pt) -> bool {
        if !self.contains(p) {
            return true;
        }
        self.obstacles.iter().any(|o| {
            o.connected_to.is_empty()
                && o.layers == self.all_layers()
                && o.rt.contains(p)
        })
    }
}
