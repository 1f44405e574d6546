use serde::{Deserialize, Serialize};

use crate::model::geom::capsule::Capsule;
use crate::model::geom::pt::Pt;
use crate::model::geom::rect::Rt;

/// A polyline with thickness — the shape a finished trace occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pts: Vec<Pt>,
    r: f64,
}

impl Path {
    /// `width` is the full trace width; `r` (half-width) is what capsules use.
    pub fn new(pts: &[Pt], width: f64) -> Self {
        debug_assert!(pts.len() >= 2, "a path needs at least 2 points");
        Self { pts: pts.to_vec(), r: width / 2.0 }
    }

    pub fn pts(&self) -> &[Pt] {
        &self.pts
    }
    pub fn r(&self) -> f64 {
        self.r
    }
    pub fn width(&self) -> f64 {
        self.r * 2.0
    }

    /// Per-segment capsules making up this path.
    pub fn caps(&self) -> impl Iterator<Item = Capsule> + '_ {
        self.pts.windows(2).map(|w| Capsule::new(w[0], w[1], self.r))
    }

    pub fn bounds(&self) -> Rt {
        self.caps().map(|c| c.bounds()).reduce(|a, b| {
            let lo = Pt::new(a.left().min(b.left()), a.bottom().min(b.bottom()));
            let hi = Pt::new(a.right().max(b.right()), a.top().max(b.top()));
            Rt::enclosing(lo, hi)
        }).unwrap_or_default()
    }

    pub fn len(&self) -> f64 {
        self.pts.windows(2).map(|w| w[0].dist(w[1])).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pts.len() < 2
    }
}

pub fn path(pts: &[Pt], width: f64) -> Path {
    Path::new(pts, width)
}
