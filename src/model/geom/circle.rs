use serde::{Deserialize, Serialize};

use crate::model::geom::pt::Pt;
use crate::model::geom::rect::Rt;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    p: Pt,
    r: f64,
}

impl Circle {
    pub fn new(p: Pt, r: f64) -> Self {
        debug_assert!(r >= 0.0);
        Self { p, r }
    }

    pub fn p(&self) -> Pt {
        self.p
    }
    pub fn r(&self) -> f64 {
        self.r
    }

    pub fn bounds(&self) -> Rt {
        Rt::new(self.p.x - self.r, self.p.y - self.r, self.r * 2.0, self.r * 2.0)
    }
}

pub fn circ(p: Pt, r: f64) -> Circle {
    Circle::new(p, r)
}
