use serde::{Deserialize, Serialize};

use crate::model::geom::pt::Pt;
use crate::model::geom::rect::Rt;

/// A simple (non-self-intersecting) polygon, used for the board outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pts: Vec<Pt>,
}

impl Polygon {
    pub fn new(pts: impl Into<Vec<Pt>>) -> Self {
        let pts = pts.into();
        debug_assert!(pts.len() >= 3, "a polygon needs at least 3 vertices");
        Self { pts }
    }

    pub fn pts(&self) -> &[Pt] {
        &self.pts
    }

    /// Ordered (wrap-around) edges of the polygon.
    pub fn edges(&self) -> impl Iterator<Item = (Pt, Pt)> + '_ {
        let n = self.pts.len();
        (0..n).map(move |i| (self.pts[i], self.pts[(i + 1) % n]))
    }

    pub fn bounds(&self) -> Rt {
        let mut min = self.pts[0];
        let mut max = self.pts[0];
        for &p in &self.pts[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Rt::enclosing(min, max)
    }

    /// Point-in-polygon via the standard ray-casting parity test.
    pub fn contains_pt(&self, p: Pt) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            let crosses_y = (a.y > p.y) != (b.y > p.y);
            if crosses_y {
                let x_at_y = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x_at_y {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

pub fn poly(pts: impl Into<Vec<Pt>>) -> Polygon {
    Polygon::new(pts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geom::pt::pt;

    #[test]
    fn contains_pt_square() {
        let p = poly(vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0), pt(0.0, 10.0)]);
        assert!(p.contains_pt(pt(5.0, 5.0)));
        assert!(!p.contains_pt(pt(15.0, 5.0)));
    }

    #[test]
    fn bounds_matches_extremes() {
        let p = poly(vec![pt(-1.0, -2.0), pt(4.0, -2.0), pt(4.0, 6.0), pt(-1.0, 6.0)]);
        let b = p.bounds();
        assert_eq!(b.left(), -1.0);
        assert_eq!(b.top(), 6.0);
    }
}
