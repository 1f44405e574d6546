use serde::{Deserialize, Serialize};

use crate::model::geom::math::is_collinear;
use crate::model::geom::pt::Pt;
use crate::model::geom::rect::Rt;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    st: Pt,
    en: Pt,
}

impl Segment {
    pub fn new(st: Pt, en: Pt) -> Self {
        Self { st, en }
    }

    pub fn st(&self) -> Pt {
        self.st
    }
    pub fn en(&self) -> Pt {
        self.en
    }
    pub fn dir(&self) -> Pt {
        self.en - self.st
    }
    pub fn len(&self) -> f64 {
        self.st.dist(self.en)
    }
    pub fn mid(&self) -> Pt {
        self.st.lerp(self.en, 0.5)
    }

    pub fn bounds(&self) -> Rt {
        Rt::enclosing(self.st, self.en)
    }

    /// True if `p` is collinear with this segment and within its bounding box.
    pub fn contains(&self, p: Pt) -> bool {
        is_collinear(self.st, self.en, p) && self.bounds().contains(p)
    }

    /// Projects `p` onto the infinite line through this segment.
    pub fn project(&self, p: Pt) -> Pt {
        let d = self.dir();
        let len2 = d.dot(d);
        if len2 <= f64::EPSILON {
            return self.st;
        }
        let t = (p - self.st).dot(d) / len2;
        self.st + d * t
    }

    /// Projects `p` onto the line and clamps to lie within the segment.
    pub fn project_clamped(&self, p: Pt) -> Pt {
        let d = self.dir();
        let len2 = d.dot(d);
        if len2 <= f64::EPSILON {
            return self.st;
        }
        let t = ((p - self.st).dot(d) / len2).clamp(0.0, 1.0);
        self.st + d * t
    }

    /// Signed distance of `p` along this segment's direction, in [0, len].
    pub fn param_dist(&self, p: Pt) -> f64 {
        self.st.dist(self.project_clamped(p))
    }

    /// True if point `p` is ordered strictly between `a` and `b` along this
    /// segment's direction (used to order crossings along an edge).
    pub fn order_along(&self, a: Pt, b: Pt) -> std::cmp::Ordering {
        self.param_dist(a).partial_cmp(&self.param_dist(b)).unwrap_or(std::cmp::Ordering::Equal)
    }

    pub fn point_at(&self, t: f64) -> Pt {
        self.st.lerp(self.en, t)
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?} -> {:?}]", self.st, self.en)
    }
}

pub fn seg(st: Pt, en: Pt) -> Segment {
    Segment::new(st, en)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geom::pt::pt;

    #[test]
    fn project_onto_axis_aligned() {
        let s = seg(pt(0.0, 0.0), pt(10.0, 0.0));
        assert_eq!(s.project(pt(5.0, 3.0)), pt(5.0, 0.0));
        assert_eq!(s.project_clamped(pt(15.0, 3.0)), pt(10.0, 0.0));
    }

    #[test]
    fn order_along_matches_param_dist() {
        let s = seg(pt(0.0, 0.0), pt(10.0, 0.0));
        assert_eq!(s.order_along(pt(2.0, 0.0), pt(8.0, 0.0)), std::cmp::Ordering::Less);
    }

    #[test]
    fn contains_collinear_point_only() {
        let s = seg(pt(0.0, 0.0), pt(10.0, 0.0));
        assert!(s.contains(pt(5.0, 0.0)));
        assert!(!s.contains(pt(5.0, 1.0)));
        assert!(!s.contains(pt(11.0, 0.0)));
    }
}
