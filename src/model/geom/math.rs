//! Epsilon-aware scalar and orientation helpers.
//!
//! Every coordinate comparison in this crate goes through one of these
//! functions rather than `==`/`<`.

use approx::{relative_eq, relative_ne};

use crate::model::geom::pt::Pt;

/// Tolerance for coordinate equality.
pub const EP: f64 = 1e-6;
/// Tolerance for edge-boundary detection (mesh adjacency, segment
/// containment); kept separate from `EP` since it is exercised right at the
/// limits of f64 precision after repeated bisection of the board rectangle.
pub const EDGE_EP: f64 = 1e-4;

pub fn f64_eq(a: f64, b: f64) -> bool {
    relative_eq!(a, b, epsilon = EP)
}

pub fn f64_ne(a: f64, b: f64) -> bool {
    relative_ne!(a, b, epsilon = EP)
}

pub fn f64_gt(a: f64, b: f64) -> bool {
    f64_ne(a, b) && a > b
}

pub fn f64_ge(a: f64, b: f64) -> bool {
    f64_eq(a, b) || a > b
}

pub fn f64_lt(a: f64, b: f64) -> bool {
    f64_ne(a, b) && a < b
}

pub fn f64_le(a: f64, b: f64) -> bool {
    f64_eq(a, b) || a < b
}

pub fn f64_cmp(a: &f64, b: &f64) -> std::cmp::Ordering {
    a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
}

pub fn pt_eq(a: Pt, b: Pt) -> bool {
    f64_eq(a.x, b.x) && f64_eq(a.y, b.y)
}

/// Cross-product of OA and OB.
pub fn cross_at(o: Pt, a: Pt, b: Pt) -> f64 {
    (a - o).cross(b - o)
}

/// -1/0/1 depending on which side of line (st,en) the point p is on.
pub fn orientation(st: Pt, en: Pt, p: Pt) -> i32 {
    let c = cross_at(st, en, p);
    if f64_eq(c, 0.0) {
        0
    } else if c > 0.0 {
        1
    } else {
        -1
    }
}

pub fn is_strictly_left_of(p: Pt, st: Pt, en: Pt) -> bool {
    f64_gt(cross_at(st, en, p), 0.0)
}

pub fn is_left_of(p: Pt, st: Pt, en: Pt) -> bool {
    f64_ge(cross_at(st, en, p), 0.0)
}

pub fn is_collinear(a: Pt, b: Pt, c: Pt) -> bool {
    f64_eq(cross_at(a, b, c), 0.0)
}

/// Rounds a coordinate to the cache-key quantum (spec section 6).
pub fn quantize(v: f64, quantum: f64) -> i64 {
    (v / quantum).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_within_epsilon() {
        assert!(f64_eq(1.0, 1.0 + EP / 2.0));
        assert!(!f64_eq(1.0, 1.1));
    }

    #[test]
    fn orientation_signs() {
        let st = Pt::new(0.0, 0.0);
        let en = Pt::new(1.0, 0.0);
        assert_eq!(orientation(st, en, Pt::new(0.5, 1.0)), 1);
        assert_eq!(orientation(st, en, Pt::new(0.5, -1.0)), -1);
        assert_eq!(orientation(st, en, Pt::new(0.5, 0.0)), 0);
    }

    #[test]
    fn quantize_rounds() {
        assert_eq!(quantize(1.0023, 0.005), 200);
        assert_eq!(quantize(1.0025, 0.005), 201);
    }
}
