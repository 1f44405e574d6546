use crate::model::geom::capsule::Capsule;
use crate::model::geom::circle::Circle;
use crate::model::geom::distance::{circ_rt_dist, rt_seg_dist};
use crate::model::geom::math::{f64_le, orientation};
use crate::model::geom::path_shape::Path;
use crate::model::geom::polygon::Polygon;
use crate::model::geom::rect::Rt;
use crate::model::geom::segment::{seg, Segment};

pub fn cap_intersects_rt(a: &Capsule, b: &Rt) -> bool {
    if b.contains(a.st()) || b.contains(a.en()) {
        true
    } else {
        f64_le(rt_seg_dist(b, &a.seg()), a.r())
    }
}

pub fn circ_intersects_rt(a: &Circle, b: &Rt) -> bool {
    b.contains(a.p()) || f64_le(circ_rt_dist(a, b), 0.0)
}

pub fn path_intersects_rt(a: &Path, b: &Rt) -> bool {
    a.caps().any(|cap| cap_intersects_rt(&cap, b))
}

/// Separating-axis-free test via edge crossings plus a containment check:
/// either a polygon edge crosses a rectangle edge, or one shape's vertex
/// lies fully inside the other (handles full containment either way).
pub fn poly_intersects_rt(a: &Polygon, b: &Rt) -> bool {
    for (p0, p1) in a.edges() {
        let s = seg(p0, p1);
        if b.segs().iter().any(|rs| seg_intersects_seg(rs, &s)) {
            return true;
        }
    }
    if a.pts().iter().any(|&p| b.contains(p)) {
        return true;
    }
    b.pts().iter().any(|&p| a.contains_pt(p))
}

pub fn rt_intersects_poly(a: &Rt, b: &Polygon) -> bool {
    poly_intersects_rt(b, a)
}

pub fn rt_intersects_rt(a: &Rt, b: &Rt) -> bool {
    a.intersects(b)
}

pub fn rt_intersects_seg(a: &Rt, b: &Segment) -> bool {
    if a.contains(b.st()) || a.contains(b.en()) {
        return true;
    }
    a.segs().iter().any(|s| seg_intersects_seg(s, b))
}

pub fn circ_intersects_circ(a: &Circle, b: &Circle) -> bool {
    f64_le(a.p().dist(b.p()), a.r() + b.r())
}

pub fn circ_intersects_poly(a: &Circle, b: &Polygon) -> bool {
    b.contains_pt(a.p()) || f64_le(crate::model::geom::distance::pt_poly_dist(&a.p(), b), a.r())
}

pub fn circ_intersects_seg(a: &Circle, b: &Segment) -> bool {
    f64_le(crate::model::geom::distance::pt_seg_dist(&a.p(), b), a.r())
}

pub fn path_intersects_path(a: &Path, b: &Path) -> bool {
    a.caps().any(|ca| b.caps().any(|cb| f64_le(seg_intersects_seg_capsule_dist(&ca, &cb), 0.0)))
}

fn seg_intersects_seg_capsule_dist(a: &Capsule, b: &Capsule) -> f64 {
    (crate::model::geom::distance::seg_seg_dist(&a.seg(), &b.seg()) - a.r() - b.r()).max(0.0)
}

pub fn path_intersects_seg(a: &Path, b: &Segment) -> bool {
    a.caps().any(|cap| cap_seg_dist(&cap, b) <= 0.0)
}

pub fn poly_intersects_poly(a: &Polygon, b: &Polygon) -> bool {
    for (p0, p1) in a.edges() {
        let s = seg(p0, p1);
        if b.edges().any(|(q0, q1)| seg_intersects_seg(&s, &seg(q0, q1))) {
            return true;
        }
    }
    a.pts().iter().any(|&p| b.contains_pt(p)) || b.pts().iter().any(|&p| a.contains_pt(p))
}

pub fn poly_intersects_seg(a: &Polygon, b: &Segment) -> bool {
    a.contains_pt(b.st())
        || a.contains_pt(b.en())
        || a.edges().any(|(p0, p1)| seg_intersects_seg(&seg(p0, p1), b))
}

pub fn seg_intersects_seg(a: &Segment, b: &Segment) -> bool {
    // Check if the segment endpoints are on opposite sides of the other segment.
    let a_st = orientation(b.st(), b.en(), a.st());
    let a_en = orientation(b.st(), b.en(), a.en());
    let b_st = orientation(a.st(), a.en(), b.st());
    let b_en = orientation(a.st(), a.en(), b.en());
    // No collinear points. Everything on different sides.
    if a_st != a_en && b_st != b_en {
        return true;
    }
    // Check collinear cases. Need to check both x and y coordinates to handle
    // vertical and horizontal segments.
    let a_rt = Rt::enclosing(a.st(), a.en());
    let b_rt = Rt::enclosing(b.st(), b.en());
    if a_st == 0 && b_rt.contains(a.st()) {
        return true;
    }
    if a_en == 0 && b_rt.contains(a.en()) {
        return true;
    }
    if b_st == 0 && a_rt.contains(b.st()) {
        return true;
    }
    if b_en == 0 && a_rt.contains(b.en()) {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geom::pt::pt;

    const SEG_SEG_TESTS: &[(Segment, Segment, bool)] = &[
        // Crossing
        (seg(pt(1.0, 1.0), pt(3.0, 4.0)), seg(pt(2.0, 4.0), pt(3.0, 1.0)), true),
        // Shared endpoints, not parallel
        (seg(pt(1.0, 1.0), pt(2.0, 3.0)), seg(pt(2.0, 3.0), pt(4.0, 1.0)), true),
        // Shared endpoints, parallel, one point of intersection
        (seg(pt(1.0, 1.0), pt(3.0, 2.0)), seg(pt(3.0, 2.0), pt(5.0, 3.0)), true),
        // Endpoint abutting segment, perpendicular
        (seg(pt(1.0, 1.0), pt(3.0, 3.0)), seg(pt(2.0, 4.0), pt(4.0, 2.0)), true),
        // Same segments
        (seg(pt(1.0, 1.0), pt(1.0, 1.0)), seg(pt(1.0, 1.0), pt(1.0, 1.0)), true),
        // Parallel and overlapping
        (seg(pt(1.0, 1.0), pt(3.0, 1.0)), seg(pt(2.0, 1.0), pt(4.0, 1.0)), true),
        // Parallel and contained
        (seg(pt(1.0, 1.0), pt(4.0, 1.0)), seg(pt(2.0, 1.0), pt(3.0, 1.0)), true),
        // Parallel segments with one shared endpoint overlapping
        (seg(pt(1.0, 1.0), pt(3.0, 1.0)), seg(pt(1.0, 1.0), pt(4.0, 1.0)), true),
        // Degenerate: one segment is a point, on the other segment.
        (seg(pt(1.0, 1.0), pt(3.0, 1.0)), seg(pt(2.0, 1.0), pt(2.0, 1.0)), true),
        // Degenerate: one segment is a point, on the other segment's endpoint
        (seg(pt(1.0, 1.0), pt(3.0, 1.0)), seg(pt(3.0, 1.0), pt(3.0, 1.0)), true),
        // Degenerate: same segments and they are points
        (seg(pt(1.0, 1.0), pt(1.0, 1.0)), seg(pt(1.0, 1.0), pt(1.0, 1.0)), true),
        // Parallel, not intersecting
        (seg(pt(1.0, 3.0), pt(3.0, 1.0)), seg(pt(2.0, 4.0), pt(4.0, 2.0)), false),
        // Perpendicular, not intersecting, projection of endpoint onto other is an endpoint
        (seg(pt(1.0, 1.0), pt(3.0, 3.0)), seg(pt(4.0, 2.0), pt(5.0, 1.0)), false),
        // Perpendicular, not intersecting
        (seg(pt(1.0, 1.0), pt(3.0, 3.0)), seg(pt(3.0, 1.0), pt(4.0, 0.0)), false),
        // Degenerate: both are points, not intersecting
        (seg(pt(1.0, 1.0), pt(1.0, 1.0)), seg(pt(2.0, 1.0), pt(2.0, 1.0)), false),
        // Degenerate: one is a point, collinear with the other segment, not intersecting
        (seg(pt(1.0, 1.0), pt(3.0, 3.0)), seg(pt(4.0, 4.0), pt(4.0, 4.0)), false),
        // Degenerate: one is a point, not intersecting
        (seg(pt(1.0, 1.0), pt(3.0, 3.0)), seg(pt(1.0, 2.0), pt(1.0, 2.0)), false),
    ];

    fn test_seg_seg_permutations(a: &Segment, b: &Segment, res: bool) {
        assert_eq!(seg_intersects_seg(a, b), res, "{} {} intersects? {}", a, b, res);
        assert_eq!(seg_intersects_seg(b, a), res, "{} {} intersects? {}", a, b, res);
        let a = seg(a.en(), a.st());
        let b = seg(b.en(), b.st());
        assert_eq!(seg_intersects_seg(&a, &b), res, "{} {} intersects? {}", a, b, res);
        assert_eq!(seg_intersects_seg(&b, &a), res, "{} {} intersects? {}", a, b, res);
    }

    #[test]
    fn test_seg_seg() {
        for (a, b, res) in SEG_SEG_TESTS {
            test_seg_seg_permutations(a, b, *res);
            // Negating both points should not change the result.
            let a = &seg(-a.st(), -a.en());
            let b = &seg(-b.st(), -b.en());
            test_seg_seg_permutations(a, b, *res);
            // Translating both segments should not change the result.
            let d = pt(-3.0, 4.0);
            let a = &seg(a.st() + d, a.en() + d);
            let b = &seg(b.st() + d, b.en() + d);
            test_seg_seg_permutations(a, b, *res);
        }
    }

    #[test]
    fn rt_intersects_rt_touching_edge() {
        let a = Rt::new(0.0, 0.0, 10.0, 10.0);
        let b = Rt::new(10.0, 0.0, 10.0, 10.0);
        assert!(rt_intersects_rt(&a, &b));
    }

    #[test]
    fn poly_intersects_rt_overlap_and_containment() {
        use crate::model::geom::polygon::poly;
        let square = poly(vec![pt(2.0, 2.0), pt(8.0, 2.0), pt(8.0, 8.0), pt(2.0, 8.0)]);
        let overlapping = Rt::new(5.0, 5.0, 10.0, 10.0);
        let containing = Rt::new(-5.0, -5.0, 20.0, 20.0);
        let disjoint = Rt::new(100.0, 100.0, 1.0, 1.0);
        assert!(poly_intersects_rt(&square, &overlapping));
        assert!(poly_intersects_rt(&square, &containing));
        assert!(!poly_intersects_rt(&square, &disjoint));
    }
}
