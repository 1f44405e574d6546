//! Distance functions should return 0 if there is intersection or
//! containment — quadtree refinement (mesh_builder) relies on that to treat
//! "touching" and "overlapping" uniformly.

use crate::model::geom::capsule::Capsule;
use crate::model::geom::circle::Circle;
use crate::model::geom::intersects::seg_intersects_seg;
use crate::model::geom::math::f64_cmp;
use crate::model::geom::path_shape::Path;
use crate::model::geom::polygon::Polygon;
use crate::model::geom::pt::Pt;
use crate::model::geom::rect::Rt;
use crate::model::geom::segment::{seg, Segment};

pub fn cap_circ_dist(a: &Capsule, b: &Circle) -> f64 {
    (pt_seg_dist(&b.p(), &a.seg()) - a.r() - b.r()).max(0.0)
}

pub fn cap_poly_dist(a: &Capsule, b: &Polygon) -> f64 {
    b.edges().map(|(p0, p1)| cap_seg_dist(a, &seg(p0, p1))).min_by(f64_cmp).unwrap_or(0.0)
}

pub fn cap_seg_dist(a: &Capsule, b: &Segment) -> f64 {
    (seg_seg_dist(&a.seg(), b) - a.r()).max(0.0)
}

pub fn path_poly_dist(a: &Path, b: &Polygon) -> f64 {
    a.caps().map(|cap| cap_poly_dist(&cap, b)).fold(f64::INFINITY, f64::min)
}

/// Distance from the circle to the boundary of the rectangle. Returns 0 if
/// the circle's center is inside the rectangle.
pub fn circ_rt_dist(a: &Circle, b: &Rt) -> f64 {
    if b.contains(a.p()) {
        return 0.0;
    }
    let p = a.p().clamp(b);
    (p.dist(a.p()) - a.r()).max(0.0)
}

pub fn pt_poly_dist(a: &Pt, b: &Polygon) -> f64 {
    if b.contains_pt(*a) {
        return 0.0;
    }
    b.edges().map(|(p0, p1)| pt_seg_dist(a, &seg(p0, p1))).fold(f64::INFINITY, f64::min)
}

pub fn pt_rt_dist(a: &Pt, b: &Rt) -> f64 {
    if b.contains(*a) {
        return 0.0;
    }
    let p = a.clamp(b);
    p.dist(*a)
}

pub fn pt_seg_dist(a: &Pt, b: &Segment) -> f64 {
    let st_dist = a.dist(b.st());
    let en_dist = a.dist(b.en());
    let project = b.project(*a);
    let dist = st_dist.min(en_dist);
    if b.contains(project) { dist.min(a.dist(project)) } else { dist }
}

pub fn rt_rt_dist(a: &Rt, b: &Rt) -> f64 {
    if a.intersects(b) {
        return 0.0;
    }
    a.pts().iter().map(|p| pt_rt_dist(p, b)).fold(f64::INFINITY, f64::min)
}

pub fn rt_seg_dist(a: &Rt, b: &Segment) -> f64 {
    a.segs().iter().map(|s| seg_seg_dist(s, b)).fold(f64::INFINITY, f64::min)
}

pub fn seg_seg_dist(a: &Segment, b: &Segment) -> f64 {
    // Closest distance must be between an endpoint and a segment, unless
    // the segments cross, in which case it is zero.
    if seg_intersects_seg(a, b) {
        return 0.0;
    }
    let mut best = pt_seg_dist(&a.st(), b);
    best = best.min(pt_seg_dist(&a.en(), b));
    best = best.min(pt_seg_dist(&b.st(), a));
    best = best.min(pt_seg_dist(&b.en(), a));
    best
}
