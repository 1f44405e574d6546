use crate::model::geom::contains::polygon_contains_rt;
use crate::model::geom::intersects::{
    circ_intersects_circ, circ_intersects_poly, circ_intersects_rt, circ_intersects_seg,
    path_intersects_path, path_intersects_rt, path_intersects_seg, poly_intersects_poly,
    poly_intersects_rt, poly_intersects_seg, rt_intersects_rt, rt_intersects_seg,
    seg_intersects_seg,
};
use crate::model::geom::math::pt_eq;
use crate::model::geom::{Circle, Path, Polygon, Pt, Rt, Segment};
use crate::model::primitive::ShapeOps;

/// The shapes this crate's geometry needs: a rectangular obstacle/mesh
/// cell/board outline bound, a via pad, a trace polyline, a single crossing
/// point, the board's (optionally non-rectangular) outline, and a mesh edge
/// boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Path(Path),
    Point(Pt),
    Polygon(Polygon),
    Rect(Rt),
    Segment(Segment),
}

impl Shape {
    pub fn intersects(&self, s: &Shape) -> bool {
        use Shape::*;
        match (self, s) {
            (Circle(a), Circle(b)) => circ_intersects_circ(a, b),
            (Circle(a), Path(b)) | (Path(b), Circle(a)) => {
                b.caps().any(|cap| crate::model::geom::distance::cap_circ_dist(&cap, a) <= 0.0)
            }
            (Circle(a), Point(b)) | (Point(b), Circle(a)) => a.p().dist(*b) <= a.r(),
            (Circle(a), Polygon(b)) | (Polygon(b), Circle(a)) => circ_intersects_poly(a, b),
            (Circle(a), Rect(b)) | (Rect(b), Circle(a)) => circ_intersects_rt(a, b),
            (Circle(a), Segment(b)) | (Segment(b), Circle(a)) => circ_intersects_seg(a, b),
            (Path(a), Path(b)) => path_intersects_path(a, b),
            (Path(a), Point(b)) | (Point(b), Path(a)) => {
                a.caps().any(|cap| cap.st().dist(*b).min(cap.en().dist(*b)) <= cap.r())
            }
            (Path(a), Polygon(b)) | (Polygon(b), Path(a)) => {
                crate::model::geom::distance::path_poly_dist(a, b) <= 0.0
            }
            (Path(a), Rect(b)) | (Rect(b), Path(a)) => path_intersects_rt(a, b),
            (Path(a), Segment(b)) | (Segment(b), Path(a)) => path_intersects_seg(a, b),
            (Point(a), Point(b)) => pt_eq(*a, *b),
            (Point(a), Polygon(b)) | (Polygon(b), Point(a)) => b.contains_pt(*a),
            (Point(a), Rect(b)) | (Rect(b), Point(a)) => b.contains(*a),
            (Point(a), Segment(b)) | (Segment(b), Point(a)) => b.contains(*a),
            (Polygon(a), Polygon(b)) => poly_intersects_poly(a, b),
            (Polygon(a), Rect(b)) | (Rect(b), Polygon(a)) => poly_intersects_rt(a, b),
            (Polygon(a), Segment(b)) | (Segment(b), Polygon(a)) => poly_intersects_seg(a, b),
            (Rect(a), Rect(b)) => rt_intersects_rt(a, b),
            (Rect(a), Segment(b)) | (Segment(b), Rect(a)) => rt_intersects_seg(a, b),
            (Segment(a), Segment(b)) => seg_intersects_seg(a, b),
        }
    }

    /// True if `self` fully encloses `s`. Exact for convex containers
    /// (Rect, Circle); for `Polygon` this checks vertex containment of `s`,
    /// which is exact when `self` is convex and otherwise a conservative
    /// approximation (acceptable here: polygons only arise as board
    /// outlines, and outlines are expected to be convex-ish keepout shapes).
    pub fn contains(&self, s: &Shape) -> bool {
        use Shape::*;
        match (self, s) {
            (Rect(a), Point(b)) => a.contains(*b),
            (Rect(a), Rect(b)) => a.contains_rt(b),
            (Rect(a), Segment(b)) => a.contains(b.st()) && a.contains(b.en()),
            (Rect(a), Circle(b)) => {
                let r = b.r();
                if a.w < 2.0 * r || a.h < 2.0 * r {
                    false
                } else {
                    Rt::new(a.x + r, a.y + r, a.w - 2.0 * r, a.h - 2.0 * r).contains(b.p())
                }
            }
            (Rect(a), Path(b)) => b.pts().iter().all(|&p| a.contains(p)),
            (Rect(a), Polygon(b)) => b.pts().iter().all(|&p| a.contains(p)),
            (Polygon(a), Rect(b)) => polygon_contains_rt(a, b),
            (Polygon(a), Point(b)) => a.contains_pt(*b),
            (Polygon(a), Segment(b)) => a.contains_pt(b.st()) && a.contains_pt(b.en()),
            (Polygon(a), Circle(b)) => a.contains_pt(b.p()),
            (Polygon(a), Path(b)) => b.pts().iter().all(|&p| a.contains_pt(p)),
            (Polygon(a), Polygon(b)) => b.pts().iter().all(|&p| a.contains_pt(p)),
            (Circle(a), Point(b)) => a.p().dist(*b) <= a.r(),
            (Circle(a), Circle(b)) => a.p().dist(b.p()) + b.r() <= a.r(),
            (Point(a), Point(b)) => pt_eq(*a, *b),
            (Segment(a), Point(b)) => a.contains(*b),
            _ => false,
        }
    }

    pub fn filled(self) -> Shape {
        match self {
            Shape::Path(s) if s.r() == 0.0 => {
                crate::model::geom::poly(s.pts().to_vec()).shape()
            }
            s => s,
        }
    }
}

impl ShapeOps for Shape {
    fn bounds(&self) -> Rt {
        match self {
            Shape::Circle(s) => s.bounds(),
            Shape::Path(s) => s.bounds(),
            Shape::Point(s) => Rt::new(s.x, s.y, 0.0, 0.0),
            Shape::Polygon(s) => s.bounds(),
            Shape::Rect(s) => *s,
            Shape::Segment(s) => s.bounds(),
        }
    }

    fn shape(self) -> Shape {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geom::{circ, poly, pt, rt, seg};

    #[test]
    fn rect_contains_circle() {
        let big = Shape::Rect(rt(0.0, 0.0, 10.0, 10.0));
        let inner = Shape::Circle(circ(pt(5.0, 5.0), 1.0));
        let poking_out = Shape::Circle(circ(pt(0.5, 5.0), 1.0));
        assert!(big.contains(&inner));
        assert!(!big.contains(&poking_out));
    }

    #[test]
    fn shape_intersects_is_symmetric() {
        let a = Shape::Rect(rt(0.0, 0.0, 10.0, 10.0));
        let b = Shape::Segment(seg(pt(5.0, -5.0), pt(5.0, 5.0)));
        assert_eq!(a.intersects(&b), b.intersects(&a));
        assert!(a.intersects(&b));
    }

    #[test]
    fn polygon_point_membership() {
        let p = Shape::Polygon(poly(vec![pt(0.0, 0.0), pt(4.0, 0.0), pt(4.0, 4.0), pt(0.0, 4.0)]));
        let inside = Shape::Point(pt(2.0, 2.0));
        let outside = Shape::Point(pt(10.0, 2.0));
        assert!(p.intersects(&inside));
        assert!(!p.intersects(&outside));
    }
}
