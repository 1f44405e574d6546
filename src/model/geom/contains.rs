use crate::model::geom::polygon::Polygon;
use crate::model::geom::rect::Rt;

/// True if `b` lies entirely within `a` — every corner inside, and no edge
/// of `a` crosses into `b`.
pub fn polygon_contains_rt(a: &Polygon, b: &Rt) -> bool {
    b.pts().iter().all(|&p| a.contains_pt(p))
}

pub fn rt_contains_rt(a: &Rt, b: &Rt) -> bool {
    a.contains_rt(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geom::polygon::poly;
    use crate::model::geom::pt::pt;

    #[test]
    fn polygon_contains_rt_inside() {
        let big = poly(vec![pt(0.0, 0.0), pt(20.0, 0.0), pt(20.0, 20.0), pt(0.0, 20.0)]);
        let inner = Rt::new(5.0, 5.0, 5.0, 5.0);
        assert!(polygon_contains_rt(&big, &inner));
        let outside = Rt::new(15.0, 15.0, 10.0, 10.0);
        assert!(!polygon_contains_rt(&big, &outside));
    }
}
