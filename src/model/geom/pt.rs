use auto_ops::{impl_op_ex, impl_op_ex_commutative};
use serde::{Deserialize, Serialize};

use crate::model::geom::math::f64_cmp;
use crate::model::geom::rect::Rt;

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pt {
    pub x: f64,
    pub y: f64,
}

impl Pt {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn dist(self, o: Pt) -> f64 {
        (self - o).mag()
    }

    pub fn mag(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(self, o: Pt) -> f64 {
        self.x * o.x + self.y * o.y
    }

    pub fn cross(self, o: Pt) -> f64 {
        self.x * o.y - self.y * o.x
    }

    /// Clamps this point to lie within (or on the boundary of) `r`.
    pub fn clamp(self, r: &Rt) -> Pt {
        Pt::new(self.x.clamp(r.left(), r.right()), self.y.clamp(r.bottom(), r.top()))
    }

    pub fn lerp(self, o: Pt, t: f64) -> Pt {
        self + (o - self) * t
    }
}

impl_op_ex!(+ |a: &Pt, b: &Pt| -> Pt { Pt::new(a.x + b.x, a.y + b.y) });
impl_op_ex!(-|a: &Pt, b: &Pt| -> Pt { Pt::new(a.x - b.x, a.y - b.y) });
impl_op_ex!(-|a: &Pt| -> Pt { Pt::new(-a.x, -a.y) });
impl_op_ex_commutative!(*|a: &Pt, b: &f64| -> Pt { Pt::new(a.x * b, a.y * b) });
impl_op_ex!(/ |a: &Pt, b: &f64| -> Pt { Pt::new(a.x / b, a.y / b) });
impl_op_ex!(+= |a: &mut Pt, b: &Pt| { a.x += b.x; a.y += b.y });

/// Orders points for deterministic tie-breaking (e.g. priority-queue
/// secondary keys): by x, then y.
pub fn pt_cmp(a: &Pt, b: &Pt) -> std::cmp::Ordering {
    f64_cmp(&a.x, &b.x).then_with(|| f64_cmp(&a.y, &b.y))
}

pub fn pt(x: f64, y: f64) -> Pt {
    Pt::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = pt(1.0, 2.0);
        let b = pt(3.0, -1.0);
        assert_eq!(a + b, pt(4.0, 1.0));
        assert_eq!(a - b, pt(-2.0, 3.0));
        assert_eq!(a * 2.0, pt(2.0, 4.0));
    }

    #[test]
    fn dist_and_dot() {
        assert_eq!(pt(0.0, 0.0).dist(pt(3.0, 4.0)), 5.0);
        assert_eq!(pt(1.0, 0.0).dot(pt(0.0, 1.0)), 0.0);
    }

    #[test]
    fn clamp_to_rect() {
        let r = Rt::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(pt(-5.0, 20.0).clamp(&r), pt(0.0, 10.0));
    }
}
