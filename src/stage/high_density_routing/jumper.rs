//! Jumper-insertion fallback for single-layer nodes that still need a
//! same-layer crossing (spec.md 4.9): each crossing costs one 0-ohm bridge
//! component, and the total jumpers placed in a node must fit its
//! footprint area. The probability-of-failure/area calibration constants
//! here are heuristic (spec.md §9, Open Questions: "the jumper probability
//! of failure formula is heuristic ... should be re-derived or left as
//! knobs") so they are named constants rather than inline magic numbers.

use crate::model::geom::Rt;

/// Area a single jumper footprint is assumed to occupy, in board units
/// squared. A knob, not a physical constant (see module doc).
pub const JUMPER_FOOTPRINT_AREA: f64 = 0.5;

/// Base probability of failure contributed by placing one jumper in a node,
/// before scaling by how crowded the node's footprint is.
pub const JUMPER_BASE_PF: f64 = 0.02;

/// Weight applied to the ratio of jumper footprint area to node area when
/// estimating failure probability: more jumpers crammed into a small node
/// raise Pf faster than the base rate alone.
pub const JUMPER_AREA_FACTOR: f64 = 0.5;

/// The footprint area a single jumper at this node is assumed to require.
/// Exposed so callers can reason about `max_jumpers_for`.
pub fn jumper_footprint(_bounds: Rt) -> f64 {
    JUMPER_FOOTPRINT_AREA
}

/// How many jumpers can fit in a node's rectangle before its footprint
/// budget is exhausted (spec.md 4.9: "total jumpers per node must fit in
/// the node's footprint area").
pub fn max_jumpers_for(bounds: Rt) -> usize {
    ((bounds.area() / JUMPER_FOOTPRINT_AREA).floor() as i64).max(0) as usize
}

/// Heuristic per-jumper failure probability, scaled by how full the node's
/// jumper budget already is (`placed` jumpers out of `max_jumpers_for`).
pub fn jumper_pf(bounds: Rt, placed: usize) -> f64 {
    let max = max_jumpers_for(bounds).max(1);
    let fill_ratio = placed as f64 / max as f64;
    (JUMPER_BASE_PF + JUMPER_AREA_FACTOR * fill_ratio).min(1.0 - 1e-6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geom::rt;

    #[test]
    fn max_jumpers_scales_with_area() {
        let small = rt(0.0, 0.0, 1.0, 1.0);
        let big = rt(0.0, 0.0, 4.0, 4.0);
        assert!(max_jumpers_for(big) > max_jumpers_for(small));
    }

    #[test]
    fn pf_increases_as_budget_fills() {
        let bounds = rt(0.0, 0.0, 2.0, 2.0);
        let empty_pf = jumper_pf(bounds, 0);
        let full_pf = jumper_pf(bounds, max_jumpers_for(bounds));
        assert!(full_pf > empty_pf);
        assert!(full_pf < 1.0);
    }
}
