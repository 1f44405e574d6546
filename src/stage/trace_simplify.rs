//! `N` passes of collinear-segment merging and redundant-via removal
//! (spec.md 4.11), run over each `StitchedRoute`'s final polyline. Designed
//! to be idempotent past its fixpoint (spec.md section 8, property 7:
//! `simplify(simplify(r)) == simplify(r)`): each pass keeps iterating a
//! single route until nothing more changes, so running it again is a no-op.

use crate::config::RouteConfig;
use crate::model::geom::math::pt_eq;
use crate::model::geom::Pt;
use crate::stage::route_stitch::StitchedRoute;

/// Applies `config.simplify_passes` rounds of simplification; a pass that
/// changes nothing short-circuits every following pass.
pub fn simplify_routes(routes: &[StitchedRoute], config: &RouteConfig) -> Vec<StitchedRoute> {
    routes.iter().map(|r| simplify_route(r, config.simplify_passes)).collect()
}

pub fn simplify_route(route: &StitchedRoute, passes: u32) -> StitchedRoute {
    let mut polyline = route.polyline.clone();
    for _ in 0..passes.max(1) {
        let next = simplify_once(&polyline);
        if next == polyline {
            break;
        }
        polyline = next;
    }

    let vias = vias_from_polyline(&polyline);

    StitchedRoute {
        connection: route.connection.clone(),
        polyline,
        vias,
        jumpers: route.jumpers.clone(),
        trace_thickness: route.trace_thickness,
        via_diameter: route.via_diameter,
        routed: route.routed,
    }
}

/// One simplification pass: first collapses there-and-back via pairs (a
/// via whose before/after segments land on the same layer with no wire run
/// between them), then merges collinear runs on a single layer.
fn simplify_once(polyline: &[(Pt, usize)]) -> Vec<(Pt, usize)> {
    let without_redundant_vias = remove_redundant_vias(polyline);
    merge_collinear(&without_redundant_vias)
}

fn remove_redundant_vias(polyline: &[(Pt, usize)]) -> Vec<(Pt, usize)> {
    let mut out = polyline.to_vec();
    loop {
        let mut changed = false;
        let mut i = 1;
        while i + 1 < out.len() {
            let (p0, z0) = out[i - 1];
            let (p1, z1) = out[i];
            let (p2, z2) = out[i + 1];
            if pt_eq(p0, p1) && pt_eq(p1, p2) && z0 == z2 && z0 != z1 {
                out.remove(i);
                changed = true;
                continue;
            }
            i += 1;
        }
        if !changed {
            break;
        }
    }
    out
}

fn merge_collinear(polyline: &[(Pt, usize)]) -> Vec<(Pt, usize)> {
    if polyline.len() < 3 {
        return polyline.to_vec();
    }
    let mut out = Vec::with_capacity(polyline.len());
    out.push(polyline[0]);
    for i in 1..polyline.len() - 1 {
        let (p0, z0) = out[out.len() - 1];
        let (p1, z1) = polyline[i];
        let (p2, z2) = polyline[i + 1];
        if z0 == z1 && z1 == z2 && crate::model::geom::math::is_collinear(p0, p1, p2) {
            continue;
        }
        out.push((p1, z1));
    }
    out.push(polyline[polyline.len() - 1]);
    out
}

/// Rebuilds the via list from scratch from wherever the simplified
/// polyline changes layer, rather than trying to track individual via
/// entries through removal/merge — simpler and self-consistent with
/// property 5 (spec.md section 8: every layer change has a via at that
/// point).
fn vias_from_polyline(polyline: &[(Pt, usize)]) -> Vec<Pt> {
    polyline
        .windows(2)
        .filter(|w| w[0].1 != w[1].1)
        .map(|w| w[0].0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geom::pt;
    use crate::name::Id;

    fn stitched(poly: Vec<(Pt, usize)>) -> StitchedRoute {
        StitchedRoute {
            connection: Id::from("net1"),
            polyline: poly,
            vias: Vec::new(),
            jumpers: Vec::new(),
            trace_thickness: 0.2,
            via_diameter: 0.5,
            routed: true,
        }
    }

    #[test]
    fn merges_collinear_midpoint() {
        let r = stitched(vec![(pt(0.0, 0.0), 0), (pt(5.0, 0.0), 0), (pt(10.0, 0.0), 0)]);
        let out = simplify_route(&r, 2);
        assert_eq!(out.polyline.len(), 2);
    }

    #[test]
    fn keeps_non_collinear_bend() {
        let r = stitched(vec![(pt(0.0, 0.0), 0), (pt(5.0, 0.0), 0), (pt(5.0, 5.0), 0)]);
        let out = simplify_route(&r, 2);
        assert_eq!(out.polyline.len(), 3);
    }

    #[test]
    fn removes_round_trip_via() {
        let r = stitched(vec![
            (pt(0.0, 0.0), 0),
            (pt(5.0, 0.0), 0),
            (pt(5.0, 0.0), 1),
            (pt(5.0, 0.0), 0),
            (pt(10.0, 0.0), 0),
        ]);
        let out = simplify_route(&r, 2);
        assert_eq!(out.polyline.len(), 2);
        assert!(out.vias.is_empty());
    }

    #[test]
    fn via_preserved_on_real_layer_change() {
        let r = stitched(vec![(pt(0.0, 0.0), 0), (pt(5.0, 0.0), 0), (pt(5.0, 0.0), 1), (pt(10.0, 0.0), 1)]);
        let out = simplify_route(&r, 2);
        assert_eq!(out.vias.len(), 1);
        assert_eq!(out.vias[0], pt(5.0, 0.0));
    }

    #[test]
    fn idempotent_past_fixpoint() {
        let r = stitched(vec![
            (pt(0.0, 0.0), 0),
            (pt(2.0, 0.0), 0),
            (pt(5.0, 0.0), 0),
            (pt(5.0, 0.0), 1),
            (pt(5.0, 0.0), 0),
            (pt(8.0, 0.0), 0),
            (pt(10.0, 0.0), 0),
        ]);
        let once = simplify_route(&r, 2);
        let twice = simplify_route(&once, 2);
        assert_eq!(once.polyline, twice.polyline);
    }
}
