//! Concatenates the per-node-sequence `HighDensityRoute`s produced for each
//! MST sub-connection (spec.md 4.1) back into one route per original net
//! (spec.md 4.10). A multi-point net decomposes into several two-point
//! sub-connections sharing a `root`; this stage chains those sub-routes by
//! nearest-endpoint match into a single polyline per root, matching the
//! teacher's `Router::ratsnest` pattern of treating a net's connectivity as
//! a small graph built from pairwise distances (`src/route/router.rs`,
//! `full_net_interconnect`) — here applied to polyline endpoints instead of
//! pin positions.

use std::collections::HashMap;

use crate::model::geom::math::EDGE_EP;
use crate::model::geom::Pt;
use crate::model::route::HighDensityRoute;
use crate::name::Id;

/// Points closer than this are the "same" point for stitching purposes and
/// get collapsed rather than duplicated.
const DUPLICATE_TOLERANCE: f64 = EDGE_EP;

/// Beyond this distance, joining two sub-routes is still attempted (spec.md
/// 4.10: "the stitch continues") but recorded as a warning rather than
/// silently treated as a clean join.
const GAP_WARNING_THRESHOLD: f64 = 1e-2;

#[derive(Debug, Clone)]
pub struct StitchedRoute {
    pub connection: Id,
    pub polyline: Vec<(Pt, usize)>,
    pub vias: Vec<Pt>,
    pub jumpers: Vec<(Pt, Pt)>,
    pub trace_thickness: f64,
    pub via_diameter: f64,
    pub routed: bool,
}

/// Chains `routes` (one `HighDensityRoute` per MST sub-connection) into one
/// `StitchedRoute` per root net. `roots` maps a sub-connection's name to
/// its root net's name (spec.md 4.1's `rootConnectionName`); a
/// sub-connection absent from `roots` is its own root (an already-atomic
/// two-point net never decomposed by `NetToPointPairs`).
pub fn stitch_routes(
    routes: &[HighDensityRoute],
    roots: &HashMap<Id, Id>,
) -> (Vec<StitchedRoute>, Vec<String>) {
    let mut by_root: HashMap<Id, Vec<&HighDensityRoute>> = HashMap::new();
    for r in routes {
        let root = roots.get(&r.connection).cloned().unwrap_or_else(|| r.connection.clone());
        by_root.entry(root).or_default().push(r);
    }

    let mut roots_sorted: Vec<&Id> = by_root.keys().collect();
    roots_sorted.sort();

    let mut out = Vec::new();
    let mut warnings = Vec::new();

    for root in roots_sorted {
        let mut pieces = by_root[root].clone();
        pieces.sort_by(|a, b| a.connection.cmp(&b.connection));

        let Some(first) = pieces.first() else { continue };
        let mut chain: Vec<(Pt, usize)> = first.polyline.clone();
        let mut vias = first.vias.clone();
        let mut jumpers = first.jumpers.clone();
        let mut routed = first.routed;
        let mut remaining: Vec<&HighDensityRoute> = pieces[1..].to_vec();

        while !remaining.is_empty() {
            let (best_idx, reverse, dist) = best_match(&chain, &remaining);
            let piece = remaining.remove(best_idx);
            routed &= piece.routed;
            vias.extend(piece.vias.iter().copied());
            jumpers.extend(piece.jumpers.iter().copied());

            let mut seg = piece.polyline.clone();
            if reverse {
                seg.reverse();
            }
            if dist > GAP_WARNING_THRESHOLD {
                warnings.push(format!(
                    "route_stitch: gap of {dist:.4} joining {} into {root}",
                    piece.connection
                ));
            }
            append_collapsing_duplicate(&mut chain, seg.remove(0), dist);
            chain.extend(seg);
        }

        out.push(StitchedRoute {
            connection: root.clone(),
            polyline: chain,
            vias: dedup_pts(vias),
            jumpers,
            trace_thickness: first.trace_thickness,
            via_diameter: first.via_diameter,
            routed,
        });
    }

    (out, warnings)
}

/// Finds which remaining piece has an endpoint nearest either end of
/// `chain`, and whether that piece must be reversed to connect head-to-tail.
/// Returns (index into `remaining`, needs_reverse, distance).
fn best_match(chain: &[(Pt, usize)], remaining: &[&HighDensityRoute]) -> (usize, bool, f64) {
    let chain_end = chain.last().unwrap().0;
    let mut best = (0usize, false, f64::INFINITY);

    for (i, piece) in remaining.iter().enumerate() {
        let Some(&(st, _)) = piece.polyline.first() else { continue };
        let Some(&(en, _)) = piece.polyline.last() else { continue };

        let d_st = chain_end.dist(st);
        if d_st < best.2 {
            best = (i, false, d_st);
        }
        let d_en = chain_end.dist(en);
        if d_en < best.2 {
            best = (i, true, d_en);
        }
    }
    best
}

fn append_collapsing_duplicate(chain: &mut Vec<(Pt, usize)>, next: (Pt, usize), dist: f64) {
    let last = *chain.last().unwrap();
    if dist <= DUPLICATE_TOLERANCE && last.1 == next.1 {
        return;
    }
    chain.push(next);
}

fn dedup_pts(mut pts: Vec<Pt>) -> Vec<Pt> {
    pts.sort_by(crate::model::geom::pt::pt_cmp);
    pts.dedup_by(|a, b| a.dist(*b) <= DUPLICATE_TOLERANCE);
    pts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geom::pt;

    fn route(name: &str, poly: Vec<(Pt, usize)>) -> HighDensityRoute {
        HighDensityRoute {
            connection: Id::from(name),
            polyline: poly,
            vias: Vec::new(),
            trace_thickness: 0.2,
            via_diameter: 0.5,
            jumpers: Vec::new(),
            routed: true,
        }
    }

    #[test]
    fn single_subconnection_passes_through_unchanged() {
        let routes = vec![route("net1_mst0", vec![(pt(0.0, 0.0), 0), (pt(1.0, 0.0), 0)])];
        let mut roots = HashMap::new();
        roots.insert(Id::from("net1_mst0"), Id::from("net1"));
        let (stitched, warnings) = stitch_routes(&routes, &roots);
        assert!(warnings.is_empty());
        assert_eq!(stitched.len(), 1);
        assert_eq!(stitched[0].connection, Id::from("net1"));
        assert_eq!(stitched[0].polyline.len(), 2);
    }

    #[test]
    fn two_subconnections_chain_at_shared_endpoint() {
        let routes = vec![
            route("net1_mst0", vec![(pt(0.0, 0.0), 0), (pt(5.0, 0.0), 0)]),
            route("net1_mst1", vec![(pt(5.0, 0.0), 0), (pt(5.0, 5.0), 0)]),
        ];
        let mut roots = HashMap::new();
        roots.insert(Id::from("net1_mst0"), Id::from("net1"));
        roots.insert(Id::from("net1_mst1"), Id::from("net1"));
        let (stitched, warnings) = stitch_routes(&routes, &roots);
        assert!(warnings.is_empty());
        assert_eq!(stitched.len(), 1);
        // shared endpoint (5,0) collapsed, not duplicated.
        assert_eq!(stitched[0].polyline.len(), 3);
    }

    #[test]
    fn reversed_piece_is_flipped_before_joining() {
        let routes = vec![
            route("net1_mst0", vec![(pt(0.0, 0.0), 0), (pt(5.0, 0.0), 0)]),
            // stored start-to-end backwards relative to the chain; must be
            // reversed so it still joins at (5,0).
            route("net1_mst1", vec![(pt(5.0, 5.0), 0), (pt(5.0, 0.0), 0)]),
        ];
        let mut roots = HashMap::new();
        roots.insert(Id::from("net1_mst0"), Id::from("net1"));
        roots.insert(Id::from("net1_mst1"), Id::from("net1"));
        let (stitched, _) = stitch_routes(&routes, &roots);
        assert_eq!(stitched[0].polyline.last().unwrap().0, pt(5.0, 5.0));
    }

    #[test]
    fn large_gap_is_warned_but_still_joined() {
        let routes = vec![
            route("net1_mst0", vec![(pt(0.0, 0.0), 0), (pt(1.0, 0.0), 0)]),
            route("net1_mst1", vec![(pt(10.0, 0.0), 0), (pt(11.0, 0.0), 0)]),
        ];
        let mut roots = HashMap::new();
        roots.insert(Id::from("net1_mst0"), Id::from("net1"));
        roots.insert(Id::from("net1_mst1"), Id::from("net1"));
        let (stitched, warnings) = stitch_routes(&routes, &roots);
        assert_eq!(stitched[0].polyline.len(), 4);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn unrouted_subpiece_marks_whole_net_unrouted() {
        let mut unrouted = route("net1_mst1", vec![(pt(5.0, 0.0), 0), (pt(5.0, 5.0), 0)]);
        unrouted.routed = false;
        let routes = vec![route("net1_mst0", vec![(pt(0.0, 0.0), 0), (pt(5.0, 0.0), 0)]), unrouted];
        let mut roots = HashMap::new();
        roots.insert(Id::from("net1_mst0"), Id::from("net1"));
        roots.insert(Id::from("net1_mst1"), Id::from("net1"));
        let (stitched, _) = stitch_routes(&routes, &roots);
        assert!(!stitched[0].routed);
    }
}
