//! Converts an ordered list of crossings on a shared segment into discrete
//! port points, respecting minimum spacing (spec.md 4.7).

use crate::config::RouteConfig;
use crate::error::FailureKind;
use crate::model::mesh::{EdgeIdx, Mesh};
use crate::model::port::{PortPoint, PortPointIdx};
use crate::name::Idx;
use crate::stage::edge_to_port_segments::EdgeSegment;

/// Places `N` port points along `seg.seg`, evenly spaced starting from the
/// segment midpoint outward so port points stay centered on the shared
/// boundary, preserving input order and choosing z=0 unless the edge's
/// mutual `availableZ` excludes it.
pub fn segment_to_points(
    mesh: &Mesh,
    seg: &EdgeSegment,
    config: &RouteConfig,
    min_trace_width: f64,
    next_idx: &mut u32,
) -> Result<Vec<PortPoint>, FailureKind> {
    let n = seg.crossings.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    let edge = mesh.edge(seg.edge);
    let l = seg.seg.len();
    let spacing = required_spacing(config, min_trace_width);

    if n as f64 * spacing > l + crate::model::geom::math::EDGE_EP {
        return Err(FailureKind::CapacityExhaustion {
            connection: seg.crossings[0].connection.clone(),
            detail: format!("{n} crossings need {:.4} but segment length is {:.4}", n as f64 * spacing, l),
        });
    }

    let z = preferred_layer(edge.available_z);

    // Evenly distribute within the available span, centered.
    let span = spacing * (n.saturating_sub(1)) as f64;
    let start_d = (l - span) / 2.0;

    let mut points: Vec<(f64, usize)> = (0..n).map(|i| (start_d + spacing * i as f64, i)).collect();

    let mut out = Vec::with_capacity(n);
    for (d, i) in &points {
        let p = seg.seg.point_at(*d);
        let idx: PortPointIdx = Idx::new(*next_idx);
        *next_idx += 1;
        let mut pp = PortPoint::new(idx, p.x, p.y, z, edge.idx, (edge.a, edge.b));
        pp.d_centermost = 0.0;
        out.push((pp, *i));
    }

    // d_centermost: distance to the centermost crossing sharing this z
    // (spec.md 4.7). All points share z here, so centermost is the median
    // position along the segment.
    let center_d = l / 2.0;
    for ((pp, _), (d, _)) in out.iter_mut().zip(points.drain(..)) {
        pp.d_centermost = (d - center_d).abs();
    }

    Ok(out.into_iter().map(|(pp, _)| pp).collect())
}

/// Minimum port-point spacing `s = w + margin` (spec.md 4.7), where `w` is
/// the board's minimum trace width.
fn required_spacing(config: &RouteConfig, min_trace_width: f64) -> f64 {
    (min_trace_width + config.port_spacing_margin).max(1e-6)
}

/// Prefers z=0 unless it is absent from the mutual `availableZ` set.
fn preferred_layer(available: crate::model::board::LayerSet) -> usize {
    use crate::model::board::Layer;
    if available.contains(Layer::L0) {
        0
    } else {
        available.iter().next().map(|l| l.z()).unwrap_or(0)
    }
}

/// Flattens all edge segments into one port-point pool and an index of
/// which edge each point belongs to, matching `Mesh`'s "ownership by id
/// only" convention (spec.md section 3).
pub fn build_port_point_pool(
    mesh: &Mesh,
    segments: &[EdgeSegment],
    config: &RouteConfig,
    min_trace_width: f64,
) -> (Vec<PortPoint>, Vec<FailureKind>) {
    let mut pool = Vec::new();
    let mut failures = Vec::new();
    let mut next_idx = 0u32;
    for seg in segments {
        match segment_to_points(mesh, seg, config, min_trace_width, &mut next_idx) {
            Ok(pts) => pool.extend(pts),
            Err(f) => failures.push(f),
        }
    }
    (pool, failures)
}

pub fn port_points_for_edge(pool: &[PortPoint], edge: EdgeIdx) -> Vec<&PortPoint> {
    pool.iter().filter(|p| p.edge == edge).collect()
}
