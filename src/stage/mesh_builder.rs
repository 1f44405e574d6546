//! Adaptive quadtree mesh construction (spec.md 4.2). A one-shot transform
//! rather than an iterative `Solver`: the quadtree is built top-down to a
//! fixpoint in a single call, then wrapped by a trivial `Solver` in the
//! pipeline driver for uniformity with the iterative stages.

use crate::config::RouteConfig;
use crate::model::board::{Board, LayerSet};
use crate::model::geom::Rt;
use crate::model::mesh::Mesh;
use crate::model::primitive::Shape;

/// `getTunedTotalCapacity1`: maps a cell's smaller dimension to the number
/// of simultaneous routes it can hold, assuming routes need roughly
/// `min_pitch` of pitch each. Monotonic and saturating at 1 so degenerate
/// (near-zero) cells never report zero capacity.
pub fn tuned_total_capacity(rt: &Rt, min_pitch: f64) -> usize {
    let dim = rt.w.min(rt.h).max(0.0);
    ((dim / min_pitch.max(1e-9)).floor() as i64).max(1) as usize
}

/// Derives the adaptive quadtree's initial depth from board span and the
/// config's target minimum capacity, when `capacity_depth` is not pinned.
fn initial_depth(board: &Board, config: &RouteConfig) -> u32 {
    if let Some(d) = config.capacity_depth {
        return d;
    }
    let span = board.bounds.w.max(board.bounds.h);
    let min_pitch = (board.min_trace_width + config.port_spacing_margin).max(1e-6);
    let mut depth = 0u32;
    let mut dim = span;
    while tuned_total_capacity(&Rt::new(0.0, 0.0, dim, dim), min_pitch) > config.target_min_capacity
        && depth < 16
    {
        dim /= 2.0;
        depth += 1;
    }
    depth.max(1)
}

struct Cell {
    rt: Rt,
    depth: u32,
}

pub fn build_mesh(board: &Board, config: &RouteConfig) -> Mesh {
    let depth = initial_depth(board, config);
    let min_pitch = (board.min_trace_width + config.port_spacing_margin).max(1e-6);
    let target_size = min_pitch * config.target_min_capacity as f64;

    let root = Cell { rt: board.bounds, depth: 0 };
    let mut leaves = Vec::new();
    subdivide(board, config, root, depth, target_size, &mut leaves);

    let mut mesh = Mesh::new();
    for cell in leaves {
        if fully_inside_obstacle_without_target(board, &cell.rt) {
            continue;
        }
        let available_z = available_layers(board, &cell.rt);
        let capacity = tuned_total_capacity(&cell.rt, min_pitch);
        let idx = mesh.add_node(cell.rt, available_z, capacity);
        let node = mesh.node_mut(idx);
        node.contains_target = contains_any_endpoint(board, &cell.rt);
        node.contains_obstacle = board.obstacles.iter().any(|o| o.rt.intersects(&cell.rt));
        node.off_board = !board.contains(cell.rt.center());
    }
    mesh
}

fn subdivide(
    board: &Board,
    config: &RouteConfig,
    cell: Cell,
    min_depth: u32,
    target_size: f64,
    out: &mut Vec<Cell>,
) {
    let needs_obstacle_split = board
        .obstacles
        .iter()
        .any(|o| o.rt.intersects(&cell.rt) && cell_larger_than(&cell.rt, &o.rt));
    let needs_endpoint_split =
        cell.rt.w.max(cell.rt.h) > target_size && contains_any_endpoint(board, &cell.rt);
    let needs_outline_split =
        cell.rt.w.max(cell.rt.h) > target_size && touches_outline_boundary(board, &cell.rt);

    let must_split = cell.depth < min_depth
        || needs_obstacle_split
        || needs_endpoint_split
        || needs_outline_split;

    if !must_split || cell.depth >= 24 {
        out.push(cell);
        return;
    }

    for child_rt in quarter(&cell.rt) {
        subdivide(
            board,
            config,
            Cell { rt: child_rt, depth: cell.depth + 1 },
            min_depth,
            target_size,
            out,
        );
    }
}

fn cell_larger_than(cell: &Rt, obstacle: &Rt) -> bool {
    cell.w > obstacle.w || cell.h > obstacle.h
}

fn quarter(rt: &Rt) -> [Rt; 4] {
    let hw = rt.w / 2.0;
    let hh = rt.h / 2.0;
    [
        Rt::new(rt.x, rt.y, hw, hh),
        Rt::new(rt.x + hw, rt.y, hw, hh),
        Rt::new(rt.x, rt.y + hh, hw, hh),
        Rt::new(rt.x + hw, rt.y + hh, hw, hh),
    ]
}

fn contains_any_endpoint(board: &Board, rt: &Rt) -> bool {
    board.connections.iter().any(|c| c.points.iter().any(|p| rt.contains(p.p)))
}

fn touches_outline_boundary(board: &Board, rt: &Rt) -> bool {
    match &board.outline {
        Some(poly) => poly.edges().any(|(p0, p1)| {
            crate::model::geom::intersects::rt_intersects_seg(rt, &crate::model::geom::seg(p0, p1))
        }),
        None => {
            let b = board.bounds;
            Shape::Rect(b).intersects(&Shape::Rect(*rt)) && !Shape::Rect(b).contains(&Shape::Rect(*rt))
        }
    }
}

/// Reduces available layers by any obstacle fully covering the cell,
/// unless that obstacle is connected to every net with an endpoint in the
/// cell (spec.md 4.2: "unless the obstacle belongs to the cell's target
/// net").
fn available_layers(board: &Board, rt: &Rt) -> LayerSet {
    let mut z = board.all_layers();
    let target_nets: Vec<_> = board
        .connections
        .iter()
        .filter(|c| c.points.iter().any(|p| rt.contains(p.p)))
        .map(|c| c.root.clone())
        .collect();

    for o in &board.obstacles {
        if !o.rt.contains_rt(rt) {
            continue;
        }
        let exempt = target_nets.iter().any(|n| o.connected_to.contains(n));
        if !exempt {
            z &= !o.layers;
        }
    }
    z
}

fn fully_inside_obstacle_without_target(board: &Board, rt: &Rt) -> bool {
    if contains_any_endpoint(board, rt) {
        return false;
    }
    board.obstacles.iter().any(|o| {
        o.rt.contains_rt(rt) && o.layers == board.all_layers() && o.connected_to.is_empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::board::Obstacle;
    use crate::model::geom::{pt, rt};

    #[test]
    fn tuned_capacity_is_monotonic_and_saturating() {
        assert!(tuned_total_capacity(&rt(0.0, 0.0, 1.0, 1.0), 0.2) >= 1);
        assert!(
            tuned_total_capacity(&rt(0.0, 0.0, 10.0, 10.0), 0.2)
                > tuned_total_capacity(&rt(0.0, 0.0, 1.0, 1.0), 0.2)
        );
        assert_eq!(tuned_total_capacity(&rt(0.0, 0.0, 0.0001, 0.0001), 0.2), 1);
    }

    #[test]
    fn mesh_tiles_board_without_gaps_by_area() {
        let board = Board::new(rt(0.0, 0.0, 10.0, 10.0), 2, 0.2, 0.5);
        let config = RouteConfig { capacity_depth: Some(2), ..Default::default() };
        let mesh = build_mesh(&board, &config);
        let total_area: f64 = mesh.nodes.iter().map(|n| n.rt.w * n.rt.h).sum();
        assert!((total_area - 100.0).abs() < 1e-6);
    }

    #[test]
    fn endpoint_cell_contains_target_flag_set() {
        let mut board = Board::new(rt(0.0, 0.0, 16.0, 16.0), 2, 0.2, 0.5);
        board.connections.push(crate::model::board::Connection::new(
            crate::name::Id::from("n1"),
            vec![
                crate::model::board::ConnectionPoint::new(pt(1.0, 1.0), board.all_layers()),
                crate::model::board::ConnectionPoint::new(pt(15.0, 15.0), board.all_layers()),
            ],
        ));
        let config = RouteConfig { capacity_depth: Some(1), ..Default::default() };
        let mesh = build_mesh(&board, &config);
        assert!(mesh.nodes.iter().any(|n| n.contains_target));
    }

    #[test]
    fn obstacle_reduces_available_layers() {
        let mut board = Board::new(rt(0.0, 0.0, 4.0, 4.0), 2, 0.2, 0.5);
        board.obstacles.push(Obstacle::new(
            rt(0.0, 0.0, 4.0, 4.0),
            crate::model::board::LayerSet::only(crate::model::board::Layer::L0),
            vec![],
        ));
        let config = RouteConfig { capacity_depth: Some(0), ..Default::default() };
        let mesh = build_mesh(&board, &config);
        assert!(!mesh.nodes.is_empty());
        for n in &mesh.nodes {
            assert!(!n.available_z.contains(crate::model::board::Layer::L0));
        }
    }
}
