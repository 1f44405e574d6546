//! The step-driven state machine every pipeline stage implements (spec.md
//! section 5). The top-level driver calls `step()` in a loop until
//! `solved()` or `failed()`, bounded by `MAX_ITERATIONS`; `run()` wraps that
//! loop for stages the driver doesn't need to single-step.

pub mod net_to_point_pairs;
pub mod mesh_builder;
pub mod edge_builder;
pub mod dead_end_prune;
pub mod capacity_pathing;
pub mod edge_to_port_segments;
pub mod segment_to_point;
pub mod unravel;
pub mod high_density_routing;
pub mod route_stitch;
pub mod trace_simplify;

use crate::error::Result;

pub trait Solver {
    /// Advances the solver by one unit of work. May return without
    /// completing; callers re-invoke until `solved()` or `failed()`.
    fn step(&mut self) -> Result<()>;

    fn solved(&self) -> bool;

    fn failed(&self) -> bool;

    /// A human-facing snapshot of current stats for streaming UIs; not used
    /// for control flow.
    fn stats(&self) -> Stats {
        Stats::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub iterations: u64,
    pub message: String,
}

/// Drives a `Solver` to completion or exhaustion, matching the "callers
/// stop by simply not calling `step()` again" cancellation model (spec.md
/// section 5) with an explicit upper bound instead of an external handle.
pub fn run<S: Solver + ?Sized>(solver: &mut S, max_iterations: u64) -> Result<()> {
    let mut iterations = 0u64;
    while !solver.solved() && !solver.failed() {
        if iterations >= max_iterations {
            break;
        }
        solver.step()?;
        iterations += 1;
    }
    Ok(())
}
