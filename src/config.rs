//! Run-time tunables for the routing pipeline (spec.md section 6). One
//! immutable `RouteConfig` is passed alongside the board into `route()`;
//! stages read from it but never mutate it.

#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Quadtree depth override; auto-derived from board span and
    /// `target_min_capacity` via `getTunedTotalCapacity1` when `None`.
    pub capacity_depth: Option<u32>,
    /// Target minimum per-leaf-cell capacity driving mesh refinement.
    pub target_min_capacity: usize,
    /// Minimum port-point spacing margin added to the board's min trace
    /// width (spec.md 4.7: `s = w + margin`).
    pub port_spacing_margin: f64,
    /// Congestion-cost exponent in `CapacityPathing`'s edge cost model.
    pub congestion_power: f64,
    /// Scales allowed node overload; > 1 permits negative residual
    /// capacity, trading completion for overload (spec.md 4.5).
    pub max_capacity_factor: f64,
    /// BFS hop radius for multi-section re-optimization subgraphs.
    pub expansion_degrees: u32,
    /// Upper bound on A* iterations per path, scaled by straight-line
    /// length at call sites (spec.md 4.8).
    pub max_iterations_per_path: u64,
    /// Overall per-stage iteration budget (spec.md section 5).
    pub max_iterations: u64,
    /// Pf threshold below which `Unravel`'s section loop stops improving a
    /// node (spec.md 4.8, "acceptablePf").
    pub acceptable_pf: f64,
    /// Board-score gate (spec.md section 7, `MIN_ALLOWED_BOARD_SCORE`): a
    /// run whose summed failure-cost exceeds this is rejected with an
    /// error instead of returned. `f64::INFINITY` (the default) disables
    /// the gate entirely.
    pub min_allowed_board_score: f64,
    /// Weight of `h` in `f = g + GREEDY * h`.
    pub greedy: f64,
    /// Minimum sub-solver steps before the hyper-supervisor compares scores.
    pub min_substeps: u32,
    /// Upper bound on `Unravel`'s section-reoptimization loop (spec.md 4.8:
    /// "a section-attempt budget").
    pub max_section_attempts: u32,
    /// Fraction of a section's affected connections ripped and rerouted on
    /// each section attempt (spec.md 4.8: "rip a configurable fraction").
    pub rip_fraction: f64,
    /// Number of `TraceSimplify` passes (spec.md 4.11 default 2).
    pub simplify_passes: u32,
    /// Deterministic seed for this run's PRNG (spec.md section 8).
    pub seed: u64,
    pub cache: CacheProvider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheProvider {
    None,
    InMemory,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            capacity_depth: None,
            target_min_capacity: 4,
            port_spacing_margin: 0.1,
            congestion_power: 2.0,
            max_capacity_factor: 1.0,
            expansion_degrees: 2,
            max_iterations_per_path: 10_000,
            max_iterations: 100_000,
            acceptable_pf: 0.05,
            min_allowed_board_score: f64::INFINITY,
            greedy: 1.0,
            min_substeps: 4,
            max_section_attempts: 16,
            rip_fraction: 0.5,
            simplify_passes: 2,
            seed: 0,
            cache: CacheProvider::InMemory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = RouteConfig::default();
        assert!(cfg.target_min_capacity > 0);
        assert!(cfg.max_capacity_factor >= 1.0);
        assert_eq!(cfg.simplify_passes, 2);
    }
}
