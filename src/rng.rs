//! The teacher crate seeds its genetic-algorithm runs from
//! `rand::thread_rng()`, fine for a GUI-driven exploratory tool but wrong
//! here: spec.md section 8 requires that routing the same board and
//! `RouteConfig` twice produce byte-identical output, so every seed-bearing
//! operation in this crate draws from a PRNG constructed from
//! `RouteConfig::seed`, never the thread-local RNG. `rand`'s `SmallRng`
//! (already a teacher dependency, via the `small_rng` feature) is
//! reseeded deterministically per call site instead.

use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Derives a child seed from a parent seed and a domain tag, so different
/// stages (or different shuffle attempts within a stage) get independent
/// but fully reproducible streams without threading a single shared `&mut
/// SmallRng` through the whole pipeline.
pub fn derive_seed(parent: u64, tag: &str, index: u64) -> u64 {
    // mulberry32-style mix: cheap, deterministic, good enough avalanche for
    // decorrelating sibling seeds (not cryptographic).
    let mut h = parent ^ (index.wrapping_mul(0x9E3779B97F4A7C15));
    for b in tag.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0xFF51AFD7ED558CCD);
        h ^= h >> 33;
    }
    h ^= h >> 29;
    h = h.wrapping_mul(0xC4CEB9FE1A85EC53);
    h ^= h >> 32;
    h
}

pub fn rng_for(parent: u64, tag: &str, index: u64) -> SmallRng {
    SmallRng::seed_from_u64(derive_seed(parent, tag, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn derive_seed_is_deterministic() {
        assert_eq!(derive_seed(7, "unravel", 3), derive_seed(7, "unravel", 3));
    }

    #[test]
    fn derive_seed_differs_by_tag_and_index() {
        assert_ne!(derive_seed(7, "unravel", 3), derive_seed(7, "pathing", 3));
        assert_ne!(derive_seed(7, "unravel", 3), derive_seed(7, "unravel", 4));
    }

    #[test]
    fn rng_for_is_reproducible() {
        let mut a = rng_for(1, "test", 0);
        let mut b = rng_for(1, "test", 0);
        let vals_a: Vec<u32> = (0..5).map(|_| a.gen()).collect();
        let vals_b: Vec<u32> = (0..5).map(|_| b.gen()).collect();
        assert_eq!(vals_a, vals_b);
    }
}
