//! A synchronous get/set cache for intra-node routing sub-problems
//! (spec.md section 5: "purely an optimization; correctness must hold with
//! no cache"). Keys are content hashes, never raw coordinates, so two
//! structurally identical sub-problems at different board locations share a
//! cache entry once normalized.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use crate::model::geom::math::quantize;
use crate::model::geom::Pt;

/// Quantum used to round coordinates before hashing (spec.md section 6).
pub const CACHE_COORD_QUANTUM: f64 = 0.005;

pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn set(&self, key: &str, value: Vec<u8>);
}

/// The default provider: a process-local `Mutex<HashMap>`, matching the
/// teacher's `Mutex<Pcb>` pattern for shared mutable state under a
/// single-threaded cooperative scheduler.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: Vec<u8>) {
        self.entries.lock().unwrap().insert(key.to_owned(), value);
    }
}

/// A no-op cache: every `get` misses, every `set` is discarded. Used to
/// prove correctness holds with caching disabled.
#[derive(Debug, Default)]
pub struct NullCache;

impl Cache for NullCache {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: Vec<u8>) {}
}

/// Builds the `intranode-solver:<hash>` cache key described in spec.md
/// section 6: a stable hash of rounded coordinates, sorted hyperparameters,
/// available layers, and a sorted list of net-connectivity ids.
pub fn intranode_cache_key(
    coords: &[Pt],
    hyperparams: &[(&str, f64)],
    available_z: &[usize],
    net_ids: &[&str],
) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();

    for p in coords {
        quantize(p.x, CACHE_COORD_QUANTUM).hash(&mut hasher);
        quantize(p.y, CACHE_COORD_QUANTUM).hash(&mut hasher);
    }

    let mut params: Vec<_> = hyperparams.to_vec();
    params.sort_by(|a, b| a.0.cmp(b.0));
    for (name, v) in params {
        name.hash(&mut hasher);
        quantize(v, CACHE_COORD_QUANTUM).hash(&mut hasher);
    }

    let mut z: Vec<_> = available_z.to_vec();
    z.sort_unstable();
    z.hash(&mut hasher);

    let mut ids: Vec<_> = net_ids.to_vec();
    ids.sort_unstable();
    ids.hash(&mut hasher);

    format!("intranode-solver:{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::geom::pt;

    #[test]
    fn in_memory_cache_roundtrip() {
        let c = InMemoryCache::new();
        assert_eq!(c.get("k"), None);
        c.set("k", vec![1, 2, 3]);
        assert_eq!(c.get("k"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn null_cache_always_misses() {
        let c = NullCache;
        c.set("k", vec![1]);
        assert_eq!(c.get("k"), None);
    }

    #[test]
    fn cache_key_is_order_independent_for_params_and_ids() {
        let coords = [pt(1.0, 2.0)];
        let a = intranode_cache_key(&coords, &[("greedy", 1.0), ("pf", 0.2)], &[0, 1], &["a", "b"]);
        let b = intranode_cache_key(&coords, &[("pf", 0.2), ("greedy", 1.0)], &[1, 0], &["b", "a"]);
        assert_eq!(a, b);
    }

    #[test]
    fn cache_key_changes_with_coords() {
        let a = intranode_cache_key(&[pt(1.0, 2.0)], &[], &[], &[]);
        let b = intranode_cache_key(&[pt(1.1, 2.0)], &[], &[], &[]);
        assert_ne!(a, b);
    }
}
