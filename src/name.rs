//! Stable string-backed identifiers shared across every pipeline stage.
//!
//! Downstream stages never hold pointers into a previous stage's structures
//! (spec.md section 9, "cyclic references" redesign flag) — only `Id`s,
//! resolved back through side maps the owning stage keeps.

use std::fmt;

use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Display, Deref, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Id(String);

impl Id {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A `u32` arena index, used for mesh nodes, mesh edges, port points and A*
/// candidates, where allocating a `String` per entity would be wasteful.
/// Distinct index kinds are distinguished by a zero-sized marker type so
/// e.g. a `NodeIdx` can never be used where an `EdgeIdx` is expected.
pub struct Idx<Kind> {
    idx: u32,
    _kind: std::marker::PhantomData<fn() -> Kind>,
}

impl<Kind> Idx<Kind> {
    pub fn new(idx: u32) -> Self {
        Self { idx, _kind: std::marker::PhantomData }
    }

    pub fn get(self) -> u32 {
        self.idx
    }

    pub fn index(self) -> usize {
        self.idx as usize
    }
}

impl<Kind> Clone for Idx<Kind> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<Kind> Copy for Idx<Kind> {}
impl<Kind> PartialEq for Idx<Kind> {
    fn eq(&self, other: &Self) -> bool {
        self.idx == other.idx
    }
}
impl<Kind> Eq for Idx<Kind> {}
impl<Kind> std::hash::Hash for Idx<Kind> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.idx.hash(state);
    }
}
impl<Kind> PartialOrd for Idx<Kind> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<Kind> Ord for Idx<Kind> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.idx.cmp(&other.idx)
    }
}
impl<Kind> fmt::Debug for Idx<Kind> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.idx)
    }
}
impl<Kind> fmt::Display for Idx<Kind> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display_and_eq() {
        let a = Id::new("net1");
        let b: Id = "net1".into();
        assert_eq!(a, b);
        assert_eq!(format!("{a}"), "net1");
    }

    #[test]
    fn idx_distinct_kinds_compile_independently() {
        struct NodeKind;
        struct EdgeKind;
        let n: Idx<NodeKind> = Idx::new(3);
        let e: Idx<EdgeKind> = Idx::new(3);
        assert_eq!(n.get(), e.get());
    }
}
