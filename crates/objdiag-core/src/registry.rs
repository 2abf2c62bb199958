//! Weak identity registry of engine-produced wrappers
//!
//! Membership is reference identity of the wrapper allocation, never
//! structural equality. Entries are non-owning: the registry must not keep an
//! otherwise-unreachable wrapper alive. Liveness is re-checked on every
//! membership query, and a stored `Weak` reserves its allocation until the
//! entry is pruned, so a recycled address can never alias a dead entry.

use std::collections::HashMap;
use std::rc::Weak;

use crate::object::{Node, Object};

#[derive(Default)]
pub(crate) struct IdentityRegistry {
    entries: HashMap<usize, Weak<Node>>,
}

impl IdentityRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a wrapper the engine just produced
    pub(crate) fn insert(&mut self, wrapper: &Object) {
        self.prune();
        self.entries.insert(wrapper.addr(), wrapper.weak_node());
    }

    /// Whether a live wrapper with this identity was produced by the engine
    pub(crate) fn contains(&self, addr: usize) -> bool {
        self.entries
            .get(&addr)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Drop entries whose wrapper has been reclaimed
    pub(crate) fn prune(&mut self) {
        self.entries.retain(|_, weak| weak.strong_count() > 0);
    }

    /// Number of live wrappers currently tracked
    pub(crate) fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}
