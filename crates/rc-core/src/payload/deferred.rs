//! Keyed, self-cancelling delayed actions
//!
//! Each key owns at most one live handle. Scheduling again on a live key
//! keeps the handle and bumps the generation, which turns every earlier
//! timer for that key into a no-op when it fires.

use std::collections::HashMap;
use std::hash::Hash;

/// Returned by [`DeferredRegistry::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    /// Generation the caller's timer must present to [`DeferredRegistry::expire`].
    pub generation: u64,
    /// `false` when an existing handle was reused.
    pub created: bool,
}

struct Entry<H> {
    handle: H,
    generation: u64,
}

pub struct DeferredRegistry<K, H> {
    entries: HashMap<K, Entry<H>>,
    next_generation: u64,
}

impl<K: Eq + Hash, H> Default for DeferredRegistry<K, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, H> DeferredRegistry<K, H> {
    pub fn new() -> Self {
        Self { entries: HashMap::new(), next_generation: 1 }
    }

    /// Register `key`, creating its handle with `create` only if none is live.
    pub fn schedule(&mut self, key: K, create: impl FnOnce() -> H) -> Scheduled {
        let generation = self.next_generation;
        self.next_generation += 1;

        let mut created = false;
        let entry = self.entries.entry(key).or_insert_with(|| {
            created = true;
            Entry { handle: create(), generation }
        });
        entry.generation = generation;
        Scheduled { generation, created }
    }

    pub fn get(&self, key: &K) -> Option<&H> {
        self.entries.get(key).map(|entry| &entry.handle)
    }

    /// Timer callback: removes and returns the handle only if `generation`
    /// is still the latest for `key`.
    pub fn expire(&mut self, key: &K, generation: u64) -> Option<H> {
        match self.entries.get(key) {
            Some(entry) if entry.generation == generation => {
                self.entries.remove(key).map(|entry| entry.handle)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expire_removes_handle() {
        let mut registry = DeferredRegistry::new();
        let first = registry.schedule("a.png", || 1);
        assert!(first.created);
        assert_eq!(registry.expire(&"a.png", first.generation), Some(1));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reschedule_reuses_handle_and_cancels_old_timer() {
        let mut registry = DeferredRegistry::new();
        let first = registry.schedule("a.png", || 1);
        let second = registry.schedule("a.png", || 2);

        assert!(!second.created);
        assert_eq!(registry.get(&"a.png"), Some(&1));
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.expire(&"a.png", first.generation), None);
        assert_eq!(registry.expire(&"a.png", second.generation), Some(1));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut registry = DeferredRegistry::new();
        let a = registry.schedule("a", || 'a');
        let b = registry.schedule("b", || 'b');
        assert_eq!(registry.expire(&"b", b.generation), Some('b'));
        assert_eq!(registry.get(&"a"), Some(&'a'));
        assert_eq!(registry.expire(&"a", a.generation), Some('a'));
        assert_eq!(registry.expire(&"missing", a.generation), None);
    }
}
