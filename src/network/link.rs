use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::RouterId;

/// Unordered pair of router ids identifying a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey {
    low: RouterId,
    high: RouterId,
}

impl LinkKey {
    pub fn new(a: RouterId, b: RouterId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn endpoints(&self) -> (RouterId, RouterId) {
        (self.low, self.high)
    }

    pub fn touches(&self, id: RouterId) -> bool {
        self.low == id || self.high == id
    }
}

/// Per-link traffic counters.
///
/// Counters are atomic so that simulations holding only a shared borrow of
/// the topology can still account for the links they traverse.
#[derive(Debug, Default)]
pub struct LinkUsage {
    counters: HashMap<LinkKey, AtomicU64>,
}

impl LinkUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a link with a zeroed counter. Returns false if it already existed.
    pub fn insert(&mut self, a: RouterId, b: RouterId) -> bool {
        let key = LinkKey::new(a, b);
        if self.counters.contains_key(&key) {
            return false;
        }
        self.counters.insert(key, AtomicU64::new(0));
        true
    }

    /// Drops a link and its counter, returning the final count.
    pub fn remove(&mut self, a: RouterId, b: RouterId) -> Option<u64> {
        self.counters
            .remove(&LinkKey::new(a, b))
            .map(AtomicU64::into_inner)
    }

    /// Drops every link touching `id`.
    pub fn remove_router(&mut self, id: RouterId) -> usize {
        let before = self.counters.len();
        self.counters.retain(|key, _| !key.touches(id));
        before - self.counters.len()
    }

    pub fn contains(&self, a: RouterId, b: RouterId) -> bool {
        self.counters.contains_key(&LinkKey::new(a, b))
    }

    /// Increments the counter of the a-b link and returns the new value,
    /// or `None` when no such link exists.
    pub fn record_use(&self, a: RouterId, b: RouterId) -> Option<u64> {
        self.counters
            .get(&LinkKey::new(a, b))
            .map(|counter| counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn lookup(&self, a: RouterId, b: RouterId) -> Option<u64> {
        self.counters
            .get(&LinkKey::new(a, b))
            .map(|counter| counter.load(Ordering::Relaxed))
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LinkKey, u64)> + '_ {
        self.counters
            .iter()
            .map(|(key, counter)| (*key, counter.load(Ordering::Relaxed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_key_is_unordered() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(LinkKey::new(a, b), LinkKey::new(b, a));
    }

    #[test]
    fn test_record_use_either_orientation() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut usage = LinkUsage::new();
        assert!(usage.insert(a, b));
        assert!(!usage.insert(b, a));

        assert_eq!(usage.record_use(a, b), Some(1));
        assert_eq!(usage.record_use(b, a), Some(2));
        assert_eq!(usage.lookup(a, b), Some(2));
        assert_eq!(usage.len(), 1);
    }

    #[test]
    fn test_record_use_missing_link() {
        let usage = LinkUsage::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(usage.record_use(a, b), None);
        assert_eq!(usage.lookup(a, b), None);
    }

    #[test]
    fn test_remove_router_drops_touching_links() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut usage = LinkUsage::new();
        usage.insert(a, b);
        usage.insert(b, c);
        usage.insert(a, c);
        usage.record_use(a, b);

        assert_eq!(usage.remove_router(b), 2);
        assert!(usage.contains(a, c));
        assert!(!usage.contains(a, b));

        // A recreated link starts from zero.
        usage.insert(a, b);
        assert_eq!(usage.lookup(a, b), Some(0));
        assert_eq!(usage.remove(a, c), Some(0));
    }
}
