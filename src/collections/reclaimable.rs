//! Process-wide memo table that only grows and can be dropped wholesale.
//!
//! A [`ReclaimableCache`] holds at most one immutable table behind an
//! `Arc`. Readers take a snapshot and work on it without holding the lock.
//! Writers compute new rows outside the lock from their snapshot, then
//! [`publish`](ReclaimableCache::publish) the grown table; publishing takes
//! the union with whatever is current, so a row visible to one reader is
//! never lost for later readers.
//!
//! [`reclaim`](ReclaimableCache::reclaim) releases the table. The next
//! caller recomputes silently.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A table that can be merged with a concurrently grown version of itself.
///
/// `union` must return a table containing every row of both inputs.
pub trait ExtendOnly {
    fn union(&self, other: &Self) -> Self;
}

/// Shared slot for an extend-only memo table.
///
/// # Examples
/// ```
/// use u_nonparam::collections::{ExtendOnly, ReclaimableCache};
///
/// #[derive(Clone)]
/// struct Rows(Vec<u64>);
///
/// impl ExtendOnly for Rows {
///     fn union(&self, other: &Self) -> Self {
///         if self.0.len() >= other.0.len() { self.clone() } else { other.clone() }
///     }
/// }
///
/// static CACHE: ReclaimableCache<Rows> = ReclaimableCache::new();
///
/// assert!(CACHE.snapshot().is_none());
/// CACHE.publish(Rows(vec![1, 1, 2]));
/// CACHE.publish(Rows(vec![1]));
/// assert_eq!(CACHE.snapshot().map(|t| t.0.len()), Some(3));
/// CACHE.reclaim();
/// assert!(CACHE.snapshot().is_none());
/// ```
#[derive(Debug)]
pub struct ReclaimableCache<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> ReclaimableCache<T> {
    /// Creates an empty cache. Usable in `static` items.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<T>>> {
        // the table is replaced atomically, so a poisoned slot is still consistent
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current table, if any.
    pub fn snapshot(&self) -> Option<Arc<T>> {
        self.lock().clone()
    }

    /// Drops the cached table. Returns `true` if one was present.
    ///
    /// Snapshots already handed out stay valid.
    pub fn reclaim(&self) -> bool {
        let dropped = self.lock().take().is_some();
        if dropped {
            log::debug!("reclaimed memo table");
        }
        dropped
    }
}

impl<T: ExtendOnly> ReclaimableCache<T> {
    /// Installs `grown`, merged with the current table, and returns the
    /// table now in place.
    pub fn publish(&self, grown: T) -> Arc<T> {
        let mut slot = self.lock();
        let merged = match slot.as_ref() {
            Some(current) => Arc::new(current.union(&grown)),
            None => Arc::new(grown),
        };
        *slot = Some(Arc::clone(&merged));
        merged
    }
}

impl<T> Default for ReclaimableCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Rows(Vec<Arc<[u32]>>);

    impl ExtendOnly for Rows {
        fn union(&self, other: &Self) -> Self {
            if self.0.len() >= other.0.len() {
                self.clone()
            } else {
                other.clone()
            }
        }
    }

    fn rows(n: usize) -> Rows {
        Rows((0..n).map(|i| Arc::from(vec![i as u32; i + 1])).collect())
    }

    #[test]
    fn test_empty_cache() {
        let cache: ReclaimableCache<Rows> = ReclaimableCache::new();
        assert!(cache.snapshot().is_none());
        assert!(!cache.reclaim());
    }

    #[test]
    fn test_publish_never_shrinks() {
        let cache = ReclaimableCache::new();
        cache.publish(rows(5));
        let t = cache.publish(rows(2));
        assert_eq!(t.0.len(), 5);
        assert_eq!(cache.snapshot().map(|t| t.0.len()), Some(5));
    }

    #[test]
    fn test_snapshot_survives_reclaim() {
        let cache = ReclaimableCache::new();
        cache.publish(rows(3));
        let snap = cache.snapshot();
        assert!(cache.reclaim());
        assert!(cache.snapshot().is_none());
        assert_eq!(snap.map(|t| t.0.len()), Some(3));
    }

    #[test]
    fn test_concurrent_publish_keeps_largest() {
        let cache = Arc::new(ReclaimableCache::new());
        let handles: Vec<_> = (1..=8)
            .map(|n| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.publish(rows(n));
                    cache.snapshot().map(|t| t.0.len()).unwrap_or(0)
                })
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap() >= 1);
        }
        assert_eq!(cache.snapshot().map(|t| t.0.len()), Some(8));
    }

    #[test]
    fn test_poisoned_lock_recovers() {
        let cache = Arc::new(ReclaimableCache::new());
        cache.publish(rows(2));
        let c = Arc::clone(&cache);
        let result = std::thread::spawn(move || {
            let _guard = c.lock();
            panic!("poison the slot");
        })
        .join();
        assert!(result.is_err());
        assert_eq!(cache.snapshot().map(|t| t.0.len()), Some(2));
        cache.publish(rows(4));
        assert_eq!(cache.snapshot().map(|t| t.0.len()), Some(4));
    }
}
