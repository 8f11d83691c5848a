//! Atomic Counter
//!
//! Lock-free unsigned counter for concurrent increments.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::CacheAligned;

/// Thread-safe `u64` counter.
///
/// Additions wrap modulo 2^64 on overflow. Wraparound is ordinary
/// fixed-width arithmetic, not an error.
///
/// Share it by reference (`&AtomicCounter`, `Arc<AtomicCounter>`); no
/// external locking is needed.
pub struct AtomicCounter {
    value: CacheAligned<AtomicU64>,
}

impl AtomicCounter {
    /// Create a counter starting at zero
    pub const fn new() -> Self {
        Self::with_value(0)
    }

    /// Create a counter starting at `value`
    pub const fn with_value(value: u64) -> Self {
        Self {
            value: CacheAligned::new(AtomicU64::new(value)),
        }
    }

    /// Atomically add `delta`
    #[inline]
    pub fn add(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::AcqRel);
    }

    /// Atomically add `delta`, returning the value before the addition
    #[inline]
    pub fn fetch_add(&self, delta: u64) -> u64 {
        self.value.fetch_add(delta, Ordering::AcqRel)
    }

    #[inline]
    pub fn increment(&self) {
        self.add(1);
    }

    /// Read the current value.
    ///
    /// Every `add` that returned before this call is reflected. Additions
    /// racing with the read may or may not be; the read is never torn.
    #[inline]
    pub fn load(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AtomicCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicCounter")
            .field("value", &self.load())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_basic_operations() {
        let counter = AtomicCounter::new();
        assert_eq!(counter.load(), 0);

        counter.add(5);
        counter.increment();
        assert_eq!(counter.load(), 6);

        assert_eq!(counter.fetch_add(4), 6);
        assert_eq!(counter.load(), 10);
    }

    #[test]
    fn test_concurrent_add() {
        let counter = Arc::new(AtomicCounter::new());
        let mut handles = vec![];

        for _ in 0..300 {
            let counter = Arc::clone(&counter);
            handles.push(thread::spawn(move || counter.add(5)));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.load(), 1500);
    }

    #[test]
    fn test_scoped_add_mixed_deltas() {
        let counter = AtomicCounter::new();
        let deltas: Vec<u64> = (1..=64).collect();

        thread::scope(|s| {
            for &d in &deltas {
                let counter = &counter;
                s.spawn(move || {
                    for _ in 0..100 {
                        counter.add(d);
                    }
                });
            }
        });

        assert_eq!(counter.load(), deltas.iter().sum::<u64>() * 100);
    }

    #[test]
    fn test_overflow_wraps() {
        let counter = AtomicCounter::with_value(u64::MAX - 1);
        counter.add(3);
        assert_eq!(counter.load(), 1);
    }

    #[test]
    fn test_debug_shows_value() {
        let counter = AtomicCounter::with_value(42);
        assert_eq!(format!("{:?}", counter), "AtomicCounter { value: 42 }");
    }
}
