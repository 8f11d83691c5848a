//! Cache Line Alignment

use std::ops::{Deref, DerefMut};

/// Cache line size (64 bytes on most modern CPUs)
pub const CACHE_LINE_SIZE: usize = 64;

/// Wrapper that places its value on its own cache line.
///
/// Hot atomics shared between threads are wrapped in this so that two
/// of them declared side by side never false-share a line.
///
/// ```rust
/// use std::sync::atomic::AtomicU64;
/// use tandem_sync::CacheAligned;
///
/// let slot = CacheAligned::new(AtomicU64::new(7));
/// assert_eq!(slot.load(std::sync::atomic::Ordering::Relaxed), 7);
/// ```
#[repr(C, align(64))]
#[derive(Debug, Clone, Copy)]
pub struct CacheAligned<T> {
    value: T,
}

impl<T> CacheAligned<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for CacheAligned<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> DerefMut for CacheAligned<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.value
    }
}

impl<T: Default> Default for CacheAligned<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
