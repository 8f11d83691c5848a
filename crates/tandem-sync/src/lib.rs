//! tandem-sync
//!
//! Shared-state building blocks used by the tandem executors and by
//! callers directly:
//! - [`AtomicCounter`]: lock-free wrapping counter
//! - [`ConcurrentMap`]: whole-map reader/writer locked key/value store
//! - [`CancellationToken`]: cooperative cancellation with optional deadline
//!
//! None of these types expose their raw storage; every access goes through
//! the guarded accessor methods.

mod aligned;
mod cancel;
mod concurrent_map;
mod counter;

pub use aligned::{CacheAligned, CACHE_LINE_SIZE};
pub use cancel::{CancelGuard, CancelReason, CancellationToken};
pub use concurrent_map::ConcurrentMap;
pub use counter::AtomicCounter;
