//! tandem
//!
//! Small, in-process concurrency primitives.
//!
//! # Components
//! - [`AtomicCounter`]: lock-free counter
//! - [`ConcurrentMap`]: reader/writer locked key/value store
//! - [`WorkerPool`]: fixed batch of jobs over a bounded set of workers,
//!   cancellable through a [`CancellationToken`]
//! - [`Pipeline`]: ordered stages over a fixed input, parallel within a
//!   stage and barrier-synchronized between stages
//!
//! The four components share no state with each other.
//!
//! # Limitations
//! - Pool results come back in completion order. Ask for
//!   [`WorkerPool::run_indexed`] when submission order matters.
//! - A cancelled pool returns a partial result set immediately; jobs that
//!   were already running finish in the background and are discarded.
//! - Panics in jobs and stages are contained and reported as
//!   [`JobError`] / [`StageError`], but the process-wide panic hook still
//!   prints them. Builds using `panic = "abort"` lose this containment.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use tandem::{AtomicCounter, CancellationToken, ConcurrentMap, Pipeline, WorkerPool};
//!
//! let counter = AtomicCounter::new();
//! std::thread::scope(|s| {
//!     for _ in 0..8 {
//!         s.spawn(|| counter.add(5));
//!     }
//! });
//! assert_eq!(counter.load(), 40);
//!
//! let map = ConcurrentMap::new();
//! map.set("answer".to_string(), 42i64);
//! assert_eq!(map.get("answer"), Some(42));
//!
//! let token = CancellationToken::with_timeout(Duration::from_secs(5));
//! let jobs: Vec<_> = (1..=3).map(|v: u64| move || v * v * v).collect();
//! let report = WorkerPool::new(2).run(jobs, &token).unwrap();
//! assert_eq!(report.len(), 3);
//!
//! let out = Pipeline::new()
//!     .stage(|x: i64| x + 10)
//!     .stage(|x| x * 3)
//!     .stage(|x| x - 5)
//!     .run(&[1, 2, 3, 4])
//!     .unwrap();
//! assert_eq!(out, vec![28, 31, 34, 37]);
//! ```

pub use tandem_exec::{
    run_pipeline, ExecConfig, JobError, JobResult, Pipeline, PoolError, RunReport, StageError,
    WorkerPool, DEFAULT_WORKERS,
};
pub use tandem_sync::{
    AtomicCounter, CacheAligned, CancelGuard, CancelReason, CancellationToken, ConcurrentMap,
};

// Re-export component crates
pub use tandem_exec as exec;
pub use tandem_sync as sync;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
