//! tandem-exec
//!
//! Executors built on the `tandem-sync` primitives:
//! - [`WorkerPool`]: runs a fixed batch of jobs on a bounded number of
//!   threads, stopping early when a [`CancellationToken`] fires
//! - [`Pipeline`] / [`run_pipeline`]: applies ordered stages to every
//!   element, one thread per element, with a barrier between stages
//!
//! # Fault isolation
//!
//! A job or stage that panics does not take the process down. The pool
//! reports it as a failed [`JobResult`]; the pipeline stops and returns a
//! [`StageError`]. The panic message is still printed by the panic hook.
//!
//! # Example
//! ```rust
//! use tandem_exec::{Pipeline, WorkerPool};
//! use tandem_sync::CancellationToken;
//!
//! let jobs: Vec<_> = (1..=4).map(|x: u64| move || x * x).collect();
//! let report = WorkerPool::new(2).run(jobs, &CancellationToken::new()).unwrap();
//! let mut squares = report.into_values().unwrap();
//! squares.sort();
//! assert_eq!(squares, vec![1, 4, 9, 16]);
//!
//! let out = Pipeline::new()
//!     .stage(|x: i64| x + 10)
//!     .stage(|x| x * 3)
//!     .run(&[1, 2])
//!     .unwrap();
//! assert_eq!(out, vec![33, 36]);
//! ```

mod config;
mod error;
mod pipeline;
mod pool;

pub use config::ExecConfig;
pub use error::{JobError, PoolError, StageError};
pub use pipeline::{run_pipeline, Pipeline};
pub use pool::{JobResult, RunReport, WorkerPool, DEFAULT_WORKERS};

pub use tandem_sync::{CancelReason, CancellationToken};
