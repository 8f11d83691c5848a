//! Worker Pool
//!
//! Runs a fixed batch of jobs on a bounded number of OS threads.
//!
//! The whole batch is queued up front on a channel sized to the batch, so
//! submission never blocks. Workers pull jobs until the queue drains and
//! publish each outcome on a result channel of the same size. The caller
//! collects until every job has reported or the cancellation token fires,
//! whichever comes first.
//!
//! Results arrive in completion order, not submission order. Use
//! [`WorkerPool::run_indexed`] when the submission index matters.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{select, Receiver, Sender};
use tandem_sync::{CancelReason, CancellationToken};

use crate::error::panic_message;
use crate::{ExecConfig, JobError, PoolError};

/// Worker count used when a pool is asked for fewer than one worker
pub const DEFAULT_WORKERS: usize = 4;

/// Outcome of one job
pub type JobResult<T> = Result<T, JobError>;

type Tagged<T> = (usize, JobResult<T>);

/// Bounded-concurrency batch executor.
///
/// The pool itself holds only configuration; threads are spawned per
/// [`run`](Self::run) and never outlive the jobs of that run.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    thread_name: String,
    stack_size: Option<usize>,
}

impl WorkerPool {
    /// Create a pool running at most `workers` jobs at once.
    ///
    /// `0` is replaced by [`DEFAULT_WORKERS`].
    pub fn new(workers: usize) -> Self {
        Self::from_config(&ExecConfig {
            workers,
            ..ExecConfig::default()
        })
    }

    pub fn from_config(config: &ExecConfig) -> Self {
        let workers = if config.workers < 1 {
            DEFAULT_WORKERS
        } else {
            config.workers
        };
        Self {
            workers,
            thread_name: config.thread_name.clone(),
            stack_size: config.stack_size,
        }
    }

    /// Maximum number of concurrent workers
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Run `jobs` and collect their outcomes.
    ///
    /// Returns once every job has reported, or as soon as `token` fires. In
    /// the second case the report holds only what had been collected so far
    /// and [`RunReport::cancel_reason`] says why. Jobs already executing keep
    /// running in the background; their results are discarded.
    ///
    /// A panicking job is reported as [`JobError::Panicked`]; its worker
    /// moves on to the next job.
    pub fn run<T, F>(&self, jobs: Vec<F>, token: &CancellationToken) -> Result<RunReport<T>, PoolError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tagged, submitted, stop) = self.execute(jobs, token)?;
        Ok(RunReport {
            outcomes: tagged.into_iter().map(|(_, outcome)| outcome).collect(),
            submitted,
            stop,
        })
    }

    /// Like [`run`](Self::run), but every value is paired with the
    /// submission index of the job that produced it.
    ///
    /// Order is still completion order; see [`RunReport::into_ordered`].
    pub fn run_indexed<T, F>(
        &self,
        jobs: Vec<F>,
        token: &CancellationToken,
    ) -> Result<RunReport<(usize, T)>, PoolError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tagged, submitted, stop) = self.execute(jobs, token)?;
        Ok(RunReport {
            outcomes: tagged
                .into_iter()
                .map(|(index, outcome)| outcome.map(|value| (index, value)))
                .collect(),
            submitted,
            stop,
        })
    }

    fn execute<T, F>(
        &self,
        jobs: Vec<F>,
        token: &CancellationToken,
    ) -> Result<(Vec<Tagged<T>>, usize, Option<CancelReason>), PoolError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let submitted = jobs.len();
        if submitted == 0 {
            return Ok((Vec::new(), 0, None));
        }

        let (job_tx, job_rx) = crossbeam_channel::bounded(submitted);
        let (result_tx, result_rx) = crossbeam_channel::bounded(submitted);

        for job in jobs.into_iter().enumerate() {
            // Capacity equals the batch and `job_rx` is alive, so this neither
            // blocks nor fails.
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let mut handles = Vec::with_capacity(self.workers.min(submitted));
        let mut spawn_error = None;
        for id in 0..self.workers.min(submitted) {
            let worker = Worker {
                id,
                jobs: job_rx.clone(),
                results: result_tx.clone(),
                token: token.clone(),
            };
            match self.spawn(worker) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    spawn_error = Some(err);
                    break;
                }
            }
        }
        // Only workers hold senders now, so the result channel disconnects
        // once the last one exits.
        drop(result_tx);
        drop(job_rx);

        match spawn_error {
            Some(err) if handles.is_empty() => return Err(PoolError::Spawn(err)),
            Some(err) => tracing::warn!(
                spawned = handles.len(),
                requested = self.workers,
                "continuing with fewer workers: {}",
                err
            ),
            None => {}
        }

        tracing::debug!(workers = handles.len(), jobs = submitted, "worker pool started");

        let outcomes = collect(&result_rx, submitted, token);
        if outcomes.len() == submitted {
            for handle in handles {
                if handle.join().is_err() {
                    tracing::warn!("worker thread exited abnormally");
                }
            }
            tracing::debug!(jobs = submitted, "worker pool finished");
            return Ok((outcomes, submitted, None));
        }

        let stop = token.reason();
        match stop {
            Some(reason) => tracing::info!(
                collected = outcomes.len(),
                submitted,
                "worker pool stopped early ({}), returning partial results",
                reason
            ),
            None => tracing::warn!(
                collected = outcomes.len(),
                submitted,
                "workers exited before reporting every job"
            ),
        }
        // Remaining workers are detached; they exit at their next
        // cancellation check.
        Ok((outcomes, submitted, stop))
    }

    fn spawn<T, F>(&self, worker: Worker<F, T>) -> io::Result<JoinHandle<()>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let mut builder = thread::Builder::new().name(format!("{}-{}", self.thread_name, worker.id));
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        builder.spawn(move || worker.run())
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::from_config(&ExecConfig::default())
    }
}

/// Wait for `expected` outcomes, giving up when `token` fires
fn collect<T>(results: &Receiver<Tagged<T>>, expected: usize, token: &CancellationToken) -> Vec<Tagged<T>> {
    let done = token.done();
    let expired = token.expired();
    let mut outcomes = Vec::with_capacity(expected);

    while outcomes.len() < expected {
        select! {
            recv(results) -> msg => match msg {
                Ok(outcome) => outcomes.push(outcome),
                Err(_) => break,
            },
            recv(done) -> _ => break,
            recv(expired) -> _ => break,
        }
    }
    outcomes
}

struct Worker<F, T> {
    id: usize,
    jobs: Receiver<(usize, F)>,
    results: Sender<Tagged<T>>,
    token: CancellationToken,
}

impl<F, T> Worker<F, T>
where
    F: FnOnce() -> T,
{
    fn run(self) {
        let mut completed = 0usize;

        while !self.token.is_cancelled() {
            let Ok((index, job)) = self.jobs.recv() else {
                break;
            };

            let outcome = panic::catch_unwind(AssertUnwindSafe(job)).map_err(|payload| JobError::Panicked {
                job: index,
                message: panic_message(payload.as_ref()),
            });
            if let Err(err) = &outcome {
                tracing::warn!(worker = self.id, "{}", err);
            }

            if self.token.is_cancelled() {
                tracing::debug!(worker = self.id, job = index, "discarding result after cancellation");
                break;
            }
            if self.results.send((index, outcome)).is_err() {
                break;
            }
            completed += 1;
        }

        tracing::trace!(worker = self.id, completed, "worker exiting");
    }
}

/// What a [`WorkerPool`] run produced.
///
/// Outcomes are in completion order. When the run was cut short the report
/// is partial: `len() < submitted()` and [`cancel_reason`](Self::cancel_reason)
/// is set.
#[derive(Debug, Clone)]
pub struct RunReport<T> {
    outcomes: Vec<JobResult<T>>,
    submitted: usize,
    stop: Option<CancelReason>,
}

impl<T> RunReport<T> {
    pub fn outcomes(&self) -> &[JobResult<T>] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<JobResult<T>> {
        self.outcomes
    }

    /// Number of outcomes collected
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of jobs in the batch
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Whether every submitted job reported
    pub fn is_complete(&self) -> bool {
        self.outcomes.len() == self.submitted
    }

    /// Why collection stopped early, if it did
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        self.stop
    }

    /// Successful values, in completion order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    /// All collected values, or the first failure in completion order
    pub fn into_values(self) -> Result<Vec<T>, JobError> {
        self.outcomes.into_iter().collect()
    }
}

impl<T> RunReport<(usize, T)> {
    /// Outcomes keyed and sorted by submission index
    pub fn into_ordered(self) -> Vec<(usize, JobResult<T>)> {
        let mut ordered: Vec<_> = self
            .outcomes
            .into_iter()
            .map(|outcome| match outcome {
                Ok((index, value)) => (index, Ok(value)),
                Err(err) => (err.job(), Err(err)),
            })
            .collect();
        ordered.sort_by_key(|(index, _)| *index);
        ordered
    }
}
