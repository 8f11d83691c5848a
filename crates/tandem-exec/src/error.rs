//! Executor errors

use std::any::Any;
use std::io;

/// Failure of a single pool job
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("job {job} panicked: {message}")]
    Panicked {
        /// Submission index of the job
        job: usize,
        message: String,
    },
}

impl JobError {
    /// Submission index of the failed job
    pub fn job(&self) -> usize {
        match self {
            Self::Panicked { job, .. } => *job,
        }
    }
}

/// The pool could not start at all
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to spawn any worker thread: {0}")]
    Spawn(#[from] io::Error),
}

/// A pipeline stage did not produce a full output
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("stage {stage} panicked on element {index}: {message}")]
    Panicked {
        stage: usize,
        index: usize,
        message: String,
    },

    #[error("stage {stage} could not spawn a thread: {source}")]
    Spawn {
        stage: usize,
        #[source]
        source: io::Error,
    },
}

impl StageError {
    /// Index of the stage that failed
    pub fn stage(&self) -> usize {
        match self {
            Self::Panicked { stage, .. } | Self::Spawn { stage, .. } => *stage,
        }
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
