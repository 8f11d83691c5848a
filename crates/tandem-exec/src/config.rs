//! Executor Configuration

use serde::{Deserialize, Serialize};

use crate::DEFAULT_WORKERS;

/// Worker pool configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Concurrent workers per run; values below 1 mean [`DEFAULT_WORKERS`]
    pub workers: usize,

    /// Worker thread name prefix; threads are named `{thread_name}-{id}`
    pub thread_name: String,

    /// Worker stack size in bytes (platform default when unset)
    pub stack_size: Option<usize>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            thread_name: "tandem-worker".to_string(),
            stack_size: None,
        }
    }
}
