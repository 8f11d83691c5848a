//! Staged Parallel Pipeline
//!
//! Applies an ordered list of stages to every element of a fixed input.
//! Each stage runs one scoped thread per element and joins all of them
//! before the next stage starts, so stage `k + 1` never sees a partially
//! computed output of stage `k`. Output index `i` always corresponds to
//! input index `i`.
//!
//! There is no cancellation point inside a stage; a pipeline runs to
//! completion or stops at the first stage that fails.

use std::fmt;
use std::thread;

use crate::error::panic_message;
use crate::StageError;

type StageFn<'a, T> = Box<dyn Fn(T) -> T + Send + Sync + 'a>;

/// Builder for a sequence of stages.
///
/// ```rust
/// use tandem_exec::Pipeline;
///
/// let pipeline = Pipeline::new()
///     .stage(|x: i64| x + 10)
///     .stage(|x| x * 3)
///     .stage(|x| x - 5);
///
/// assert_eq!(pipeline.run(&[1, 2, 3, 4]).unwrap(), vec![28, 31, 34, 37]);
/// ```
pub struct Pipeline<'a, T> {
    stages: Vec<StageFn<'a, T>>,
}

impl<'a, T> Pipeline<'a, T> {
    /// Create a pipeline with no stages
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage
    pub fn stage<F>(mut self, f: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'a,
    {
        self.stages.push(Box::new(f));
        self
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage over a copy of `input`.
    ///
    /// The pipeline can be run any number of times; `input` is never
    /// modified.
    pub fn run(&self, input: &[T]) -> Result<Vec<T>, StageError>
    where
        T: Clone + Send + Sync,
    {
        let stages: Vec<&(dyn Fn(T) -> T + Sync)> = self
            .stages
            .iter()
            .map(|stage| &**stage as &(dyn Fn(T) -> T + Sync))
            .collect();
        run_pipeline(input, &stages)
    }
}

impl<T> Default for Pipeline<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Pipeline<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}

/// Apply `stages` in order to every element of `input`.
///
/// Returns a freshly allocated vector; with no stages it is a copy of
/// `input`. If a unit panics, the stage's remaining units still run to
/// completion, the error for the lowest failing index is returned, and no
/// later stage runs.
pub fn run_pipeline<T>(input: &[T], stages: &[&(dyn Fn(T) -> T + Sync)]) -> Result<Vec<T>, StageError>
where
    T: Clone + Send + Sync,
{
    let mut data = input.to_vec();
    if data.is_empty() {
        return Ok(data);
    }

    for (index, stage) in stages.iter().enumerate() {
        tracing::trace!(stage = index, elements = data.len(), "running stage");
        data = run_stage(index, *stage, data).inspect_err(|err| {
            tracing::warn!(stage = index, "pipeline aborted: {}", err);
        })?;
    }

    tracing::debug!(stages = stages.len(), elements = data.len(), "pipeline finished");
    Ok(data)
}

/// One thread per element; joining every handle is the barrier
fn run_stage<T>(stage_index: usize, stage: &(dyn Fn(T) -> T + Sync), data: Vec<T>) -> Result<Vec<T>, StageError>
where
    T: Send,
{
    thread::scope(|s| {
        let mut handles = Vec::with_capacity(data.len());
        let mut spawn_error = None;

        for value in data {
            match thread::Builder::new().spawn_scoped(s, move || stage(value)) {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    spawn_error = Some(source);
                    break;
                }
            }
        }

        let joined: Vec<_> = handles.into_iter().map(|handle| handle.join()).collect();

        if let Some(source) = spawn_error {
            return Err(StageError::Spawn {
                stage: stage_index,
                source,
            });
        }

        joined
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                result.map_err(|payload| StageError::Panicked {
                    stage: stage_index,
                    index,
                    message: panic_message(payload.as_ref()),
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn test_three_stages() {
        let out = Pipeline::new()
            .stage(|x: i64| x + 10)
            .stage(|x| x * 3)
            .stage(|x| x - 5)
            .run(&[1, 2, 3, 4])
            .unwrap();

        assert_eq!(out, vec![28, 31, 34, 37]);
    }

    #[test]
    fn test_free_function() {
        let add = |x: i32| x + 1;
        let double = |x: i32| x * 2;
        let stages: [&(dyn Fn(i32) -> i32 + Sync); 2] = [&add, &double];
        let out = run_pipeline(&[1, 2, 3], &stages).unwrap();
        assert_eq!(out, vec![4, 6, 8]);
    }

    #[test]
    fn test_no_stages_copies_input() {
        let input = vec![5, 6, 7];
        let mut out = Pipeline::<i32>::new().run(&input).unwrap();
        assert_eq!(out, input);

        out[0] = 99;
        assert_eq!(input, vec![5, 6, 7]);
    }

    #[test]
    fn test_empty_input() {
        let calls = AtomicUsize::new(0);
        let out = Pipeline::new()
            .stage(|x: i32| {
                calls.fetch_add(1, Ordering::SeqCst);
                x
            })
            .run(&[])
            .unwrap();

        assert!(out.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_order_preserved_despite_skewed_timing() {
        // Later elements finish first
        let input: Vec<u64> = (0..16).collect();
        let out = Pipeline::new()
            .stage(|x: u64| {
                thread::sleep(Duration::from_millis(16 - x));
                x * 2
            })
            .run(&input)
            .unwrap();

        let expected: Vec<u64> = input.iter().map(|x| x * 2).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_barrier_between_stages() {
        // Every first-stage unit must finish before any second-stage unit starts
        let finished_first = AtomicUsize::new(0);
        let observed = Mutex::new(Vec::new());

        Pipeline::new()
            .stage(|x: usize| {
                thread::sleep(Duration::from_millis((x % 3) as u64 * 5));
                finished_first.fetch_add(1, Ordering::SeqCst);
                x
            })
            .stage(|x| {
                observed.lock().unwrap().push(finished_first.load(Ordering::SeqCst));
                x
            })
            .run(&[0, 1, 2, 3, 4, 5, 6, 7])
            .unwrap();

        let observed = observed.into_inner().unwrap();
        assert_eq!(observed.len(), 8);
        assert!(observed.iter().all(|&n| n == 8));
    }

    #[test]
    fn test_one_thread_per_element() {
        let ids = Mutex::new(std::collections::HashSet::new());
        let gate = std::sync::Barrier::new(6);

        // Would deadlock unless all six units run concurrently
        Pipeline::new()
            .stage(|x: i32| {
                gate.wait();
                ids.lock().unwrap().insert(thread::current().id());
                x
            })
            .run(&[1, 2, 3, 4, 5, 6])
            .unwrap();

        assert_eq!(ids.into_inner().unwrap().len(), 6);
    }

    #[test]
    fn test_panic_stops_pipeline() {
        let later_calls = AtomicUsize::new(0);

        let err = Pipeline::new()
            .stage(|x: i32| x + 1)
            .stage(|x| {
                if x % 2 == 0 {
                    panic!("even value {}", x);
                }
                x
            })
            .stage(|x| {
                later_calls.fetch_add(1, Ordering::SeqCst);
                x
            })
            .run(&[0, 1, 2, 3])
            .unwrap_err();

        match err {
            StageError::Panicked { stage, index, message } => {
                assert_eq!(stage, 1);
                assert_eq!(index, 1);
                assert_eq!(message, "even value 2");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pipeline_is_reusable() {
        let pipeline = Pipeline::new().stage(|s: String| s.to_uppercase());
        assert_eq!(pipeline.len(), 1);

        let words = vec!["a".to_string(), "b".to_string()];
        assert_eq!(pipeline.run(&words).unwrap(), vec!["A", "B"]);
        assert_eq!(pipeline.run(&words).unwrap(), vec!["A", "B"]);
    }
}
