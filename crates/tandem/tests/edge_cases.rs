//! Edge case tests for tandem
//!
//! Degenerate sizes, zero workers, already-fired tokens, wraparound.

use std::time::{Duration, Instant};

use tandem::{
    run_pipeline, AtomicCounter, CancelReason, CancellationToken, ConcurrentMap, Pipeline,
    StageError, WorkerPool, DEFAULT_WORKERS,
};

// ============================================================================
// COUNTER / MAP
// ============================================================================

#[test]
fn test_counter_zero_adds() {
    assert_eq!(AtomicCounter::new().load(), 0);
}

#[test]
fn test_counter_wraparound() {
    let counter = AtomicCounter::with_value(u64::MAX);
    counter.increment();
    assert_eq!(counter.load(), 0);
}

#[test]
fn test_map_absent_key() {
    let map: ConcurrentMap<String, i64> = ConcurrentMap::new();
    assert_eq!(map.get("nope"), None);
    assert_eq!(map.get_or_default("nope"), 0);
}

#[test]
fn test_map_empty_string_key() {
    let map: ConcurrentMap<String, i64> = ConcurrentMap::default();
    map.set(String::new(), -1);
    assert_eq!(map.get(""), Some(-1));
}

// ============================================================================
// WORKER POOL
// ============================================================================

#[test]
fn test_pool_zero_workers_matches_default() {
    let zero = WorkerPool::new(0);
    let four = WorkerPool::new(4);
    assert_eq!(zero.worker_count(), DEFAULT_WORKERS);
    assert_eq!(zero.worker_count(), four.worker_count());

    let run = |pool: &WorkerPool| {
        let jobs: Vec<_> = (0..9).map(|i| move || i * 2).collect();
        let mut values = pool.run(jobs, &CancellationToken::new()).unwrap().into_values().unwrap();
        values.sort();
        values
    };
    assert_eq!(run(&zero), run(&four));
}

#[test]
fn test_pool_more_workers_than_jobs() {
    let jobs: Vec<_> = (0..2).map(|i| move || i).collect();
    let report = WorkerPool::new(64).run(jobs, &CancellationToken::new()).unwrap();
    assert_eq!(report.len(), 2);
}

#[test]
fn test_pool_empty_batch_with_cancelled_token() {
    let token = CancellationToken::new();
    token.cancel();
    let jobs: Vec<fn() -> u8> = Vec::new();
    let report = WorkerPool::new(2).run(jobs, &token).unwrap();
    assert!(report.is_empty());
    assert!(report.is_complete());
    assert_eq!(report.cancel_reason(), None);
}

#[test]
fn test_pool_expired_deadline_never_blocks() {
    let token = CancellationToken::with_deadline(Instant::now());
    let jobs: Vec<_> = (0..100)
        .map(|i| {
            move || {
                std::thread::sleep(Duration::from_millis(50));
                i
            }
        })
        .collect();

    let start = Instant::now();
    let report = WorkerPool::new(4).run(jobs, &token).unwrap();
    assert!(start.elapsed() < Duration::from_millis(500));
    assert!(report.len() <= 100);
    assert_eq!(report.cancel_reason(), Some(CancelReason::DeadlineExceeded));
}

// ============================================================================
// PIPELINE
// ============================================================================

#[test]
fn test_pipeline_zero_stages_is_fresh_copy() {
    let input = vec![1, 2, 3];
    let mut out = run_pipeline(&input, &[]).unwrap();
    out.push(4);
    assert_eq!(input, vec![1, 2, 3]);
    assert_eq!(out, vec![1, 2, 3, 4]);
}

#[test]
fn test_pipeline_empty_input_many_stages() {
    let out = Pipeline::new()
        .stage(|x: i32| x + 1)
        .stage(|x| x * 2)
        .stage(|x| x - 3)
        .run(&[])
        .unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_pipeline_single_element() {
    let out = Pipeline::new().stage(|x: i32| x * 7).run(&[6]).unwrap();
    assert_eq!(out, vec![42]);
}

#[test]
fn test_pipeline_panic_in_first_stage() {
    let err = Pipeline::new()
        .stage(|x: i32| {
            assert!(x >= 0, "negative input");
            x
        })
        .run(&[3, -1, -2])
        .unwrap_err();

    assert_eq!(err.stage(), 0);
    assert!(matches!(err, StageError::Panicked { index: 1, .. }));
}
