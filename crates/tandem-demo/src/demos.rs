//! The individual demonstrations. Each returns what it computed so the
//! binary can print it and the tests can check it.

use std::collections::BTreeMap;
use std::thread;

use anyhow::Context;
use tandem::{AtomicCounter, CancellationToken, ConcurrentMap, Pipeline, RunReport, WorkerPool};

use crate::config::DemoConfig;

/// `counter_tasks` threads each add `counter_delta` to one shared counter
pub fn counter(config: &DemoConfig) -> u64 {
    let counter = AtomicCounter::new();
    thread::scope(|s| {
        for _ in 0..config.counter_tasks {
            s.spawn(|| counter.add(config.counter_delta));
        }
    });
    counter.load()
}

/// Writers fill disjoint key ranges while readers poll them
pub fn map() -> BTreeMap<String, i64> {
    const WRITERS: i64 = 3;
    const KEYS_PER_WRITER: i64 = 4;

    let map = ConcurrentMap::new();
    thread::scope(|s| {
        for w in 0..WRITERS {
            let map = &map;
            s.spawn(move || {
                for i in 0..KEYS_PER_WRITER {
                    map.set(format!("writer{}-{}", w, i), w * 10 + i);
                }
            });
        }
        for _ in 0..2 {
            let map = &map;
            s.spawn(move || {
                let hits = (0..WRITERS)
                    .flat_map(|w| (0..KEYS_PER_WRITER).map(move |i| format!("writer{}-{}", w, i)))
                    .filter(|key| map.contains_key(key.as_str()))
                    .count();
                tracing::debug!(hits, "reader pass");
            });
        }
    });
    map.snapshot().into_iter().collect()
}

/// Cubes of 1..=10 on a bounded pool under a deadline
pub fn pool(config: &DemoConfig) -> anyhow::Result<RunReport<i64>> {
    let data: Vec<i64> = (1..=10).collect();
    let jobs: Vec<_> = data.iter().map(|&v| move || v * v * v).collect();

    let token = CancellationToken::with_timeout(config.pool_timeout());
    WorkerPool::new(config.pool_workers)
        .run(jobs, &token)
        .context("running worker pool demo")
}

/// `[1, 2, 3, 4]` through `x + 10`, `x * 3`, `x - 5`
pub fn pipeline() -> anyhow::Result<Vec<i64>> {
    Pipeline::new()
        .stage(|x: i64| x + 10)
        .stage(|x| x * 3)
        .stage(|x| x - 5)
        .run(&[1, 2, 3, 4])
        .context("running pipeline demo")
}
