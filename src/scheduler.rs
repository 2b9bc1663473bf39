//! Work scheduler and aggregator.
//!
//! Fans mutations across at most N worker threads and folds the result
//! stream into [`Stats`]. Mutations are partitioned by file before
//! parallelization, so two build-mode runs never hold the same file mutated
//! concurrently. No lock is held anywhere near a child-process wait; the
//! only shared state is an abort flag, the progress counter, and the result
//! channel.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Instant;

use crate::mutants::{Mutation, MutationResult, MutationStatus, Stats};
use crate::runner::{self, RunnerConfig, RunnerHealth};

#[derive(Debug, Clone, Default)]
pub struct ScheduleConfig {
    /// `<= 1` selects the sequential path.
    pub num_workers: usize,
    pub runner: RunnerConfig,
}

#[derive(Debug)]
pub struct ScheduleOutcome {
    /// All judged mutants, ordered by mutation id.
    pub results: Vec<MutationResult>,
    pub stats: Stats,
    /// True when a restore failure stopped the run early.
    pub aborted: bool,
}

/// Invoked once per completed mutation, in completion order, with
/// `(completed, total, result)`.
pub type ProgressFn<'a> = dyn Fn(usize, usize, &MutationResult) + 'a;

pub fn schedule(
    mutations: Vec<Mutation>,
    sources: &HashMap<PathBuf, String>,
    config: &ScheduleConfig,
    on_progress: Option<&ProgressFn<'_>>,
) -> ScheduleOutcome {
    let started = Instant::now();
    let total = mutations.len();
    let (mut results, aborted) = if config.num_workers <= 1 {
        run_sequential(mutations, sources, config, on_progress, total)
    } else {
        run_parallel(mutations, sources, config, on_progress, total)
    };
    results.sort_by_key(|r| r.mutation.id);

    let mut stats = Stats::default();
    for result in &results {
        stats.record(result);
    }
    stats.total_time_ms = started.elapsed().as_millis() as u64;

    ScheduleOutcome {
        results,
        stats,
        aborted,
    }
}

/// Group mutations by file (first-seen order) and deal the groups round-robin
/// into at most `num_workers` shards. Keeping a file's mutations in one shard
/// is what serializes build-mode runs per file.
pub fn partition_by_file(mutations: Vec<Mutation>, num_workers: usize) -> Vec<Vec<Mutation>> {
    let mut groups: Vec<(PathBuf, Vec<Mutation>)> = Vec::new();
    for mutation in mutations {
        match groups.iter_mut().find(|(file, _)| *file == mutation.file) {
            Some((_, group)) => group.push(mutation),
            None => groups.push((mutation.file.clone(), vec![mutation])),
        }
    }
    let n = num_workers.max(1);
    let mut shards: Vec<Vec<Mutation>> = (0..n).map(|_| Vec::new()).collect();
    for (i, (_, group)) in groups.into_iter().enumerate() {
        shards[i % n].extend(group);
    }
    shards.retain(|shard| !shard.is_empty());
    shards
}

fn missing_source(mutation: Mutation) -> MutationResult {
    MutationResult {
        mutation,
        status: MutationStatus::Error,
        duration_ms: 0,
        message: "no source bytes for file".to_string(),
    }
}

fn run_sequential(
    mutations: Vec<Mutation>,
    sources: &HashMap<PathBuf, String>,
    config: &ScheduleConfig,
    on_progress: Option<&ProgressFn<'_>>,
    total: usize,
) -> (Vec<MutationResult>, bool) {
    let mut results = Vec::with_capacity(total);
    let mut aborted = false;
    let mut completed = 0usize;
    for mutation in mutations {
        let (result, health) = match sources.get(&mutation.file) {
            Some(original) => runner::run(&mutation, original, &config.runner),
            None => (missing_source(mutation), RunnerHealth::Ok),
        };
        completed += 1;
        if let Some(callback) = on_progress {
            callback(completed, total, &result);
        }
        let restore_failed = health == RunnerHealth::RestoreFailed;
        results.push(result);
        if restore_failed {
            aborted = true;
            break;
        }
    }
    (results, aborted)
}

fn run_parallel(
    mutations: Vec<Mutation>,
    sources: &HashMap<PathBuf, String>,
    config: &ScheduleConfig,
    on_progress: Option<&ProgressFn<'_>>,
    total: usize,
) -> (Vec<MutationResult>, bool) {
    let shards = partition_by_file(mutations, config.num_workers);
    let abort = AtomicBool::new(false);
    let completed = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<(MutationResult, RunnerHealth)>();
    let mut results = Vec::with_capacity(total);
    let mut aborted = false;

    std::thread::scope(|scope| {
        for shard in shards {
            let tx = tx.clone();
            let abort = &abort;
            let runner_config = &config.runner;
            scope.spawn(move || {
                for mutation in shard {
                    if abort.load(Ordering::SeqCst) {
                        break;
                    }
                    let (result, health) = match sources.get(&mutation.file) {
                        Some(original) => runner::run(&mutation, original, runner_config),
                        None => (missing_source(mutation), RunnerHealth::Ok),
                    };
                    if health == RunnerHealth::RestoreFailed {
                        abort.store(true, Ordering::SeqCst);
                    }
                    if tx.send((result, health)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        // Drain inside the scope so progress fires while workers run.
        for (result, health) in rx.iter() {
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(callback) = on_progress {
                callback(done, total, &result);
            }
            if health == RunnerHealth::RestoreFailed {
                aborted = true;
            }
            results.push(result);
        }
    });

    (results, aborted)
}
