use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use leanmutator::mutants::{Mutation, MutationStatus, SourceLocation, Stats};
use leanmutator::runner::RunnerConfig;
use leanmutator::scheduler::{self, ScheduleConfig};

fn make_mutation(id: usize, file: &Path, start: usize, end: usize, original: &str, mutated: &str) -> Mutation {
    Mutation {
        id,
        file: file.to_path_buf(),
        location: SourceLocation {
            file: file.to_path_buf(),
            start_line: 1,
            start_col: start + 1,
            end_line: 1,
            end_col: end + 1,
            byte_start: start,
            byte_end: end,
        },
        original_text: original.to_string(),
        mutated_text: mutated.to_string(),
        operator_name: "test".to_string(),
        description: String::new(),
    }
}

/// A small fixture: one file on disk, three valid mutants and one that
/// breaks tokenization, judged in isolated mode.
fn fixture(dir: &Path) -> (Vec<Mutation>, HashMap<PathBuf, String>) {
    let file = dir.join("Main.lean");
    let source = "def p (n : Nat) : Bool := n > 0\n".to_string();
    fs::write(&file, &source).unwrap();

    let mutations = vec![
        make_mutation(0, &file, 29, 30, ">", ">="),
        make_mutation(1, &file, 29, 30, ">", "<"),
        make_mutation(2, &file, 30, 31, " ", " \""),
        make_mutation(3, &file, 29, 30, ">", "="),
    ];
    let mut sources = HashMap::new();
    sources.insert(file, source);
    (mutations, sources)
}

fn isolated_config(num_workers: usize) -> ScheduleConfig {
    ScheduleConfig {
        num_workers,
        runner: RunnerConfig {
            isolated: true,
            ..RunnerConfig::default()
        },
    }
}

// --- partitioning ---

#[test]
fn partition_keeps_a_file_in_one_shard() {
    let a = PathBuf::from("a.lean");
    let b = PathBuf::from("b.lean");
    let c = PathBuf::from("c.lean");
    let mutations = vec![
        make_mutation(0, &a, 0, 1, "x", "y"),
        make_mutation(1, &b, 0, 1, "x", "y"),
        make_mutation(2, &a, 2, 3, "x", "y"),
        make_mutation(3, &c, 0, 1, "x", "y"),
        make_mutation(4, &b, 2, 3, "x", "y"),
    ];
    let shards = scheduler::partition_by_file(mutations, 2);
    assert_eq!(shards.len(), 2);
    for file in [&a, &b, &c] {
        let holders = shards
            .iter()
            .filter(|shard| shard.iter().any(|m| &m.file == file))
            .count();
        assert_eq!(holders, 1, "{} split across shards", file.display());
    }
    let total: usize = shards.iter().map(|s| s.len()).sum();
    assert_eq!(total, 5);
}

#[test]
fn partition_never_exceeds_worker_count() {
    let mutations: Vec<Mutation> = (0..10)
        .map(|i| {
            let file = PathBuf::from(format!("f{i}.lean"));
            make_mutation(i, &file, 0, 1, "x", "y")
        })
        .collect();
    assert!(scheduler::partition_by_file(mutations.clone(), 4).len() <= 4);
    assert_eq!(scheduler::partition_by_file(mutations, 1).len(), 1);
}

// --- sequential path ---

#[test]
fn sequential_schedule_aggregates_stats() {
    let dir = tempfile::TempDir::new().unwrap();
    let (mutations, sources) = fixture(dir.path());
    let outcome = scheduler::schedule(mutations, &sources, &isolated_config(1), None);

    assert!(!outcome.aborted);
    assert_eq!(outcome.stats.total, 4);
    // The broken-quote mutant is the only parser kill.
    assert_eq!(outcome.stats.killed, 1);
    assert_eq!(outcome.stats.survived, 3);
    assert_eq!(outcome.stats.errors, 0);
    assert_eq!(outcome.results.len(), 4);
}

#[test]
fn results_are_ordered_by_mutation_id() {
    let dir = tempfile::TempDir::new().unwrap();
    let (mutations, sources) = fixture(dir.path());
    let outcome = scheduler::schedule(mutations, &sources, &isolated_config(4), None);
    let ids: Vec<usize> = outcome.results.iter().map(|r| r.mutation.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[test]
fn progress_fires_once_per_mutation_in_completion_order() {
    let dir = tempfile::TempDir::new().unwrap();
    let (mutations, sources) = fixture(dir.path());
    let calls = Cell::new(0usize);
    let last_done = Cell::new(0usize);
    let progress = |done: usize, total: usize, _result: &leanmutator::mutants::MutationResult| {
        calls.set(calls.get() + 1);
        assert_eq!(total, 4);
        assert!(done > last_done.get(), "completion counter must increase");
        last_done.set(done);
    };
    scheduler::schedule(mutations, &sources, &isolated_config(1), Some(&progress));
    assert_eq!(calls.get(), 4);
}

// --- parallel path ---

#[test]
fn parallel_stats_match_sequential_stats() {
    let dir = tempfile::TempDir::new().unwrap();
    let (mutations, sources) = fixture(dir.path());

    let sequential =
        scheduler::schedule(mutations.clone(), &sources, &isolated_config(1), None);
    let parallel = scheduler::schedule(mutations, &sources, &isolated_config(4), None);

    let strip_time = |s: &Stats| Stats {
        total_time_ms: 0,
        ..s.clone()
    };
    assert_eq!(strip_time(&sequential.stats), strip_time(&parallel.stats));
}

#[test]
fn parallel_progress_reaches_total() {
    let dir = tempfile::TempDir::new().unwrap();
    let (mutations, sources) = fixture(dir.path());
    let calls = Cell::new(0usize);
    let progress = |_done: usize, total: usize, _result: &leanmutator::mutants::MutationResult| {
        calls.set(calls.get() + 1);
        assert_eq!(total, 4);
    };
    scheduler::schedule(mutations, &sources, &isolated_config(3), Some(&progress));
    assert_eq!(calls.get(), 4);
}

// --- missing sources ---

#[test]
fn missing_source_bytes_become_error_results() {
    let file = PathBuf::from("nowhere.lean");
    let mutations = vec![make_mutation(0, &file, 0, 1, "x", "y")];
    let sources = HashMap::new();
    let outcome = scheduler::schedule(mutations, &sources, &isolated_config(1), None);
    assert_eq!(outcome.stats.errors, 1);
    assert_eq!(outcome.results[0].status, MutationStatus::Error);
    assert!(!outcome.results[0].message.is_empty());
}

// --- error results do not move the score ---

#[test]
fn errors_do_not_change_the_score() {
    let dir = tempfile::TempDir::new().unwrap();
    let (mut mutations, sources) = fixture(dir.path());
    let base = scheduler::schedule(mutations.clone(), &sources, &isolated_config(1), None);

    // Append mutants whose file has no bytes: guaranteed Error results.
    for i in 0..3 {
        mutations.push(make_mutation(
            4 + i,
            Path::new("missing.lean"),
            0,
            1,
            "x",
            "y",
        ));
    }
    let extended = scheduler::schedule(mutations, &sources, &isolated_config(1), None);
    assert_eq!(extended.stats.errors, 3);
    assert_eq!(base.stats.score(), extended.stats.score());
}

// --- wall clock ---

#[test]
fn total_time_is_wall_clock_not_sum() {
    let dir = tempfile::TempDir::new().unwrap();
    let (mutations, sources) = fixture(dir.path());
    let outcome = scheduler::schedule(mutations, &sources, &isolated_config(1), None);
    let sum: u64 = outcome.results.iter().map(|r| r.duration_ms).sum();
    assert!(outcome.stats.total_time_ms >= sum / 4);
}
