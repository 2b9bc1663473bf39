use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Byte-accurate span of a mutation site. Lines and columns are 1-based;
/// columns count bytes within the line. `byte_start`/`byte_end` index the
/// file's UTF-8 byte stream, `byte_start <= byte_end <= file length`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub byte_start: usize,
    pub byte_end: usize,
}

/// One candidate mutation. `original_text` must equal the on-disk bytes at
/// `location.byte_start..byte_end` when the runner picks this mutation up;
/// the producer guarantees that. Ids are monotonic within a run, from 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    pub id: usize,
    pub file: PathBuf,
    pub location: SourceLocation,
    pub original_text: String,
    pub mutated_text: String,
    pub operator_name: String,
    pub description: String,
}

/// Outcome lattice for a mutant. Transitions are write-once,
/// `Pending -> {Killed, Survived, Timeout, Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationStatus {
    Pending,
    Killed,
    Survived,
    Timeout,
    Error,
}

impl std::fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Killed => write!(f, "killed"),
            Self::Survived => write!(f, "survived"),
            Self::Timeout => write!(f, "timeout"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Judged mutant. `message` carries the workflow error for `Error` results
/// and is empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    pub mutation: Mutation,
    pub status: MutationStatus,
    pub duration_ms: u64,
    pub message: String,
}

/// Aggregated run statistics. A straight commutative fold over the result
/// stream; `total_time_ms` is the wall clock of the whole schedule call, not
/// the sum of per-mutant durations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub killed: usize,
    pub survived: usize,
    pub timed_out: usize,
    pub errors: usize,
    pub total_time_ms: u64,
}

impl Stats {
    pub fn record(&mut self, result: &MutationResult) {
        self.total += 1;
        match result.status {
            MutationStatus::Killed => self.killed += 1,
            MutationStatus::Survived => self.survived += 1,
            MutationStatus::Timeout => self.timed_out += 1,
            MutationStatus::Error => self.errors += 1,
            MutationStatus::Pending => {}
        }
    }

    /// Mutation score in `[0, 100]`. Workflow errors are excluded from the
    /// denominator so infrastructure failures never degrade the score; weak
    /// tests (survivors and timeouts) do.
    pub fn score(&self) -> f64 {
        let effective = self.total - self.errors;
        if effective == 0 {
            100.0
        } else {
            100.0 * self.killed as f64 / effective as f64
        }
    }
}
