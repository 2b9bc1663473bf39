//! Mutant execution.
//!
//! Applies one mutation to disk, lets a judge decide its fate, and restores
//! the original bytes on every exit path. Two judges share the pipeline:
//! isolated mode re-parses the mutant in a scratch file (fast, catches only
//! syntactically invalid mutants), build mode runs the project's build
//! command and reads its exit code (authoritative, expensive).

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::mutants::{Mutation, MutationResult, MutationStatus};
use crate::parser;

/// Per-mutant runner settings.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Build command, whitespace-split into program and arguments.
    pub build_cmd: String,
    /// Working directory override; defaults to the file's project root.
    pub project_dir: Option<PathBuf>,
    /// Hard wall-clock budget per mutant.
    pub timeout_ms: u64,
    /// Judge with the parser instead of the build tool.
    pub isolated: bool,
    /// Leave scratch files and backups behind for debugging.
    pub keep_temp_files: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            build_cmd: "lake build".to_string(),
            project_dir: None,
            timeout_ms: 30_000,
            isolated: false,
            keep_temp_files: false,
        }
    }
}

/// Out-of-band health signal. A failed restore is not just another `Error`
/// result: the working tree is dirty and the run must stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerHealth {
    Ok,
    RestoreFailed,
}

/// Result of building the unmutated project once, before any mutant runs.
pub enum BaselineResult {
    Ok { duration_ms: u64 },
    Failed(String),
}

/// Splice `mutated_text` over the mutation's byte range. Falls back to a
/// first-occurrence textual replace when the indices are out of range or not
/// on char boundaries; the primary path is taken whenever they are valid.
pub fn apply_mutation(source: &str, mutation: &Mutation) -> String {
    let start = mutation.location.byte_start;
    let end = mutation.location.byte_end;
    if start <= end
        && end <= source.len()
        && source.is_char_boundary(start)
        && source.is_char_boundary(end)
    {
        let mut result = String::with_capacity(
            source.len() + mutation.mutated_text.len() - (end - start).min(source.len()),
        );
        result.push_str(&source[..start]);
        result.push_str(&mutation.mutated_text);
        result.push_str(&source[end..]);
        result
    } else {
        source.replacen(&mutation.original_text, &mutation.mutated_text, 1)
    }
}

/// `<file>.bak`, next to the original.
pub fn backup_path(file: &Path) -> PathBuf {
    let mut name = OsString::from(file.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

/// Restore a source file from a stale backup left by an interrupted run.
pub fn restore_stale_backup(file: &Path) -> std::io::Result<bool> {
    let backup = backup_path(file);
    if !backup.exists() {
        return Ok(false);
    }
    fs::copy(&backup, file)?;
    fs::remove_file(&backup)?;
    Ok(true)
}

/// Walk up from the source file looking for Lake project markers.
pub fn find_project_root(file: &Path) -> PathBuf {
    let markers = &["lakefile.lean", "lakefile.toml", "lean-toolchain", ".git"];
    let mut dir = file.parent().unwrap_or(file);
    loop {
        for marker in markers {
            if dir.join(marker).exists() {
                return dir.to_path_buf();
            }
        }
        match dir.parent() {
            Some(parent) if parent != dir => dir = parent,
            _ => break,
        }
    }
    file.parent().unwrap_or(file).to_path_buf()
}

pub fn parse_build_cmd(cmd: &str) -> (String, Vec<String>) {
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    match parts.split_first() {
        Some((program, args)) => (
            program.to_string(),
            args.iter().map(|s| s.to_string()).collect(),
        ),
        None => (cmd.to_string(), vec![]),
    }
}

/// Build the unmutated project once. A baseline failure means mutation
/// results would be meaningless; callers abort the run.
pub fn run_baseline(config: &RunnerConfig, any_file: &Path) -> BaselineResult {
    let start = Instant::now();
    let (program, args) = parse_build_cmd(&config.build_cmd);
    let working_dir = config
        .project_dir
        .clone()
        .unwrap_or_else(|| find_project_root(any_file));
    let output = Command::new(&program)
        .args(&args)
        .current_dir(&working_dir)
        .output();
    match output {
        Ok(o) if o.status.success() => BaselineResult::Ok {
            duration_ms: start.elapsed().as_millis() as u64,
        },
        Ok(o) => {
            let stdout = String::from_utf8_lossy(&o.stdout);
            let stderr = String::from_utf8_lossy(&o.stderr);
            BaselineResult::Failed(format!("{stdout}\n{stderr}"))
        }
        Err(e) => BaselineResult::Failed(format!("failed to run {}: {e}", config.build_cmd)),
    }
}

/// Run one mutation. Precondition: `mutation.file` exists on disk with
/// content equal to `original`. Postcondition: the file equals `original`
/// byte-for-byte on every exit path, panics included.
pub fn run(
    mutation: &Mutation,
    original: &str,
    config: &RunnerConfig,
) -> (MutationResult, RunnerHealth) {
    if config.isolated {
        (run_isolated(mutation, original, config), RunnerHealth::Ok)
    } else {
        run_build(mutation, original, config)
    }
}

fn result(
    mutation: &Mutation,
    status: MutationStatus,
    started: Instant,
    message: impl Into<String>,
) -> MutationResult {
    MutationResult {
        mutation: mutation.clone(),
        status,
        duration_ms: started.elapsed().as_millis() as u64,
        message: message.into(),
    }
}

/// Isolated judge: write the mutant to a scratch file and re-parse it. A
/// parser rejection is a kill; anything that parses survives.
fn run_isolated(mutation: &Mutation, original: &str, config: &RunnerConfig) -> MutationResult {
    let started = Instant::now();
    let mutated = apply_mutation(original, mutation);

    let scratch = match scratch_dir() {
        Ok(dir) => dir,
        Err(e) => {
            return result(
                mutation,
                MutationStatus::Error,
                started,
                format!("failed to create scratch dir: {e}"),
            )
        }
    };
    let file_name = mutation
        .file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("mutant.lean"));
    let scratch_file = scratch.path().join(file_name);
    if let Err(e) = fs::write(&scratch_file, &mutated) {
        return result(
            mutation,
            MutationStatus::Error,
            started,
            format!("failed to write scratch file: {e}"),
        );
    }

    // Judge the bytes that actually landed on disk, not the in-memory copy.
    let written = match fs::read_to_string(&scratch_file) {
        Ok(s) => s,
        Err(e) => {
            return result(
                mutation,
                MutationStatus::Error,
                started,
                format!("failed to read scratch file back: {e}"),
            )
        }
    };
    let status = match parser::parse(&written) {
        Err(_) => MutationStatus::Killed,
        Ok(parsed) if !parsed.is_complete() => MutationStatus::Killed,
        Ok(_) => MutationStatus::Survived,
    };

    if config.keep_temp_files {
        // Cleanup is skipped; the path is lost but that is the point of the
        // flag.
        let _ = scratch.keep();
    }
    result(mutation, status, started, "")
}

/// Build judge: backup, overwrite, build, classify, restore.
fn run_build(
    mutation: &Mutation,
    original: &str,
    config: &RunnerConfig,
) -> (MutationResult, RunnerHealth) {
    let started = Instant::now();
    let file = &mutation.file;
    let backup = backup_path(file);

    // The backup is advisory (restoration uses the in-memory original); it
    // exists so an interrupted process leaves evidence on disk.
    if let Err(e) = fs::write(&backup, original) {
        return (
            result(
                mutation,
                MutationStatus::Error,
                started,
                format!("failed to write backup: {e}"),
            ),
            RunnerHealth::Ok,
        );
    }

    let mutated = apply_mutation(original, mutation);
    let mut guard = RestoreGuard::new(file, original);
    if let Err(e) = fs::write(file, &mutated) {
        // The write may have truncated the file before failing.
        let health = guard.restore();
        remove_backup(&backup, config);
        return (
            result(
                mutation,
                MutationStatus::Error,
                started,
                format!("failed to write mutant: {e}"),
            ),
            health,
        );
    }

    let status_and_message = judge_build(mutation, config, started);
    let health = guard.restore();
    remove_backup(&backup, config);

    match health {
        RunnerHealth::RestoreFailed => (
            result(
                mutation,
                MutationStatus::Error,
                started,
                format!("failed to restore {}", file.display()),
            ),
            health,
        ),
        RunnerHealth::Ok => {
            let (status, message) = status_and_message;
            (result(mutation, status, started, message), health)
        }
    }
}

fn judge_build(
    mutation: &Mutation,
    config: &RunnerConfig,
    started: Instant,
) -> (MutationStatus, String) {
    let (program, args) = parse_build_cmd(&config.build_cmd);
    let working_dir = config
        .project_dir
        .clone()
        .unwrap_or_else(|| find_project_root(&mutation.file));
    let timeout = Duration::from_millis(config.timeout_ms);

    let child = Command::new(&program)
        .args(&args)
        .current_dir(&working_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();
    let mut child = match child {
        Ok(c) => c,
        Err(e) => {
            return (
                MutationStatus::Error,
                format!("failed to spawn {}: {e}", config.build_cmd),
            )
        }
    };

    loop {
        match child.try_wait() {
            Ok(Some(exit_status)) => {
                return if exit_status.success() {
                    (MutationStatus::Survived, String::new())
                } else {
                    (MutationStatus::Killed, String::new())
                };
            }
            Ok(None) => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return (
                        MutationStatus::Timeout,
                        format!("timed out after {}ms", config.timeout_ms),
                    );
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return (MutationStatus::Error, format!("wait failed: {e}"));
            }
        }
    }
}

fn remove_backup(backup: &Path, config: &RunnerConfig) {
    if !config.keep_temp_files {
        let _ = fs::remove_file(backup);
    }
}

/// Per-mutation scratch directory under the OS temp location, with a
/// monotonically-timestamped prefix. Dropped (and deleted) with the tempdir
/// handle unless kept.
fn scratch_dir() -> std::io::Result<tempfile::TempDir> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    tempfile::Builder::new()
        .prefix(&format!("leanmutator-{millis}-"))
        .tempdir()
}

/// Writes the original bytes back on drop if no explicit restore happened,
/// which covers panics inside the judge.
struct RestoreGuard<'a> {
    file: &'a Path,
    original: &'a str,
    done: bool,
}

impl<'a> RestoreGuard<'a> {
    fn new(file: &'a Path, original: &'a str) -> Self {
        Self {
            file,
            original,
            done: false,
        }
    }

    fn restore(&mut self) -> RunnerHealth {
        match fs::write(self.file, self.original) {
            Ok(()) => {
                self.done = true;
                RunnerHealth::Ok
            }
            // Drop will try once more; the caller still reports the failure.
            Err(_) => RunnerHealth::RestoreFailed,
        }
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            let _ = fs::write(self.file, self.original);
        }
    }
}
