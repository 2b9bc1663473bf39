pub mod config;
pub mod error;
pub mod mutants;
pub mod operators;
pub mod output;
pub mod parser;
pub mod patterns;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod traverse;

use std::path::{Path, PathBuf};

pub use error::MutatorError;

/// Directories never scanned: hidden dirs plus the Lake build caches.
const SKIP_DIRS: &[&str] = &[".lake", "lake-packages"];

pub fn is_lean_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("lean")
}

fn is_excluded(path: &Path, exclude: &[String]) -> bool {
    let full = path.display().to_string();
    exclude.iter().any(|pattern| full.contains(pattern.as_str()))
}

/// Collect `.lean` sources from files and directories. Directories are
/// scanned recursively, skipping hidden dirs and the Lake caches; exclude
/// patterns are substring matches on the full path. Explicitly named files
/// are taken as given. A missing path is an error.
pub fn collect_sources(paths: &[PathBuf], exclude: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for path in paths {
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ));
        }
        if path.is_dir() {
            collect_dir(path, exclude, &mut sources)?;
        } else if !is_excluded(path, exclude) {
            sources.push(path.clone());
        }
    }
    Ok(sources)
}

fn collect_dir(
    dir: &Path,
    exclude: &[String],
    sources: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    // read_dir order is platform-dependent; sorting keeps id assignment
    // deterministic across runs.
    entries.sort();

    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if path.is_dir() {
            if name.starts_with('.') || SKIP_DIRS.contains(&name.as_str()) {
                continue;
            }
            collect_dir(&path, exclude, sources)?;
        } else if is_lean_file(&path) && !is_excluded(&path, exclude) {
            sources.push(path);
        }
    }
    Ok(())
}
