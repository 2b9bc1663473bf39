use std::fs;
use std::path::{Path, PathBuf};

// --- extension detection ---

#[test]
fn lean_files_are_detected() {
    assert!(leanmutator::is_lean_file(Path::new("Main.lean")));
    assert!(leanmutator::is_lean_file(Path::new("Src/Nested/Lemmas.lean")));
    assert!(!leanmutator::is_lean_file(Path::new("lakefile.toml")));
    assert!(!leanmutator::is_lean_file(Path::new("lean-toolchain")));
    assert!(!leanmutator::is_lean_file(Path::new("Main.lean.bak")));
}

// --- source discovery ---

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

#[test]
fn directories_are_scanned_recursively_for_lean_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("A.lean"));
    touch(&root.join("Src").join("B.lean"));
    touch(&root.join("Src").join("Deep").join("C.lean"));
    touch(&root.join("README.md"));

    let found = leanmutator::collect_sources(&[root.to_path_buf()], &[]).unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|p| leanmutator::is_lean_file(p)));
}

#[test]
fn hidden_and_cache_dirs_are_skipped() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("A.lean"));
    touch(&root.join(".git").join("B.lean"));
    touch(&root.join(".lake").join("build").join("C.lean"));
    touch(&root.join("lake-packages").join("dep").join("D.lean"));

    let found = leanmutator::collect_sources(&[root.to_path_buf()], &[]).unwrap();
    assert_eq!(found, vec![root.join("A.lean")]);
}

#[test]
fn exclude_patterns_match_substrings_of_the_full_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("Main.lean"));
    touch(&root.join("Tests").join("Spec.lean"));

    let found =
        leanmutator::collect_sources(&[root.to_path_buf()], &["Tests".to_string()]).unwrap();
    assert_eq!(found, vec![root.join("Main.lean")]);
}

#[test]
fn explicit_files_are_taken_as_given() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("Main.lean");
    touch(&file);
    let found = leanmutator::collect_sources(&[file.clone()], &[]).unwrap();
    assert_eq!(found, vec![file]);
}

#[test]
fn missing_path_is_an_error() {
    let missing = PathBuf::from("/definitely/not/here.lean");
    assert!(leanmutator::collect_sources(&[missing], &[]).is_err());
}

#[test]
fn discovery_order_is_deterministic() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("B.lean"));
    touch(&root.join("A.lean"));
    touch(&root.join("C.lean"));

    let first = leanmutator::collect_sources(&[root.to_path_buf()], &[]).unwrap();
    let second = leanmutator::collect_sources(&[root.to_path_buf()], &[]).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![root.join("A.lean"), root.join("B.lean"), root.join("C.lean")]
    );
}
