use leanmutator::config::Config;
use leanmutator::MutatorError;

// --- defaults ---

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();
    assert!(config.operators.is_empty());
    assert!(config.exclude.is_empty());
    assert_eq!(config.timeout, 30_000);
    assert_eq!(config.parallel, 1);
    assert_eq!(config.output, "console");
    assert_eq!(config.report, None);
    assert_eq!(config.threshold, 80.0);
    assert_eq!(config.sources, None);
    assert_eq!(config.test_command, None);
}

// --- TOML round-trip ---

#[test]
fn default_config_round_trips_through_toml() {
    let config = Config::default();
    let parsed: Config = toml::from_str(&config.to_toml()).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn partial_file_fills_in_defaults() {
    let parsed: Config = toml::from_str("timeout = 5000\nthreshold = 95.0\n").unwrap();
    assert_eq!(parsed.timeout, 5000);
    assert_eq!(parsed.threshold, 95.0);
    assert_eq!(parsed.parallel, 1);
    assert_eq!(parsed.output, "console");
}

#[test]
fn full_file_parses_every_key() {
    let text = r#"
operators = ["boolean-flip", "comparison-relational"]
exclude = ["Tests/", "Scratch"]
timeout = 12000
parallel = 4
output = "json"
report = "out.json"
threshold = 66.5
sources = ["Src"]
test_command = "lake build tests"
"#;
    let parsed: Config = toml::from_str(text).unwrap();
    assert_eq!(parsed.operators.len(), 2);
    assert_eq!(parsed.exclude, vec!["Tests/", "Scratch"]);
    assert_eq!(parsed.timeout, 12000);
    assert_eq!(parsed.parallel, 4);
    assert_eq!(parsed.output, "json");
    assert_eq!(parsed.report.as_deref(), Some("out.json"));
    assert_eq!(parsed.threshold, 66.5);
    assert_eq!(parsed.sources, Some(vec!["Src".to_string()]));
    assert_eq!(parsed.test_command.as_deref(), Some("lake build tests"));
}

// --- file loading ---

#[test]
fn load_from_reads_a_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("leanmutator.toml");
    std::fs::write(&path, "parallel = 8\n").unwrap();
    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.parallel, 8);
}

#[test]
fn load_from_missing_file_is_an_io_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = Config::load_from(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, MutatorError::Io(_)));
}

#[test]
fn load_from_invalid_toml_is_a_toml_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("leanmutator.toml");
    std::fs::write(&path, "timeout = \"not a number\"\n").unwrap();
    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, MutatorError::Toml(_)));
}

// --- init ---

#[test]
fn write_default_creates_a_loadable_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("leanmutator.toml");
    Config::write_default(&path).unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn write_default_refuses_to_overwrite() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("leanmutator.toml");
    std::fs::write(&path, "# hand-edited\n").unwrap();
    let err = Config::write_default(&path).unwrap_err();
    assert!(matches!(err, MutatorError::Config(_)));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "# hand-edited\n"
    );
}
