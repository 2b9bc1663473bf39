//! Run configuration: built-in defaults, the TOML config file, and the
//! precedence rule CLI > file > defaults (the CLI applies its overrides on
//! top of the loaded file).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MutatorError;

pub const DEFAULT_CONFIG_FILE: &str = "leanmutator.toml";

/// Environment variable redirecting the default config file location.
pub const CONFIG_PATH_ENV: &str = "LEANMUTATOR_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Operator names to enable; empty selects all built-ins.
    pub operators: Vec<String>,
    /// Substring patterns excluding files by full path.
    pub exclude: Vec<String>,
    /// Per-mutation wall-clock budget in milliseconds.
    pub timeout: u64,
    /// Worker count; 1 is sequential, 0 resolves to the CPU count.
    pub parallel: usize,
    /// Report format: `console`, `json`, or `html`.
    pub output: String,
    /// Report file path for the json/html formats.
    pub report: Option<String>,
    /// Minimum score for exit code 0.
    pub threshold: f64,
    /// Default paths to mutate when the CLI gives none.
    pub sources: Option<Vec<String>>,
    /// Build command judging each mutant.
    pub test_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operators: vec![],
            exclude: vec![],
            timeout: 30_000,
            parallel: 1,
            output: "console".to_string(),
            report: None,
            threshold: 80.0,
            sources: None,
            test_command: None,
        }
    }
}

impl Config {
    /// Default config location, honoring the environment override.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load from the default location; a missing file yields the defaults.
    pub fn load() -> Result<Self, MutatorError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, MutatorError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Write the default config for `init`. Refuses to overwrite.
    pub fn write_default(path: &Path) -> Result<(), MutatorError> {
        if path.exists() {
            return Err(MutatorError::Config(format!(
                "{} already exists; delete it first to re-initialize",
                path.display()
            )));
        }
        std::fs::write(path, Self::default().to_toml())?;
        Ok(())
    }
}
