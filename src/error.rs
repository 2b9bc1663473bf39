use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the library.
#[derive(Debug, Error)]
pub enum MutatorError {
    /// The Lean source could not be parsed.
    #[error("failed to parse {file}: {message}")]
    Parse {
        /// Source file the parser rejected.
        file: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
    /// Configuration problem (bad value, refusing to overwrite, ...).
    #[error("config error: {0}")]
    Config(String),
    /// The configuration file is not valid TOML.
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    /// IO failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
