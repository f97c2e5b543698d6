//! Error types for helm-pilot.
//!
//! Every fatal condition of a reconciliation surfaces as one of these
//! variants. Nothing in the decision engine swallows an error; callers that
//! drive several releases isolate failures per release themselves.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving configuration or driving helm.
#[derive(Debug, Error)]
pub enum HelmPilotError {
    /// A required value is still absent after the whole fallback chain was tried
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A chart manifest or requirements file could not be parsed
    #[error("Failed to parse {}: {message}", path.display())]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message, including the line when known
        message: String,
    },

    /// The remote release query failed; no operation is chosen in that case
    #[error("Failed to query release \"{release}\": {message}")]
    Query {
        /// Release that was queried
        release: String,
        /// What went wrong
        message: String,
    },

    /// helm exited with a non-zero status
    #[error("`{command}` failed with {status}: {}", stderr.trim())]
    Execution {
        /// The rendered command line
        command: String,
        /// Exit status description (exit code or signal)
        status: String,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// Malformed project configuration file
    #[error("Invalid configuration file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Some items of a batch run failed; each failure was reported already
    #[error("{action} failed for {failed} of {total}: {names}")]
    Batch {
        action: String,
        failed: usize,
        total: usize,
        names: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HelmPilotError {
    /// Build a configuration error naming the missing value and the sources checked.
    pub fn missing(what: &str, sources: &[&str]) -> Self {
        HelmPilotError::Configuration(format!(
            "{} could not be resolved (checked: {})",
            what,
            sources.join(", ")
        ))
    }
}

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, HelmPilotError>;
