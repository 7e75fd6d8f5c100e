//! Error types for configuration, environment validation and build execution.
//!
//! The taxonomy mirrors the phases of a packaging run: configuration is
//! resolved and validated first, the toolchain environment second, and only
//! then do external commands run. Each phase owns its error type so callers
//! can tell a bad option apart from a broken SDK install or a failed tool.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for packaging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for a packaging run.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or contradictory option values.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Missing or incompatible toolchain installation.
    #[error("environment error: {0}")]
    Environment(#[from] EnvironmentError),

    /// External process could not be spawned or exited non-zero.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// A build stage failed; carries the stage name and the underlying cause.
    #[error("build stage '{stage}' failed: {source}")]
    BuildStep {
        /// Name of the failing stage.
        stage: &'static str,
        /// Underlying failure.
        source: Box<Error>,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wraps any error as a build-step failure tagged with the stage name.
    pub fn build_step(stage: &'static str, source: Error) -> Self {
        Error::BuildStep {
            stage,
            source: Box::new(source),
        }
    }
}

/// Validation errors for application options, detected before or during
/// [`ApplicationDescriptor`](crate::descriptor::ApplicationDescriptor)
/// construction.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required option was not supplied by any source.
    #[error("missing required option '{option}'")]
    Missing {
        /// Stable option name.
        option: &'static str,
    },

    /// An option value failed syntactic or semantic validation.
    #[error("invalid value for '{option}': {reason}")]
    Invalid {
        /// Stable option name.
        option: &'static str,
        /// What was wrong with the value.
        reason: String,
    },

    /// Two options that exclude each other were both supplied.
    #[error("options '{first}' and '{second}' are mutually exclusive; set exactly one")]
    Conflicting {
        first: &'static str,
        second: &'static str,
    },

    /// A path-valued option points at a file or directory that does not exist.
    #[error("path for '{option}' does not exist: {path}")]
    MissingPath {
        /// Stable option name.
        option: &'static str,
        /// The offending path.
        path: PathBuf,
    },

    /// A JSON configuration file could not be read or parsed.
    #[error("malformed configuration file {path}: {reason}")]
    MalformedFile {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser or IO diagnostic.
        reason: String,
    },
}

/// Validation errors for the local toolchain, detected during
/// [`EnvironmentDescriptor`](crate::descriptor::EnvironmentDescriptor)
/// construction and never mid-build.
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// A required environment option was not supplied by any source.
    #[error("missing required option '{option}'")]
    Missing {
        /// Stable option name.
        option: &'static str,
    },

    /// An environment option value is outside the supported set.
    #[error("invalid value for '{option}': {reason}")]
    Invalid {
        /// Stable option name.
        option: &'static str,
        /// What was wrong with the value.
        reason: String,
    },

    /// An expected toolchain entry point is absent.
    #[error("{what} not found at {path}")]
    MissingToolchain {
        /// Human-readable name of the missing piece.
        what: &'static str,
        /// Where it was expected.
        path: PathBuf,
    },

    /// A read-only toolchain probe failed.
    #[error("toolchain probe failed: {0}")]
    Probe(#[source] CommandError),
}

/// Failures of a single external command invocation.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The program could not be located or started.
    #[error("failed to spawn '{program}': {reason}")]
    Spawn {
        /// Program name or path as given by the caller.
        program: String,
        /// OS or lookup diagnostic.
        reason: String,
    },

    /// The program ran but exited non-zero.
    #[error("'{program}' exited with status {code:?}\narguments: {args:?}\nstderr: {stderr}")]
    Failed {
        /// Program name or path as given by the caller.
        program: String,
        /// Arguments the program was invoked with.
        args: Vec<String>,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
}
