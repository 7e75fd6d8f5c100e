//! Build orchestration core for packaging HTML5 applications as Android APKs.
//!
//! The crate reconciles configuration from environment variables, command
//! line flags and JSON files into two independently-validated descriptors,
//! derives every build path from them, and drives the external Android and
//! Crosswalk toolchain binaries to produce a signed, zipaligned package.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod locations;
pub mod pipeline;
pub mod runner;

// Re-export commonly used types
pub use error::{CommandError, ConfigError, EnvironmentError, Error, Result};
