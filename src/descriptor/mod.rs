//! Validated, immutable descriptors for the two concerns of a packaging run.
//!
//! [`ApplicationDescriptor`] captures the application being packaged;
//! [`EnvironmentDescriptor`] captures the local toolchain. Both are built
//! once per run, validated completely during construction, and never
//! mutated afterwards. Construction of the two is independent, so the caller
//! runs them concurrently and joins on the pair.

mod application;
mod environment;

pub use application::{AppEntry, ApplicationDescriptor};
pub use environment::{Arch, EnvironmentDescriptor, DEBUG_KEYSTORE_ALIAS, DEBUG_KEYSTORE_FILE};
