//! Descriptor file handling for rulekit
//!
//! This module contains data structures for:
//! - `rulekit.yaml` - Bundle manifest declaring direct requirements
//! - `rulekit.lock` - Lock file with the resolved requirement graph and checksums
//! - [`Config`] - Per-invocation settings (work dir, cache dir)

pub mod lockfile;
pub mod manifest;
pub mod settings;

// Re-export commonly used types
pub use lockfile::{Direction, LockRequirement, Lockfile, ModuleRecord};
pub use manifest::{Manifest, Requirement};
pub use settings::Config;

/// Manifest file name
pub const MANIFEST_FILE: &str = "rulekit.yaml";

/// Lock file name
pub const LOCK_FILE: &str = "rulekit.lock";

/// Ignore file name
pub const IGNORE_FILE: &str = ".rulekitignore";

/// Extension of module source files
pub const MODULE_EXTENSION: &str = "rule";

/// Lock file schema edition written by this version
pub const EDITION: &str = "2024";
