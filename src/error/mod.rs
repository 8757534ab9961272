//! Error types and handling for rulekit
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Constructor helpers are grouped by error domain:
//! - [`version`]: Version parsing and selection errors
//! - [`git`]: Git transport errors
//! - [`integrity`]: Checksum and structural validation errors
//! - [`fs`]: File system and persistence errors

pub mod fs;
pub mod git;
pub mod integrity;
pub mod version;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for rulekit operations
#[derive(Error, Diagnostic, Debug)]
pub enum RulekitError {
    // Version errors
    #[error("Version is empty")]
    #[diagnostic(
        code(rulekit::version::empty),
        help("Omit the version to request the latest release")
    )]
    EmptyVersion,

    #[error("Invalid version '{input}'")]
    #[diagnostic(
        code(rulekit::version::invalid_format),
        help("Use a semantic version such as v1.2.3 or a pseudo-version v0.0.0+YYYYMMDDHHMMSS-<hash>")
    )]
    InvalidVersion { input: String },

    #[error("Cannot compare release '{left}' with pseudo-version '{right}'")]
    #[diagnostic(code(rulekit::version::mixed_comparison))]
    MixedVersionComparison { left: String, right: String },

    #[error("version '{version}' is not found")]
    #[diagnostic(
        code(rulekit::version::not_found),
        help("Check the tags published in the repository")
    )]
    VersionNotFound { version: String },

    // Resolution errors
    #[error("Failed to clone repository: {url}: {reason}")]
    #[diagnostic(
        code(rulekit::git::clone_failed),
        help("Check that URL is correct and you have access to repository")
    )]
    GitCloneFailed { url: String, reason: String },

    #[error("Git operation failed: {message}")]
    #[diagnostic(code(rulekit::git::operation_failed))]
    GitOperationFailed { message: String },

    #[error("Failed to decode manifest of '{source_name}': {reason}")]
    #[diagnostic(code(rulekit::bundle::manifest_decode_failed))]
    ManifestDecodeFailed { source_name: String, reason: String },

    #[error("Failed to decode lock file of '{source_name}': {reason}")]
    #[diagnostic(code(rulekit::bundle::lockfile_decode_failed))]
    LockfileDecodeFailed { source_name: String, reason: String },

    #[error("Failed to decode module '{path}': {reason}")]
    #[diagnostic(code(rulekit::bundle::module_decode_failed))]
    ModuleDecodeFailed { path: String, reason: String },

    #[error("Failed to fetch '{source_name}'")]
    #[diagnostic(code(rulekit::fetch::failed))]
    FetchFailed {
        source_name: String,
        #[source]
        inner: Box<RulekitError>,
    },

    #[error("Circular dependency detected: {chain}")]
    #[diagnostic(
        code(rulekit::deps::circular),
        help("Remove the circular requirement from one of the manifests")
    )]
    CircularDependency { chain: String },

    // Integrity errors
    #[error("Checksum mismatch: lock file records '{expected}', manifest sums to '{actual}'")]
    #[diagnostic(
        code(rulekit::integrity::checksum_mismatch),
        help("The manifest changed since the lock file was written. Run 'rulekit tidy'")
    )]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Module '{source_path}' does not match its lock file checksum")]
    #[diagnostic(code(rulekit::integrity::module_checksum_mismatch))]
    ModuleChecksumMismatch { source_path: String },

    #[error("Invalid bundle structure: {message}")]
    #[diagnostic(code(rulekit::integrity::structure_invalid))]
    StructureInvalid { message: String },

    #[error("Bundle '{repository}' failed inspection")]
    #[diagnostic(code(rulekit::integrity::inspection_failed))]
    InspectionFailed {
        repository: String,
        #[source]
        inner: Box<RulekitError>,
    },

    // Store errors
    #[error("Bundle '{key}' is not in the local store")]
    #[diagnostic(code(rulekit::store::not_found))]
    StoreNotFound { key: String },

    #[error("Cache operation failed: {message}")]
    #[diagnostic(code(rulekit::cache::operation_failed))]
    CacheOperationFailed { message: String },

    // File system errors
    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(rulekit::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(rulekit::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("Failed to save {files}")]
    #[diagnostic(
        code(rulekit::fs::save_failed),
        help("Manifest and lock file may now disagree. Run 'rulekit tidy' to reconcile them")
    )]
    SaveFailed {
        files: String,
        #[related]
        failures: Vec<RulekitError>,
    },

    #[error("IO error: {message}")]
    #[diagnostic(code(rulekit::fs::io_error))]
    IoError { message: String },
}

impl RulekitError {
    /// Wrap an error with the source (repository) it was raised for
    pub fn fetching(source_name: impl Into<String>, inner: RulekitError) -> Self {
        RulekitError::FetchFailed {
            source_name: source_name.into(),
            inner: Box::new(inner),
        }
    }

    /// Walk through `FetchFailed`/`InspectionFailed` wrappers to the root cause
    #[cfg(test)]
    pub fn root_cause(&self) -> &RulekitError {
        match self {
            RulekitError::FetchFailed { inner, .. } | RulekitError::InspectionFailed { inner, .. } => {
                inner.root_cause()
            }
            other => other,
        }
    }
}

impl From<std::io::Error> for RulekitError {
    fn from(err: std::io::Error) -> Self {
        RulekitError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for RulekitError {
    fn from(err: serde_yaml::Error) -> Self {
        RulekitError::ManifestDecodeFailed {
            source_name: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RulekitError {
    fn from(err: serde_json::Error) -> Self {
        RulekitError::LockfileDecodeFailed {
            source_name: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<git2::Error> for RulekitError {
    fn from(err: git2::Error) -> Self {
        RulekitError::GitOperationFailed {
            message: err.message().to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, RulekitError>;
