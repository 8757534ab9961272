//! Version parsing and selection errors

use super::RulekitError;

/// Creates an invalid version format error
pub fn invalid(input: impl Into<String>) -> RulekitError {
    RulekitError::InvalidVersion {
        input: input.into(),
    }
}

/// Creates a version-not-found error
pub fn not_found(version: impl Into<String>) -> RulekitError {
    RulekitError::VersionNotFound {
        version: version.into(),
    }
}

/// Creates a mixed release/pseudo-version comparison error
pub fn mixed_comparison(left: impl Into<String>, right: impl Into<String>) -> RulekitError {
    RulekitError::MixedVersionComparison {
        left: left.into(),
        right: right.into(),
    }
}
