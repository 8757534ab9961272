//! Checksum and structural validation errors

use super::RulekitError;

/// Creates a manifest-vs-lock checksum mismatch error
pub fn checksum_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> RulekitError {
    RulekitError::ChecksumMismatch {
        expected: expected.into(),
        actual: actual.into(),
    }
}

/// Creates a structural validation error
pub fn structure_invalid(message: impl Into<String>) -> RulekitError {
    RulekitError::StructureInvalid {
        message: message.into(),
    }
}

/// Wraps an inspection failure with the repository it was raised for
pub fn inspection_failed(repository: impl Into<String>, inner: RulekitError) -> RulekitError {
    RulekitError::InspectionFailed {
        repository: repository.into(),
        inner: Box::new(inner),
    }
}
