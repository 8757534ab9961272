//! File system and persistence errors

use super::RulekitError;

/// Creates a file read failed error
pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> RulekitError {
    RulekitError::FileReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates a file write failed error
pub fn write_failed(path: impl Into<String>, reason: impl Into<String>) -> RulekitError {
    RulekitError::FileWriteFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Combines the failed writes of a save into one error naming every file
pub fn save_failed(failures: Vec<RulekitError>) -> RulekitError {
    let files = failures
        .iter()
        .map(|f| match f {
            RulekitError::FileWriteFailed { path, .. } => path.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    RulekitError::SaveFailed { files, failures }
}
