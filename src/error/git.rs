//! Git transport errors

use super::RulekitError;

/// Creates a clone failed error
pub fn clone_failed(url: impl Into<String>, reason: impl Into<String>) -> RulekitError {
    RulekitError::GitCloneFailed {
        url: url.into(),
        reason: reason.into(),
    }
}

/// Creates a generic git operation error
pub fn operation_failed(message: impl Into<String>) -> RulekitError {
    RulekitError::GitOperationFailed {
        message: message.into(),
    }
}
