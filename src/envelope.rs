//! Uniform success/failure envelope returned by every exposed operation.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Outcome of a single operation, carrying either data or an error message.
///
/// `success` is true exactly when `error_message` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl<T> OperationResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error_message: Some(message.into()),
        }
    }

    /// Wrap a `Result`, using the error's `Display` output as the message.
    pub fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> OperationResult<U> {
        OperationResult {
            success: self.success,
            data: self.data.map(f),
            error_message: self.error_message,
        }
    }

    /// Convert back into a `Result`.
    ///
    /// A successful envelope without data (e.g. deserialized from a peer)
    /// is reported as an error since there is nothing to return.
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("operation succeeded without data".to_string()),
            (false, _) => Err(self
                .error_message
                .unwrap_or_else(|| "operation failed".to_string())),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for OperationResult<T> {
    fn from(result: Result<T, E>) -> Self {
        Self::from_result(result)
    }
}
