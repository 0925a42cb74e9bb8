//! Common error types used across all user-data crates
//! Provides consistent error handling and reporting

use crate::Dataset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A storage write or read was rejected by the backing store
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum StorageError {
    #[error("Storage is not available: {message}")]
    Unavailable { message: String },

    #[error("Storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },

    #[error("Storage rejected write to {key}: {message}")]
    WriteRejected { key: String, message: String },

    #[error("Failed to serialize value for {key}: {message}")]
    Serialize { key: String, message: String },
}

/// Parsed JSON does not match the shape required for a dataset
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("Invalid {dataset} format: {reason}")]
pub struct FormatError {
    pub dataset: Dataset,
    pub reason: String,
}

impl FormatError {
    pub fn new(dataset: Dataset, reason: impl Into<String>) -> Self {
        Self {
            dataset,
            reason: reason.into(),
        }
    }
}

/// Base error type for all user-data operations
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum UserDataError {
    #[error("Failed to parse JSON: {message}")]
    Parse { message: String },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("No dataset selected")]
    EmptySelection,

    #[error("Operation cancelled by the user")]
    Cancelled,

    #[error("Browser interop error: {message}")]
    Browser { message: String },
}

/// Result type alias for user-data operations
pub type UserDataResult<T> = Result<T, UserDataError>;

impl From<serde_json::Error> for UserDataError {
    fn from(err: serde_json::Error) -> Self {
        UserDataError::Parse {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "wasm-bindgen")]
impl From<wasm_bindgen::JsValue> for UserDataError {
    fn from(err: wasm_bindgen::JsValue) -> Self {
        UserDataError::Browser {
            message: err
                .as_string()
                .unwrap_or_else(|| format!("{err:?}")),
        }
    }
}

/// Error response structure for JavaScript interop
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: UserDataError,
    pub action: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: UserDataError) -> Self {
        Self {
            success: false,
            error,
            action: None,
        }
    }

    /// Name the user action that failed
    pub fn with_action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }

    /// Convert to JSON string for JavaScript
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":{"type":"Browser","details":{"message":"Failed to serialize error"}}}"#.to_string()
        })
    }
}
