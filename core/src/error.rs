//! Error types for dlr-rs.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dlr-rs operations.
pub type Result<T> = std::result::Result<T, DlrError>;

/// Errors that can occur while loading models and running inference.
#[derive(Debug, Error)]
pub enum DlrError {
    /// The native runtime could not materialize a model handle.
    #[error("Runtime load failed: {0}")]
    RuntimeLoad(String),

    /// Native inference execution failed.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// An operation was attempted on a closed predictor, block, or manager.
    #[error("Closed resource: {0}")]
    Closed(String),

    /// A translator could not convert between typed values and tensors.
    #[error("Translation failed: {0}")]
    Translation(String),

    /// Invalid tensor.
    #[error("Invalid tensor: {0}")]
    Tensor(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl DlrError {
    /// Create a runtime load error.
    pub fn runtime_load(msg: impl Into<String>) -> Self {
        Self::RuntimeLoad(msg.into())
    }

    /// Create an inference error.
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a closed-resource error.
    pub fn closed(msg: impl Into<String>) -> Self {
        Self::Closed(msg.into())
    }

    /// Create a translation error.
    pub fn translation(msg: impl Into<String>) -> Self {
        Self::Translation(msg.into())
    }

    /// Create a tensor error.
    pub fn tensor(msg: impl Into<String>) -> Self {
        Self::Tensor(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DlrError::runtime_load("no loadable model found");
        assert_eq!(
            format!("{}", err),
            "Runtime load failed: no loadable model found"
        );

        let err = DlrError::closed("predictor is closed");
        assert_eq!(format!("{}", err), "Closed resource: predictor is closed");

        let err = DlrError::translation("missing output 'y'");
        assert_eq!(format!("{}", err), "Translation failed: missing output 'y'");

        let err = DlrError::FileNotFound(PathBuf::from("/path/to/model"));
        assert_eq!(format!("{}", err), "File not found: /path/to/model");
    }
}
