//! Error types for the MC tool gateway
//!
//! Every fault a tool can hit is mapped to one of the [`ErrorKind`] values
//! before it reaches the caller. Callers branch on the kind; the message keeps
//! the original diagnostic for logging.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

/// Failure categories reported by the tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing, malformed or contradictory parameters
    InvalidInput,
    /// Path resolves outside every allowed root
    PathTraversal,
    /// File or parent directory does not exist
    NotFound,
    /// The OS refused access
    PermissionDenied,
    /// File content is not valid in the requested encoding
    DecodeError,
    /// Content exceeds the configured size limit
    TooLarge,
    /// Any other OS-level failure (out of space, timeouts, ...)
    IoFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::PathTraversal => "path_traversal",
            ErrorKind::NotFound => "not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::DecodeError => "decode_error",
            ErrorKind::TooLarge => "too_large",
            ErrorKind::IoFailure => "io_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured tool failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn path_traversal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PathTraversal, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DecodeError, message)
    }

    pub fn too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooLarge, message)
    }

    pub fn io_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IoFailure, message)
    }

    /// Map an OS error onto the taxonomy, prefixing it with what was being done
    pub fn from_io(err: &io::Error, context: impl fmt::Display) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            io::ErrorKind::InvalidData => ErrorKind::DecodeError,
            _ => ErrorKind::IoFailure,
        };
        Self::new(kind, format!("{}: {}", context, err))
    }
}

/// Result type alias for tool operations
pub type ToolOutcome<T> = std::result::Result<T, ToolError>;

/// Problems detected while building a gateway configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An allowed root could not be resolved
    #[error("Invalid allowed root '{path}': {source}")]
    InvalidRoot {
        path: String,
        #[source]
        source: io::Error,
    },

    /// An allowed root exists but is not a directory
    #[error("Allowed root '{0}' is not a directory")]
    RootNotDirectory(String),

    /// No allowed root configured
    #[error("At least one allowed root is required")]
    NoRoots,

    /// An environment variable held an unusable value
    #[error("Invalid value for {var}: {message}")]
    InvalidEnv { var: String, message: String },

    /// Unknown encoding name
    #[error("Unsupported encoding: {0}")]
    UnknownEncoding(String),

    /// A limit is zero or otherwise unusable
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Config file is not valid YAML for the config schema
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ToolError::not_found("missing.txt");
        assert_eq!(err.to_string(), "not_found: missing.txt");
    }

    #[test]
    fn test_io_error_mapping() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let err = ToolError::from_io(&io_err, "Failed to open 'a.txt'");
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.contains("Failed to open 'a.txt'"));
        assert!(err.message.contains("no such file"));

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            ToolError::from_io(&io_err, "open").kind,
            ErrorKind::PermissionDenied
        );

        let io_err = io::Error::new(io::ErrorKind::Other, "disk full");
        assert_eq!(ToolError::from_io(&io_err, "write").kind, ErrorKind::IoFailure);
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::PathTraversal).unwrap(),
            "\"path_traversal\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorKind::IoFailure).unwrap(),
            "\"io_failure\""
        );
        let kind: ErrorKind = serde_json::from_str("\"too_large\"").unwrap();
        assert_eq!(kind, ErrorKind::TooLarge);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidEnv {
            var: "MC_MAX_READ_BYTES".to_string(),
            message: "not a number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for MC_MAX_READ_BYTES: not a number"
        );
    }
}
