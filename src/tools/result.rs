use serde::{Deserialize, Serialize};

use super::encoding::Encoding;
use super::request::WriteMode;
use crate::error::{ErrorKind, ToolError, ToolOutcome};

/// Result structure for tool execution.
///
/// Serialized with a `status` tag so the model sees either
/// `{"status":"success","data":{...}}` or
/// `{"status":"failure","kind":"not_found","message":"..."}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Success { data: ToolOutput },
    Failure { kind: ErrorKind, message: String },
}

impl ToolResult {
    pub fn success(data: ToolOutput) -> Self {
        ToolResult::Success { data }
    }

    pub fn failure(error: ToolError) -> Self {
        ToolResult::Failure {
            kind: error.kind,
            message: error.message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    pub fn data(&self) -> Option<&ToolOutput> {
        match self {
            ToolResult::Success { data } => Some(data),
            ToolResult::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ToolResult::Success { .. } => None,
            ToolResult::Failure { kind, .. } => Some(*kind),
        }
    }

    /// JSON text sent back to the model as the tool message content
    pub fn to_message_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                "{{\"status\":\"failure\",\"kind\":\"io_failure\",\"message\":\"Failed to serialize result: {}\"}}",
                e.to_string().replace('"', "'")
            )
        })
    }
}

impl From<ToolOutcome<ToolOutput>> for ToolResult {
    fn from(outcome: ToolOutcome<ToolOutput>) -> Self {
        match outcome {
            Ok(data) => ToolResult::success(data),
            Err(error) => ToolResult::failure(error),
        }
    }
}

/// Success payloads, one per tool
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolOutput {
    Content(FileContent),
    Written(WriteReport),
    Exists(ExistsReport),
    Stat(FileStat),
    Time(TimeReport),
}

/// Decoded file content
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    Text(String),
    Lines(Vec<String>),
    /// Base64 of the raw bytes
    Base64(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileContent {
    pub path: String,
    pub encoding: Encoding,
    pub offset: u64,
    pub bytes_read: u64,
    pub file_size: u64,
    pub content: Content,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WriteReport {
    pub path: String,
    pub bytes_written: u64,
    pub mode: WriteMode,
    /// True when the file did not exist before the call
    pub created: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExistsReport {
    pub path: String,
    pub exists: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileStat {
    pub path: String,
    pub size: u64,
    /// RFC 3339 timestamp, when the platform reports one
    pub modified: Option<String>,
    pub modified_unix: Option<i64>,
    pub is_dir: bool,
    pub is_file: bool,
    pub readonly: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimeReport {
    pub time: String,
    pub format: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_serialization() {
        let result = ToolResult::success(ToolOutput::Exists(ExistsReport {
            path: "/tmp/a".to_string(),
            exists: true,
        }));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["type"], "exists");
        assert_eq!(value["data"]["exists"], true);
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn test_failure_serialization() {
        let result = ToolResult::failure(ToolError::too_large("too big"));
        let value: serde_json::Value =
            serde_json::from_str(&result.to_message_content()).unwrap();
        assert_eq!(value["status"], "failure");
        assert_eq!(value["kind"], "too_large");
        assert_eq!(value["message"], "too big");
        assert!(value.get("data").is_none());
        assert!(!result.is_success());
        assert_eq!(result.error_kind(), Some(ErrorKind::TooLarge));
        assert!(result.data().is_none());
    }

    #[test]
    fn test_content_round_trip() {
        let result = ToolResult::success(ToolOutput::Content(FileContent {
            path: "/tmp/a".to_string(),
            encoding: Encoding::Utf8,
            offset: 0,
            bytes_read: 5,
            file_size: 5,
            content: Content::Lines(vec!["a\n".to_string(), "b".to_string()]),
        }));
        let text = result.to_message_content();
        let back: ToolResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, result);
    }
}
