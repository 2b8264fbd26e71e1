//! Tool call execution
//!
//! Takes the tool calls a model returns in a chat completion, dispatches them
//! to the matching tool and always produces a [`ToolResult`]. File operations
//! run on the blocking pool, bounded by the configured timeout.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::file_system::{Deadline, FileGateway};
use super::request::ToolRequest;
use super::result::{ToolOutput, ToolResult};
use super::schema::FileSystemTool;
use super::time::{run_time_tool, GET_CURRENT_TIME};
use super::get_all_tools;
use crate::config::GatewayConfig;
use crate::error::{ConfigError, ToolError};

/// A tool call as returned in an OpenRouter chat completion
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, exactly as the model produced them
    pub arguments: String,
}

fn default_call_type() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            call_type: default_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Dispatches tool calls to the gateway and the time tool
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    gateway: Arc<FileGateway>,
}

impl ToolExecutor {
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_gateway(FileGateway::new(config)?))
    }

    pub fn with_gateway(gateway: FileGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }

    pub fn gateway(&self) -> &FileGateway {
        &self.gateway
    }

    /// Definitions to send along with a chat request
    pub fn tool_definitions(&self) -> Vec<FileSystemTool> {
        get_all_tools()
    }

    pub fn available_tools(&self) -> Vec<String> {
        get_all_tools()
            .into_iter()
            .map(|tool| tool.function.name)
            .collect()
    }

    /// Execute a model tool call and return the result
    pub async fn execute_tool_call(&self, call: &ToolCall) -> ToolResult {
        let name = call.function.name.as_str();
        debug!("Tool call {} -> {}", call.id, name);

        let raw = call.function.arguments.trim();
        let arguments = if raw.is_empty() {
            Value::Object(Default::default())
        } else {
            match serde_json::from_str::<Value>(raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Tool call {} has invalid JSON arguments: {}", call.id, e);
                    return ToolResult::failure(ToolError::invalid_input(format!(
                        "Invalid JSON in arguments for {}: {}",
                        name, e
                    )));
                }
            }
        };

        self.execute(name, &arguments).await
    }

    /// Execute a tool by name with already-parsed arguments
    pub async fn execute(&self, name: &str, arguments: &Value) -> ToolResult {
        if name == GET_CURRENT_TIME {
            return run_time_tool(arguments).map(ToolOutput::Time).into();
        }

        if !ToolRequest::handles(name) {
            warn!("Unknown function requested: {}", name);
            return ToolResult::failure(ToolError::invalid_input(format!(
                "Unknown function {}",
                name
            )));
        }

        match ToolRequest::parse(name, arguments) {
            Ok(request) => self.run(request).await,
            Err(e) => {
                warn!("Rejected {} call: {}", name, e);
                ToolResult::failure(e)
            }
        }
    }

    /// Run a validated request on the blocking pool.
    ///
    /// On timeout the executor abandons the operation. If the operation
    /// already committed its write, the executor waits for it instead, so a
    /// reported failure never hides a published write.
    pub async fn run(&self, request: ToolRequest) -> ToolResult {
        let tool_name = request.tool_name();
        let timeout = self.gateway.config().timeout();
        let deadline = Deadline::from_timeout(timeout);
        let task_deadline = deadline.clone();
        let gateway = Arc::clone(&self.gateway);

        let mut task = tokio::task::spawn_blocking(move || {
            gateway.execute_with_deadline(&request, task_deadline)
        });

        let joined = match timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) if deadline.abandon() => {
                    warn!("{} timed out after {}ms", tool_name, limit.as_millis());
                    return ToolResult::failure(ToolError::io_failure(format!(
                        "{} timed out after {}ms",
                        tool_name,
                        limit.as_millis()
                    )));
                }
                Err(_) => {
                    debug!("{} committed before its timeout, waiting for it", tool_name);
                    task.await
                }
            },
            None => task.await,
        };

        joined.unwrap_or_else(|e| {
            warn!("{} task failed: {}", tool_name, e);
            ToolResult::failure(ToolError::io_failure(format!(
                "{} task failed: {}",
                tool_name, e
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::tools::result::Content;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn executor(dir: &TempDir) -> ToolExecutor {
        ToolExecutor::new(GatewayConfig::new().with_root(dir.path())).unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read_tool_calls() {
        let temp_dir = TempDir::new().unwrap();
        let executor = executor(&temp_dir);

        let call = ToolCall::new(
            "call_1",
            "write_file",
            r#"{"path": "out/report.txt", "content": "hello", "create_dirs": true}"#,
        );
        let result = executor.execute_tool_call(&call).await;
        match result.data() {
            Some(ToolOutput::Written(report)) => assert_eq!(report.bytes_written, 5),
            other => panic!("unexpected result {:?}", other),
        }

        let call = ToolCall::new("call_2", "read_file", r#"{"path": "out/report.txt"}"#);
        let result = executor.execute_tool_call(&call).await;
        match result.data() {
            Some(ToolOutput::Content(content)) => {
                assert_eq!(content.content, Content::Text("hello".to_string()))
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_calls() {
        let temp_dir = TempDir::new().unwrap();
        let executor = executor(&temp_dir);

        let result = executor
            .execute_tool_call(&ToolCall::new("c", "read_file", "{not json"))
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidInput));

        let result = executor
            .execute_tool_call(&ToolCall::new("c", "delete_path", r#"{"path": "a"}"#))
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidInput));

        let result = executor
            .execute_tool_call(&ToolCall::new("c", "file_stat", ""))
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidInput));

        let result = executor
            .execute("read_file", &json!({"path": "../../etc/passwd"}))
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::PathTraversal));
    }

    #[tokio::test]
    async fn test_time_tool_call() {
        let temp_dir = TempDir::new().unwrap();
        let executor = executor(&temp_dir);

        let result = executor
            .execute_tool_call(&ToolCall::new("t", "get_current_time", r#"{"time_format": "%Y"}"#))
            .await;
        match result.data() {
            Some(ToolOutput::Time(report)) => assert_eq!(report.time.len(), 4),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_never_publishes_partial_write() {
        let temp_dir = TempDir::new().unwrap();
        let executor = ToolExecutor::new(
            GatewayConfig::new()
                .with_root(temp_dir.path())
                .with_chunk_size(1)
                .with_timeout_ms(Some(1)),
        )
        .unwrap();

        let content = "x".repeat(2 * 1024 * 1024);
        let result = executor
            .execute("write_file", &json!({"path": "slow.txt", "content": content}))
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::IoFailure));

        // The abandoned task may still be unwinding its temp file
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(!temp_dir.path().join("slow.txt").exists());
        let leftovers = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_write_within_timeout_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let executor = ToolExecutor::new(
            GatewayConfig::new()
                .with_root(temp_dir.path())
                .with_timeout_ms(Some(5_000)),
        )
        .unwrap();

        let result = executor
            .execute("write_file", &json!({"path": "fast.txt", "content": "done"}))
            .await;
        assert!(result.is_success());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("fast.txt")).unwrap(),
            "done"
        );
    }

    #[test]
    fn test_tool_call_deserialization() {
        let call: ToolCall = serde_json::from_value(json!({
            "id": "call_abc",
            "type": "function",
            "function": {"name": "file_exists", "arguments": "{\"path\":\"a.txt\"}"}
        }))
        .unwrap();
        assert_eq!(call.function.name, "file_exists");

        let call: ToolCall = serde_json::from_value(json!({
            "id": "call_abc",
            "function": {"name": "file_exists", "arguments": "{}"}
        }))
        .unwrap();
        assert_eq!(call.call_type, "function");
    }

    #[test]
    fn test_available_tools() {
        let temp_dir = TempDir::new().unwrap();
        let executor = executor(&temp_dir);
        assert_eq!(
            executor.available_tools(),
            vec!["read_file", "write_file", "file_exists", "file_stat", "get_current_time"]
        );
        assert_eq!(executor.tool_definitions().len(), 5);
    }
}
