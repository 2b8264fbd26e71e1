//! MC - sandboxed file tools for OpenRouter tool calling
//!
//! This library exposes a small set of file tools that an LLM agent can call
//! through OpenRouter's function-calling API. Every call is validated before
//! it touches the filesystem and answers with a structured result.
//!
//! # Features
//!
//! - **Sandboxing**: paths are canonicalized and must stay inside the allowed roots
//! - **Reads**: whole files or byte windows, text or base64, size-checked up front
//! - **Writes**: atomic overwrite via temp file + rename, all-or-nothing append
//! - **Typed requests**: untyped model arguments are parsed into [`tools::ToolRequest`]
//! - **Structured errors**: every failure carries an [`ErrorKind`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mc::config::GatewayConfig;
//! use mc::tools::{get_all_tools, ToolCall, ToolExecutor};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! // Tool definitions for the chat request
//! let tools = get_all_tools();
//!
//! // Execute a tool call returned by the model
//! let executor = ToolExecutor::new(GatewayConfig::from_env()?)?;
//! let call = ToolCall::new("call_1", "read_file", r#"{"path": "README.md"}"#);
//! let result = executor.execute_tool_call(&call).await;
//! println!("{}", result.to_message_content());
//! # Ok(())
//! # }
//! ```
//!
//! # Available Tools
//!
//! 1. **read_file** - Read a file or a byte window of it
//! 2. **write_file** - Overwrite or append, optionally creating directories
//! 3. **file_exists** - Check whether a path exists
//! 4. **file_stat** - Size, modification time and type of a path
//! 5. **get_current_time** - Current local time in a strftime format

pub mod config;
pub mod error;
pub mod tools;

// Re-export commonly used types for convenience
pub use config::GatewayConfig;
pub use error::{ConfigError, ErrorKind, ToolError};
pub use tools::{get_all_tools, FileGateway, ToolCall, ToolExecutor, ToolRequest, ToolResult};
