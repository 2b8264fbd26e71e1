pub mod encoding;
pub mod executor;
pub mod file_system;
pub mod path;
pub mod request;
pub mod result;
pub mod schema;
pub mod time;

pub use encoding::Encoding;
pub use executor::{FunctionCall, ToolCall, ToolExecutor};
pub use file_system::{Deadline, FileGateway};
pub use path::{PathGuard, ResolvedPath};
pub use request::{Operation, ReadMode, ReadOptions, ToolRequest, WriteMode, WriteOptions};
pub use result::{Content, ToolOutput, ToolResult};
pub use schema::{get_file_system_tools, FileSystemTool};

/// Get all available tools for the LLM
pub fn get_all_tools() -> Vec<FileSystemTool> {
    let mut tools = schema::get_file_system_tools();
    tools.push(schema::get_time_tool());
    tools
}
