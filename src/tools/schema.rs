use serde::{Deserialize, Serialize};
use serde_json::json;

use super::encoding::Encoding;
use super::request::{FILE_EXISTS, FILE_STAT, READ_FILE, WRITE_FILE};
use super::time::{DEFAULT_TIME_FORMAT, GET_CURRENT_TIME};

/// Tool definitions in the OpenRouter function-calling format
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileSystemTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: ToolFunction,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolFunction {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub param_type: String,
    pub properties: serde_json::Value,
    pub required: Vec<String>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

impl FileSystemTool {
    fn function(name: &str, description: &str, properties: serde_json::Value, required: &[&str]) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: ToolFunction {
                name: name.to_string(),
                description: description.to_string(),
                parameters: ToolParameters {
                    param_type: "object".to_string(),
                    properties,
                    required: required.iter().map(|r| r.to_string()).collect(),
                    additional_properties: false,
                },
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

fn path_property(description: &str) -> serde_json::Value {
    json!({
        "type": "string",
        "description": description
    })
}

fn encoding_property(description: &str) -> serde_json::Value {
    json!({
        "type": "string",
        "description": description,
        "enum": Encoding::NAMES
    })
}

/// Generate OpenRouter-compatible definitions for the file tools
pub fn get_file_system_tools() -> Vec<FileSystemTool> {
    vec![
        FileSystemTool::function(
            READ_FILE,
            "Read the contents of a file inside the workspace. Returns the decoded content, the number of bytes read and the file size. Large files can be read in windows with offset and length.",
            json!({
                "path": path_property("Path of the file to read, relative to the workspace root."),
                "encoding": encoding_property("Text encoding of the file. Use 'binary' to get base64 of the raw bytes."),
                "offset": {
                    "type": "integer",
                    "description": "Byte offset to start reading from.",
                    "minimum": 0,
                    "default": 0
                },
                "length": {
                    "type": "integer",
                    "description": "Maximum number of bytes to read. Clamped to the end of the file.",
                    "minimum": 0
                },
                "mode": {
                    "type": "string",
                    "description": "'all' returns one string, 'lines' returns a list of lines.",
                    "enum": ["all", "lines"],
                    "default": "all"
                }
            }),
            &["path"],
        ),
        FileSystemTool::function(
            WRITE_FILE,
            "Write content to a file inside the workspace. Overwrites atomically by default, or appends to the end of the file.",
            json!({
                "path": path_property("Path of the file to write, relative to the workspace root."),
                "content": {
                    "type": "string",
                    "description": "Content to write. Base64 when encoding is 'binary'."
                },
                "encoding": encoding_property("Encoding used to store the content."),
                "mode": {
                    "type": "string",
                    "description": "'overwrite' replaces the file, 'append' adds to its end.",
                    "enum": ["overwrite", "append"],
                    "default": "overwrite"
                },
                "create_dirs": {
                    "type": "boolean",
                    "description": "Create missing parent directories.",
                    "default": false
                }
            }),
            &["path", "content"],
        ),
        FileSystemTool::function(
            FILE_EXISTS,
            "Check whether a file or directory exists inside the workspace.",
            json!({
                "path": path_property("Path to check, relative to the workspace root.")
            }),
            &["path"],
        ),
        FileSystemTool::function(
            FILE_STAT,
            "Get the size, modification time and type of a file or directory inside the workspace.",
            json!({
                "path": path_property("Path to inspect, relative to the workspace root.")
            }),
            &["path"],
        ),
    ]
}

pub fn get_time_tool() -> FileSystemTool {
    FileSystemTool::function(
        GET_CURRENT_TIME,
        "Get the current local time in the specified strftime format.",
        json!({
            "time_format": {
                "type": "string",
                "description": "strftime format string, e.g. '%Y-%m-%d %H:%M:%S'.",
                "default": DEFAULT_TIME_FORMAT
            }
        }),
        &[],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names() {
        let names: Vec<String> = get_file_system_tools()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec![READ_FILE, WRITE_FILE, FILE_EXISTS, FILE_STAT]);
    }

    #[test]
    fn test_tool_serialization() {
        let tools = get_file_system_tools();
        let value = serde_json::to_value(&tools[1]).unwrap();
        assert_eq!(value["type"], "function");
        assert_eq!(value["function"]["name"], "write_file");
        assert_eq!(value["function"]["parameters"]["type"], "object");
        assert_eq!(value["function"]["parameters"]["additionalProperties"], false);
        assert_eq!(
            value["function"]["parameters"]["required"],
            json!(["path", "content"])
        );
        assert_eq!(
            value["function"]["parameters"]["properties"]["encoding"]["enum"],
            json!(["utf-8", "latin-1", "ascii", "binary"])
        );
    }

    #[test]
    fn test_time_tool_has_no_required_params() {
        let tool = get_time_tool();
        assert_eq!(tool.name(), GET_CURRENT_TIME);
        assert!(tool.function.parameters.required.is_empty());
    }
}
