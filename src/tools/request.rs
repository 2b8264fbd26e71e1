//! Typed tool requests
//!
//! Tool calls arrive as untyped JSON chosen by a model. [`ToolRequest::parse`]
//! turns them into a validated request or rejects them with `InvalidInput`
//! before any filesystem access happens.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::encoding::Encoding;
use crate::error::{ToolError, ToolOutcome};

pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";
pub const FILE_EXISTS: &str = "file_exists";
pub const FILE_STAT: &str = "file_stat";

/// How read content is returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// Whole window as one string
    #[default]
    #[serde(alias = "read_all")]
    All,
    /// Window split into lines, terminators kept
    #[serde(alias = "read_lines")]
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    #[default]
    #[serde(alias = "write")]
    Overwrite,
    Append,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadOptions {
    /// Falls back to the gateway default when unset
    pub encoding: Option<Encoding>,
    pub offset: Option<u64>,
    pub length: Option<u64>,
    pub mode: ReadMode,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteOptions {
    pub content: String,
    pub encoding: Option<Encoding>,
    pub mode: WriteMode,
    pub create_dirs: bool,
}

impl WriteOptions {
    pub fn overwrite(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn append(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            mode: WriteMode::Append,
            ..Default::default()
        }
    }

    pub fn with_create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Read(ReadOptions),
    Write(WriteOptions),
    Exists,
    Stat,
}

/// A validated file tool invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    /// Caller-supplied and untrusted until resolved
    pub path: String,
    pub operation: Operation,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ReadArgs {
    path: String,
    #[serde(default)]
    encoding: Option<Encoding>,
    #[serde(default)]
    offset: Option<u64>,
    #[serde(default, alias = "num_bytes")]
    length: Option<u64>,
    #[serde(default)]
    mode: Option<ReadMode>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WriteArgs {
    path: String,
    content: String,
    #[serde(default)]
    encoding: Option<Encoding>,
    #[serde(default)]
    mode: Option<WriteMode>,
    #[serde(default)]
    create_dirs: Option<bool>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PathArgs {
    path: String,
}

impl ToolRequest {
    pub fn read(path: impl Into<String>, options: ReadOptions) -> Self {
        Self {
            path: path.into(),
            operation: Operation::Read(options),
        }
    }

    pub fn write(path: impl Into<String>, options: WriteOptions) -> Self {
        Self {
            path: path.into(),
            operation: Operation::Write(options),
        }
    }

    pub fn exists(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operation: Operation::Exists,
        }
    }

    pub fn stat(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operation: Operation::Stat,
        }
    }

    /// Whether `name` is one of the file tools this type can represent
    pub fn handles(name: &str) -> bool {
        matches!(name, READ_FILE | WRITE_FILE | FILE_EXISTS | FILE_STAT)
    }

    pub fn tool_name(&self) -> &'static str {
        match self.operation {
            Operation::Read(_) => READ_FILE,
            Operation::Write(_) => WRITE_FILE,
            Operation::Exists => FILE_EXISTS,
            Operation::Stat => FILE_STAT,
        }
    }

    /// Parse and validate the JSON arguments of a file tool call
    pub fn parse(tool_name: &str, arguments: &Value) -> ToolOutcome<Self> {
        if !arguments.is_object() {
            return Err(ToolError::invalid_input(format!(
                "Arguments for {} must be a JSON object",
                tool_name
            )));
        }

        let request = match tool_name {
            READ_FILE => {
                let args: ReadArgs = decode_args(tool_name, arguments)?;
                Self::read(
                    args.path,
                    ReadOptions {
                        encoding: args.encoding,
                        offset: args.offset,
                        length: args.length,
                        mode: args.mode.unwrap_or_default(),
                    },
                )
            }
            WRITE_FILE => {
                let args: WriteArgs = decode_args(tool_name, arguments)?;
                Self::write(
                    args.path,
                    WriteOptions {
                        content: args.content,
                        encoding: args.encoding,
                        mode: args.mode.unwrap_or_default(),
                        create_dirs: args.create_dirs.unwrap_or(false),
                    },
                )
            }
            FILE_EXISTS => Self::exists(decode_args::<PathArgs>(tool_name, arguments)?.path),
            FILE_STAT => Self::stat(decode_args::<PathArgs>(tool_name, arguments)?.path),
            other => {
                return Err(ToolError::invalid_input(format!("Unknown file tool: {}", other)))
            }
        };

        request.validate()?;
        Ok(request)
    }

    /// Reject contradictory combinations that serde alone cannot catch
    pub fn validate(&self) -> ToolOutcome<()> {
        if self.path.trim().is_empty() {
            return Err(ToolError::invalid_input("Path must not be empty"));
        }

        if let Operation::Read(options) = &self.operation {
            if options.mode == ReadMode::Lines && options.encoding == Some(Encoding::Binary) {
                return Err(ToolError::invalid_input(
                    "mode 'lines' cannot be combined with binary encoding",
                ));
            }
            if let (Some(offset), Some(length)) = (options.offset, options.length) {
                if offset.checked_add(length).is_none() {
                    return Err(ToolError::invalid_input("offset + length overflows"));
                }
            }
        }

        Ok(())
    }
}

fn decode_args<T: DeserializeOwned>(tool_name: &str, arguments: &Value) -> ToolOutcome<T> {
    serde_json::from_value(arguments.clone()).map_err(|e| {
        ToolError::invalid_input(format!("Invalid arguments for {}: {}", tool_name, e))
    })
}
