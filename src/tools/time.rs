use chrono::Local;
use serde::Deserialize;
use serde_json::Value;

use super::result::TimeReport;
use crate::error::{ToolError, ToolOutcome};

pub const GET_CURRENT_TIME: &str = "get_current_time";
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// strftime directives accepted in `time_format`
const VALID_DIRECTIVES: [char; 24] = [
    'a', 'A', 'w', 'd', 'b', 'B', 'm', 'y', 'Y', 'H', 'I', 'p', 'M', 'S', 'f', 'z', 'Z', 'j',
    'U', 'W', 'c', 'x', 'X', '%',
];

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TimeArgs {
    #[serde(default)]
    time_format: Option<String>,
}

/// Check that every `%` starts a known directive
pub fn validate_format(time_format: &str) -> ToolOutcome<()> {
    let mut chars = time_format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.next() {
            Some(d) if VALID_DIRECTIVES.contains(&d) => {}
            Some(d) => {
                return Err(ToolError::invalid_input(format!(
                    "Invalid datetime format: unsupported directive '%{}'",
                    d
                )))
            }
            None => {
                return Err(ToolError::invalid_input(
                    "Invalid datetime format: incomplete directive at end",
                ))
            }
        }
    }
    Ok(())
}

/// chrono's `%f` is nanoseconds; strftime's is microseconds
fn to_chrono_format(time_format: &str) -> String {
    let mut out = String::with_capacity(time_format.len() + 2);
    let mut chars = time_format.chars();
    while let Some(c) = chars.next() {
        out.push(c);
        if c != '%' {
            continue;
        }
        match chars.next() {
            Some('f') => out.push_str("6f"),
            Some(d) => out.push(d),
            None => {}
        }
    }
    out
}

/// Current local time in the given strftime format
pub fn current_time(time_format: Option<&str>) -> ToolOutcome<TimeReport> {
    let format = time_format.unwrap_or(DEFAULT_TIME_FORMAT);
    validate_format(format)?;

    Ok(TimeReport {
        time: Local::now().format(&to_chrono_format(format)).to_string(),
        format: format.to_string(),
    })
}

/// Entry point for `get_current_time` tool calls
pub fn run_time_tool(arguments: &Value) -> ToolOutcome<TimeReport> {
    let args: TimeArgs = if arguments.is_null() {
        TimeArgs { time_format: None }
    } else {
        serde_json::from_value(arguments.clone()).map_err(|e| {
            ToolError::invalid_input(format!("Invalid arguments for {}: {}", GET_CURRENT_TIME, e))
        })?
    };
    current_time(args.time_format.as_deref())
}
