//! Message framing for newline-delimited JSON.

use crate::types::{McpError, McpResult};

/// Serialize a value to a JSON line (with trailing newline).
///
/// Compact serialization escapes any newline inside strings, so one message
/// is always exactly one line.
pub fn frame_message(value: &serde_json::Value) -> McpResult<String> {
    let mut json = serde_json::to_string(value).map_err(McpError::Json)?;
    json.push('\n');
    Ok(json)
}
