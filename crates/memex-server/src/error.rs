//! Bridges `ToolError` to the MCP `{content, is_error}` envelope (SPEC_FULL
//! §6.3/§7), mirroring the teacher's `ServerError -> IntoResponse` bridge but
//! targeting an RPC content block instead of an HTTP status code.
use memex_core::error::Classify;
use memex_tools::ToolError;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::json;

pub fn ok_result<T: Serialize>(value: &T) -> CallToolResult {
    let text = serde_json::to_string(value)
        .unwrap_or_else(|e| json!({"error": format!("response serialization failed: {e}")}).to_string());
    CallToolResult::success(vec![Content::text(text)])
}

pub fn err_result(err: ToolError) -> CallToolResult {
    let field = match &err {
        ToolError::InvalidArgument { field, .. } => Some(field.clone()),
        _ => None,
    };
    let body = json!({
        "kind": format!("{:?}", err.kind()),
        "message": err.to_string(),
        "field": field,
    });
    CallToolResult::error(vec![Content::text(body.to_string())])
}

pub fn to_call_tool_result<T: Serialize>(result: Result<T, ToolError>) -> CallToolResult {
    match result {
        Ok(value) => ok_result(&value),
        Err(err) => err_result(err),
    }
}
