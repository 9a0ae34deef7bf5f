//! Tool call and result value objects.
//!
//! These are the values exchanged between the orchestrator and the tool
//! surface. The closed set of tool names and the dispatch logic live in
//! `datagate-tools`; this crate only defines the shapes that flow through
//! the agent loop.

use serde::{Deserialize, Serialize};

/// A request to execute a tool, decoded from the model's response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the provider's tool_call id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution, fed back to the model as a tool turn.
///
/// Tool failures are represented here as `success = false` with a
/// human-readable explanation in `output` — they are never raised into the
/// orchestration loop, so the model can react (e.g., retry with corrected
/// SQL) instead of the conversation crashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content sent back to the model
    pub output: String,
}

impl ToolResult {
    pub fn ok(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            output: output.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_keeps_explanation() {
        let result = ToolResult::failed("call_3", "Policy violation: forbidden keyword 'DROP'");
        assert!(!result.success);
        assert!(result.output.contains("DROP"));
        assert_eq!(result.call_id, "call_3");
    }
}
