//! Provider trait — the abstraction over the LLM collaborator.
//!
//! A Provider sends a conversation plus tool schemas to an LLM and gets
//! back either a direct text answer or a structured request to invoke one
//! of the declared tools. Transport failures are reported as
//! `ProviderError` and are distinguishable from content-level refusals,
//! which arrive as ordinary assistant messages.

use crate::error::ProviderError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o", "meta-llama/Llama-3-8b")
    pub model: String,

    /// The conversation messages, in insertion order
    pub messages: Vec<Message>,

    /// Temperature (low values for consistent SQL generation)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools the model may request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.1
}

/// A tool definition sent to the LLM so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated assistant message (text and/or tool calls)
    pub message: Message,

    /// Token usage statistics, when the provider reports them
    pub usage: Option<Usage>,

    /// Which model actually responded
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The LLM collaborator contract.
///
/// The orchestrator calls `complete()` without knowing which backend is
/// configured. Implementations live in `datagate-providers`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai_compat").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_temperature_is_low() {
        assert!((default_temperature() - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn tool_definition_serializes_schema() {
        let tool = ToolDefinition {
            name: "run_query".into(),
            description: "Execute a read-only SQL query".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "sql": { "type": "string", "description": "A SELECT statement" }
                },
                "required": ["sql"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("run_query"));
        assert!(json.contains("SELECT"));
    }
}
