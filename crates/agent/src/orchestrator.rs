//! The bounded model↔tool conversation loop.

use crate::prompt;
use datagate_core::error::{Error, OrchestrationError};
use datagate_core::message::{Conversation, Message, Role};
use datagate_core::provider::{Provider, ProviderRequest};
use datagate_core::tool::ToolCall;
use datagate_core::Result;
use datagate_tools::ToolSurface;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Terminal state of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The model produced a final textual answer.
    Answer(String),

    /// The turn budget ran out before a final answer. Carries the model's
    /// last textual output as a best-effort partial result; this is a soft
    /// failure, not an error.
    BudgetExhausted { partial: String },
}

impl Outcome {
    /// The user-visible text regardless of how the exchange ended.
    pub fn text(&self) -> &str {
        match self {
            Outcome::Answer(text) => text,
            Outcome::BudgetExhausted { partial } => partial,
        }
    }
}

/// Drives the conversation loop for one exchange at a time.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolSurface>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_turns: u32,
    memory_turn_cap: usize,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolSurface>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: Option<u32>,
        max_turns: u32,
        memory_turn_cap: usize,
    ) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature,
            max_tokens,
            max_turns: max_turns.max(1),
            memory_turn_cap: memory_turn_cap.max(1),
        }
    }

    /// Run the exchange to a terminal state.
    ///
    /// Tool invocations are strictly sequential: a second tool call is
    /// never issued before the first result is observed, because later
    /// model decisions depend on earlier tool outputs. Hard failures
    /// (provider exhaustion, unknown tools, policy violations) unwind the
    /// loop; the conversation keeps whatever turns were appended so far.
    pub async fn run(&self, conversation: &mut Conversation, subject: &str) -> Result<Outcome> {
        info!(
            conversation_id = %conversation.id,
            %subject,
            turns = conversation.turn_count(),
            "Starting exchange"
        );

        if conversation
            .messages
            .first()
            .is_none_or(|m| m.role != Role::System)
        {
            conversation
                .messages
                .insert(0, Message::system(prompt::SYSTEM_PROMPT));
        }

        let tool_definitions = self.tools.definitions();

        for turn in 1..=self.max_turns {
            conversation.truncate_to(self.memory_turn_cap);

            debug!(conversation_id = %conversation.id, turn, "Model round-trip");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: conversation.messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = self.provider.complete(request).await.map_err(|e| {
                warn!(conversation_id = %conversation.id, error = %e, "Provider exhausted");
                Error::Orchestration(OrchestrationError::RetriesExhausted {
                    attempts: turn,
                    last_error: e.to_string(),
                })
            })?;

            if response.message.tool_calls.is_empty() {
                let answer = response.message.content.clone();
                if answer.trim().is_empty() {
                    warn!(conversation_id = %conversation.id, turn, "Empty assistant turn");
                    return Err(Error::Orchestration(OrchestrationError::MalformedResponse(
                        "assistant turn carried neither text nor tool calls".into(),
                    )));
                }
                conversation.push(response.message);
                info!(conversation_id = %conversation.id, turn, "Exchange answered");
                return Ok(Outcome::Answer(answer));
            }

            let tool_calls = response.message.tool_calls.clone();
            conversation.push(response.message);

            for tc in &tool_calls {
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: serde_json::from_str(&tc.arguments)
                        .unwrap_or(serde_json::Value::Null),
                };

                let result = self.tools.dispatch(&call, subject).await?;
                debug!(
                    conversation_id = %conversation.id,
                    tool = %tc.name,
                    success = result.success,
                    "Tool result"
                );
                conversation.push(Message::tool_result(&tc.id, &result.output));
            }
        }

        warn!(
            conversation_id = %conversation.id,
            max_turns = self.max_turns,
            "Turn budget exhausted"
        );

        let partial = conversation
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && !m.content.is_empty())
            .map(|m| m.content.clone())
            .unwrap_or_else(|| {
                "The question could not be answered within the allotted number of steps.".into()
            });

        Ok(Outcome::BudgetExhausted { partial })
    }
}
