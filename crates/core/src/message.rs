//! Message and Conversation domain types.
//!
//! A `Conversation` is the orchestrator's memory for one logical exchange:
//! an ordered sequence of turns, bounded by a configurable cap with the
//! oldest non-system turns dropped first. Insertion order is the only
//! ordering used to reconstruct context for the LLM.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user's natural-language question
    User,
    /// The model's response (text or tool requests)
    Assistant,
    /// System instructions (identity, rules, schema hints)
    System,
    /// A tool execution result fed back to the model
    Tool,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a tool result message answering a specific tool call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            timestamp: Utc::now(),
        }
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call (matches the provider's id)
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON string, exactly as the model produced them
    pub arguments: String,
}

/// An ordered, bounded sequence of messages for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Session this conversation belongs to
    pub id: SessionId,

    /// Ordered messages
    pub messages: Vec<Message>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(id: SessionId) -> Self {
        Self { id, ..Self::new() }
    }

    /// Add a message to the conversation.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Number of non-system turns currently held.
    pub fn turn_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role != Role::System)
            .count()
    }

    /// Drop the oldest non-system turns until at most `cap` remain.
    ///
    /// A leading system message is always preserved; everything else is
    /// evicted oldest-first. Called before each provider round-trip to
    /// bound the context size.
    pub fn truncate_to(&mut self, cap: usize) {
        let excess = self.turn_count().saturating_sub(cap);
        if excess == 0 {
            return;
        }
        let mut dropped = 0;
        self.messages.retain(|m| {
            if m.role != Role::System && dropped < excess {
                dropped += 1;
                false
            } else {
                true
            }
        });
        // A tool result whose issuing assistant turn was evicted goes
        // too: chat-completions endpoints reject a tool message with no
        // preceding assistant tool_calls turn.
        let mut call_seen = false;
        self.messages.retain(|m| match m.role {
            Role::System => true,
            Role::Tool if !call_seen => false,
            _ => {
                if !m.tool_calls.is_empty() {
                    call_seen = true;
                }
                true
            }
        });
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("How many orders shipped last week?");
        assert_eq!(msg.role, Role::User);
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn conversation_tracks_updates() {
        let mut conv = Conversation::new();
        let created = conv.created_at;
        conv.push(Message::user("first"));
        assert_eq!(conv.messages.len(), 1);
        assert!(conv.updated_at >= created);
    }

    #[test]
    fn truncate_keeps_system_and_newest() {
        let mut conv = Conversation::new();
        conv.push(Message::system("rules"));
        for i in 0..10 {
            conv.push(Message::user(format!("turn {i}")));
        }
        conv.truncate_to(4);

        assert_eq!(conv.turn_count(), 4);
        assert_eq!(conv.messages[0].role, Role::System);
        assert_eq!(conv.messages.last().unwrap().content, "turn 9");
        // Oldest turns were dropped first
        assert_eq!(conv.messages[1].content, "turn 6");
    }

    #[test]
    fn truncate_noop_under_cap() {
        let mut conv = Conversation::new();
        conv.push(Message::user("only one"));
        conv.truncate_to(10);
        assert_eq!(conv.messages.len(), 1);
    }

    #[test]
    fn truncate_drops_orphaned_tool_results() {
        let mut conv = Conversation::new();
        conv.push(Message::system("rules"));
        conv.push(Message::user("question"));
        let mut call = Message::assistant("");
        call.tool_calls = vec![MessageToolCall {
            id: "call_1".into(),
            name: "run_query".into(),
            arguments: "{}".into(),
        }];
        conv.push(call);
        conv.push(Message::tool_result("call_1", "one row"));
        conv.push(Message::assistant("There is one row."));
        conv.push(Message::user("And now?"));

        // The cut lands between the tool_calls turn and its result.
        conv.truncate_to(3);

        let first_turn = conv
            .messages
            .iter()
            .find(|m| m.role != Role::System)
            .unwrap();
        assert_ne!(first_turn.role, Role::Tool);
        assert!(conv.messages.iter().all(|m| m.role != Role::Tool));
    }

    #[test]
    fn message_serialization_round_trip() {
        let msg = Message::tool_result("call_1", "3 rows");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::Tool);
        assert_eq!(back.tool_call_id.as_deref(), Some("call_1"));
    }
}
