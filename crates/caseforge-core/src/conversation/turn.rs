//! Conversation turn types.
//!
//! A turn is one recorded message inside a conversation session, as stored
//! in the analytical warehouse. Turns are immutable once retrieved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents the role of a recorded turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System-generated message.
    System,
}

/// A single recorded message in a conversation session.
///
/// Assistant turns may carry a model id, a 1-5 user rating, token and
/// latency accounting, and the ids of the retrieval chunks they cited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Session the turn belongs to.
    pub session_id: String,
    /// Unique message id within the warehouse.
    pub message_id: String,
    /// Who produced the turn.
    pub role: TurnRole,
    /// The message text.
    pub content: String,
    /// Model that produced an assistant turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
    /// User rating attached to an assistant turn (1-5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// Tokens consumed producing the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,
    /// End-to-end processing time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    /// Ids of the retrieval chunks the turn cited, in retrieval order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunk_ids: Vec<String>,
    /// Free-text feedback the user left on the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_text: Option<String>,
}

impl ConversationTurn {
    /// Creates a user turn. Optional fields start empty.
    pub fn user(
        session_id: impl Into<String>,
        message_id: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            message_id: message_id.into(),
            role: TurnRole::User,
            content: content.into(),
            model_id: None,
            timestamp,
            rating: None,
            token_count: None,
            processing_time_ms: None,
            chunk_ids: Vec::new(),
            feedback_text: None,
        }
    }

    /// Creates an assistant turn. Optional fields start empty.
    pub fn assistant(
        session_id: impl Into<String>,
        message_id: impl Into<String>,
        content: impl Into<String>,
        model_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            message_id: message_id.into(),
            role: TurnRole::Assistant,
            content: content.into(),
            model_id: Some(model_id.into()),
            timestamp,
            rating: None,
            token_count: None,
            processing_time_ms: None,
            chunk_ids: Vec::new(),
            feedback_text: None,
        }
    }

    /// True for turns produced by the user.
    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }

    /// True for turns produced by the assistant.
    pub fn is_assistant(&self) -> bool {
        self.role == TurnRole::Assistant
    }
}
