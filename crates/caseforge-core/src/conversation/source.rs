//! Conversation source trait.
//!
//! Abstracts the analytical store that holds recorded conversation turns
//! and retrieval chunks. Production deployments back this with a data
//! warehouse; tests and demos use the seeded in-memory implementation
//! from the infrastructure crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::{ChunkRecord, ConversationTurn};
use crate::error::Result;

/// Filter for searching recorded turns.
///
/// All criteria are conjunctive; unset fields do not constrain the
/// search. Results are ordered newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnQuery {
    /// Case-insensitive substring match against turn content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Only turns produced by this model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Only turns recorded at or after this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Only turns recorded at or before this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Only turns rated at least this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<u8>,
    /// Only turns rated at most this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rating: Option<u8>,
    /// Number of matching turns to skip.
    #[serde(default)]
    pub offset: u64,
    /// Maximum number of turns to return; `None` means no cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Aggregate statistics for one session.
///
/// Cheap to compute on the warehouse side; the import preview uses this
/// instead of pulling full turn lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub session_id: String,
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    /// Mean of the ratings present on the session's turns.
    pub average_rating: Option<f64>,
    /// Distinct model ids, in first-seen order.
    pub models_used: Vec<String>,
    pub total_tokens: u64,
    pub total_processing_time_ms: u64,
    /// Text of the earliest turn.
    pub first_message: Option<String>,
    /// Text of the latest turn.
    pub last_message: Option<String>,
    pub first_message_time: Option<DateTime<Utc>>,
    pub last_message_time: Option<DateTime<Utc>>,
}

/// Read-only access to recorded conversations.
#[async_trait]
pub trait ConversationSource: Send + Sync {
    /// Fetches every turn of a session, ordered by timestamp.
    ///
    /// An unknown session id yields an empty vector, not an error;
    /// callers decide whether that is a failure.
    async fn session_turns(&self, session_id: &str) -> Result<Vec<ConversationTurn>>;

    /// Resolves chunk ids to chunk records.
    ///
    /// Ids that cannot be resolved are silently omitted, so the result
    /// may be shorter than the input.
    async fn chunks_by_ids(&self, chunk_ids: &[String]) -> Result<Vec<ChunkRecord>>;

    /// Computes aggregate statistics for one session.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the session is unknown.
    async fn session_statistics(&self, session_id: &str) -> Result<Option<SessionStatistics>>;

    /// Searches recorded turns.
    ///
    /// # Arguments
    ///
    /// * `query` - Conjunctive filter plus pagination window.
    ///
    /// # Returns
    ///
    /// Matching turns, newest first, honoring the query's
    /// offset and limit.
    async fn search_turns(&self, query: &TurnQuery) -> Result<Vec<ConversationTurn>>;

    /// Counts the turns matching a query, ignoring its pagination window.
    async fn count_turns(&self, query: &TurnQuery) -> Result<u64>;

    /// Lists the distinct model ids present in the store, sorted.
    async fn available_model_ids(&self) -> Result<Vec<String>>;

    /// Connection test. `false` means the store is unreachable.
    async fn healthy(&self) -> bool;
}
