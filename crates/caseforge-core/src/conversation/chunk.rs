//! Retrieval chunk types.

use serde::{Deserialize, Serialize};

/// Metadata describing a retrieval chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Publication date of the source document (ISO date string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    /// Date the content became effective.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    /// Date the content expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    /// Kind of content the chunk holds ("regulation", "faq", ...).
    #[serde(default = "default_chunk_type")]
    pub chunk_type: String,
    /// Source confidence in [0, 1].
    #[serde(default)]
    pub confidence: f64,
    /// 1-based position in the citing turn's chunk list. Assigned by the
    /// test case builder; `None` on records coming straight from the
    /// warehouse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_rank: Option<u32>,
}

fn default_chunk_type() -> String {
    "text".to_string()
}

impl Default for ChunkMetadata {
    fn default() -> Self {
        Self {
            publish_date: None,
            effective_date: None,
            expiration_date: None,
            chunk_type: default_chunk_type(),
            confidence: 0.0,
            retrieval_rank: None,
        }
    }
}

/// A retrieval chunk as stored in the analytical warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique chunk id.
    pub id: String,
    /// Document title, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Source location (URL or document path), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// The chunk text.
    pub content: String,
    /// Retrieval similarity score in [0, 1], when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}
