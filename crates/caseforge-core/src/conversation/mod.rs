//! Conversation domain module.
//!
//! Recorded sessions as they come out of the analytical warehouse:
//! turns, retrieval chunks, and the source trait that hides the store.
//!
//! # Module Structure
//!
//! - `turn`: recorded messages (`ConversationTurn`, `TurnRole`)
//! - `chunk`: retrieval chunks (`ChunkRecord`, `ChunkMetadata`)
//! - `source`: warehouse access trait (`ConversationSource`) and its
//!   query/statistics types

mod chunk;
mod source;
mod turn;

// Re-export public API
pub use chunk::{ChunkMetadata, ChunkRecord};
pub use source::{ConversationSource, SessionStatistics, TurnQuery};
pub use turn::{ConversationTurn, TurnRole};
