//! Session analysis module.
//!
//! Everything here is pure computation over already-fetched data.
//!
//! # Module Structure
//!
//! - `keywords`: data-driven topic/anaphora/entity pattern tables
//! - `analyzer`: per-session aggregates (`SessionAnalysis`)
//! - `context`: anaphoric query reconstruction

mod analyzer;
mod context;
mod keywords;

// Re-export public API
pub use analyzer::{analyze_session, SessionAnalysis};
pub use context::{reconstruct_context, truncate_chars};
pub use keywords::{contains_anaphora, match_topics, RESPONSE_TOPIC_KEYWORDS, TOPIC_KEYWORDS};
