//! Session analyzer.
//!
//! Computes per-session aggregates from an ordered turn slice. The
//! analyzer is a pure function: no I/O, deterministic output, and no
//! mutation of its input.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::analysis::keywords::{contains_anaphora, match_topics, TOPIC_KEYWORDS};
use crate::conversation::ConversationTurn;
use crate::error::{CaseforgeError, Result};
use crate::test_case::Difficulty;

/// Aggregates derived from one session's turns.
///
/// Ephemeral: feeds test case construction and is never persisted on
/// its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    pub total_turns: usize,
    pub user_turns: usize,
    pub assistant_turns: usize,
    /// Wall-clock span between the first and last turn.
    pub duration_seconds: f64,
    /// Distinct model ids, in first-seen order.
    pub models_used: Vec<String>,
    /// Most frequent model id; ties resolved by first appearance.
    pub primary_model: Option<String>,
    /// Mean of the ratings present on the session's turns.
    pub avg_rating: Option<f64>,
    /// Detected topics, in keyword-table order. Never empty.
    pub topics: Vec<String>,
    /// Highest-priority detected topic.
    pub domain: String,
    pub complexity: Difficulty,
    /// Mean content length in characters, across all turns.
    pub avg_turn_length: f64,
    /// More than one user turn.
    pub multi_turn: bool,
    /// Some user turn refers back to earlier conversation.
    pub has_context_references: bool,
    /// Distinct chunk ids cited across all turns.
    pub referenced_chunk_count: usize,
}

/// Analyzes an ordered turn slice.
///
/// # Errors
///
/// `InvalidInput` when the slice is empty.
pub fn analyze_session(turns: &[ConversationTurn]) -> Result<SessionAnalysis> {
    if turns.is_empty() {
        return Err(CaseforgeError::invalid_input(
            "cannot analyze an empty turn list",
        ));
    }

    let total_turns = turns.len();
    let user_turns = turns.iter().filter(|t| t.is_user()).count();
    let assistant_turns = turns.iter().filter(|t| t.is_assistant()).count();

    let first = &turns[0];
    let last = &turns[turns.len() - 1];
    let duration_seconds = (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0;

    // Distinct models in first-seen order, then the mode. Iterating the
    // first-seen list makes ties resolve to the earliest model.
    let mut models_used: Vec<String> = Vec::new();
    let mut model_counts: HashMap<&str, usize> = HashMap::new();
    for turn in turns {
        if let Some(model) = &turn.model_id {
            if !models_used.contains(model) {
                models_used.push(model.clone());
            }
            *model_counts.entry(model.as_str()).or_insert(0) += 1;
        }
    }
    let mut primary_model: Option<String> = None;
    let mut primary_count = 0usize;
    for model in &models_used {
        let count = model_counts.get(model.as_str()).copied().unwrap_or(0);
        if count > primary_count {
            primary_count = count;
            primary_model = Some(model.clone());
        }
    }

    let ratings: Vec<f64> = turns
        .iter()
        .filter_map(|t| t.rating.map(f64::from))
        .collect();
    let avg_rating = if ratings.is_empty() {
        None
    } else {
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    };

    let user_text = turns
        .iter()
        .filter(|t| t.is_user())
        .map(|t| t.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let mut topics = match_topics(&user_text, TOPIC_KEYWORDS);
    if topics.is_empty() {
        topics.push("general".to_string());
    }
    let domain = TOPIC_KEYWORDS
        .iter()
        .map(|(label, _)| *label)
        .find(|label| topics.iter().any(|t| t == label))
        .map(str::to_string)
        .unwrap_or_else(|| topics[0].clone());

    let avg_turn_length = turns
        .iter()
        .map(|t| t.content.chars().count() as f64)
        .sum::<f64>()
        / total_turns as f64;

    let has_context_references = turns
        .iter()
        .filter(|t| t.is_user())
        .any(|t| contains_anaphora(&t.content));

    let complexity = score_complexity(avg_turn_length, total_turns, has_context_references);

    let referenced_chunk_count = turns
        .iter()
        .flat_map(|t| t.chunk_ids.iter())
        .collect::<HashSet<_>>()
        .len();

    Ok(SessionAnalysis {
        total_turns,
        user_turns,
        assistant_turns,
        duration_seconds,
        models_used,
        primary_model,
        avg_rating,
        topics,
        domain,
        complexity,
        avg_turn_length,
        multi_turn: user_turns > 1,
        has_context_references,
        referenced_chunk_count,
    })
}

/// Mean of three normalized factors: turn length (saturating at 200
/// chars), turn count (saturating at 10), and context references
/// (1.0 when present, 0.5 otherwise).
fn score_complexity(avg_turn_length: f64, total_turns: usize, has_references: bool) -> Difficulty {
    let length_factor = (avg_turn_length / 200.0).min(1.0);
    let count_factor = (total_turns as f64 / 10.0).min(1.0);
    let reference_factor = if has_references { 1.0 } else { 0.5 };
    let score = (length_factor + count_factor + reference_factor) / 3.0;

    if score >= 0.7 {
        Difficulty::Hard
    } else if score >= 0.4 {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}
