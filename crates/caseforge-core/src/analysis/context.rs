//! Context reconstructor.
//!
//! Queries that lean on earlier conversation ("what about the second
//! one?") are useless as standalone test inputs. The reconstructor
//! prefixes such a query with a bracketed description synthesized from
//! the two most recent history records, leaving the original text
//! intact after a blank line.

use crate::analysis::keywords::{
    contains_anaphora, match_topics, CAPITALIZED_STOPWORDS, ENTITY_PATTERNS,
    RESPONSE_TOPIC_KEYWORDS,
};
use crate::test_case::DialogueRecord;

/// Maximum entities carried into a context description.
const MAX_ENTITIES: usize = 5;
/// Maximum topics carried into a context description.
const MAX_TOPICS: usize = 3;

/// Rewrites a user query so it stands alone.
///
/// Returns the query unchanged when it carries no anaphoric marker,
/// when it is one of the first two records (`turn_index <= 2`), or when
/// fewer than two history records exist. Otherwise the result is
/// `"[context: <description>]\n\n<original query>"`.
pub fn reconstruct_context(query: &str, history: &[DialogueRecord], turn_index: usize) -> String {
    if turn_index <= 2 || history.len() < 2 || !contains_anaphora(query) {
        return query.to_string();
    }

    let recent = &history[history.len() - 2..];

    let mut entities: Vec<String> = Vec::new();
    for record in recent {
        if let Some(prior_query) = &record.query {
            for entity in extract_entities(prior_query) {
                if !entities.contains(&entity) {
                    entities.push(entity);
                }
            }
        }
    }
    entities.truncate(MAX_ENTITIES);

    let mut topics: Vec<String> = Vec::new();
    for record in recent {
        if let Some(response) = &record.response {
            for topic in match_topics(response, RESPONSE_TOPIC_KEYWORDS) {
                if !topics.contains(&topic) {
                    topics.push(topic);
                }
            }
        }
    }
    topics.truncate(MAX_TOPICS);

    let mut parts: Vec<String> = Vec::new();
    if let Some(last_question) = recent.last().and_then(|r| r.query.as_deref()) {
        parts.push(format!(
            "previous question: {}",
            truncate_chars(last_question, 50)
        ));
    }
    if !topics.is_empty() {
        parts.push(format!("discussed topics: {}", topics.join(", ")));
    }
    if !entities.is_empty() {
        parts.push(format!("mentioned: {}", entities.join(", ")));
    }

    let description = if parts.is_empty() {
        "earlier conversation content".to_string()
    } else {
        parts.join("; ")
    };

    format!("[context: {description}]\n\n{query}")
}

/// Pulls candidate entities out of a prior query, in pattern order.
fn extract_entities(text: &str) -> Vec<String> {
    let mut entities = Vec::new();
    for pattern in ENTITY_PATTERNS.iter() {
        for captures in pattern.captures_iter(text) {
            if let Some(group) = captures.get(1) {
                let candidate = group.as_str().trim();
                if candidate.is_empty() || CAPITALIZED_STOPWORDS.contains(&candidate) {
                    continue;
                }
                entities.push(candidate.to_string());
            }
        }
    }
    entities
}

/// Cuts a string to `max` characters, appending `"..."` when anything
/// was removed. Counts characters, not bytes.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}
