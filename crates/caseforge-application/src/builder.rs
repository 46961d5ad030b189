//! Assembles a persisted-ready test case draft from the raw turns of a
//! recorded conversation session.
//!
//! The builder is pure: it reads turns and resolved chunk records, runs the
//! session analysis and context reconstruction, and produces a
//! `TestCaseDraft`. Fetching turns and writing the draft belong to the
//! import use case.

use std::collections::HashMap;

use caseforge_core::analysis::{SessionAnalysis, analyze_session, reconstruct_context, truncate_chars};
use caseforge_core::conversation::{ChunkRecord, ConversationTurn, TurnRole};
use caseforge_core::import::ImportConfig;
use caseforge_core::test_case::{
    ActualExecution, CaseAnalysis, CaseExecution, CaseInput, CurrentQuery, DialogueRecord,
    Difficulty, FeedbackCategory, ModelParams, ModelSettings, PerformanceMetrics, PromptSettings,
    QualityScores, RetrievalQuality, RetrievalSettings, RetrievedChunk, Tag, TestCaseDraft,
    TestConfig, UserFeedback,
};
use caseforge_core::{CaseforgeError, Result};
use chrono::Utc;

/// Fallback model when the session never recorded one.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Response time assumed when the answering turn carries no timing data.
const DEFAULT_RESPONSE_TIME_SECS: f64 = 2.0;

/// Portion of the response time attributed to retrieval.
const RETRIEVAL_TIME_SECS: f64 = 0.3;

/// Token usage assumed when the answering turn carries no token count.
const DEFAULT_TOKENS_USED: u32 = 300;

/// Builds test case drafts from conversation sessions.
///
/// One builder is created per import task and carries the task's
/// [`ImportConfig`] (owner, default priority, tag and analysis switches).
pub struct TestCaseBuilder {
    config: ImportConfig,
}

impl TestCaseBuilder {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Converts one session into a draft.
    ///
    /// `chunks` maps chunk id to its resolved record; ids cited by the
    /// session but absent from the map are dropped from the draft input.
    ///
    /// # Errors
    ///
    /// Returns [`CaseforgeError::EmptySession`] when the session has no user
    /// turns and [`CaseforgeError::NoAssistantResponse`] when it has no
    /// assistant turns. Both mean the session cannot yield a usable case.
    pub fn build(
        &self,
        session_id: &str,
        turns: &[ConversationTurn],
        chunks: &HashMap<String, ChunkRecord>,
    ) -> Result<TestCaseDraft> {
        let last_user = turns
            .iter()
            .rev()
            .find(|t| t.is_user())
            .ok_or_else(|| CaseforgeError::empty_session(session_id))?;
        let last_assistant = turns
            .iter()
            .rev()
            .find(|t| t.is_assistant())
            .ok_or_else(|| CaseforgeError::no_assistant_response(session_id))?;

        let analysis = analyze_session(turns)?;

        let current_query = CurrentQuery {
            text: last_user.content.clone(),
            timestamp: last_user.timestamp,
        };
        let conversation_history = extract_dialogue(turns);
        let current_chunks = resolve_chunks(&last_user.chunk_ids, chunks);

        let execution = build_execution(last_assistant);
        let name = build_name(turns, &analysis);
        let description = build_description(&analysis);
        let tags = if self.config.auto_generate_tags {
            build_tags(&analysis)
        } else {
            Vec::new()
        };
        let case_analysis = if self.config.include_analysis {
            Some(self.build_analysis(
                session_id,
                &analysis,
                &current_query.text,
                &current_chunks,
            ))
        } else {
            None
        };

        Ok(TestCaseDraft {
            name,
            description,
            owner: self.config.default_owner.clone(),
            priority: self.config.default_priority,
            domain: analysis.domain.clone(),
            difficulty: self.config.default_difficulty,
            tags,
            source_session: session_id.to_string(),
            test_config: build_test_config(&analysis),
            input: CaseInput {
                current_query,
                conversation_history,
                current_chunks,
            },
            execution,
            analysis: case_analysis,
        })
    }

    fn build_analysis(
        &self,
        session_id: &str,
        analysis: &SessionAnalysis,
        query: &str,
        current_chunks: &[RetrievedChunk],
    ) -> CaseAnalysis {
        let avg = analysis.avg_rating.unwrap_or(3.0);
        let has_chunks = !current_chunks.is_empty();

        let issue_type = if avg >= 4.0 {
            "good_example"
        } else if avg >= 3.0 {
            "minor_improvement"
        } else if analysis.has_context_references {
            "context_understanding"
        } else {
            "answer_quality"
        };

        let root_cause = if !has_chunks {
            "no retrieved content was available to ground the answer"
        } else if analysis.complexity == Difficulty::Hard {
            "the question requires deeper domain reasoning than the current setup provides"
        } else if analysis.has_context_references {
            "the conversation relies on context tracking across turns"
        } else {
            "answer quality does not fully meet user expectations"
        };

        let mut criteria = vec![
            "1. The answer is accurate and relevant to the question".to_string(),
            "2. The answer is grounded in the retrieved documents".to_string(),
        ];
        if analysis.has_context_references {
            criteria.push("3. Earlier conversation references are resolved correctly".to_string());
        }
        if analysis.complexity == Difficulty::Hard {
            criteria.push("4. Key aspects of the topic are covered in depth".to_string());
        }
        criteria.push("5. The wording is clear and easy to follow".to_string());

        let clamp = |v: f64| v.clamp(1.0, 5.0);
        let quality_scores = QualityScores {
            context_understanding: if analysis.has_context_references { 4.0 } else { 3.0 },
            answer_accuracy: clamp(avg),
            answer_completeness: clamp(avg * 0.9),
            clarity: clamp(avg * 1.1),
            citation_quality: if has_chunks { 4.0 } else { 2.0 },
        };

        let mut suggestions = Vec::new();
        if avg < 3.0 {
            suggestions.push("improve answer accuracy and relevance".to_string());
        }
        if analysis.has_context_references {
            suggestions.push("strengthen multi-turn context tracking".to_string());
        }
        if !has_chunks {
            suggestions.push("review retrieval coverage for this domain".to_string());
        }
        if analysis.complexity == Difficulty::Hard {
            suggestions.push("add domain-specific knowledge sources".to_string());
        }
        if suggestions.is_empty() {
            suggestions.push("maintain the current quality level".to_string());
        }

        CaseAnalysis {
            issue_type: issue_type.to_string(),
            root_cause: root_cause.to_string(),
            expected_answer: format!(
                "An accurate, well-sourced answer to \"{}\"",
                truncate_chars(query, 50)
            ),
            acceptance_criteria: criteria.join("\n"),
            quality_scores,
            optimization_suggestions: suggestions,
            notes: format!("Automatically generated from session {session_id}"),
            analyzed_by: self.config.default_owner.clone(),
            analysis_date: Utc::now(),
        }
    }
}

/// Pairs user queries with the assistant responses that answer them.
///
/// A user turn opens a pending record; the next assistant turn closes it.
/// A user turn arriving while another is still open replaces it, and an
/// assistant turn with no open record is dropped. Context reconstruction
/// runs on each query against the records closed so far, so later turns
/// never influence earlier ones.
fn extract_dialogue(turns: &[ConversationTurn]) -> Vec<DialogueRecord> {
    let mut records: Vec<DialogueRecord> = Vec::new();
    let mut open: Option<DialogueRecord> = None;

    for turn in turns {
        match turn.role {
            TurnRole::User => {
                let turn_number = (records.len() + 1) as u32;
                let query = reconstruct_context(&turn.content, &records, turn_number as usize);
                open = Some(DialogueRecord {
                    turn: turn_number,
                    role: TurnRole::User,
                    query: Some(query),
                    response: None,
                    chunk_ids: turn.chunk_ids.clone(),
                    timestamp: turn.timestamp,
                });
            }
            TurnRole::Assistant => {
                if let Some(mut record) = open.take() {
                    record.role = TurnRole::Assistant;
                    record.response = Some(turn.content.clone());
                    record.chunk_ids = turn.chunk_ids.clone();
                    record.timestamp = turn.timestamp;
                    records.push(record);
                }
            }
            TurnRole::System => {}
        }
    }
    if let Some(record) = open {
        records.push(record);
    }
    records
}

/// Resolves the cited chunk ids of the final query against fetched records.
///
/// Ranks follow the citation order, so a dropped id leaves a gap rather
/// than renumbering the rest.
fn resolve_chunks(
    chunk_ids: &[String],
    chunks: &HashMap<String, ChunkRecord>,
) -> Vec<RetrievedChunk> {
    let mut resolved = Vec::new();
    for (position, id) in chunk_ids.iter().enumerate() {
        let Some(record) = chunks.get(id) else {
            continue;
        };
        let mut metadata = record.metadata.clone();
        metadata.confidence = record.similarity.unwrap_or(0.8);
        metadata.retrieval_rank = Some((position + 1) as u32);
        resolved.push(RetrievedChunk {
            id: record.id.clone(),
            title: record
                .title
                .clone()
                .unwrap_or_else(|| content_preview(&record.content)),
            source: record
                .source
                .clone()
                .unwrap_or_else(|| "unknown source".to_string()),
            content: record.content.clone(),
            metadata,
        });
    }
    resolved
}

/// Collapses whitespace and trims the text to a title-sized preview,
/// preferring to end on sentence punctuation when any falls past the
/// midpoint of the window.
fn content_preview(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= 100 {
        return collapsed;
    }
    let window: String = collapsed.chars().take(100).collect();
    match window.rfind(['.', '!', '?']) {
        Some(pos) if pos >= 50 => window[..=pos].to_string(),
        _ => format!("{window}..."),
    }
}

fn build_execution(last_assistant: &ConversationTurn) -> CaseExecution {
    let total_response_time = last_assistant
        .processing_time_ms
        .map(|ms| ms as f64 / 1000.0)
        .unwrap_or(DEFAULT_RESPONSE_TIME_SECS);
    let performance = PerformanceMetrics {
        total_response_time,
        retrieval_time: RETRIEVAL_TIME_SECS,
        generation_time: total_response_time - RETRIEVAL_TIME_SECS,
        tokens_used: last_assistant.token_count.unwrap_or(DEFAULT_TOKENS_USED),
        chunks_considered: last_assistant.chunk_ids.len(),
    };
    let retrieval_quality = if last_assistant.chunk_ids.is_empty() {
        None
    } else {
        Some(RetrievalQuality {
            max_similarity: 0.85,
            avg_similarity: 0.75,
            diversity_score: 0.65,
        })
    };
    let user_feedback = last_assistant.rating.map(|rating| {
        let category = if rating >= 4 {
            FeedbackCategory::Positive
        } else if rating == 3 {
            FeedbackCategory::Neutral
        } else {
            FeedbackCategory::Negative
        };
        UserFeedback {
            rating,
            category,
            comment: last_assistant.feedback_text.clone().unwrap_or_default(),
            feedback_date: last_assistant.timestamp,
        }
    });

    CaseExecution {
        actual: ActualExecution {
            response: last_assistant.content.clone(),
            performance,
            retrieval_quality,
        },
        user_feedback,
    }
}

fn build_name(turns: &[ConversationTurn], analysis: &SessionAnalysis) -> String {
    let first_user = turns.iter().find(|t| t.is_user());
    match first_user {
        Some(turn) if !turn.content.trim().is_empty() => truncate_chars(turn.content.trim(), 50),
        _ => {
            let topics = analysis
                .topics
                .iter()
                .take(2)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} conversation test - {topics}", analysis.domain)
        }
    }
}

fn build_description(analysis: &SessionAnalysis) -> String {
    let mut parts = vec![format!(
        "conversation with {} messages",
        analysis.total_turns
    )];
    if let Some(model) = &analysis.primary_model {
        parts.push(format!("primary model: {model}"));
    }
    if let Some(avg) = analysis.avg_rating {
        parts.push(format!("average rating: {avg:.1}/5"));
    }
    if analysis.multi_turn {
        parts.push("multi-turn conversation".to_string());
    }
    if analysis.has_context_references {
        parts.push("contains context references".to_string());
    }
    parts.push(format!("topics: {}", analysis.topics.join(", ")));
    parts.join("; ")
}

fn build_tags(analysis: &SessionAnalysis) -> Vec<Tag> {
    let mut tags = Vec::new();
    if analysis.multi_turn {
        tags.push(Tag::new("multi-turn", "blue"));
    }
    if analysis.has_context_references {
        tags.push(Tag::new("context-understanding", "orange"));
    }
    if let Some(avg) = analysis.avg_rating {
        if avg >= 4.0 {
            tags.push(Tag::new("high-quality", "green"));
        } else if avg <= 2.0 {
            tags.push(Tag::new("needs-improvement", "red"));
        }
    }
    let (tier, color) = match analysis.complexity {
        Difficulty::Easy => ("easy", "green"),
        Difficulty::Medium => ("medium", "orange"),
        Difficulty::Hard => ("hard", "red"),
    };
    tags.push(Tag::new(format!("complexity:{tier}"), color));
    let domain_color = match analysis.domain.as_str() {
        "finance" => "gold",
        "technology" => "blue",
        "healthcare" => "green",
        "education" => "purple",
        _ => "default",
    };
    tags.push(Tag::new(analysis.domain.clone(), domain_color));
    tags
}

fn build_test_config(analysis: &SessionAnalysis) -> TestConfig {
    TestConfig {
        model: ModelSettings {
            name: analysis
                .primary_model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            version: "latest".to_string(),
            params: ModelParams::default(),
        },
        prompts: PromptSettings {
            system: "You are a helpful AI assistant. Answer the user's question based on the \
                     provided document context."
                .to_string(),
            user_instruction: "Use the retrieved document fragments to answer the current query. \
                               Keep the answer accurate, relevant and helpful."
                .to_string(),
        },
        retrieval: RetrievalSettings::default(),
    }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
