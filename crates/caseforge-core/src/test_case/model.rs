//! Test case domain model.
//!
//! A test case captures one recorded conversation as a reproducible
//! evaluation scenario: the configuration the assistant ran with, the
//! conversation input, the observed execution, and optional analyst
//! annotations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::{ChunkMetadata, TurnRole};

/// Lifecycle status of a persisted test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Review priority of a test case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Difficulty tier, shared by test cases and session complexity scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// A colored label attached to a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    /// Display color ("blue", "gold", ... or "default").
    pub color: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

// ============================================================================
// Test configuration
// ============================================================================

/// Generation parameters the assistant ran with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 512,
            top_p: 0.9,
        }
    }
}

/// Model under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub name: String,
    pub version: String,
    pub params: ModelParams,
}

/// Prompts the assistant ran with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSettings {
    pub system: String,
    pub user_instruction: String,
}

/// Retrieval pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub top_k: u32,
    pub similarity_threshold: f64,
    pub reranker_enabled: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 0.7,
            reranker_enabled: true,
        }
    }
}

/// Complete configuration block of a test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    pub model: ModelSettings,
    pub prompts: PromptSettings,
    pub retrieval: RetrievalSettings,
}

// ============================================================================
// Test input
// ============================================================================

/// The query the test case replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentQuery {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// One grouped record of the conversation leading up to the current
/// query.
///
/// A completed exchange carries both `query` and `response` under the
/// `Assistant` role; a trailing unanswered question carries only `query`
/// under the `User` role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRecord {
    /// 1-based position in the grouped history.
    pub turn: u32,
    pub role: TurnRole,
    /// The user's question, after context reconstruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// The assistant's answer, when the exchange completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Chunk ids the answering turn cited.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunk_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// A chunk resolved for the current query, with display fallbacks
/// applied and its retrieval rank assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub title: String,
    pub source: String,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// Input block of a test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseInput {
    pub current_query: CurrentQuery,
    pub conversation_history: Vec<DialogueRecord>,
    pub current_chunks: Vec<RetrievedChunk>,
}

// ============================================================================
// Execution record
// ============================================================================

/// Latency and token accounting of the recorded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// End-to-end response time in seconds.
    pub total_response_time: f64,
    /// Retrieval stage time in seconds.
    pub retrieval_time: f64,
    /// Generation stage time in seconds.
    pub generation_time: f64,
    pub tokens_used: u32,
    pub chunks_considered: usize,
}

/// Similarity profile of the retrieval that backed the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalQuality {
    pub max_similarity: f64,
    pub avg_similarity: f64,
    pub diversity_score: f64,
}

/// What the assistant actually produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualExecution {
    pub response: String,
    pub performance: PerformanceMetrics,
    /// Present only when the answering turn cited chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_quality: Option<RetrievalQuality>,
}

/// Sentiment bucket derived from a 1-5 rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackCategory {
    Positive,
    Neutral,
    Negative,
}

/// The user's reaction to the recorded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeedback {
    pub rating: u8,
    pub category: FeedbackCategory,
    pub comment: String,
    pub feedback_date: DateTime<Utc>,
}

/// Execution block of a test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseExecution {
    pub actual: ActualExecution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<UserFeedback>,
}

// ============================================================================
// Analyst annotations
// ============================================================================

/// Heuristic quality scores on a 1-5 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub context_understanding: f64,
    pub answer_accuracy: f64,
    pub answer_completeness: f64,
    pub clarity: f64,
    pub citation_quality: f64,
}

/// Optional analysis block generated at import time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseAnalysis {
    /// Coarse classification ("good_example", "answer_quality", ...).
    pub issue_type: String,
    pub root_cause: String,
    pub expected_answer: String,
    pub acceptance_criteria: String,
    pub quality_scores: QualityScores,
    pub optimization_suggestions: Vec<String>,
    pub notes: String,
    pub analyzed_by: String,
    pub analysis_date: DateTime<Utc>,
}

// ============================================================================
// Draft and persisted case
// ============================================================================

/// A fully built test case that has not been persisted yet.
///
/// The store assigns identity and lifecycle fields on create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseDraft {
    pub name: String,
    pub description: String,
    pub owner: String,
    pub priority: Priority,
    pub domain: String,
    pub difficulty: Difficulty,
    pub tags: Vec<Tag>,
    /// Session id the case was imported from.
    pub source_session: String,
    pub test_config: TestConfig,
    pub input: CaseInput,
    pub execution: CaseExecution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<CaseAnalysis>,
}

/// A persisted test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Store-assigned id ("TC-0042").
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: CaseStatus,
    pub owner: String,
    pub priority: Priority,
    pub domain: String,
    pub difficulty: Difficulty,
    pub tags: Vec<Tag>,
    pub source_session: String,
    pub version: String,
    pub created_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<DateTime<Utc>>,
    pub test_config: TestConfig,
    pub input: CaseInput,
    pub execution: CaseExecution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<CaseAnalysis>,
}

impl TestCase {
    /// Promotes a draft into a persisted case.
    ///
    /// New cases start in `Draft` status at version "1.0" with the
    /// creation time stamped by the store.
    pub fn from_draft(id: impl Into<String>, draft: TestCaseDraft) -> Self {
        Self {
            id: id.into(),
            name: draft.name,
            description: draft.description,
            status: CaseStatus::Draft,
            owner: draft.owner,
            priority: draft.priority,
            domain: draft.domain,
            difficulty: draft.difficulty,
            tags: draft.tags,
            source_session: draft.source_session,
            version: "1.0".to_string(),
            created_date: Utc::now(),
            updated_date: None,
            test_config: draft.test_config,
            input: draft.input,
            execution: draft.execution,
            analysis: draft.analysis,
        }
    }
}

/// Partial update applied to a persisted case. Unset fields are left
/// untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

/// Conjunctive listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Case-insensitive substring match against name and description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// One page of a case listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasePage {
    pub items: Vec<TestCase>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Counts of persisted cases along each categorical axis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseStatistics {
    pub total_count: usize,
    pub status_distribution: std::collections::HashMap<String, usize>,
    pub priority_distribution: std::collections::HashMap<String, usize>,
    pub difficulty_distribution: std::collections::HashMap<String, usize>,
    pub domain_distribution: std::collections::HashMap<String, usize>,
}

/// Lightweight reference to a case that already imported a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingCaseRef {
    pub test_case_id: String,
    pub test_case_name: String,
    pub owner: String,
    pub import_date: DateTime<Utc>,
}
