//! Test case domain module.
//!
//! # Module Structure
//!
//! - `model`: the test case data model (draft, persisted case, nested
//!   config/input/execution/analysis blocks, listing types)
//! - `repository`: persistence trait (`TestCaseRepository`)

mod model;
mod repository;

// Re-export public API
pub use model::{
    ActualExecution, CaseAnalysis, CaseExecution, CaseFilter, CaseInput, CasePage, CaseStatistics,
    CaseStatus, CaseUpdate, CurrentQuery, DialogueRecord, Difficulty, ExistingCaseRef,
    FeedbackCategory, ModelParams, ModelSettings, PerformanceMetrics, Priority, PromptSettings,
    QualityScores, RetrievalQuality, RetrievalSettings, RetrievedChunk, Tag, TestCase,
    TestCaseDraft, TestConfig, UserFeedback,
};
pub use repository::TestCaseRepository;
