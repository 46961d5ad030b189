//! Application layer for Caseforge.
//!
//! Turns recorded conversation sessions into persisted test cases:
//! the draft builder, duplicate checking, the background import
//! orchestrator, and the management services that sit next to it.

pub mod builder;
pub mod cases;
pub mod duplicates;
pub mod history;
pub mod import;
pub mod import_usecase;
pub mod services;

pub use builder::TestCaseBuilder;
pub use cases::CaseService;
pub use duplicates::DuplicateChecker;
pub use history::{HistoryPage, HistorySearchRequest, HistoryService, SessionSummary};
pub use import::TaskRegistry;
pub use import_usecase::ImportUseCase;
pub use services::Services;
