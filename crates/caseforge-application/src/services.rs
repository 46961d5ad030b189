//! Service wiring.
//!
//! Bundles the three application services over one shared source and
//! repository pair. Callers construct it once at startup and clone the
//! `Arc`s into whatever surface (CLI, HTTP, tests) sits on top.

use std::sync::Arc;

use caseforge_core::conversation::ConversationSource;
use caseforge_core::test_case::TestCaseRepository;
use caseforge_infrastructure::{InMemoryCaseRepository, MockWarehouse};

use crate::cases::CaseService;
use crate::history::HistoryService;
use crate::import_usecase::ImportUseCase;

/// The application service set.
pub struct Services {
    pub import: Arc<ImportUseCase>,
    pub cases: Arc<CaseService>,
    pub history: Arc<HistoryService>,
}

impl Services {
    pub fn new(
        source: Arc<dyn ConversationSource>,
        repository: Arc<dyn TestCaseRepository>,
    ) -> Self {
        Self {
            import: Arc::new(ImportUseCase::new(
                Arc::clone(&source),
                Arc::clone(&repository),
            )),
            cases: Arc::new(CaseService::new(Arc::clone(&repository))),
            history: Arc::new(HistoryService::new(source)),
        }
    }

    /// Wires the services against the seeded in-memory warehouse and an
    /// empty case store. This is the demo and test configuration.
    pub fn with_mock_data() -> Self {
        tracing::info!(target: "services", "[Services] Using seeded mock data");
        Self::new(
            Arc::new(MockWarehouse::new()),
            Arc::new(InMemoryCaseRepository::new()),
        )
    }
}
