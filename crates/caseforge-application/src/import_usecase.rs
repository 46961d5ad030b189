//! Import task orchestration.
//!
//! Coordinates the whole pipeline: duplicate validation, preview
//! assembly, background execution over the warehouse, and task
//! lifecycle queries. Execution is fire-and-forget: `execute` registers
//! a task, spawns a worker and returns immediately; callers follow the
//! task through `progress`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use caseforge_core::conversation::ConversationSource;
use caseforge_core::import::{
    ImportConfig, ImportPreview, ImportProgress, ImportTask, SessionPreview, TaskPage,
};
use caseforge_core::test_case::TestCaseRepository;
use rand::Rng;
use tokio::sync::RwLock;

use crate::builder::TestCaseBuilder;
use crate::duplicates::DuplicateChecker;
use crate::import::TaskRegistry;

/// How many sessions a preview describes in detail.
const PREVIEW_LIMIT: usize = 5;

/// Pause between sessions inside the worker, to keep load on the
/// warehouse bounded.
const SESSION_PAUSE: Duration = Duration::from_millis(100);

/// Drives session imports end to end.
pub struct ImportUseCase {
    /// Read side: recorded conversations and retrieval chunks.
    source: Arc<dyn ConversationSource>,
    /// Write side: persisted test cases.
    repository: Arc<dyn TestCaseRepository>,
    /// Duplicate detection against already-imported sessions.
    checker: DuplicateChecker,
    /// Live and finished import tasks.
    registry: TaskRegistry,
    /// Worker pause between sessions; shortened in tests.
    session_pause: Duration,
}

impl ImportUseCase {
    pub fn new(source: Arc<dyn ConversationSource>, repository: Arc<dyn TestCaseRepository>) -> Self {
        Self {
            source,
            checker: DuplicateChecker::new(Arc::clone(&repository)),
            repository,
            registry: TaskRegistry::new(),
            session_pause: SESSION_PAUSE,
        }
    }

    /// Overrides the per-session worker pause.
    pub fn with_session_pause(mut self, pause: Duration) -> Self {
        self.session_pause = pause;
        self
    }

    /// Describes what an import of `session_ids` would do, without
    /// creating a task.
    ///
    /// The first [`PREVIEW_LIMIT`] sessions get per-session detail. The
    /// detail is best effort: when the warehouse cannot provide
    /// statistics for a session, randomized placeholder values stand in
    /// so the preview always renders.
    pub async fn preview(&self, session_ids: &[String]) -> Result<ImportPreview> {
        let validation = self.checker.check(session_ids).await?;

        let mut preview_data = Vec::new();
        for session_id in session_ids.iter().take(PREVIEW_LIMIT) {
            preview_data.push(self.describe_session(session_id).await);
        }

        tracing::debug!(
            target: "import",
            "[Preview] {} sessions requested, {} duplicates",
            session_ids.len(),
            validation.duplicate_count
        );

        Ok(ImportPreview {
            total_count: session_ids.len(),
            preview_count: preview_data.len(),
            session_ids: session_ids.to_vec(),
            message: validation.message.clone(),
            preview_data,
            duplicate_sessions: validation.duplicate_sessions.clone(),
            validation,
        })
    }

    async fn describe_session(&self, session_id: &str) -> SessionPreview {
        match self.source.session_statistics(session_id).await {
            Ok(Some(stats)) => SessionPreview {
                session_id: session_id.to_string(),
                message_count: stats.total_messages,
                first_message: stats.first_message.unwrap_or_default(),
                last_message: stats.last_message.unwrap_or_default(),
                has_user_rating: stats.average_rating.is_some(),
            },
            Ok(None) => placeholder_preview(session_id),
            Err(e) => {
                tracing::warn!(
                    target: "import",
                    "[Preview] Statistics unavailable for {session_id}: {e}"
                );
                placeholder_preview(session_id)
            }
        }
    }

    /// Starts an import and returns the freshly registered task.
    ///
    /// Duplicate sessions are dropped up front. When nothing remains
    /// the task is created already failed, with every candidate counted
    /// against it, and no worker runs. Otherwise the task covers only
    /// the valid sessions and a background worker picks it up.
    pub async fn execute(
        &self,
        session_ids: &[String],
        config: ImportConfig,
    ) -> Result<ImportTask> {
        let validation = self.checker.check(session_ids).await?;

        if validation.valid_sessions.is_empty() {
            let mut task = ImportTask::new(session_ids.to_vec(), config);
            task.failed = task.total;
            task.fail(validation.message.clone());
            let handle = self.registry.insert(task).await;
            let snapshot = handle.read().await.clone();
            tracing::info!(
                target: "import",
                "[Import] Task {} rejected: {}",
                snapshot.task_id,
                validation.message
            );
            return Ok(snapshot);
        }

        let task = ImportTask::new(validation.valid_sessions.clone(), config);
        let handle = self.registry.insert(task).await;
        let snapshot = handle.read().await.clone();

        let source = Arc::clone(&self.source);
        let repository = Arc::clone(&self.repository);
        let pause = self.session_pause;
        tokio::spawn(async move {
            run_import(source, repository, handle, pause).await;
        });

        tracing::info!(
            target: "import",
            "[Import] Task {} scheduled with {} sessions ({} duplicates dropped)",
            snapshot.task_id,
            snapshot.total,
            validation.duplicate_count
        );
        Ok(snapshot)
    }

    /// Point-in-time progress of a task, if it is still registered.
    pub async fn progress(&self, task_id: &str) -> Option<ImportProgress> {
        let handle = self.registry.get(task_id).await?;
        let task = handle.read().await;
        Some(ImportProgress::from(&*task))
    }

    /// Registered tasks, newest first.
    pub async fn list_tasks(&self, page: usize, page_size: usize) -> TaskPage {
        let mut tasks = self.registry.snapshots().await;
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let page = page.max(1);
        let page_size = page_size.max(1);
        let total = tasks.len();
        let total_pages = total.div_ceil(page_size);
        let items = tasks
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        TaskPage {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }

    /// Unregisters a task regardless of its state.
    ///
    /// A running worker is not cancelled: it holds its own handle and
    /// finishes the import, but the task stops being visible.
    pub async fn delete_task(&self, task_id: &str) -> bool {
        let removed = self.registry.remove(task_id).await;
        if removed {
            tracing::info!(target: "import", "[Import] Task {task_id} deleted");
        }
        removed
    }
}

fn placeholder_preview(session_id: &str) -> SessionPreview {
    let mut rng = rand::thread_rng();
    SessionPreview {
        session_id: session_id.to_string(),
        message_count: rng.gen_range(2..=8),
        first_message: format!("Conversation {session_id} (statistics unavailable)"),
        last_message: "(statistics unavailable)".to_string(),
        has_user_rating: rng.gen_bool(0.5),
    }
}

/// Background worker: runs one task to completion.
async fn run_import(
    source: Arc<dyn ConversationSource>,
    repository: Arc<dyn TestCaseRepository>,
    task: Arc<RwLock<ImportTask>>,
    pause: Duration,
) {
    let (task_id, session_ids, config) = {
        let mut guard = task.write().await;
        guard.mark_running();
        (
            guard.task_id.clone(),
            guard.session_ids.clone(),
            guard.config.clone(),
        )
    };
    tracing::info!(
        target: "import",
        "[ImportWorker] Task {task_id} started with {} sessions",
        session_ids.len()
    );

    let builder = TestCaseBuilder::new(config);
    match run_sessions(&source, &repository, &builder, &task, &session_ids, pause).await {
        Ok(()) => {
            let mut guard = task.write().await;
            let processed = guard.processed;
            let total = guard.total;
            let rate = if total == 0 {
                100.0
            } else {
                processed as f64 * 100.0 / total as f64
            };
            guard.complete(format!(
                "Imported {processed}/{total} sessions ({rate:.0}% success)"
            ));
            tracing::info!(
                target: "import",
                "[ImportWorker] Task {task_id} completed: {processed}/{total} sessions imported"
            );
        }
        Err(e) => {
            let mut guard = task.write().await;
            guard.fail(format!("Import aborted: {e}"));
            tracing::error!(target: "import", "[ImportWorker] Task {task_id} aborted: {e}");
        }
    }
}

/// Per-session loop. A failing session is counted and skipped; only an
/// error escaping the loop itself aborts the task.
async fn run_sessions(
    source: &Arc<dyn ConversationSource>,
    repository: &Arc<dyn TestCaseRepository>,
    builder: &TestCaseBuilder,
    task: &Arc<RwLock<ImportTask>>,
    session_ids: &[String],
    pause: Duration,
) -> Result<()> {
    for session_id in session_ids {
        match import_session(source.as_ref(), repository.as_ref(), builder, session_id).await {
            Ok(case_id) => {
                task.write().await.record_success();
                tracing::info!(
                    target: "import",
                    "[ImportWorker] Session {session_id} imported as {case_id}"
                );
            }
            Err(e) => {
                task.write().await.record_failure();
                tracing::warn!(
                    target: "import",
                    "[ImportWorker] Session {session_id} skipped: {e}"
                );
            }
        }
        tokio::time::sleep(pause).await;
    }
    Ok(())
}

/// Imports one session: fetch turns, resolve cited chunks in one batch,
/// build the draft, persist it.
async fn import_session(
    source: &dyn ConversationSource,
    repository: &dyn TestCaseRepository,
    builder: &TestCaseBuilder,
    session_id: &str,
) -> caseforge_core::Result<String> {
    let turns = source.session_turns(session_id).await?;

    let mut chunk_ids: Vec<String> = Vec::new();
    for turn in &turns {
        for id in &turn.chunk_ids {
            if !chunk_ids.contains(id) {
                chunk_ids.push(id.clone());
            }
        }
    }
    let chunks: HashMap<String, _> = if chunk_ids.is_empty() {
        HashMap::new()
    } else {
        match source.chunks_by_ids(&chunk_ids).await {
            Ok(records) => records.into_iter().map(|c| (c.id.clone(), c)).collect(),
            // Chunk lookup failures degrade the draft instead of
            // failing the session.
            Err(e) => {
                tracing::warn!(
                    target: "import",
                    "[ImportWorker] Chunk lookup failed for {session_id}: {e}"
                );
                HashMap::new()
            }
        }
    };

    let draft = builder.build(session_id, &turns, &chunks)?;
    let case = repository.create(draft).await?;
    Ok(case.id)
}

#[cfg(test)]
#[path = "import_usecase_test.rs"]
mod tests;
