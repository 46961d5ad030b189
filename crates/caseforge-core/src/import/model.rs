//! Import task model.
//!
//! An import task tracks one batch conversion of recorded sessions into
//! test cases. Tasks move `Pending -> Running -> {Completed, Failed}`
//! and never leave a terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::test_case::{Difficulty, Priority};

/// Lifecycle state of an import task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ImportStatus {
    /// Completed and failed tasks no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Defaults applied to every test case an import produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Owner recorded on imported cases.
    #[serde(default = "default_owner", alias = "defaultOwner")]
    pub default_owner: String,
    #[serde(default, alias = "defaultPriority")]
    pub default_priority: Priority,
    #[serde(default, alias = "defaultDifficulty")]
    pub default_difficulty: Difficulty,
    /// Derive tags (domain, complexity, quality) from session analysis.
    #[serde(default = "default_true", alias = "autoGenerateTags")]
    pub auto_generate_tags: bool,
    /// Attach the generated analysis block to imported cases.
    #[serde(default, alias = "includeAnalysis")]
    pub include_analysis: bool,
}

fn default_owner() -> String {
    "system".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_owner: default_owner(),
            default_priority: Priority::Medium,
            default_difficulty: Difficulty::Medium,
            auto_generate_tags: true,
            include_analysis: false,
        }
    }
}

/// One batch import run.
///
/// `processed` and `failed` only ever grow, and their sum never exceeds
/// `total`. A single worker owns the mutable task; everyone else sees
/// snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportTask {
    pub task_id: String,
    /// Sessions the worker will process, duplicates already removed.
    pub session_ids: Vec<String>,
    pub status: ImportStatus,
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    /// Human-readable outcome, set at the terminal transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub config: ImportConfig,
}

impl ImportTask {
    /// Creates a pending task over the given sessions.
    pub fn new(session_ids: Vec<String>, config: ImportConfig) -> Self {
        let now = Utc::now();
        Self {
            task_id: generate_task_id(now),
            total: session_ids.len(),
            session_ids,
            status: ImportStatus::Pending,
            processed: 0,
            failed: 0,
            message: None,
            start_time: now,
            end_time: None,
            created_at: now,
            config,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = ImportStatus::Running;
    }

    /// Counts one successfully imported session.
    pub fn record_success(&mut self) {
        self.processed += 1;
    }

    /// Counts one session that could not be imported.
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Terminal success transition.
    pub fn complete(&mut self, message: impl Into<String>) {
        self.status = ImportStatus::Completed;
        self.message = Some(message.into());
        self.end_time = Some(Utc::now());
    }

    /// Terminal failure transition.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = ImportStatus::Failed;
        self.message = Some(message.into());
        self.end_time = Some(Utc::now());
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Share of sessions accounted for, in percent.
    pub fn progress_percent(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            ((self.processed + self.failed) * 100 / self.total) as u32
        }
    }
}

/// Task ids look like `IMPORT-1715331600-a1b2c3d4`. The uuid suffix
/// keeps ids distinct when tasks are created within the same second.
fn generate_task_id(now: DateTime<Utc>) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("IMPORT-{}-{}", now.timestamp(), &uuid[..8])
}

/// Read-only progress snapshot of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub task_id: String,
    pub status: ImportStatus,
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub percentage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl From<&ImportTask> for ImportProgress {
    fn from(task: &ImportTask) -> Self {
        Self {
            task_id: task.task_id.clone(),
            status: task.status,
            total: task.total,
            processed: task.processed,
            failed: task.failed,
            percentage: task.progress_percent(),
            message: task.message.clone(),
            start_time: task.start_time,
            end_time: task.end_time,
        }
    }
}

/// One page of the task listing, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPage {
    pub items: Vec<ImportTask>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// A candidate session that was already imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateSessionInfo {
    pub session_id: String,
    pub existing_test_case_id: String,
    pub existing_test_case_name: String,
    pub import_date: DateTime<Utc>,
    pub owner: String,
}

/// Outcome of a duplicate check over candidate sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportValidation {
    /// Sessions with no existing case, input order preserved.
    pub valid_sessions: Vec<String>,
    pub duplicate_sessions: Vec<DuplicateSessionInfo>,
    pub can_import_all: bool,
    pub total_count: usize,
    pub duplicate_count: usize,
    pub message: String,
}

/// Lightweight look at one candidate session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPreview {
    pub session_id: String,
    pub message_count: usize,
    pub first_message: String,
    pub last_message: String,
    pub has_user_rating: bool,
}

/// Import preview: validation plus a sample of per-session stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPreview {
    pub total_count: usize,
    /// How many sessions were sampled into `preview_data`.
    pub preview_count: usize,
    pub session_ids: Vec<String>,
    pub message: String,
    pub preview_data: Vec<SessionPreview>,
    pub duplicate_sessions: Vec<DuplicateSessionInfo>,
    pub validation: ImportValidation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_conversion_defaults() {
        let config: ImportConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.default_owner, "system");
        assert_eq!(config.default_priority, Priority::Medium);
        assert_eq!(config.default_difficulty, Difficulty::Medium);
        assert!(config.auto_generate_tags);
        assert!(!config.include_analysis);
        assert_eq!(config, ImportConfig::default());
    }

    #[test]
    fn config_accepts_camel_case_aliases() {
        let config: ImportConfig = serde_json::from_str(
            r#"{"defaultOwner": "qa-team", "defaultPriority": "high", "includeAnalysis": true}"#,
        )
        .unwrap();
        assert_eq!(config.default_owner, "qa-team");
        assert_eq!(config.default_priority, Priority::High);
        assert!(config.include_analysis);
    }

    #[test]
    fn new_tasks_are_pending_with_zeroed_counters() {
        let task = ImportTask::new(
            vec!["session_a".to_string(), "session_b".to_string()],
            ImportConfig::default(),
        );
        assert_eq!(task.status, ImportStatus::Pending);
        assert_eq!(task.total, 2);
        assert_eq!(task.processed, 0);
        assert_eq!(task.failed, 0);
        assert!(task.message.is_none());
        assert!(task.end_time.is_none());
        assert!(!task.is_terminal());
    }

    #[test]
    fn task_ids_carry_timestamp_and_suffix() {
        let task = ImportTask::new(vec![], ImportConfig::default());
        let parts: Vec<&str> = task.task_id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "IMPORT");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn consecutive_tasks_get_distinct_ids() {
        let a = ImportTask::new(vec![], ImportConfig::default());
        let b = ImportTask::new(vec![], ImportConfig::default());
        assert_ne!(a.task_id, b.task_id);
    }

    #[test]
    fn terminal_transitions_stamp_end_time() {
        let mut task = ImportTask::new(vec!["s".to_string()], ImportConfig::default());
        task.mark_running();
        assert_eq!(task.status, ImportStatus::Running);

        task.record_success();
        task.complete("imported 1/1 sessions");
        assert_eq!(task.status, ImportStatus::Completed);
        assert!(task.is_terminal());
        assert!(task.end_time.is_some());
        assert_eq!(task.message.as_deref(), Some("imported 1/1 sessions"));
    }

    #[test]
    fn percentage_counts_both_outcomes() {
        let mut task = ImportTask::new(
            (0..4).map(|i| format!("session_{i}")).collect(),
            ImportConfig::default(),
        );
        assert_eq!(task.progress_percent(), 0);
        task.record_success();
        task.record_failure();
        assert_eq!(task.progress_percent(), 50);
    }

    #[test]
    fn empty_tasks_report_zero_progress() {
        let task = ImportTask::new(vec![], ImportConfig::default());
        assert_eq!(task.progress_percent(), 0);
    }
}
