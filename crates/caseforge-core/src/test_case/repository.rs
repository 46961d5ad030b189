//! Test case repository trait.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::test_case::{
    CaseFilter, CasePage, CaseStatistics, CaseUpdate, ExistingCaseRef, TestCase, TestCaseDraft,
};

/// Persistence operations for test cases.
///
/// The import pipeline only needs `find_by_source_sessions` and
/// `create`; the remaining operations back the management surface.
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait TestCaseRepository: Send + Sync {
    /// Looks up which of the given sessions were already imported.
    ///
    /// # Arguments
    ///
    /// * `session_ids` - Candidate session ids, duplicates allowed.
    ///
    /// # Returns
    ///
    /// Map from session id to the case that imported it. Sessions with
    /// no existing case are absent from the map.
    async fn find_by_source_sessions(
        &self,
        session_ids: &[String],
    ) -> Result<HashMap<String, ExistingCaseRef>>;

    /// Persists a draft, assigning its id and lifecycle fields.
    async fn create(&self, draft: TestCaseDraft) -> Result<TestCase>;

    /// Fetches one case by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<TestCase>>;

    /// Lists cases matching a filter, newest first.
    ///
    /// # Arguments
    ///
    /// * `filter` - Conjunctive criteria; empty filter matches all.
    /// * `page` - 1-based page number.
    /// * `page_size` - Cases per page.
    async fn list(&self, filter: &CaseFilter, page: usize, page_size: usize) -> Result<CasePage>;

    /// Applies a partial update.
    ///
    /// # Returns
    ///
    /// The updated case, or `None` when the id is unknown.
    async fn update(&self, id: &str, update: CaseUpdate) -> Result<Option<TestCase>>;

    /// Deletes one case. Returns whether anything was removed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Counts cases along each categorical axis.
    async fn statistics(&self) -> Result<CaseStatistics>;

    /// Lists the distinct tag names in use, sorted.
    async fn tag_names(&self) -> Result<Vec<String>>;
}
