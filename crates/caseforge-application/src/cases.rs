//! Test case management.
//!
//! Thin service over the case repository: listing, CRUD, statistics and
//! tag lookup. Imported drafts normally arrive through the import
//! worker; `create` exists for cases authored by hand.

use std::sync::Arc;

use anyhow::Result;
use caseforge_core::CaseforgeError;
use caseforge_core::test_case::{
    CaseFilter, CasePage, CaseStatistics, CaseUpdate, TestCase, TestCaseDraft, TestCaseRepository,
};

pub struct CaseService {
    repository: Arc<dyn TestCaseRepository>,
}

impl CaseService {
    pub fn new(repository: Arc<dyn TestCaseRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self, filter: &CaseFilter, page: usize, page_size: usize) -> Result<CasePage> {
        let cases = self.repository.list(filter, page, page_size).await?;
        tracing::debug!(
            target: "cases",
            "[CaseService] Listed {} of {} cases",
            cases.items.len(),
            cases.total
        );
        Ok(cases)
    }

    /// # Errors
    ///
    /// `NotFound` when no case has this id.
    pub async fn get(&self, id: &str) -> Result<TestCase> {
        let case = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CaseforgeError::not_found("test case", id))?;
        Ok(case)
    }

    pub async fn create(&self, draft: TestCaseDraft) -> Result<TestCase> {
        let case = self.repository.create(draft).await?;
        tracing::info!(target: "cases", "[CaseService] Created case {}", case.id);
        Ok(case)
    }

    /// # Errors
    ///
    /// `NotFound` when no case has this id.
    pub async fn update(&self, id: &str, update: CaseUpdate) -> Result<TestCase> {
        let case = self
            .repository
            .update(id, update)
            .await?
            .ok_or_else(|| CaseforgeError::not_found("test case", id))?;
        tracing::info!(target: "cases", "[CaseService] Updated case {id}");
        Ok(case)
    }

    /// Returns false when the id was unknown.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.repository.delete(id).await?;
        if removed {
            tracing::info!(target: "cases", "[CaseService] Deleted case {id}");
        }
        Ok(removed)
    }

    pub async fn statistics(&self) -> Result<CaseStatistics> {
        Ok(self.repository.statistics().await?)
    }

    /// Distinct tag names across all cases, sorted.
    pub async fn tags(&self) -> Result<Vec<String>> {
        Ok(self.repository.tag_names().await?)
    }
}
