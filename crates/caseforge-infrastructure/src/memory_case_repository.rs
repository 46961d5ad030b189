//! In-memory test case store.
//!
//! Backs the repository trait with a plain vector behind a lock. Ids
//! are sequential (`TC-0001`, `TC-0002`, ...) and survive deletes, so
//! an id is never reused within one process.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use caseforge_core::Result;
use caseforge_core::test_case::{
    CaseFilter, CasePage, CaseStatistics, CaseUpdate, ExistingCaseRef, TestCase, TestCaseDraft,
    TestCaseRepository,
};
use chrono::Utc;
use tokio::sync::RwLock;

pub struct InMemoryCaseRepository {
    inner: RwLock<Inner>,
}

struct Inner {
    cases: Vec<TestCase>,
    next_id: u32,
}

impl InMemoryCaseRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                cases: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryCaseRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TestCaseRepository for InMemoryCaseRepository {
    async fn find_by_source_sessions(
        &self,
        session_ids: &[String],
    ) -> Result<HashMap<String, ExistingCaseRef>> {
        let inner = self.inner.read().await;
        let mut found = HashMap::new();
        for case in &inner.cases {
            if session_ids.contains(&case.source_session)
                && !found.contains_key(&case.source_session)
            {
                found.insert(
                    case.source_session.clone(),
                    ExistingCaseRef {
                        test_case_id: case.id.clone(),
                        test_case_name: case.name.clone(),
                        owner: case.owner.clone(),
                        import_date: case.created_date,
                    },
                );
            }
        }
        Ok(found)
    }

    async fn create(&self, draft: TestCaseDraft) -> Result<TestCase> {
        let mut inner = self.inner.write().await;
        let id = format!("TC-{:04}", inner.next_id);
        inner.next_id += 1;
        let case = TestCase::from_draft(id, draft);
        inner.cases.push(case.clone());
        tracing::debug!(target: "case_store", "[CaseStore] Created {}", case.id);
        Ok(case)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<TestCase>> {
        let inner = self.inner.read().await;
        Ok(inner.cases.iter().find(|c| c.id == id).cloned())
    }

    async fn list(&self, filter: &CaseFilter, page: usize, page_size: usize) -> Result<CasePage> {
        let inner = self.inner.read().await;
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut matches: Vec<TestCase> = inner
            .cases
            .iter()
            .filter(|case| {
                let status_ok = filter.status.is_none_or(|s| case.status == s);
                let domain_ok = filter.domain.as_ref().is_none_or(|d| &case.domain == d);
                let priority_ok = filter.priority.is_none_or(|p| case.priority == p);
                let search_ok = needle.as_ref().is_none_or(|n| {
                    case.name.to_lowercase().contains(n)
                        || case.description.to_lowercase().contains(n)
                });
                status_ok && domain_ok && priority_ok && search_ok
            })
            .cloned()
            .collect();
        // Ids are sequential, so they break created_date ties.
        matches.sort_by(|a, b| {
            b.created_date
                .cmp(&a.created_date)
                .then_with(|| b.id.cmp(&a.id))
        });

        let page = page.max(1);
        let page_size = page_size.max(1);
        let total = matches.len();
        let total_pages = total.div_ceil(page_size);
        let items = matches
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        Ok(CasePage {
            items,
            total,
            page,
            page_size,
            total_pages,
        })
    }

    async fn update(&self, id: &str, update: CaseUpdate) -> Result<Option<TestCase>> {
        let mut inner = self.inner.write().await;
        let Some(case) = inner.cases.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            case.name = name;
        }
        if let Some(description) = update.description {
            case.description = description;
        }
        if let Some(status) = update.status {
            case.status = status;
        }
        if let Some(owner) = update.owner {
            case.owner = owner;
        }
        if let Some(priority) = update.priority {
            case.priority = priority;
        }
        if let Some(domain) = update.domain {
            case.domain = domain;
        }
        if let Some(difficulty) = update.difficulty {
            case.difficulty = difficulty;
        }
        if let Some(tags) = update.tags {
            case.tags = tags;
        }
        case.updated_date = Some(Utc::now());
        Ok(Some(case.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.cases.len();
        inner.cases.retain(|c| c.id != id);
        Ok(inner.cases.len() < before)
    }

    async fn statistics(&self) -> Result<CaseStatistics> {
        let inner = self.inner.read().await;
        let mut stats = CaseStatistics {
            total_count: inner.cases.len(),
            ..CaseStatistics::default()
        };
        for case in &inner.cases {
            *stats
                .status_distribution
                .entry(case.status.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .priority_distribution
                .entry(case.priority.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .difficulty_distribution
                .entry(case.difficulty.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .domain_distribution
                .entry(case.domain.clone())
                .or_insert(0) += 1;
        }
        Ok(stats)
    }

    async fn tag_names(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let names: BTreeSet<String> = inner
            .cases
            .iter()
            .flat_map(|c| c.tags.iter().map(|t| t.name.clone()))
            .collect();
        Ok(names.into_iter().collect())
    }
}
