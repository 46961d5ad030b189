//! Pre-import duplicate detection.
//!
//! A session that already produced a test case must not be imported a
//! second time. The checker partitions candidate session ids into the
//! importable remainder and the already-imported ones, carrying enough
//! detail about each duplicate for the caller to report it.

use std::sync::Arc;

use anyhow::Result;
use caseforge_core::import::{DuplicateSessionInfo, ImportValidation};
use caseforge_core::test_case::TestCaseRepository;

pub struct DuplicateChecker {
    repository: Arc<dyn TestCaseRepository>,
}

impl DuplicateChecker {
    pub fn new(repository: Arc<dyn TestCaseRepository>) -> Self {
        Self { repository }
    }

    /// Partitions candidate ids into valid and duplicate sessions.
    ///
    /// Repeated input ids collapse to one candidate. Every candidate
    /// lands in exactly one of the two output lists, preserving input
    /// order.
    pub async fn check(&self, session_ids: &[String]) -> Result<ImportValidation> {
        let mut candidates: Vec<String> = Vec::new();
        for id in session_ids {
            if !candidates.contains(id) {
                candidates.push(id.clone());
            }
        }

        let existing = self.repository.find_by_source_sessions(&candidates).await?;

        let mut valid_sessions = Vec::new();
        let mut duplicate_sessions = Vec::new();
        for session_id in &candidates {
            match existing.get(session_id) {
                Some(case) => duplicate_sessions.push(DuplicateSessionInfo {
                    session_id: session_id.clone(),
                    existing_test_case_id: case.test_case_id.clone(),
                    existing_test_case_name: case.test_case_name.clone(),
                    import_date: case.import_date,
                    owner: case.owner.clone(),
                }),
                None => valid_sessions.push(session_id.clone()),
            }
        }

        let total_count = candidates.len();
        let duplicate_count = duplicate_sessions.len();
        let message = if duplicate_sessions.is_empty() {
            format!("All {total_count} sessions can be imported")
        } else if valid_sessions.is_empty() {
            format!("All {total_count} sessions have already been imported")
        } else {
            format!(
                "{} of {total_count} sessions can be imported; {duplicate_count} duplicates skipped",
                valid_sessions.len()
            )
        };

        Ok(ImportValidation {
            can_import_all: duplicate_count == 0,
            valid_sessions,
            duplicate_sessions,
            total_count,
            duplicate_count,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use caseforge_core::test_case::{
        CaseFilter, CasePage, CaseStatistics, CaseUpdate, ExistingCaseRef, TestCase, TestCaseDraft,
    };
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    struct StubRepo {
        imported: HashMap<String, ExistingCaseRef>,
    }

    impl StubRepo {
        fn empty() -> Self {
            Self {
                imported: HashMap::new(),
            }
        }

        fn with_imported(session_ids: &[&str]) -> Self {
            let imported = session_ids
                .iter()
                .enumerate()
                .map(|(i, id)| {
                    let reference = ExistingCaseRef {
                        test_case_id: format!("TC-{:04}", i + 1),
                        test_case_name: format!("Imported from {id}"),
                        owner: "importer".to_string(),
                        import_date: Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap(),
                    };
                    (id.to_string(), reference)
                })
                .collect();
            Self { imported }
        }
    }

    #[async_trait]
    impl TestCaseRepository for StubRepo {
        async fn find_by_source_sessions(
            &self,
            session_ids: &[String],
        ) -> caseforge_core::Result<HashMap<String, ExistingCaseRef>> {
            Ok(session_ids
                .iter()
                .filter_map(|id| self.imported.get(id).map(|r| (id.clone(), r.clone())))
                .collect())
        }

        async fn create(&self, draft: TestCaseDraft) -> caseforge_core::Result<TestCase> {
            Ok(TestCase::from_draft("TC-0001", draft))
        }

        async fn find_by_id(&self, _id: &str) -> caseforge_core::Result<Option<TestCase>> {
            Ok(None)
        }

        async fn list(
            &self,
            _filter: &CaseFilter,
            page: usize,
            page_size: usize,
        ) -> caseforge_core::Result<CasePage> {
            Ok(CasePage {
                items: Vec::new(),
                total: 0,
                page,
                page_size,
                total_pages: 0,
            })
        }

        async fn update(
            &self,
            _id: &str,
            _update: CaseUpdate,
        ) -> caseforge_core::Result<Option<TestCase>> {
            Ok(None)
        }

        async fn delete(&self, _id: &str) -> caseforge_core::Result<bool> {
            Ok(false)
        }

        async fn statistics(&self) -> caseforge_core::Result<CaseStatistics> {
            Ok(CaseStatistics::default())
        }

        async fn tag_names(&self) -> caseforge_core::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn all_new_sessions_can_be_imported() {
        let checker = DuplicateChecker::new(Arc::new(StubRepo::empty()));
        let validation = checker.check(&ids(&["s1", "s2"])).await.unwrap();

        assert_eq!(validation.valid_sessions, ids(&["s1", "s2"]));
        assert!(validation.duplicate_sessions.is_empty());
        assert!(validation.can_import_all);
        assert_eq!(validation.total_count, 2);
        assert_eq!(validation.duplicate_count, 0);
        assert_eq!(validation.message, "All 2 sessions can be imported");
    }

    #[tokio::test]
    async fn known_sessions_are_partitioned_out() {
        let checker = DuplicateChecker::new(Arc::new(StubRepo::with_imported(&["s1"])));
        let validation = checker.check(&ids(&["s1", "s2"])).await.unwrap();

        assert_eq!(validation.valid_sessions, ids(&["s2"]));
        assert_eq!(validation.duplicate_sessions.len(), 1);
        let duplicate = &validation.duplicate_sessions[0];
        assert_eq!(duplicate.session_id, "s1");
        assert_eq!(duplicate.existing_test_case_id, "TC-0001");
        assert_eq!(duplicate.owner, "importer");
        assert!(!validation.can_import_all);
        assert_eq!(
            validation.message,
            "1 of 2 sessions can be imported; 1 duplicates skipped"
        );
    }

    #[tokio::test]
    async fn all_duplicates_yield_an_empty_valid_list() {
        let checker = DuplicateChecker::new(Arc::new(StubRepo::with_imported(&["s1", "s2"])));
        let validation = checker.check(&ids(&["s1", "s2"])).await.unwrap();

        assert!(validation.valid_sessions.is_empty());
        assert_eq!(validation.duplicate_count, 2);
        assert_eq!(
            validation.message,
            "All 2 sessions have already been imported"
        );
    }

    #[tokio::test]
    async fn partition_is_total_and_disjoint() {
        let checker = DuplicateChecker::new(Arc::new(StubRepo::with_imported(&["s2"])));
        let validation = checker.check(&ids(&["s1", "s2", "s3"])).await.unwrap();

        assert_eq!(
            validation.valid_sessions.len() + validation.duplicate_sessions.len(),
            validation.total_count
        );
        assert!(!validation.valid_sessions.contains(&"s2".to_string()));
        let duplicate_ids: Vec<&str> = validation
            .duplicate_sessions
            .iter()
            .map(|d| d.session_id.as_str())
            .collect();
        assert_eq!(duplicate_ids, vec!["s2"]);
    }

    #[tokio::test]
    async fn repeated_input_ids_collapse() {
        let checker = DuplicateChecker::new(Arc::new(StubRepo::empty()));
        let validation = checker.check(&ids(&["s1", "s1", "s2"])).await.unwrap();

        assert_eq!(validation.total_count, 2);
        assert_eq!(validation.valid_sessions, ids(&["s1", "s2"]));
    }
}
