//! Conversation history browsing.
//!
//! Read-only views over the conversation source: keyword search grouped
//! into per-session summaries, full session playback, and model
//! discovery. Nothing here writes test cases; the import pipeline does
//! that.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use caseforge_core::CaseforgeError;
use caseforge_core::conversation::{ConversationSource, ConversationTurn, TurnQuery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Search form for recorded conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySearchRequest {
    /// Case-insensitive substring match against turn content.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, alias = "modelId")]
    pub model_id: Option<String>,
    #[serde(default, alias = "startTime")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, alias = "endTime")]
    pub end_time: Option<DateTime<Utc>>,
    /// Only sessions containing a turn rated at least this value.
    #[serde(default, alias = "minRating")]
    pub min_rating: Option<u8>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size", alias = "pageSize")]
    pub page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    20
}

impl Default for HistorySearchRequest {
    fn default() -> Self {
        Self {
            query: None,
            model_id: None,
            start_time: None,
            end_time: None,
            min_rating: None,
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

/// One session collapsed to its first matched exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    /// Oldest matched user turn; empty when only assistant turns matched.
    pub user_query: String,
    /// Oldest matched assistant turn; empty when only user turns matched.
    pub ai_response: String,
    pub user_rating: Option<u8>,
    pub model_id: Option<String>,
    /// Timestamp of the session's oldest matched turn.
    pub created_at: DateTime<Utc>,
    /// Chunks cited by the summarized assistant turn.
    pub chunk_refs: Vec<String>,
}

/// One page of session summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub items: Vec<SessionSummary>,
    /// Number of matching sessions across all pages.
    pub total: usize,
    /// Number of matching turns before session grouping.
    pub matched_turns: u64,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

pub struct HistoryService {
    source: Arc<dyn ConversationSource>,
}

impl HistoryService {
    pub fn new(source: Arc<dyn ConversationSource>) -> Self {
        Self { source }
    }

    /// Searches turns and groups the matches into per-session
    /// summaries, newest session first.
    pub async fn search(&self, request: &HistorySearchRequest) -> Result<HistoryPage> {
        let query = TurnQuery {
            keyword: request.query.clone(),
            model_id: request.model_id.clone(),
            start_time: request.start_time,
            end_time: request.end_time,
            min_rating: request.min_rating,
            max_rating: None,
            offset: 0,
            limit: None,
        };
        let matched_turns = self.source.count_turns(&query).await?;
        let turns = self.source.search_turns(&query).await?;

        // Group matched turns by session, in first-seen (newest) order.
        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<&ConversationTurn>> = HashMap::new();
        for turn in &turns {
            let entry = grouped.entry(turn.session_id.clone()).or_default();
            if entry.is_empty() {
                order.push(turn.session_id.clone());
            }
            entry.push(turn);
        }

        let mut sessions: Vec<SessionSummary> = order
            .iter()
            .map(|session_id| summarize(session_id, &grouped[session_id]))
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let page = request.page.max(1);
        let page_size = request.page_size.max(1);
        let total = sessions.len();
        let total_pages = total.div_ceil(page_size);
        let items = sessions
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        tracing::debug!(
            target: "history",
            "[HistoryService] {matched_turns} turns matched across {total} sessions"
        );

        Ok(HistoryPage {
            items,
            total,
            matched_turns,
            page,
            page_size,
            total_pages,
        })
    }

    /// Full turn list of one session, oldest first.
    ///
    /// # Errors
    ///
    /// `NotFound` when the session has no recorded turns.
    pub async fn session_detail(&self, session_id: &str) -> Result<Vec<ConversationTurn>> {
        let turns = self.source.session_turns(session_id).await?;
        if turns.is_empty() {
            return Err(CaseforgeError::not_found("session", session_id).into());
        }
        Ok(turns)
    }

    /// Distinct model ids present in the store, sorted.
    pub async fn model_ids(&self) -> Result<Vec<String>> {
        Ok(self.source.available_model_ids().await?)
    }

    pub async fn healthy(&self) -> bool {
        self.source.healthy().await
    }
}

/// Collapses one session's matched turns (newest first) into a summary.
fn summarize(session_id: &str, turns: &[&ConversationTurn]) -> SessionSummary {
    let oldest_user = turns.iter().rev().find(|t| t.is_user());
    let oldest_assistant = turns.iter().rev().find(|t| t.is_assistant());
    SessionSummary {
        session_id: session_id.to_string(),
        user_query: oldest_user.map(|t| t.content.clone()).unwrap_or_default(),
        ai_response: oldest_assistant.map(|t| t.content.clone()).unwrap_or_default(),
        user_rating: turns.iter().rev().find_map(|t| t.rating),
        model_id: turns.iter().rev().find_map(|t| t.model_id.clone()),
        created_at: turns
            .last()
            .map(|t| t.timestamp)
            .unwrap_or_else(Utc::now),
        chunk_refs: oldest_assistant
            .map(|t| t.chunk_ids.clone())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use caseforge_core::conversation::{ChunkRecord, SessionStatistics};
    use chrono::{Duration, TimeZone};

    struct FixtureSource {
        sessions: HashMap<String, Vec<ConversationTurn>>,
    }

    impl FixtureSource {
        fn new() -> Self {
            let base = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();

            let mut bond_answer = ConversationTurn::assistant(
                "s_funds",
                "m2",
                "The bond fund is the safest option.",
                "gpt-4o",
                base + Duration::seconds(30),
            );
            bond_answer.rating = Some(4);
            bond_answer.chunk_ids = vec!["chunk_bonds".to_string()];

            let mut deploy_answer = ConversationTurn::assistant(
                "s_deploy",
                "m4",
                "Push the image and apply the manifest.",
                "claude-3",
                base + Duration::seconds(3630),
            );
            deploy_answer.rating = Some(2);

            let mut sessions = HashMap::new();
            sessions.insert(
                "s_funds".to_string(),
                vec![
                    ConversationTurn::user("s_funds", "m1", "Which fund is safe?", base),
                    bond_answer,
                ],
            );
            sessions.insert(
                "s_deploy".to_string(),
                vec![
                    ConversationTurn::user(
                        "s_deploy",
                        "m3",
                        "How do we deploy the reporting service?",
                        base + Duration::seconds(3600),
                    ),
                    deploy_answer,
                ],
            );
            Self { sessions }
        }

        fn matching(&self, query: &TurnQuery) -> Vec<ConversationTurn> {
            let mut turns: Vec<ConversationTurn> = self
                .sessions
                .values()
                .flatten()
                .filter(|t| {
                    let keyword_ok = query.keyword.as_ref().is_none_or(|k| {
                        t.content.to_lowercase().contains(&k.to_lowercase())
                    });
                    let model_ok = query
                        .model_id
                        .as_ref()
                        .is_none_or(|m| t.model_id.as_deref() == Some(m.as_str()));
                    let rating_ok = query
                        .min_rating
                        .is_none_or(|min| t.rating.is_some_and(|r| r >= min));
                    let start_ok = query.start_time.is_none_or(|s| t.timestamp >= s);
                    let end_ok = query.end_time.is_none_or(|e| t.timestamp <= e);
                    keyword_ok && model_ok && rating_ok && start_ok && end_ok
                })
                .cloned()
                .collect();
            turns.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            turns
        }
    }

    #[async_trait]
    impl ConversationSource for FixtureSource {
        async fn session_turns(
            &self,
            session_id: &str,
        ) -> caseforge_core::Result<Vec<ConversationTurn>> {
            Ok(self.sessions.get(session_id).cloned().unwrap_or_default())
        }

        async fn chunks_by_ids(
            &self,
            _chunk_ids: &[String],
        ) -> caseforge_core::Result<Vec<ChunkRecord>> {
            Ok(Vec::new())
        }

        async fn session_statistics(
            &self,
            _session_id: &str,
        ) -> caseforge_core::Result<Option<SessionStatistics>> {
            Ok(None)
        }

        async fn search_turns(
            &self,
            query: &TurnQuery,
        ) -> caseforge_core::Result<Vec<ConversationTurn>> {
            Ok(self.matching(query))
        }

        async fn count_turns(&self, query: &TurnQuery) -> caseforge_core::Result<u64> {
            Ok(self.matching(query).len() as u64)
        }

        async fn available_model_ids(&self) -> caseforge_core::Result<Vec<String>> {
            Ok(vec!["claude-3".to_string(), "gpt-4o".to_string()])
        }

        async fn healthy(&self) -> bool {
            true
        }
    }

    fn service() -> HistoryService {
        HistoryService::new(Arc::new(FixtureSource::new()))
    }

    #[tokio::test]
    async fn search_groups_turns_into_sessions_newest_first() {
        let page = service()
            .search(&HistorySearchRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.matched_turns, 4);
        assert_eq!(page.items[0].session_id, "s_deploy");
        assert_eq!(page.items[1].session_id, "s_funds");

        let funds = &page.items[1];
        assert_eq!(funds.user_query, "Which fund is safe?");
        assert_eq!(funds.ai_response, "The bond fund is the safest option.");
        assert_eq!(funds.user_rating, Some(4));
        assert_eq!(funds.model_id.as_deref(), Some("gpt-4o"));
        assert_eq!(funds.chunk_refs, vec!["chunk_bonds".to_string()]);
    }

    #[tokio::test]
    async fn keyword_filter_narrows_to_matching_sessions() {
        let request = HistorySearchRequest {
            query: Some("fund".to_string()),
            ..HistorySearchRequest::default()
        };
        let page = service().search(&request).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.matched_turns, 2);
        assert_eq!(page.items[0].session_id, "s_funds");
    }

    #[tokio::test]
    async fn rating_filter_can_leave_partial_summaries() {
        let request = HistorySearchRequest {
            min_rating: Some(3),
            ..HistorySearchRequest::default()
        };
        let page = service().search(&request).await.unwrap();

        assert_eq!(page.total, 1);
        let summary = &page.items[0];
        assert_eq!(summary.session_id, "s_funds");
        // Only the rated assistant turn matched, so no user side exists.
        assert!(summary.user_query.is_empty());
        assert_eq!(summary.ai_response, "The bond fund is the safest option.");
    }

    #[tokio::test]
    async fn search_paginates_sessions() {
        let request = HistorySearchRequest {
            page_size: 1,
            ..HistorySearchRequest::default()
        };
        let page1 = service().search(&request).await.unwrap();
        assert_eq!(page1.total, 2);
        assert_eq!(page1.total_pages, 2);
        assert_eq!(page1.items.len(), 1);
        assert_eq!(page1.items[0].session_id, "s_deploy");

        let page2 = service()
            .search(&HistorySearchRequest {
                page: 2,
                page_size: 1,
                ..HistorySearchRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(page2.items[0].session_id, "s_funds");
    }

    #[tokio::test]
    async fn session_detail_returns_ordered_turns_or_not_found() {
        let turns = service().session_detail("s_funds").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert!(turns[0].timestamp <= turns[1].timestamp);

        let err = service().session_detail("s_ghost").await.unwrap_err();
        let domain = err.downcast_ref::<CaseforgeError>().unwrap();
        assert!(domain.is_not_found());
    }

    #[tokio::test]
    async fn model_ids_and_health_pass_through() {
        let service = service();
        assert_eq!(service.model_ids().await.unwrap(), vec!["claude-3", "gpt-4o"]);
        assert!(service.healthy().await);
    }
}
