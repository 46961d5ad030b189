//! Seeded in-memory conversation warehouse.
//!
//! Stands in for the analytical store that records production
//! conversations. The corpus is generated from a fixed seed, so every
//! run sees the same sessions, ratings and chunk citations: 20
//! scripted multi-turn sessions (`session_mock_NNNN`) whose follow-up
//! questions deliberately refer back to earlier turns, plus 30
//! generated single-topic sessions (`session_gen_NNNN`).

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use caseforge_core::Result;
use caseforge_core::conversation::{
    ChunkMetadata, ChunkRecord, ConversationSource, ConversationTurn, SessionStatistics,
    TurnQuery,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const DEFAULT_SEED: u64 = 42;

const MODELS: &[&str] = &["claude-3-5-sonnet", "gemini-1.5-pro", "gpt-4o", "gpt-4o-mini"];

struct DocumentSpec {
    title: &'static str,
    source: &'static str,
    chunk_type: &'static str,
    topic: &'static str,
    chunks: &'static [&'static str],
}

/// Reference documents the chunk store is built from. Topics join the
/// documents to the sessions that cite them.
const DOCUMENTS: &[DocumentSpec] = &[
    DocumentSpec {
        title: "Savings and Deposit Products Guide",
        source: "https://docs.examplebank.com/products/savings",
        chunk_type: "guide",
        topic: "finance",
        chunks: &[
            "The Steady Growth savings plan requires a minimum deposit of 500 dollars and pays 3.2 percent interest, fixed for the first year.",
            "Term deposits lock funds for six, twelve or twenty-four months; longer terms earn a higher interest rate.",
            "Early withdrawal from a term deposit forfeits the accrued interest of the current quarter; the principal is never reduced.",
            "Deposit insurance covers balances up to 250000 dollars per account holder and institution.",
        ],
    },
    DocumentSpec {
        title: "Fund Fee and Risk Disclosures",
        source: "https://docs.examplebank.com/funds/fees",
        chunk_type: "policy",
        topic: "finance",
        chunks: &[
            "Index funds charge between 0.03 and 0.2 percent annually, while actively managed funds range from 0.5 to 1.5 percent.",
            "Every fund carries a risk rating from one (conservative) to seven (speculative), reviewed twice a year.",
            "Switching between funds of the same family is free once per calendar month; additional switches cost 10 dollars.",
        ],
    },
    DocumentSpec {
        title: "Cloud Platform Service Overview",
        source: "https://handbook.example.dev/cloud/overview",
        chunk_type: "reference",
        topic: "technology",
        chunks: &[
            "The platform exposes managed databases, object storage and a message queue; all services authenticate through the central gateway.",
            "Network traffic between regions is encrypted in transit and billed per gigabyte transferred.",
            "Service quotas default to 100 requests per second and can be raised through a support request.",
        ],
    },
    DocumentSpec {
        title: "Database Access Patterns",
        source: "https://handbook.example.dev/guides/database-access",
        chunk_type: "guide",
        topic: "programming",
        chunks: &[
            "Open one pooled connection per request and release it promptly; creating a connection per record exhausts the pool under load.",
            "Batch writes in groups of 100 records to keep transaction time short and retries cheap.",
            "Wrap migrations in a transaction where the engine supports it, and test the rollback path before deploying.",
        ],
    },
    DocumentSpec {
        title: "Event Bus Design Notes",
        source: "https://handbook.example.dev/architecture/event-bus",
        chunk_type: "design",
        topic: "architecture",
        chunks: &[
            "The event bus decouples producers from consumers; a producer publishes once and any number of consumers subscribe independently.",
            "Direct service calls give synchronous guarantees but couple the caller to the availability of the callee.",
            "Audit events are retained for 90 days and stay replayable per consumer group.",
        ],
    },
    DocumentSpec {
        title: "Credential and Secret Policy",
        source: "https://handbook.example.dev/security/credentials",
        chunk_type: "policy",
        topic: "security",
        chunks: &[
            "Service accounts use generated 32-character secrets rotated every 90 days by the secret manager.",
            "Rotation is automatic: the secret manager writes the new value and restarts dependent deployments within five minutes.",
            "Human accounts require hardware-backed two-factor authentication for production access.",
        ],
    },
    DocumentSpec {
        title: "Code Review Checklist",
        source: "https://handbook.example.dev/development/review-checklist",
        chunk_type: "checklist",
        topic: "development",
        chunks: &[
            "Every change needs one approving review; changes touching storage formats need two.",
            "Reviewers check error handling first: every fallible call must surface or log its failure.",
            "Keep pull requests under 400 changed lines where practical; split larger work into stacked changes.",
        ],
    },
    DocumentSpec {
        title: "Deployment Runbook",
        source: "https://handbook.example.dev/operations/deploy-runbook",
        chunk_type: "runbook",
        topic: "operations",
        chunks: &[
            "Push the image to the registry, then apply the staging manifest; the controller rolls pods one at a time.",
            "A rollout waits for the readiness probe before replacing the next pod; failures pause the rollout automatically.",
            "Rollback re-applies the previous manifest revision and completes in under two minutes.",
        ],
    },
];

struct ExchangeSpec {
    question: &'static str,
    answer: &'static str,
    chunk_topic: &'static str,
}

/// Scripted conversations. Follow-up questions lean on earlier turns on
/// purpose, mirroring how users actually talk to an assistant.
const SESSION_TEMPLATES: &[&[ExchangeSpec]] = &[
    &[
        ExchangeSpec {
            question: "What is the minimum deposit for the Steady Growth savings plan?",
            answer: "The Steady Growth plan requires a minimum deposit of 500 dollars and pays 3.2 percent interest.",
            chunk_topic: "finance",
        },
        ExchangeSpec {
            question: "Earlier you mentioned the interest rate, is it fixed for the whole term?",
            answer: "The rate is fixed for the first year of the deposit; afterwards it follows the market index.",
            chunk_topic: "finance",
        },
        ExchangeSpec {
            question: "What about early withdrawal?",
            answer: "Early withdrawal forfeits the accrued interest for the quarter, but the principal stays intact.",
            chunk_topic: "finance",
        },
    ],
    &[
        ExchangeSpec {
            question: "How do I deploy the reporting service to the staging cluster?",
            answer: "Push the image to the registry and apply the staging manifest; the controller rolls pods gradually.",
            chunk_topic: "operations",
        },
        ExchangeSpec {
            question: "Tell me more about the rollout strategy.",
            answer: "The rollout replaces one pod at a time and waits for the readiness probe before continuing.",
            chunk_topic: "operations",
        },
    ],
    &[
        ExchangeSpec {
            question: "Which password policy applies to service accounts?",
            answer: "Service accounts use generated 32-character secrets rotated every 90 days.",
            chunk_topic: "security",
        },
        ExchangeSpec {
            question: "You mentioned rotation, can it run without manual steps?",
            answer: "Yes, the secret manager rotates credentials and restarts dependent deployments on its own.",
            chunk_topic: "security",
        },
    ],
    &[
        ExchangeSpec {
            question: "Why does the nightly batch job fail with a database timeout?",
            answer: "The job opens one connection per record; pool exhaustion causes the timeout under load.",
            chunk_topic: "programming",
        },
        ExchangeSpec {
            question: "How do I fix the first one?",
            answer: "Reuse a pooled connection across records and batch the writes in groups of 100.",
            chunk_topic: "programming",
        },
    ],
    &[
        ExchangeSpec {
            question: "Explain the difference between the event bus and direct service calls.",
            answer: "The event bus decouples producers from consumers, while direct calls give synchronous guarantees.",
            chunk_topic: "architecture",
        },
        ExchangeSpec {
            question: "Based on that, which approach suits audit logging?",
            answer: "Audit logging suits the event bus, because consumers can be added without touching producers.",
            chunk_topic: "architecture",
        },
    ],
];

/// Standalone question/answer pairs per topic, for the generated
/// sessions.
const GENERATED_QA: &[(&str, &[(&str, &str)])] = &[
    (
        "finance",
        &[
            (
                "Which term deposit length earns the highest interest rate?",
                "The twenty-four month term deposit earns the highest rate in the current table.",
            ),
            (
                "How are fund risk ratings assigned?",
                "Each fund gets a risk rating from one to seven, reviewed twice a year.",
            ),
            (
                "Is there a fee for switching between funds?",
                "One switch per calendar month is free; each additional switch costs 10 dollars.",
            ),
        ],
    ),
    (
        "technology",
        &[
            (
                "What is the default request quota on the cloud platform?",
                "Quotas default to 100 requests per second and can be raised on request.",
            ),
            (
                "How is network traffic between regions secured?",
                "Network traffic between regions is encrypted in transit and billed per gigabyte.",
            ),
            (
                "Which managed services does the cloud platform provide?",
                "Managed databases, object storage and a message queue, all behind the central gateway.",
            ),
        ],
    ),
    (
        "programming",
        &[
            (
                "How many records should a database batch write contain?",
                "Groups of 100 records keep transactions short and retries cheap.",
            ),
            (
                "What is the recommended way to hold database connections?",
                "Take one pooled connection per request and release it promptly.",
            ),
            (
                "Should database migrations run inside a transaction?",
                "Yes, wrap migrations in a transaction and test the rollback path first.",
            ),
        ],
    ),
    (
        "architecture",
        &[
            (
                "When is an event bus better than direct service calls?",
                "Use the bus when producers must not depend on who consumes their events.",
            ),
            (
                "How long are audit events retained?",
                "Audit events stay replayable for 90 days per consumer group.",
            ),
            (
                "What coupling does a direct service call introduce?",
                "The caller becomes coupled to the availability and latency of the callee.",
            ),
        ],
    ),
    (
        "security",
        &[
            (
                "How often are service account secrets rotated?",
                "The secret manager rotates them every 90 days without manual steps.",
            ),
            (
                "What authentication is required for production access?",
                "Human accounts need hardware-backed two-factor authentication.",
            ),
            (
                "How long does a secret rotation take to propagate?",
                "Dependent deployments restart within five minutes of a rotation.",
            ),
        ],
    ),
    (
        "development",
        &[
            (
                "How many approvals does a storage format change need?",
                "Two approving reviews; ordinary changes need one.",
            ),
            (
                "What should reviewers check first in a change?",
                "Error handling: every fallible call must surface or log its failure.",
            ),
            (
                "How large should a pull request be?",
                "Keep it under 400 changed lines and split bigger work into stacked changes.",
            ),
        ],
    ),
    (
        "operations",
        &[
            (
                "What happens when a readiness probe fails during a rollout?",
                "The rollout pauses automatically before replacing the next pod.",
            ),
            (
                "How fast is a deployment rollback?",
                "Re-applying the previous manifest completes in under two minutes.",
            ),
            (
                "In what order do pods restart during a deploy?",
                "The controller replaces pods one at a time after each readiness check.",
            ),
        ],
    ),
];

pub struct MockWarehouse {
    sessions: HashMap<String, Vec<ConversationTurn>>,
    chunks: HashMap<String, ChunkRecord>,
}

impl MockWarehouse {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Builds the corpus from an explicit seed. The same seed always
    /// produces the same corpus.
    pub fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut chunks = HashMap::new();
        let mut chunks_by_topic: HashMap<&'static str, Vec<String>> = HashMap::new();
        let mut counter = 0usize;
        for document in DOCUMENTS {
            for (part, content) in document.chunks.iter().enumerate() {
                counter += 1;
                let id = format!("chunk_{counter:04}");
                chunks.insert(
                    id.clone(),
                    ChunkRecord {
                        id: id.clone(),
                        title: Some(format!("{} - part {}", document.title, part + 1)),
                        source: Some(document.source.to_string()),
                        content: (*content).to_string(),
                        similarity: Some(rng.gen_range(0.62..0.95)),
                        metadata: ChunkMetadata {
                            publish_date: Some(format!(
                                "2023-{:02}-{:02}",
                                rng.gen_range(1..=12),
                                rng.gen_range(1..=28)
                            )),
                            effective_date: None,
                            expiration_date: None,
                            chunk_type: document.chunk_type.to_string(),
                            confidence: rng.gen_range(0.70..0.96),
                            retrieval_rank: None,
                        },
                    },
                );
                chunks_by_topic.entry(document.topic).or_default().push(id);
            }
        }

        let mut sessions = HashMap::new();
        seed_template_sessions(&mut rng, &chunks_by_topic, &mut sessions);
        seed_generated_sessions(&mut rng, &chunks_by_topic, &mut sessions);

        tracing::info!(
            target: "warehouse",
            "[MockWarehouse] Seeded {} sessions and {} chunks",
            sessions.len(),
            chunks.len()
        );
        Self { sessions, chunks }
    }

    /// All seeded session ids, sorted.
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn all_turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.sessions.values().flatten()
    }

    fn matches(turn: &ConversationTurn, query: &TurnQuery) -> bool {
        let keyword_ok = query
            .keyword
            .as_ref()
            .is_none_or(|k| turn.content.to_lowercase().contains(&k.to_lowercase()));
        let model_ok = query
            .model_id
            .as_ref()
            .is_none_or(|m| turn.model_id.as_deref() == Some(m.as_str()));
        let start_ok = query.start_time.is_none_or(|s| turn.timestamp >= s);
        let end_ok = query.end_time.is_none_or(|e| turn.timestamp <= e);
        let min_ok = query
            .min_rating
            .is_none_or(|min| turn.rating.is_some_and(|r| r >= min));
        let max_ok = query
            .max_rating
            .is_none_or(|max| turn.rating.is_some_and(|r| r <= max));
        keyword_ok && model_ok && start_ok && end_ok && min_ok && max_ok
    }

    fn search(&self, query: &TurnQuery) -> Vec<ConversationTurn> {
        let mut turns: Vec<ConversationTurn> = self
            .all_turns()
            .filter(|t| Self::matches(t, query))
            .cloned()
            .collect();
        // Newest first; message ids are unique and break timestamp ties.
        turns.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.message_id.cmp(&a.message_id))
        });
        turns
    }
}

impl Default for MockWarehouse {
    fn default() -> Self {
        Self::new()
    }
}

fn seed_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

fn pick_chunks(
    rng: &mut StdRng,
    chunks_by_topic: &HashMap<&'static str, Vec<String>>,
    topic: &str,
) -> Vec<String> {
    let Some(pool) = chunks_by_topic.get(topic) else {
        return Vec::new();
    };
    let count = rng.gen_range(1..=pool.len().min(3));
    pool.choose_multiple(rng, count).cloned().collect()
}

fn seed_template_sessions(
    rng: &mut StdRng,
    chunks_by_topic: &HashMap<&'static str, Vec<String>>,
    sessions: &mut HashMap<String, Vec<ConversationTurn>>,
) {
    for i in 0..20 {
        let session_id = format!("session_mock_{:04}", i + 1);
        let template = SESSION_TEMPLATES[i % SESSION_TEMPLATES.len()];
        let base = seed_epoch() + Duration::hours(i as i64 * 6);
        let model = MODELS[rng.gen_range(0..MODELS.len())];

        let mut turns = Vec::with_capacity(template.len() * 2);
        for (j, exchange) in template.iter().enumerate() {
            let cited = pick_chunks(rng, chunks_by_topic, exchange.chunk_topic);
            let question_time = base + Duration::seconds(j as i64 * 90);

            let mut question = ConversationTurn::user(
                session_id.clone(),
                format!("{session_id}_m{:02}", turns.len() + 1),
                exchange.question,
                question_time,
            );
            question.chunk_ids = cited.clone();
            turns.push(question);

            let mut answer = ConversationTurn::assistant(
                session_id.clone(),
                format!("{session_id}_m{:02}", turns.len() + 1),
                exchange.answer,
                model,
                question_time + Duration::seconds(45),
            );
            answer.chunk_ids = cited;
            answer.token_count = Some(rng.gen_range(150..600));
            answer.processing_time_ms = Some(rng.gen_range(900..3200));
            if rng.gen_bool(0.8) {
                let rating = rng.gen_range(3..=5);
                answer.rating = Some(rating);
                if rating == 5 && rng.gen_bool(0.4) {
                    answer.feedback_text = Some("Clear and complete answer".to_string());
                }
            }
            turns.push(answer);
        }
        sessions.insert(session_id, turns);
    }
}

fn seed_generated_sessions(
    rng: &mut StdRng,
    chunks_by_topic: &HashMap<&'static str, Vec<String>>,
    sessions: &mut HashMap<String, Vec<ConversationTurn>>,
) {
    let generated_base = seed_epoch() + Duration::days(31);
    for i in 0..30 {
        let session_id = format!("session_gen_{:04}", i + 1);
        let (topic, pool) = GENERATED_QA[rng.gen_range(0..GENERATED_QA.len())];
        let base = generated_base + Duration::hours(i as i64 * 3);
        let model = MODELS[rng.gen_range(0..MODELS.len())];

        let exchange_count = rng.gen_range(1..=pool.len().min(3));
        let picked: Vec<&(&str, &str)> = pool.choose_multiple(rng, exchange_count).collect();

        let mut turns = Vec::with_capacity(picked.len() * 2);
        for (j, (question_text, answer_text)) in picked.into_iter().enumerate() {
            let cited = pick_chunks(rng, chunks_by_topic, topic);
            let question_time = base + Duration::seconds(j as i64 * 120);

            let mut question = ConversationTurn::user(
                session_id.clone(),
                format!("{session_id}_m{:02}", turns.len() + 1),
                *question_text,
                question_time,
            );
            question.chunk_ids = cited.clone();
            turns.push(question);

            let mut answer = ConversationTurn::assistant(
                session_id.clone(),
                format!("{session_id}_m{:02}", turns.len() + 1),
                *answer_text,
                model,
                question_time + Duration::seconds(60),
            );
            answer.chunk_ids = cited;
            answer.token_count = Some(rng.gen_range(120..500));
            answer.processing_time_ms = Some(rng.gen_range(800..3000));
            if rng.gen_bool(0.7) {
                let rating = rng.gen_range(1..=5);
                answer.rating = Some(rating);
                if rating <= 2 && rng.gen_bool(0.5) {
                    answer.feedback_text =
                        Some("The answer did not address my question".to_string());
                }
            }
            turns.push(answer);
        }
        sessions.insert(session_id, turns);
    }
}

#[async_trait]
impl ConversationSource for MockWarehouse {
    async fn session_turns(&self, session_id: &str) -> Result<Vec<ConversationTurn>> {
        Ok(self.sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn chunks_by_ids(&self, chunk_ids: &[String]) -> Result<Vec<ChunkRecord>> {
        Ok(chunk_ids
            .iter()
            .filter_map(|id| self.chunks.get(id).cloned())
            .collect())
    }

    async fn session_statistics(&self, session_id: &str) -> Result<Option<SessionStatistics>> {
        let Some(turns) = self.sessions.get(session_id) else {
            return Ok(None);
        };
        if turns.is_empty() {
            return Ok(None);
        }

        let ratings: Vec<f64> = turns.iter().filter_map(|t| t.rating.map(f64::from)).collect();
        let mut models_used: Vec<String> = Vec::new();
        for turn in turns {
            if let Some(model) = &turn.model_id {
                if !models_used.contains(model) {
                    models_used.push(model.clone());
                }
            }
        }

        Ok(Some(SessionStatistics {
            session_id: session_id.to_string(),
            total_messages: turns.len(),
            user_messages: turns.iter().filter(|t| t.is_user()).count(),
            assistant_messages: turns.iter().filter(|t| t.is_assistant()).count(),
            average_rating: if ratings.is_empty() {
                None
            } else {
                Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
            },
            models_used,
            total_tokens: turns.iter().filter_map(|t| t.token_count).map(u64::from).sum(),
            total_processing_time_ms: turns.iter().filter_map(|t| t.processing_time_ms).sum(),
            first_message: turns.first().map(|t| t.content.clone()),
            last_message: turns.last().map(|t| t.content.clone()),
            first_message_time: turns.first().map(|t| t.timestamp),
            last_message_time: turns.last().map(|t| t.timestamp),
        }))
    }

    async fn search_turns(&self, query: &TurnQuery) -> Result<Vec<ConversationTurn>> {
        let turns = self.search(query);
        let offset = query.offset as usize;
        let limited: Vec<ConversationTurn> = match query.limit {
            Some(limit) => turns.into_iter().skip(offset).take(limit as usize).collect(),
            None => turns.into_iter().skip(offset).collect(),
        };
        Ok(limited)
    }

    async fn count_turns(&self, query: &TurnQuery) -> Result<u64> {
        Ok(self
            .all_turns()
            .filter(|t| Self::matches(t, query))
            .count() as u64)
    }

    async fn available_model_ids(&self) -> Result<Vec<String>> {
        let models: BTreeSet<String> = self
            .all_turns()
            .filter_map(|t| t.model_id.clone())
            .collect();
        Ok(models.into_iter().collect())
    }

    async fn healthy(&self) -> bool {
        true
    }
}
