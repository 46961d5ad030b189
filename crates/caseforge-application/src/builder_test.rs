use super::*;
use caseforge_core::conversation::ChunkMetadata;
use chrono::{DateTime, Duration, TimeZone, Utc};

fn ts(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap() + Duration::seconds(offset_secs)
}

fn user(n: u32, content: &str) -> ConversationTurn {
    ConversationTurn::user("session_test", format!("msg_{n:02}"), content, ts(n as i64 * 30))
}

fn assistant(n: u32, content: &str) -> ConversationTurn {
    ConversationTurn::assistant(
        "session_test",
        format!("msg_{n:02}"),
        content,
        "gpt-4o",
        ts(n as i64 * 30),
    )
}

fn chunk(id: &str, content: &str, similarity: Option<f64>) -> ChunkRecord {
    ChunkRecord {
        id: id.to_string(),
        title: Some(format!("{id} title")),
        source: Some("https://docs.example.com/guide".to_string()),
        content: content.to_string(),
        similarity,
        metadata: ChunkMetadata::default(),
    }
}

fn builder() -> TestCaseBuilder {
    TestCaseBuilder::new(ImportConfig::default())
}

fn no_chunks() -> HashMap<String, ChunkRecord> {
    HashMap::new()
}

/// Three finance exchanges; the last query refers back to earlier turns.
fn funds_session() -> Vec<ConversationTurn> {
    let mut a1 = assistant(2, "Index funds track a market index at low cost.");
    a1.rating = Some(5);
    let mut a2 = assistant(4, "Active funds charge higher fees for managed selection.");
    a2.rating = Some(4);
    let mut a3 = assistant(6, "Index funds are usually the safer long-term choice.");
    a3.rating = Some(5);
    vec![
        user(1, "Which investment funds have low fees?"),
        a1,
        user(3, "How do index funds differ from active funds?"),
        a2,
        user(5, "Earlier you mentioned funds, which one is safer?"),
        a3,
    ]
}

#[test]
fn rejects_session_without_user_turns() {
    let turns = vec![assistant(1, "Unprompted answer.")];
    let err = builder().build("session_test", &turns, &no_chunks()).unwrap_err();
    assert!(err.is_empty_session());

    let err = builder().build("session_test", &[], &no_chunks()).unwrap_err();
    assert!(err.is_empty_session());
}

#[test]
fn rejects_session_without_assistant_response() {
    let turns = vec![user(1, "Is anyone there?")];
    let err = builder().build("session_test", &turns, &no_chunks()).unwrap_err();
    assert!(err.is_no_assistant_response());
}

#[test]
fn current_query_is_the_raw_last_user_turn() {
    let turns = funds_session();
    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    assert_eq!(
        draft.input.current_query.text,
        "Earlier you mentioned funds, which one is safer?"
    );
    assert_eq!(draft.input.current_query.timestamp, ts(5 * 30));
}

#[test]
fn history_pairs_queries_with_responses() {
    let turns = funds_session();
    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    let history = &draft.input.conversation_history;
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].turn, 1);
    assert_eq!(
        history[0].query.as_deref(),
        Some("Which investment funds have low fees?")
    );
    assert_eq!(
        history[0].response.as_deref(),
        Some("Index funds track a market index at low cost.")
    );
    assert_eq!(history[1].turn, 2);
    assert_eq!(history[2].turn, 3);
}

#[test]
fn late_referential_query_gains_context_prefix_in_history() {
    let turns = funds_session();
    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    let rebuilt = draft.input.conversation_history[2].query.as_deref().unwrap();
    assert!(rebuilt.starts_with("[context: "));
    assert!(rebuilt.contains("funds"));
    assert!(rebuilt.ends_with("\n\nEarlier you mentioned funds, which one is safer?"));

    // Earlier queries stay untouched: not enough history at their index.
    let first = draft.input.conversation_history[0].query.as_deref().unwrap();
    assert!(!first.starts_with("[context:"));
}

#[test]
fn unanswered_query_is_replaced_by_the_next_one() {
    let turns = vec![
        user(1, "First attempt that never got answered"),
        user(2, "Second attempt at the question"),
        assistant(3, "Here is the answer."),
    ];
    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    let history = &draft.input.conversation_history;
    assert_eq!(history.len(), 1);
    assert_eq!(
        history[0].query.as_deref(),
        Some("Second attempt at the question")
    );
    assert_eq!(history[0].response.as_deref(), Some("Here is the answer."));
}

#[test]
fn orphan_assistant_turn_is_dropped() {
    let turns = vec![
        assistant(1, "Greeting nobody asked for."),
        user(2, "An actual question about deposits"),
        assistant(3, "An actual answer."),
    ];
    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    assert_eq!(draft.input.conversation_history.len(), 1);
    assert_eq!(
        draft.input.conversation_history[0].response.as_deref(),
        Some("An actual answer.")
    );
}

#[test]
fn trailing_user_turn_stays_as_open_record() {
    let turns = vec![
        user(1, "What does the insurance cover?"),
        assistant(2, "It covers accidental damage."),
        user(3, "And water damage?"),
    ];
    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    let history = &draft.input.conversation_history;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, TurnRole::User);
    assert!(history[1].response.is_none());
    assert_eq!(draft.input.current_query.text, "And water damage?");
    // Execution still comes from the last assistant turn.
    assert_eq!(draft.execution.actual.response, "It covers accidental damage.");
}

#[test]
fn chunk_resolution_keeps_citation_order_ranks() {
    let mut turns = funds_session();
    let last_user_index = turns.len() - 2;
    turns[last_user_index].chunk_ids = vec![
        "chunk_a".to_string(),
        "chunk_missing".to_string(),
        "chunk_b".to_string(),
    ];

    let mut chunk_a = chunk("chunk_a", "Fund fee tables are published quarterly.", Some(0.91));
    chunk_a.title = None;
    chunk_a.source = None;
    let chunk_b = chunk("chunk_b", "Risk ratings range from one to seven.", None);
    let mut chunks = HashMap::new();
    chunks.insert(chunk_a.id.clone(), chunk_a);
    chunks.insert(chunk_b.id.clone(), chunk_b);

    let draft = builder().build("session_test", &turns, &chunks).unwrap();
    let resolved = &draft.input.current_chunks;

    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved[0].id, "chunk_a");
    assert_eq!(resolved[0].metadata.retrieval_rank, Some(1));
    assert!((resolved[0].metadata.confidence - 0.91).abs() < f64::EPSILON);
    assert_eq!(resolved[0].title, "Fund fee tables are published quarterly.");
    assert_eq!(resolved[0].source, "unknown source");

    // The unresolved id leaves a gap instead of renumbering.
    assert_eq!(resolved[1].id, "chunk_b");
    assert_eq!(resolved[1].metadata.retrieval_rank, Some(3));
    assert!((resolved[1].metadata.confidence - 0.8).abs() < f64::EPSILON);
    assert_eq!(resolved[1].title, "chunk_b title");
}

#[test]
fn execution_falls_back_when_metrics_are_missing() {
    let turns = vec![
        user(1, "Explain deposit insurance limits"),
        assistant(2, "Deposits are insured up to a fixed ceiling."),
    ];
    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    let perf = &draft.execution.actual.performance;
    assert!((perf.total_response_time - 2.0).abs() < f64::EPSILON);
    assert!((perf.retrieval_time - 0.3).abs() < f64::EPSILON);
    assert!((perf.generation_time - 1.7).abs() < 1e-9);
    assert_eq!(perf.tokens_used, 300);
    assert_eq!(perf.chunks_considered, 0);
    assert!(draft.execution.actual.retrieval_quality.is_none());
    assert!(draft.execution.user_feedback.is_none());
}

#[test]
fn execution_uses_recorded_metrics() {
    let mut answer = assistant(2, "The limit is 250000 dollars per holder.");
    answer.processing_time_ms = Some(2500);
    answer.token_count = Some(420);
    answer.chunk_ids = vec!["chunk_a".to_string(), "chunk_b".to_string()];
    answer.rating = Some(2);
    answer.feedback_text = Some("Answer missed the point".to_string());
    let turns = vec![user(1, "Explain deposit insurance limits"), answer];

    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    let perf = &draft.execution.actual.performance;
    assert!((perf.total_response_time - 2.5).abs() < f64::EPSILON);
    assert!((perf.generation_time - 2.2).abs() < 1e-9);
    assert_eq!(perf.tokens_used, 420);
    assert_eq!(perf.chunks_considered, 2);

    let quality = draft.execution.actual.retrieval_quality.as_ref().unwrap();
    assert!((quality.max_similarity - 0.85).abs() < f64::EPSILON);

    let feedback = draft.execution.user_feedback.as_ref().unwrap();
    assert_eq!(feedback.rating, 2);
    assert_eq!(feedback.category, FeedbackCategory::Negative);
    assert_eq!(feedback.comment, "Answer missed the point");
}

#[test]
fn feedback_category_tracks_rating() {
    let build_with_rating = |rating: u8| {
        let mut answer = assistant(2, "A rated answer.");
        answer.rating = Some(rating);
        let turns = vec![user(1, "A question worth rating"), answer];
        builder().build("session_test", &turns, &no_chunks()).unwrap()
    };

    let positive = build_with_rating(4).execution.user_feedback.unwrap();
    assert_eq!(positive.category, FeedbackCategory::Positive);
    let neutral = build_with_rating(3).execution.user_feedback.unwrap();
    assert_eq!(neutral.category, FeedbackCategory::Neutral);
    let negative = build_with_rating(1).execution.user_feedback.unwrap();
    assert_eq!(negative.category, FeedbackCategory::Negative);
}

#[test]
fn name_prefers_the_first_user_query() {
    let turns = vec![
        user(1, "Could you walk me through the mortgage refinancing paperwork step by step"),
        assistant(2, "Certainly, start with the payoff statement."),
    ];
    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    assert!(draft.name.starts_with("Could you walk me through"));
    assert_eq!(draft.name.chars().count(), 53);
    assert!(draft.name.ends_with("..."));
}

#[test]
fn blank_first_query_falls_back_to_domain_name() {
    let turns = vec![
        user(1, "   "),
        assistant(2, "Hello!"),
        user(3, "hello there friend"),
        assistant(4, "Hi again."),
    ];
    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    assert_eq!(draft.name, "general conversation test - general");
    assert_eq!(draft.domain, "general");
}

#[test]
fn description_lists_session_signals() {
    let mut a1 = assistant(2, "Stocks are shares of a company.");
    a1.rating = Some(4);
    let mut a2 = assistant(4, "Bonds pay fixed interest.");
    a2.rating = Some(5);
    let turns = vec![
        user(1, "What is a stock?"),
        a1,
        user(3, "What is a bond, in terms of interest rate?"),
        a2,
    ];
    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    assert!(draft.description.contains("conversation with 4 messages"));
    assert!(draft.description.contains("primary model: gpt-4o"));
    assert!(draft.description.contains("average rating: 4.5/5"));
    assert!(draft.description.contains("multi-turn conversation"));
    assert!(!draft.description.contains("context references"));
    assert!(draft.description.contains("topics: finance"));
}

#[test]
fn tags_follow_session_quality() {
    let turns = funds_session();
    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    let names: Vec<&str> = draft.tags.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"multi-turn"));
    assert!(names.contains(&"context-understanding"));
    assert!(names.contains(&"high-quality"));
    assert!(names.contains(&"complexity:medium"));
    assert!(names.contains(&"finance"));

    let finance = draft.tags.iter().find(|t| t.name == "finance").unwrap();
    assert_eq!(finance.color, "gold");
}

#[test]
fn tag_generation_can_be_disabled() {
    let config = ImportConfig {
        auto_generate_tags: false,
        ..ImportConfig::default()
    };
    let draft = TestCaseBuilder::new(config)
        .build("session_test", &funds_session(), &no_chunks())
        .unwrap();
    assert!(draft.tags.is_empty());
}

#[test]
fn analysis_block_respects_config_switch() {
    // Analysis is off by default.
    let without = builder()
        .build("session_test", &funds_session(), &no_chunks())
        .unwrap();
    assert!(without.analysis.is_none());

    let with = TestCaseBuilder::new(ImportConfig {
        include_analysis: true,
        ..ImportConfig::default()
    })
    .build("session_test", &funds_session(), &no_chunks())
    .unwrap();
    let analysis = with.analysis.unwrap();
    // Average rating 14/3 is well above 4.0.
    assert_eq!(analysis.issue_type, "good_example");
    assert!(analysis.notes.contains("session_test"));
    assert!(analysis
        .acceptance_criteria
        .contains("3. Earlier conversation references are resolved correctly"));
    assert!((analysis.quality_scores.context_understanding - 4.0).abs() < f64::EPSILON);
    assert!((analysis.quality_scores.citation_quality - 2.0).abs() < f64::EPSILON);
}

#[test]
fn draft_carries_config_defaults_and_test_config() {
    let turns = funds_session();
    let draft = builder().build("session_test", &turns, &no_chunks()).unwrap();

    assert_eq!(draft.owner, "system");
    assert_eq!(draft.source_session, "session_test");
    assert_eq!(draft.test_config.model.name, "gpt-4o");
    assert_eq!(draft.test_config.model.version, "latest");
    assert_eq!(draft.test_config.retrieval.top_k, 5);
    assert!((draft.test_config.model.params.temperature - 0.0).abs() < f64::EPSILON);
}
