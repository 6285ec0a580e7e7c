//! End-to-end tests for the repetition session state machine against the
//! SQLite store.

mod common;

use std::sync::Arc;

use common::{seed_word, test_store, FIXED_TIMESTAMP};

use vocab_engine::clock::FixedClock;
use vocab_engine::config::EngineConfig;
use vocab_engine::planner::SelectionPlanner;
use vocab_engine::session::{
    RepetitionSession, RepetitionState, SegmentState, SessionError, SessionFailure,
};
use vocab_engine::store::{SqliteWordStore, WordStore};
use vocab_engine::types::{WordCategory, ExerciseType};

const NOW: i64 = FIXED_TIMESTAMP + 60_000;

fn session(store: Arc<SqliteWordStore>, seed: u64) -> RepetitionSession {
    RepetitionSession::new(
        store,
        Arc::new(FixedClock::new(NOW)),
        SelectionPlanner::with_seed(seed),
        EngineConfig::default(),
        "de",
        "en",
    )
}

fn content_of(state: &RepetitionState) -> &vocab_engine::session::ContentState {
    match state {
        RepetitionState::Content(content) => content,
        other => panic!("expected Content, got {other:?}"),
    }
}

fn correct_index(content: &vocab_engine::session::ContentState) -> usize {
    content
        .answer_options
        .iter()
        .position(|option| *option == content.word.translation)
        .expect("options must contain the correct translation")
}

fn wrong_index(content: &vocab_engine::session::ContentState) -> usize {
    content
        .answer_options
        .iter()
        .position(|option| *option != content.word.translation)
        .expect("options must contain a distractor")
}

#[tokio::test]
async fn correct_quiz_answer_moves_hard_word_to_stable() {
    let store = Arc::new(test_store().await);
    let word = seed_word(&store, "Haus", "house", 38, 3, 5, FIXED_TIMESTAMP).await;
    seed_word(&store, "Hund", "dog", 0, 0, 0, FIXED_TIMESTAMP).await;
    seed_word(&store, "Baum", "tree", 0, 0, 0, FIXED_TIMESTAMP).await;

    let mut session = session(Arc::clone(&store), 1);
    session.start(WordCategory::Hard).await.expect("start");

    let content = content_of(session.state()).clone();
    assert_eq!(content.word.id, word.id);
    assert_eq!(content.total_steps, 1);

    let index = correct_index(&content);
    session.submit_answer(index).await.expect("answer");

    let answered = content_of(session.state());
    assert_eq!(answered.selected_answer_index, Some(index));
    assert_eq!(answered.is_answer_correct, Some(true));
    assert_eq!(answered.word.mastery_score, 48);
    assert_eq!(answered.segment_states[0], SegmentState::Correct);

    // Persisted: counters bumped, score clamped band crossed, timestamp set.
    let stored = store
        .get_word_by_id(word.id)
        .await
        .expect("lookup")
        .expect("present");
    assert_eq!(stored.correct_answer_count, 4);
    assert_eq!(stored.wrong_answer_count, 5);
    assert_eq!(stored.mastery_score, 48);
    assert_eq!(stored.last_trained_at, NOW);
    assert_eq!(
        vocab_engine::categorizer::categorize(&stored),
        WordCategory::Stable
    );

    // The day's statistic followed the answer.
    let day = vocab_engine::stats::day_key(NOW);
    let stats = store
        .get_statistic_for_day(&day)
        .await
        .expect("query")
        .expect("present");
    assert_eq!(stats.correct_answers, 1);
    assert_eq!(stats.wrong_answers, 0);
}

#[tokio::test]
async fn second_answer_on_the_same_card_is_a_no_op() {
    let store = Arc::new(test_store().await);
    let word = seed_word(&store, "Haus", "house", 38, 3, 5, FIXED_TIMESTAMP).await;
    seed_word(&store, "Hund", "dog", 0, 0, 0, FIXED_TIMESTAMP).await;

    let mut session = session(Arc::clone(&store), 2);
    session.start(WordCategory::Hard).await.expect("start");

    let content = content_of(session.state()).clone();
    let index = correct_index(&content);
    session.submit_answer(index).await.expect("first answer");
    session
        .submit_answer(wrong_index(&content))
        .await
        .expect("second answer is silently ignored");

    let answered = content_of(session.state());
    assert_eq!(answered.selected_answer_index, Some(index));
    assert_eq!(answered.is_answer_correct, Some(true));

    let stored = store.get_word_by_id(word.id).await.unwrap().unwrap();
    assert_eq!(stored.correct_answer_count, 4, "no double scoring");
    assert_eq!(stored.mastery_score, 48);
}

#[tokio::test]
async fn out_of_bounds_answer_is_rejected_without_mutation() {
    let store = Arc::new(test_store().await);
    let word = seed_word(&store, "Haus", "house", 38, 3, 5, FIXED_TIMESTAMP).await;

    let mut session = session(Arc::clone(&store), 3);
    session.start(WordCategory::Hard).await.expect("start");

    let option_count = content_of(session.state()).answer_options.len();
    let err = session
        .submit_answer(option_count + 3)
        .await
        .expect_err("index past the options");
    assert!(matches!(
        err,
        SessionError::InvalidAnswerIndex { index, .. } if index == option_count + 3
    ));

    let content = content_of(session.state());
    assert_eq!(content.selected_answer_index, None);
    let stored = store.get_word_by_id(word.id).await.unwrap().unwrap();
    assert_eq!(stored.mastery_score, 38);
    assert_eq!(stored.correct_answer_count, 3);
}

#[tokio::test]
async fn empty_pool_is_a_terminal_state_not_an_error() {
    let store = Arc::new(test_store().await);
    let mut session = session(store, 4);

    session
        .start(WordCategory::Learned)
        .await
        .expect("empty pool must not error");
    assert!(matches!(
        session.state(),
        RepetitionState::Failed(SessionFailure::EmptyPool)
    ));
}

#[tokio::test]
async fn finished_round_offers_a_mistakes_review() {
    let store = Arc::new(test_store().await);
    seed_word(&store, "eins", "one", 10, 1, 2, FIXED_TIMESTAMP).await;
    seed_word(&store, "zwei", "two", 12, 1, 2, FIXED_TIMESTAMP).await;
    seed_word(&store, "drei", "three", 0, 0, 0, FIXED_TIMESTAMP).await;

    let mut session = session(Arc::clone(&store), 5);
    session.start(WordCategory::Hard).await.expect("start");
    assert_eq!(content_of(session.state()).total_steps, 2);

    // First card wrong, second card correct.
    let first = content_of(session.state()).clone();
    let mistaken_id = first.word.id;
    session
        .submit_answer(wrong_index(&first))
        .await
        .expect("answer");
    session.next_word().await;

    let second = content_of(session.state()).clone();
    session
        .submit_answer(correct_index(&second))
        .await
        .expect("answer");
    session.next_word().await;

    let summary = match session.state() {
        RepetitionState::Finished(summary) => summary.clone(),
        other => panic!("expected Finished, got {other:?}"),
    };
    assert_eq!(summary.total_correct, 1);
    assert_eq!(summary.total_wrong, 1);
    assert_eq!(summary.mastery_earned, i64::from(ExerciseType::Quiz.weight()));
    assert!(summary.has_wrong_answers);

    // The review round replays exactly the mistaken word, with fresh state.
    session.start_mistakes_review();
    let review = content_of(session.state()).clone();
    assert_eq!(review.word.id, mistaken_id);
    assert_eq!(review.total_steps, 1);
    assert_eq!(
        review.word.wrong_answer_count, 3,
        "review card reflects the persisted counters"
    );

    session
        .submit_answer(correct_index(&review))
        .await
        .expect("answer");
    session.next_word().await;
    let review_summary = match session.state() {
        RepetitionState::Finished(summary) => summary.clone(),
        other => panic!("expected Finished, got {other:?}"),
    };
    assert_eq!(review_summary.total_correct, 1);
    assert!(!review_summary.has_wrong_answers);
}

#[tokio::test]
async fn persistence_failure_surfaces_as_the_error_state() {
    let store = Arc::new(test_store().await);
    seed_word(&store, "Haus", "house", 38, 3, 5, FIXED_TIMESTAMP).await;

    let mut session = session(Arc::clone(&store), 6);
    session.start(WordCategory::Hard).await.expect("start");
    let content = content_of(session.state()).clone();

    // Pull the table out from under the session to force a write failure.
    sqlx::query("ALTER TABLE \"words\" RENAME TO \"words_gone\"")
        .execute(store.pool())
        .await
        .expect("rename");

    let err = session
        .submit_answer(correct_index(&content))
        .await
        .expect_err("write must fail");
    assert!(matches!(err, SessionError::Persistence(_)));
    assert!(matches!(
        session.state(),
        RepetitionState::Failed(SessionFailure::Persistence { .. })
    ));
}

#[tokio::test]
async fn single_card_picks_the_worst_known_word() {
    let store = Arc::new(test_store().await);
    seed_word(&store, "eins", "one", 60, 5, 1, FIXED_TIMESTAMP - 10).await;
    let weakest = seed_word(&store, "zwei", "two", 5, 0, 4, FIXED_TIMESTAMP - 500).await;
    seed_word(&store, "drei", "three", 30, 2, 2, FIXED_TIMESTAMP - 200).await;

    let mut session = session(Arc::clone(&store), 7);
    let card = session
        .single_card()
        .await
        .expect("query")
        .expect("pool is not empty");
    assert_eq!(card.word.id, weakest.id);
    assert!(card.answer_options.contains(&card.word.translation));
    assert!(card.answer_options.len() >= 2);
}

#[tokio::test]
async fn single_card_on_empty_pool_is_none() {
    let store = Arc::new(test_store().await);
    let mut session = session(store, 8);
    assert!(session.single_card().await.expect("query").is_none());
}

#[tokio::test]
async fn intelligent_session_only_serves_due_words() {
    let store = Arc::new(test_store().await);
    // Trained just now: nothing is due yet.
    seed_word(&store, "frisch", "fresh", 50, 3, 1, NOW - 1000).await;

    let mut session = session(Arc::clone(&store), 9);
    session
        .start(WordCategory::Intelligent)
        .await
        .expect("start");
    assert!(matches!(
        session.state(),
        RepetitionState::Failed(SessionFailure::EmptyPool)
    ));

    // An overdue word makes the session start.
    seed_word(
        &store,
        "alt",
        "old",
        50,
        3,
        1,
        NOW - 2 * 24 * 3_600_000,
    )
    .await;
    session
        .start(WordCategory::Intelligent)
        .await
        .expect("start");
    let content = content_of(session.state());
    assert_eq!(content.word.source_word, "alt");
}
