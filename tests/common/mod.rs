#![allow(dead_code)]

use vocab_engine::mastery::ScoreUpdate;
use vocab_engine::store::{NewWord, SqliteWordStore, WordStore};
use vocab_engine::types::Word;

pub const FIXED_TIMESTAMP: i64 = 1_700_000_000_000;

pub async fn test_store() -> SqliteWordStore {
    SqliteWordStore::in_memory()
        .await
        .expect("in-memory store should open")
}

pub fn new_word(source: &str, translation: &str) -> NewWord {
    NewWord {
        source_word: source.to_string(),
        translation: translation.to_string(),
        source_language_code: "de".to_string(),
        target_language_code: "en".to_string(),
        added_at: FIXED_TIMESTAMP,
    }
}

/// Insert a word and push it into the wanted learning state through the
/// regular update path.
pub async fn seed_word(
    store: &SqliteWordStore,
    source: &str,
    translation: &str,
    mastery_score: i32,
    correct: i32,
    wrong: i32,
    last_trained_at: i64,
) -> Word {
    let word = store
        .add_word(new_word(source, translation))
        .await
        .expect("insert should succeed");

    if correct != 0 || wrong != 0 || mastery_score != 0 || last_trained_at != FIXED_TIMESTAMP {
        let update = ScoreUpdate {
            word_id: word.id,
            correct_count: correct,
            wrong_count: wrong,
            mastery_score,
            last_trained_at,
        };
        store
            .update_score(&update)
            .await
            .expect("seed update should succeed");
    }

    store
        .get_word_by_id(word.id)
        .await
        .expect("lookup should succeed")
        .expect("seeded word should exist")
}
