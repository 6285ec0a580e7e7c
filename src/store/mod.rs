//! The persistence boundary of the engine.
//!
//! `WordStore` is the only collaborator the core talks to; everything else
//! (scoring, categorization, planning) is pure computation. The SQLite
//! implementation lives in [`sqlite`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::mastery::ScoreUpdate;
use crate::stats::{DailyStatistic, StatType};
use crate::types::{CategoryCounts, Word};

pub mod sqlite;

pub use sqlite::SqliteWordStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("word not found: {0}")]
    NotFound(i64),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// Insert payload for a word the user just added. The score starts at zero
/// and both counters at rest; `added_at` doubles as the initial
/// `last_trained_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWord {
    pub source_word: String,
    pub translation: String,
    pub source_language_code: String,
    pub target_language_code: String,
    pub added_at: i64,
}

/// Word persistence plus the aggregate queries the engine selects from.
///
/// `update_score` must be atomic: when the future resolves the row is
/// durable, and a cancelled call leaves the row untouched. That gives the
/// session read-after-write consistency on a single word's mastery state.
#[async_trait]
pub trait WordStore: Send + Sync {
    async fn add_word(&self, word: NewWord) -> Result<Word, StoreError>;

    async fn get_word_by_id(&self, id: i64) -> Result<Option<Word>, StoreError>;

    async fn word_exists(
        &self,
        source_word: &str,
        source_language_code: &str,
    ) -> Result<bool, StoreError>;

    async fn delete_word(&self, id: i64) -> Result<(), StoreError>;

    /// All words for a source language; `"all"` or blank returns everything.
    async fn get_words(&self, source_language_code: &str) -> Result<Vec<Word>, StoreError>;

    /// Lowest mastery first, oldest training time second. The planner layers
    /// its seeded tie-break on top of this ordering.
    async fn get_word_for_repetition(
        &self,
        source_language_code: &str,
    ) -> Result<Option<Word>, StoreError>;

    /// Priority-ordered candidate pool for the planner.
    async fn get_words_for_training(
        &self,
        source_language_code: &str,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError>;

    async fn get_new_words(
        &self,
        source_language_code: &str,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError>;

    async fn get_hard_words(
        &self,
        source_language_code: &str,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError>;

    async fn get_stable_words(
        &self,
        source_language_code: &str,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError>;

    async fn get_learned_words(
        &self,
        source_language_code: &str,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError>;

    /// Words whose review interval has elapsed at `now_ms`.
    async fn get_intelligent_words(
        &self,
        source_language_code: &str,
        now_ms: i64,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError>;

    /// Distractor translations for a quiz card: other words of the target
    /// language, the current word excluded.
    async fn get_answer_options_for_word(
        &self,
        word: &Word,
        target_language_code: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError>;

    async fn update_score(&self, update: &ScoreUpdate) -> Result<(), StoreError>;

    async fn get_category_counts(
        &self,
        source_language_code: &str,
    ) -> Result<CategoryCounts, StoreError>;

    /// Live counts feed for one language; the store pushes a fresh value
    /// after every mutation touching that language.
    async fn category_counts_feed(
        &self,
        source_language_code: &str,
    ) -> Result<watch::Receiver<CategoryCounts>, StoreError>;

    async fn record_stat(&self, date: &str, stat: StatType) -> Result<(), StoreError>;

    async fn get_statistic_for_day(
        &self,
        date: &str,
    ) -> Result<Option<DailyStatistic>, StoreError>;

    async fn get_all_statistics(&self) -> Result<Vec<DailyStatistic>, StoreError>;

    async fn was_active_on(&self, date: &str) -> Result<bool, StoreError>;
}
