use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tokio::sync::{watch, RwLock};

use crate::mastery::ScoreUpdate;
use crate::stats::{DailyStatistic, StatType};
use crate::store::{NewWord, StoreError, WordStore};
use crate::types::{CategoryCounts, Word};

const SCHEMA: &str = include_str!("../../sql/schema.sql");

// Matching bucket predicates live in categorizer.rs; the two must agree.
const HARD_PREDICATE: &str =
    r#"("correct_count" + "wrong_count") > 0 AND "mastery_score" < 40"#;
const LEARNED_PREDICATE: &str =
    r#"("correct_count" + "wrong_count") > 0 AND "mastery_score" >= 80 AND "wrong_count" = 0"#;
const STABLE_PREDICATE: &str = r#"("correct_count" + "wrong_count") > 0 AND "mastery_score" >= 40
      AND NOT ("mastery_score" >= 80 AND "wrong_count" = 0)"#;
const REVIEW_INTERVAL_CASE: &str = r#"CASE
      WHEN "mastery_score" <= 20 THEN 14400000
      WHEN "mastery_score" <= 40 THEN 43200000
      WHEN "mastery_score" <= 60 THEN 86400000
      WHEN "mastery_score" <= 80 THEN 259200000
      ELSE 604800000
    END"#;

const WORD_COLUMNS: &str = r#""id","source_word","translation","source_language_code",
    "target_language_code","correct_count","wrong_count","mastery_score","added_at","last_trained_at""#;

/// SQLite-backed word store. One pool, schema applied on connect, and a
/// watch channel per language for the live category-count feed.
pub struct SqliteWordStore {
    pool: SqlitePool,
    counts_feeds: RwLock<HashMap<String, watch::Sender<CategoryCounts>>>,
}

impl SqliteWordStore {
    pub async fn connect(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database. Pinned to a single connection, otherwise
    /// every pooled connection would see its own empty database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        run_migrations(&pool).await?;
        Ok(Self {
            pool,
            counts_feeds: RwLock::new(HashMap::new()),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn load_category_counts(
        &self,
        source_language_code: &str,
    ) -> Result<CategoryCounts, StoreError> {
        let sql = format!(
            r#"
            SELECT
              COUNT(*) as "total",
              COALESCE(SUM(CASE WHEN ("correct_count" + "wrong_count") = 0 THEN 1 ELSE 0 END), 0) as "new_count",
              COALESCE(SUM(CASE WHEN {HARD_PREDICATE} THEN 1 ELSE 0 END), 0) as "hard_count",
              COALESCE(SUM(CASE WHEN {STABLE_PREDICATE} THEN 1 ELSE 0 END), 0) as "stable_count",
              COALESCE(SUM(CASE WHEN {LEARNED_PREDICATE} THEN 1 ELSE 0 END), 0) as "learned_count"
            FROM "words"
            WHERE "source_language_code" = ?
            "#
        );
        let row = sqlx::query(&sql)
            .bind(source_language_code)
            .fetch_one(&self.pool)
            .await?;

        Ok(CategoryCounts {
            new_count: row.try_get("new_count").unwrap_or(0),
            hard_count: row.try_get("hard_count").unwrap_or(0),
            stable_count: row.try_get("stable_count").unwrap_or(0),
            learned_count: row.try_get("learned_count").unwrap_or(0),
            total_count: row.try_get("total").unwrap_or(0),
        })
    }

    /// Push fresh counts to an existing feed. Languages nobody subscribed to
    /// are skipped.
    async fn refresh_counts(&self, source_language_code: &str) {
        {
            let feeds = self.counts_feeds.read().await;
            if !feeds.contains_key(source_language_code) {
                return;
            }
        }

        match self.load_category_counts(source_language_code).await {
            Ok(counts) => {
                let feeds = self.counts_feeds.read().await;
                if let Some(sender) = feeds.get(source_language_code) {
                    sender.send_replace(counts);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, language = source_language_code, "category count refresh failed");
            }
        }
    }

    async fn language_of(&self, word_id: i64) -> Result<Option<String>, StoreError> {
        let language: Option<String> =
            sqlx::query_scalar(r#"SELECT "source_language_code" FROM "words" WHERE "id" = ?"#)
                .bind(word_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(language)
    }

    async fn select_words(
        &self,
        predicate: &str,
        order: &str,
        source_language_code: &str,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError> {
        let sql = format!(
            r#"SELECT {WORD_COLUMNS} FROM "words"
               WHERE "source_language_code" = ? AND {predicate}
               ORDER BY {order} LIMIT ?"#
        );
        let rows = sqlx::query(&sql)
            .bind(source_language_code)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(map_word_row).collect())
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA.split(';') {
        let sql: String = statement
            .lines()
            .filter(|line| !line.trim_start().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = sql.trim();
        if trimmed.is_empty() {
            continue;
        }
        sqlx::query(trimmed).execute(pool).await?;
    }
    tracing::debug!("sqlite schema applied");
    Ok(())
}

fn map_word_row(row: &SqliteRow) -> Word {
    Word {
        id: row.try_get("id").unwrap_or_default(),
        source_word: row.try_get("source_word").unwrap_or_default(),
        translation: row.try_get("translation").unwrap_or_default(),
        source_language_code: row.try_get("source_language_code").unwrap_or_default(),
        target_language_code: row.try_get("target_language_code").unwrap_or_default(),
        correct_answer_count: row.try_get("correct_count").unwrap_or(0),
        wrong_answer_count: row.try_get("wrong_count").unwrap_or(0),
        mastery_score: row.try_get("mastery_score").unwrap_or(0),
        added_at: row.try_get("added_at").unwrap_or(0),
        last_trained_at: row.try_get("last_trained_at").unwrap_or(0),
    }
}

#[async_trait]
impl WordStore for SqliteWordStore {
    async fn add_word(&self, word: NewWord) -> Result<Word, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO "words"
              ("source_word","translation","source_language_code","target_language_code",
               "correct_count","wrong_count","mastery_score","added_at","last_trained_at")
            VALUES (?, ?, ?, ?, 0, 0, 0, ?, ?)
            "#,
        )
        .bind(&word.source_word)
        .bind(&word.translation)
        .bind(&word.source_language_code)
        .bind(&word.target_language_code)
        .bind(word.added_at)
        .bind(word.added_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.refresh_counts(&word.source_language_code).await;

        Ok(Word {
            id,
            source_word: word.source_word,
            translation: word.translation,
            source_language_code: word.source_language_code,
            target_language_code: word.target_language_code,
            correct_answer_count: 0,
            wrong_answer_count: 0,
            mastery_score: 0,
            added_at: word.added_at,
            last_trained_at: word.added_at,
        })
    }

    async fn get_word_by_id(&self, id: i64) -> Result<Option<Word>, StoreError> {
        let sql = format!(r#"SELECT {WORD_COLUMNS} FROM "words" WHERE "id" = ? LIMIT 1"#);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(map_word_row))
    }

    async fn word_exists(
        &self,
        source_word: &str,
        source_language_code: &str,
    ) -> Result<bool, StoreError> {
        let exists: i64 = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
              SELECT 1 FROM "words"
              WHERE "source_word" = ? AND "source_language_code" = ?
            )
            "#,
        )
        .bind(source_word)
        .bind(source_language_code)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    async fn delete_word(&self, id: i64) -> Result<(), StoreError> {
        let Some(language) = self.language_of(id).await? else {
            return Ok(());
        };
        sqlx::query(r#"DELETE FROM "words" WHERE "id" = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.refresh_counts(&language).await;
        Ok(())
    }

    async fn get_words(&self, source_language_code: &str) -> Result<Vec<Word>, StoreError> {
        let all = source_language_code.trim().is_empty()
            || source_language_code.eq_ignore_ascii_case("all");

        let rows = if all {
            let sql = format!(r#"SELECT {WORD_COLUMNS} FROM "words" ORDER BY "added_at" ASC"#);
            sqlx::query(&sql).fetch_all(&self.pool).await?
        } else {
            let sql = format!(
                r#"SELECT {WORD_COLUMNS} FROM "words"
                   WHERE "source_language_code" = ? ORDER BY "added_at" ASC"#
            );
            sqlx::query(&sql)
                .bind(source_language_code)
                .fetch_all(&self.pool)
                .await?
        };
        Ok(rows.iter().map(map_word_row).collect())
    }

    async fn get_word_for_repetition(
        &self,
        source_language_code: &str,
    ) -> Result<Option<Word>, StoreError> {
        let sql = format!(
            r#"SELECT {WORD_COLUMNS} FROM "words"
               WHERE "source_language_code" = ?
               ORDER BY "mastery_score" ASC, "last_trained_at" ASC
               LIMIT 1"#
        );
        let row = sqlx::query(&sql)
            .bind(source_language_code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_word_row))
    }

    async fn get_words_for_training(
        &self,
        source_language_code: &str,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError> {
        self.select_words(
            "1 = 1",
            r#""mastery_score" ASC, "last_trained_at" ASC"#,
            source_language_code,
            limit,
        )
        .await
    }

    async fn get_new_words(
        &self,
        source_language_code: &str,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError> {
        self.select_words(
            r#"("correct_count" + "wrong_count") = 0"#,
            r#""added_at" ASC"#,
            source_language_code,
            limit,
        )
        .await
    }

    async fn get_hard_words(
        &self,
        source_language_code: &str,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError> {
        self.select_words(
            HARD_PREDICATE,
            r#""mastery_score" ASC, "last_trained_at" ASC"#,
            source_language_code,
            limit,
        )
        .await
    }

    async fn get_stable_words(
        &self,
        source_language_code: &str,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError> {
        self.select_words(
            STABLE_PREDICATE,
            r#""last_trained_at" ASC"#,
            source_language_code,
            limit,
        )
        .await
    }

    async fn get_learned_words(
        &self,
        source_language_code: &str,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError> {
        self.select_words(
            LEARNED_PREDICATE,
            r#""last_trained_at" ASC"#,
            source_language_code,
            limit,
        )
        .await
    }

    async fn get_intelligent_words(
        &self,
        source_language_code: &str,
        now_ms: i64,
        limit: usize,
    ) -> Result<Vec<Word>, StoreError> {
        let sql = format!(
            r#"SELECT {WORD_COLUMNS} FROM "words"
               WHERE "source_language_code" = ?
                 AND (? - "last_trained_at") > {REVIEW_INTERVAL_CASE}
               ORDER BY "mastery_score" ASC, "last_trained_at" ASC
               LIMIT ?"#
        );
        let rows = sqlx::query(&sql)
            .bind(source_language_code)
            .bind(now_ms)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(map_word_row).collect())
    }

    async fn get_answer_options_for_word(
        &self,
        word: &Word,
        target_language_code: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT "translation" FROM "words"
            WHERE "target_language_code" = ?
              AND "id" != ?
              AND "translation" != ?
            ORDER BY RANDOM()
            LIMIT ?
            "#,
        )
        .bind(target_language_code)
        .bind(word.id)
        .bind(&word.translation)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.try_get::<String, _>("translation").ok())
            .collect())
    }

    async fn update_score(&self, update: &ScoreUpdate) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE "words"
            SET "correct_count" = ?,
                "wrong_count" = ?,
                "mastery_score" = ?,
                "last_trained_at" = ?
            WHERE "id" = ?
            "#,
        )
        .bind(update.correct_count)
        .bind(update.wrong_count)
        .bind(update.mastery_score.clamp(0, 100))
        .bind(update.last_trained_at)
        .bind(update.word_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(update.word_id));
        }

        if let Some(language) = self.language_of(update.word_id).await? {
            self.refresh_counts(&language).await;
        }
        Ok(())
    }

    async fn get_category_counts(
        &self,
        source_language_code: &str,
    ) -> Result<CategoryCounts, StoreError> {
        self.load_category_counts(source_language_code).await
    }

    async fn category_counts_feed(
        &self,
        source_language_code: &str,
    ) -> Result<watch::Receiver<CategoryCounts>, StoreError> {
        let counts = self.load_category_counts(source_language_code).await?;

        let mut feeds = self.counts_feeds.write().await;
        match feeds.get(source_language_code) {
            Some(sender) => {
                sender.send_replace(counts);
                Ok(sender.subscribe())
            }
            None => {
                let (sender, receiver) = watch::channel(counts);
                feeds.insert(source_language_code.to_string(), sender);
                Ok(receiver)
            }
        }
    }

    async fn record_stat(&self, date: &str, stat: StatType) -> Result<(), StoreError> {
        let (correct, wrong) = match stat {
            StatType::CorrectAnswer => (1_i64, 0_i64),
            StatType::WrongAnswer => (0_i64, 1_i64),
        };
        sqlx::query(
            r#"
            INSERT INTO "daily_statistic" ("date","correct_answers","wrong_answers")
            VALUES (?, ?, ?)
            ON CONFLICT("date") DO UPDATE SET
              "correct_answers" = "correct_answers" + excluded."correct_answers",
              "wrong_answers" = "wrong_answers" + excluded."wrong_answers"
            "#,
        )
        .bind(date)
        .bind(correct)
        .bind(wrong)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_statistic_for_day(
        &self,
        date: &str,
    ) -> Result<Option<DailyStatistic>, StoreError> {
        let row = sqlx::query(
            r#"SELECT "date","correct_answers","wrong_answers"
               FROM "daily_statistic" WHERE "date" = ? LIMIT 1"#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| DailyStatistic {
            date: row.try_get("date").unwrap_or_default(),
            correct_answers: row.try_get("correct_answers").unwrap_or(0),
            wrong_answers: row.try_get("wrong_answers").unwrap_or(0),
        }))
    }

    async fn get_all_statistics(&self) -> Result<Vec<DailyStatistic>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT "date","correct_answers","wrong_answers"
               FROM "daily_statistic" ORDER BY "date" DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| DailyStatistic {
                date: row.try_get("date").unwrap_or_default(),
                correct_answers: row.try_get("correct_answers").unwrap_or(0),
                wrong_answers: row.try_get("wrong_answers").unwrap_or(0),
            })
            .collect())
    }

    async fn was_active_on(&self, date: &str) -> Result<bool, StoreError> {
        let active: i64 = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
              SELECT 1 FROM "daily_statistic"
              WHERE "date" = ? AND ("correct_answers" > 0 OR "wrong_answers" > 0)
            )
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(active != 0)
    }
}
