use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a single answer contributes to the daily counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatType {
    CorrectAnswer,
    WrongAnswer,
}

impl StatType {
    pub fn from_answer(is_correct: bool) -> Self {
        if is_correct {
            Self::CorrectAnswer
        } else {
            Self::WrongAnswer
        }
    }
}

/// Per-day answer counters, keyed by an ISO calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatistic {
    pub date: String,
    pub correct_answers: i64,
    pub wrong_answers: i64,
}

/// ISO `YYYY-MM-DD` key for a timestamp, the primary key of the statistics
/// table.
pub fn day_key(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_else(|| "1970-01-01".to_string())
}
