use serde::{Deserialize, Serialize};

use crate::types::{ExerciseOutcome, ExerciseType, Word};

/// A wrong answer costs 1.5x the weight of a correct one, so mistakes decay
/// mastery faster than correct answers build it.
pub const MASTERY_PENALTY_COEFFICIENT: f64 = 1.5;

const SCORE_MIN: i32 = 0;
const SCORE_MAX: i32 = 100;

/// Next mastery score after one answer. Total over all integer inputs:
/// out-of-range `current_score` is clamped on read, never rejected.
pub fn next_score(current_score: i32, exercise_type: ExerciseType, is_correct: bool) -> i32 {
    let weight = exercise_type.weight();
    let delta = if is_correct {
        weight
    } else {
        -((weight as f64 * MASTERY_PENALTY_COEFFICIENT).round() as i32)
    };
    (current_score.clamp(SCORE_MIN, SCORE_MAX) + delta).clamp(SCORE_MIN, SCORE_MAX)
}

/// The full post-answer state for one word, ready for atomic persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdate {
    pub word_id: i64,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub mastery_score: i32,
    pub last_trained_at: i64,
}

/// The only mutation path for mastery state: bump the matching counter,
/// move the score, stamp the training time.
pub fn apply_outcome(word: &Word, outcome: &ExerciseOutcome, now_ms: i64) -> ScoreUpdate {
    let correct_count = if outcome.is_correct {
        word.correct_answer_count + 1
    } else {
        word.correct_answer_count
    };
    let wrong_count = if outcome.is_correct {
        word.wrong_answer_count
    } else {
        word.wrong_answer_count + 1
    };

    ScoreUpdate {
        word_id: word.id,
        correct_count,
        wrong_count,
        mastery_score: next_score(word.mastery_score, outcome.exercise_type, outcome.is_correct),
        last_trained_at: now_ms,
    }
}
