use crate::types::{CategoryCounts, MasteryStage, Word, WordCategory};

pub const HARD_SCORE_CEILING: i32 = 40;
pub const LEARNED_SCORE_FLOOR: i32 = 80;

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Exclusive bucket for one word. Precedence: NEW, HARD, LEARNED, STABLE.
///
/// LEARNED requires a clean wrong-answer history; a word that was ever
/// answered wrong stays STABLE no matter how high its score climbs.
pub fn categorize(word: &Word) -> WordCategory {
    if word.attempts() == 0 {
        WordCategory::New
    } else if word.mastery_score < HARD_SCORE_CEILING {
        WordCategory::Hard
    } else if word.mastery_score >= LEARNED_SCORE_FLOOR && word.wrong_answer_count == 0 {
        WordCategory::Learned
    } else {
        WordCategory::Stable
    }
}

/// Spaced-repetition backoff: higher mastery keeps a word out of rotation
/// for longer before it surfaces as due again.
pub fn review_interval_ms(mastery_score: i32) -> i64 {
    match MasteryStage::from_score(mastery_score) {
        MasteryStage::Discovery => 4 * HOUR_MS,
        MasteryStage::Acquisition => 12 * HOUR_MS,
        MasteryStage::Retention => DAY_MS,
        MasteryStage::Consolidation => 3 * DAY_MS,
        MasteryStage::Mastery => 7 * DAY_MS,
    }
}

/// Due-for-review overlay. Orthogonal to the exclusive buckets and computed
/// against an explicit `now` so callers stay deterministic.
pub fn is_due(word: &Word, now_ms: i64) -> bool {
    now_ms.saturating_sub(word.last_trained_at) > review_interval_ms(word.mastery_score)
}

/// Aggregate the exclusive buckets plus a total. Due-ness is evaluated at
/// query time by the callers that need it and never cached here.
pub fn count_categories(words: &[Word]) -> CategoryCounts {
    let mut counts = CategoryCounts::default();
    for word in words {
        counts.total_count += 1;
        match categorize(word) {
            WordCategory::New => counts.new_count += 1,
            WordCategory::Hard => counts.hard_count += 1,
            WordCategory::Stable => counts.stable_count += 1,
            WordCategory::Learned => counts.learned_count += 1,
            WordCategory::Intelligent => {}
        }
    }
    counts
}
