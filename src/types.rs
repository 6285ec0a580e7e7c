use serde::{Deserialize, Serialize};

/// Quiz modality. The weight scales how far one answer moves the mastery
/// score, heavier types carrying a stronger diagnostic signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[derive(Default)]
pub enum ExerciseType {
    #[default]
    Quiz,
    Cards,
    Sprint,
    Constructor,
    Writing,
}

impl ExerciseType {
    pub fn weight(&self) -> i32 {
        match self {
            Self::Quiz => 10,
            Self::Cards => 5,
            Self::Sprint => 8,
            Self::Constructor => 15,
            Self::Writing => 25,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quiz => "QUIZ",
            Self::Cards => "CARDS",
            Self::Sprint => "SPRINT",
            Self::Constructor => "CONSTRUCTOR",
            Self::Writing => "WRITING",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "CARDS" => Self::Cards,
            "SPRINT" => Self::Sprint,
            "CONSTRUCTOR" => Self::Constructor,
            "WRITING" => Self::Writing,
            _ => Self::Quiz,
        }
    }
}

/// One answer against one word, as reported by the session driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseOutcome {
    pub word_id: i64,
    pub is_correct: bool,
    pub exercise_type: ExerciseType,
}

/// A stored vocabulary word together with its learning counters.
///
/// `mastery_score` stays within [0,100]; every update path clamps. Counters
/// only grow, except through an external reset the engine never performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: i64,
    pub source_word: String,
    pub translation: String,
    pub source_language_code: String,
    pub target_language_code: String,
    pub correct_answer_count: i32,
    pub wrong_answer_count: i32,
    pub mastery_score: i32,
    pub added_at: i64,
    pub last_trained_at: i64,
}

impl Word {
    pub fn attempts(&self) -> i32 {
        self.correct_answer_count + self.wrong_answer_count
    }

    pub fn mastery_level(&self) -> MasteryLevel {
        MasteryLevel::from_score(self.mastery_score)
    }
}

/// Pedagogical stage derived from fixed score bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasteryStage {
    Discovery,
    Acquisition,
    Retention,
    Consolidation,
    Mastery,
}

impl MasteryStage {
    pub fn from_score(score: i32) -> Self {
        match score.clamp(0, 100) {
            0..=20 => Self::Discovery,
            21..=40 => Self::Acquisition,
            41..=60 => Self::Retention,
            61..=80 => Self::Consolidation,
            _ => Self::Mastery,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "Discovery",
            Self::Acquisition => "Acquisition",
            Self::Retention => "Retention",
            Self::Consolidation => "Consolidation",
            Self::Mastery => "Mastery",
        }
    }
}

/// Score plus its derived stage, the shape dashboards consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryLevel {
    pub score: i32,
}

impl MasteryLevel {
    pub fn from_score(score: i32) -> Self {
        Self { score }
    }

    pub fn percentage(&self) -> i32 {
        self.score.clamp(0, 100)
    }

    pub fn stage(&self) -> MasteryStage {
        MasteryStage::from_score(self.score)
    }
}

/// Mutually-exclusive learning bucket. `Intelligent` is the due-for-review
/// overlay used for selection, not a storage bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WordCategory {
    Intelligent,
    New,
    Hard,
    Stable,
    Learned,
}

impl WordCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intelligent => "INTELLIGENT",
            Self::New => "NEW",
            Self::Hard => "HARD",
            Self::Stable => "STABLE",
            Self::Learned => "LEARNED",
        }
    }
}

/// Dashboard aggregate over the exclusive buckets for one source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub new_count: i64,
    pub hard_count: i64,
    pub stable_count: i64,
    pub learned_count: i64,
    pub total_count: i64,
}

impl CategoryCounts {
    pub fn count_for(&self, category: WordCategory) -> i64 {
        match category {
            WordCategory::New => self.new_count,
            WordCategory::Hard => self.hard_count,
            WordCategory::Stable => self.stable_count,
            WordCategory::Learned => self.learned_count,
            WordCategory::Intelligent => self.total_count,
        }
    }
}
