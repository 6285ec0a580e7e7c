use crate::types::ExerciseType;

/// Engine tunables, read once from the environment by the host.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Words per repetition session.
    pub session_limit: usize,
    /// Cards held by the rotating practice deck.
    pub deck_size: usize,
    /// Total answer options shown per word (1 correct + distractors).
    pub answer_option_count: usize,
    /// Candidate pool size handed to the planner.
    pub training_pool_limit: usize,
    /// Exercise type scored by repetition sessions.
    pub exercise_type: ExerciseType,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session_limit: 10,
            deck_size: 3,
            answer_option_count: 4,
            training_pool_limit: 50,
            exercise_type: ExerciseType::Quiz,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let session_limit = std::env::var("VOCAB_SESSION_LIMIT")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.session_limit);

        let deck_size = std::env::var("VOCAB_DECK_SIZE")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.deck_size);

        let answer_option_count = std::env::var("VOCAB_ANSWER_OPTIONS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value >= 2)
            .unwrap_or(defaults.answer_option_count);

        let training_pool_limit = std::env::var("VOCAB_TRAINING_POOL_LIMIT")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.training_pool_limit);

        let exercise_type = std::env::var("VOCAB_EXERCISE_TYPE")
            .map(|value| ExerciseType::parse(&value))
            .unwrap_or(defaults.exercise_type);

        Self {
            session_limit,
            deck_size,
            answer_option_count,
            training_pool_limit,
            exercise_type,
        }
    }
}
