use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::mastery;
use crate::planner::SelectionPlanner;
use crate::stats::{day_key, StatType};
use crate::store::{StoreError, WordStore};
use crate::types::{ExerciseOutcome, Word, WordCategory};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("answer index {index} out of bounds for {option_count} options")]
    InvalidAnswerIndex { index: usize, option_count: usize },
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

/// Why a session landed in the Failed state. EmptyPool is a legitimate
/// terminal outcome ("nothing to review"), not a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SessionFailure {
    EmptyPool,
    Persistence { message: String },
}

/// Per-step progress marker for the session progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentState {
    Idle,
    Correct,
    Wrong,
}

/// One quiz card: the word plus its shuffled answer options.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepetitionCard {
    pub word: Word,
    pub answer_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentState {
    pub word: Word,
    pub answer_options: Vec<String>,
    pub current_step: usize,
    pub total_steps: usize,
    pub segment_states: Vec<SegmentState>,
    /// Set once per card; a second submission is ignored.
    pub selected_answer_index: Option<usize>,
    pub is_answer_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total_correct: u32,
    pub total_wrong: u32,
    pub mastery_earned: i64,
    pub has_wrong_answers: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "payload")]
pub enum RepetitionState {
    Loading,
    Content(ContentState),
    Finished(SessionSummary),
    Failed(SessionFailure),
}

/// Drives one interactive repetition round.
///
/// States: Loading -> Content -> { Content | Finished | Failed }. Scoring
/// is persisted before the state advances, so the next selection always
/// observes the updated mastery.
pub struct RepetitionSession {
    id: Uuid,
    store: Arc<dyn WordStore>,
    clock: Arc<dyn Clock>,
    planner: SelectionPlanner,
    config: EngineConfig,
    source_language: String,
    target_language: String,
    state: RepetitionState,
    queue: VecDeque<RepetitionCard>,
    segment_states: Vec<SegmentState>,
    initial_session_size: usize,
    session_correct_answers: u32,
    session_wrong_answers: u32,
    total_mastery_earned: i64,
    wrong_answers: Vec<(i64, Vec<String>)>,
    prepared_mistakes: Vec<RepetitionCard>,
    is_processing_answer: bool,
}

impl RepetitionSession {
    pub fn new(
        store: Arc<dyn WordStore>,
        clock: Arc<dyn Clock>,
        planner: SelectionPlanner,
        config: EngineConfig,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            store,
            clock,
            planner,
            config,
            source_language: source_language.into(),
            target_language: target_language.into(),
            state: RepetitionState::Loading,
            queue: VecDeque::new(),
            segment_states: Vec::new(),
            initial_session_size: 0,
            session_correct_answers: 0,
            session_wrong_answers: 0,
            total_mastery_earned: 0,
            wrong_answers: Vec::new(),
            prepared_mistakes: Vec::new(),
            is_processing_answer: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &RepetitionState {
        &self.state
    }

    /// Load a round for the chosen category and show the first card. An
    /// empty pool ends in `Failed(EmptyPool)` without raising an error.
    pub async fn start(&mut self, category: WordCategory) -> Result<(), SessionError> {
        self.state = RepetitionState::Loading;
        let limit = self.config.session_limit;
        let now = self.clock.now_ms();

        let words = match category {
            WordCategory::New => self.store.get_new_words(&self.source_language, limit).await,
            WordCategory::Hard => self.store.get_hard_words(&self.source_language, limit).await,
            WordCategory::Stable => {
                self.store
                    .get_stable_words(&self.source_language, limit)
                    .await
            }
            WordCategory::Learned => {
                self.store
                    .get_learned_words(&self.source_language, limit)
                    .await
            }
            WordCategory::Intelligent => {
                self.store
                    .get_intelligent_words(&self.source_language, now, limit)
                    .await
            }
        };

        let words = match words {
            Ok(words) => words,
            Err(err) => return Err(self.fail_persistence(err)),
        };

        if words.is_empty() {
            self.state = RepetitionState::Failed(SessionFailure::EmptyPool);
            return Ok(());
        }

        let mut queue = VecDeque::with_capacity(words.len());
        for word in words {
            let distractors = match self
                .store
                .get_answer_options_for_word(
                    &word,
                    &self.target_language,
                    self.config.answer_option_count.saturating_sub(1),
                )
                .await
            {
                Ok(options) => options,
                Err(err) => return Err(self.fail_persistence(err)),
            };
            let answer_options = self
                .planner
                .compose_answer_options(&word.translation, distractors);
            queue.push_back(RepetitionCard {
                word,
                answer_options,
            });
        }

        self.queue = queue;
        self.initial_session_size = self.queue.len();
        self.segment_states = vec![SegmentState::Idle; self.initial_session_size];
        self.session_correct_answers = 0;
        self.session_wrong_answers = 0;
        self.total_mastery_earned = 0;
        self.wrong_answers.clear();
        self.prepared_mistakes.clear();

        tracing::info!(
            session = %self.id,
            category = category.as_str(),
            words = self.initial_session_size,
            "repetition session started"
        );

        self.show_next();
        Ok(())
    }

    /// Score the selected option against the current card. Exactly one
    /// answer per card: re-submission and overlapping submission are no-ops;
    /// an out-of-bounds index is rejected before anything mutates.
    pub async fn submit_answer(&mut self, index: usize) -> Result<(), SessionError> {
        let (word, options) = match &self.state {
            RepetitionState::Content(content) => {
                if self.is_processing_answer || content.selected_answer_index.is_some() {
                    return Ok(());
                }
                if index >= content.answer_options.len() {
                    return Err(SessionError::InvalidAnswerIndex {
                        index,
                        option_count: content.answer_options.len(),
                    });
                }
                (content.word.clone(), content.answer_options.clone())
            }
            _ => return Ok(()),
        };

        self.is_processing_answer = true;

        let is_correct = options[index] == word.translation;
        let now = self.clock.now_ms();
        let outcome = ExerciseOutcome {
            word_id: word.id,
            is_correct,
            exercise_type: self.config.exercise_type,
        };
        let update = mastery::apply_outcome(&word, &outcome, now);

        if let Err(err) = self.store.update_score(&update).await {
            self.is_processing_answer = false;
            return Err(self.fail_persistence(err));
        }
        if let Err(err) = self
            .store
            .record_stat(&day_key(now), StatType::from_answer(is_correct))
            .await
        {
            self.is_processing_answer = false;
            return Err(self.fail_persistence(err));
        }

        if is_correct {
            self.session_correct_answers += 1;
            self.total_mastery_earned += i64::from(outcome.exercise_type.weight());
        } else {
            self.session_wrong_answers += 1;
            self.wrong_answers.push((word.id, options.clone()));
        }

        if let RepetitionState::Content(content) = &mut self.state {
            if let Some(segment) = self.segment_states.get_mut(content.current_step) {
                *segment = if is_correct {
                    SegmentState::Correct
                } else {
                    SegmentState::Wrong
                };
            }

            content.word.correct_answer_count = update.correct_count;
            content.word.wrong_answer_count = update.wrong_count;
            content.word.mastery_score = update.mastery_score;
            content.word.last_trained_at = update.last_trained_at;
            content.selected_answer_index = Some(index);
            content.is_answer_correct = Some(is_correct);
            content.segment_states = self.segment_states.clone();
        }

        tracing::debug!(
            session = %self.id,
            word = word.id,
            exercise = outcome.exercise_type.as_str(),
            correct = is_correct,
            score = update.mastery_score,
            "answer scored"
        );

        self.is_processing_answer = false;
        Ok(())
    }

    /// Advance past the answered card. Draining the queue finishes the round
    /// and pre-loads fresh copies of the mistaken words for review.
    pub async fn next_word(&mut self) {
        if !self.queue.is_empty() {
            self.show_next();
            return;
        }

        let summary = SessionSummary {
            total_correct: self.session_correct_answers,
            total_wrong: self.session_wrong_answers,
            mastery_earned: self.total_mastery_earned,
            has_wrong_answers: !self.wrong_answers.is_empty(),
        };
        tracing::info!(
            session = %self.id,
            correct = summary.total_correct,
            wrong = summary.total_wrong,
            "repetition session finished"
        );
        self.state = RepetitionState::Finished(summary);

        if self.wrong_answers.is_empty() {
            return;
        }
        self.prepared_mistakes.clear();
        let entries = self.wrong_answers.clone();
        for (word_id, answer_options) in entries {
            match self.store.get_word_by_id(word_id).await {
                Ok(Some(word)) => self.prepared_mistakes.push(RepetitionCard {
                    word,
                    answer_options,
                }),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(session = %self.id, word = word_id, error = %err, "mistake preload failed");
                }
            }
        }
    }

    /// Replay this round's mistakes as a fresh round. No-op when the last
    /// round was clean.
    pub fn start_mistakes_review(&mut self) {
        if self.prepared_mistakes.is_empty() {
            return;
        }

        self.queue = self.prepared_mistakes.drain(..).collect();
        self.initial_session_size = self.queue.len();
        self.segment_states = vec![SegmentState::Idle; self.initial_session_size];
        self.session_correct_answers = 0;
        self.session_wrong_answers = 0;
        self.total_mastery_earned = 0;
        self.wrong_answers.clear();

        self.show_next();
    }

    /// One-card quick mode: the planner's highest-priority pick over the
    /// training pool, with answer options attached. `None` when the pool is
    /// empty.
    pub async fn single_card(&mut self) -> Result<Option<RepetitionCard>, SessionError> {
        let pool = self
            .store
            .get_words_for_training(&self.source_language, self.config.training_pool_limit)
            .await?;
        let Some(word) = self.planner.pick_repetition(&pool) else {
            return Ok(None);
        };
        let distractors = self
            .store
            .get_answer_options_for_word(
                &word,
                &self.target_language,
                self.config.answer_option_count.saturating_sub(1),
            )
            .await?;
        let answer_options = self
            .planner
            .compose_answer_options(&word.translation, distractors);
        Ok(Some(RepetitionCard {
            word,
            answer_options,
        }))
    }

    fn show_next(&mut self) {
        if let Some(card) = self.queue.pop_front() {
            let current_step = self.initial_session_size - self.queue.len() - 1;
            self.state = RepetitionState::Content(ContentState {
                word: card.word,
                answer_options: card.answer_options,
                current_step,
                total_steps: self.initial_session_size,
                segment_states: self.segment_states.clone(),
                selected_answer_index: None,
                is_answer_correct: None,
            });
        }
    }

    fn fail_persistence(&mut self, err: StoreError) -> SessionError {
        tracing::warn!(session = %self.id, error = %err, "persistence failure");
        self.state = RepetitionState::Failed(SessionFailure::Persistence {
            message: err.to_string(),
        });
        SessionError::Persistence(err)
    }
}
