use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::categorizer::{categorize, is_due};
use crate::types::{Word, WordCategory};

/// Selection policy for both session flavours. All randomness flows through
/// the owned ChaCha8 generator so a seeded planner replays identically.
pub struct SelectionPlanner {
    rng: ChaCha8Rng,
}

impl SelectionPlanner {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Repetition mode: the single word the learner knows worst and has left
    /// untouched the longest. Exact ties are broken by a random draw.
    pub fn pick_repetition(&mut self, candidates: &[Word]) -> Option<Word> {
        let best = candidates
            .iter()
            .map(|w| (w.mastery_score, w.last_trained_at))
            .min()?;
        let ties: Vec<&Word> = candidates
            .iter()
            .filter(|w| (w.mastery_score, w.last_trained_at) == best)
            .collect();
        let picked = if ties.len() == 1 {
            ties[0]
        } else {
            ties[self.rng.random_range(0..ties.len())]
        };
        Some(picked.clone())
    }

    /// Distractors plus the correct translation, shuffled into one list.
    pub fn compose_answer_options(
        &mut self,
        correct_translation: &str,
        distractors: Vec<String>,
    ) -> Vec<String> {
        let mut options = distractors;
        options.push(correct_translation.to_string());
        options.shuffle(&mut self.rng);
        options
    }

    /// Practice mode refill: round-robin over category buckets in preference
    /// order HARD, due, NEW, STABLE, LEARNED so a session is not dominated
    /// by already-mastered vocabulary. Each bucket is shuffled before the
    /// draw; words already in the deck are skipped.
    pub fn refill_deck(&mut self, deck: &mut PracticeDeck, pool: &[Word], now_ms: i64) {
        if deck.len() >= deck.target_size() {
            return;
        }

        let mut hard = Vec::new();
        let mut due = Vec::new();
        let mut fresh = Vec::new();
        let mut stable = Vec::new();
        let mut learned = Vec::new();

        for word in pool {
            if deck.contains(word.id) {
                continue;
            }
            match categorize(word) {
                WordCategory::Hard => hard.push(word.clone()),
                _ if is_due(word, now_ms) => due.push(word.clone()),
                WordCategory::New => fresh.push(word.clone()),
                WordCategory::Stable => stable.push(word.clone()),
                WordCategory::Learned => learned.push(word.clone()),
                WordCategory::Intelligent => {}
            }
        }

        let mut buckets = [
            {
                hard.shuffle(&mut self.rng);
                VecDeque::from(hard)
            },
            {
                due.shuffle(&mut self.rng);
                VecDeque::from(due)
            },
            {
                fresh.shuffle(&mut self.rng);
                VecDeque::from(fresh)
            },
            {
                stable.shuffle(&mut self.rng);
                VecDeque::from(stable)
            },
            {
                learned.shuffle(&mut self.rng);
                VecDeque::from(learned)
            },
        ];

        while deck.len() < deck.target_size() {
            let mut drew_any = false;
            for bucket in buckets.iter_mut() {
                if deck.len() >= deck.target_size() {
                    break;
                }
                if let Some(word) = bucket.pop_front() {
                    deck.push_back(word);
                    drew_any = true;
                }
            }
            if !drew_any {
                break;
            }
        }
    }
}

impl Default for SelectionPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// The rotating card conveyor for practice mode. Consuming the front card
/// recycles it to the back instead of discarding it, so the deck loops
/// oldest-served-first until the caller refills or removes cards.
#[derive(Debug, Clone)]
pub struct PracticeDeck {
    cards: VecDeque<Word>,
    target_size: usize,
}

impl PracticeDeck {
    pub fn new(target_size: usize) -> Self {
        Self {
            cards: VecDeque::with_capacity(target_size),
            target_size,
        }
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, word_id: i64) -> bool {
        self.cards.iter().any(|w| w.id == word_id)
    }

    pub fn current(&self) -> Option<&Word> {
        self.cards.front()
    }

    /// Rotate the front card to the back.
    pub fn advance(&mut self) {
        if let Some(word) = self.cards.pop_front() {
            self.cards.push_back(word);
        }
    }

    /// Drop the front card, e.g. when the learner marks it as known.
    pub fn remove_current(&mut self) -> Option<Word> {
        self.cards.pop_front()
    }

    fn push_back(&mut self, word: Word) {
        self.cards.push_back(word);
    }
}
