//! Data models for the flashcard system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest Leitner box (least retained)
pub const MIN_BOX: u8 = 1;

/// Highest Leitner box (best retained)
pub const MAX_BOX: u8 = 5;

/// Author-assigned difficulty of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// A flashcard with question and answer plus its Leitner scheduling state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Current Leitner box, 1..=5
    #[serde(rename = "box", default = "default_box")]
    pub leitner_box: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review: Option<DateTime<Utc>>,
}

fn default_box() -> u8 {
    MIN_BOX
}

impl Flashcard {
    pub fn new(id: impl Into<String>, question: String, answer: String, topic: String) -> Self {
        Self {
            id: id.into(),
            question,
            answer,
            topic,
            difficulty: Difficulty::default(),
            leitner_box: MIN_BOX,
            last_review: None,
            next_review: None,
        }
    }

    /// Box clamped into the valid range, for records written by other tools
    pub fn current_box(&self) -> u8 {
        self.leitner_box.clamp(MIN_BOX, MAX_BOX)
    }

    /// A card with no scheduled review is always due
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_review {
            Some(next) => next <= now,
            None => true,
        }
    }

    pub fn apply_patch(&mut self, patch: &CardPatch) {
        self.leitner_box = patch.leitner_box;
        self.last_review = Some(patch.last_review);
        self.next_review = Some(patch.next_review);
    }
}

/// Outcome of reviewing a single card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewOutcome {
    Correct,
    Incorrect,
}

impl ReviewOutcome {
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// Scheduling fields written back to the card store after a review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    #[serde(rename = "box")]
    pub leitner_box: u8,
    pub last_review: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
}

/// Statistics over a set of cards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub due_cards: usize,
    pub never_reviewed: usize,
    /// Card count per box, index 0 is box 1
    pub per_box: [usize; MAX_BOX as usize],
}

/// Counters for one review session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub reviewed: usize,
    pub correct: usize,
    pub incorrect: usize,
}

/// A topic ranked by how urgently it should be studied next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSuggestion {
    pub topic: String,
    pub card_count: usize,
    pub due_count: usize,
    /// Mean box of the topic's cards; lower means less confident
    pub mean_box: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_review: Option<DateTime<Utc>>,
}
