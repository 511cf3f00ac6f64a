//! Leitner box scheduling
//!
//! A card climbs one box per correct answer and drops back on a miss. Each
//! box maps to a fixed lookahead before the card is due again:
//! - Box 1: same day
//! - Box 2: 2 days
//! - Box 3: 4 days
//! - Box 4: 7 days
//! - Box 5: 14 days
//!
//! Both the lookahead table and the demotion policy come from
//! [`LeitnerConfig`], so they can be tuned per deployment.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::models::{CardPatch, Flashcard, ReviewOutcome, MAX_BOX, MIN_BOX};

/// Default lookahead in days for boxes 1..=5
pub const DEFAULT_INTERVALS: [u32; MAX_BOX as usize] = [0, 2, 4, 7, 14];

/// Longest lookahead a box may have (about a century)
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// What happens to a card after an incorrect answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Demotion {
    /// Back to box 1
    #[default]
    Reset,
    /// Down one box, never below box 1
    StepBack,
}

/// Tunable parameters of the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeitnerConfig {
    /// Lookahead in days for each box, index 0 is box 1
    pub intervals: [u32; MAX_BOX as usize],
    pub demotion: Demotion,
}

impl Default for LeitnerConfig {
    fn default() -> Self {
        Self {
            intervals: DEFAULT_INTERVALS,
            demotion: Demotion::default(),
        }
    }
}

impl LeitnerConfig {
    /// Lookahead for a box; out-of-range boxes use the nearest valid one
    pub fn interval(&self, leitner_box: u8) -> Duration {
        let index = (leitner_box.clamp(MIN_BOX, MAX_BOX) - MIN_BOX) as usize;
        Duration::days(i64::from(self.intervals[index]))
    }

    /// Intervals must never shrink as the box grows and stay within [`MAX_INTERVAL_DAYS`]
    pub fn validate(&self) -> Result<(), String> {
        if let Some(days) = self.intervals.iter().find(|&&d| d > MAX_INTERVAL_DAYS) {
            return Err(format!(
                "scheduler interval of {} days exceeds the {} day maximum",
                days, MAX_INTERVAL_DAYS
            ));
        }
        if self.intervals.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(format!(
                "scheduler intervals must be non-decreasing, got {:?}",
                self.intervals
            ));
        }
        Ok(())
    }

    fn next_box(&self, current: u8, outcome: ReviewOutcome) -> u8 {
        match outcome {
            ReviewOutcome::Correct => (current + 1).min(MAX_BOX),
            ReviewOutcome::Incorrect => match self.demotion {
                Demotion::Reset => MIN_BOX,
                Demotion::StepBack => current.saturating_sub(1).max(MIN_BOX),
            },
        }
    }
}

/// New scheduling state for a card after one review
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewResult {
    pub leitner_box: u8,
    pub last_review: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
}

impl From<ReviewResult> for CardPatch {
    fn from(result: ReviewResult) -> Self {
        Self {
            leitner_box: result.leitner_box,
            last_review: result.last_review,
            next_review: result.next_review,
        }
    }
}

/// Compute the next box and review dates for a card. Pure; the caller persists the result.
pub fn advance(
    config: &LeitnerConfig,
    card: &Flashcard,
    outcome: ReviewOutcome,
    now: DateTime<Utc>,
) -> ReviewResult {
    let leitner_box = config.next_box(card.current_box(), outcome);

    ReviewResult {
        leitner_box,
        last_review: now,
        next_review: now
            .checked_add_signed(config.interval(leitner_box))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}

/// Next review date each outcome would produce
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomePreview {
    pub correct: DateTime<Utc>,
    pub incorrect: DateTime<Utc>,
}

/// Used to show users what each answer would do before they commit to it
pub fn preview(config: &LeitnerConfig, card: &Flashcard, now: DateTime<Utc>) -> OutcomePreview {
    OutcomePreview {
        correct: advance(config, card, ReviewOutcome::Correct, now).next_review,
        incorrect: advance(config, card, ReviewOutcome::Incorrect, now).next_review,
    }
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: i64) -> String {
    if days <= 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn card_in_box(leitner_box: u8) -> Flashcard {
        let mut card = Flashcard::new(
            "card-1",
            "What is a borrow?".to_string(),
            "A reference".to_string(),
            "rust".to_string(),
        );
        card.leitner_box = leitner_box;
        card
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_correct_climbs_one_box_capped_at_five() {
        let config = LeitnerConfig::default();
        for leitner_box in MIN_BOX..=MAX_BOX {
            let result = advance(&config, &card_in_box(leitner_box), ReviewOutcome::Correct, now());
            assert_eq!(result.leitner_box, (leitner_box + 1).min(MAX_BOX));
            assert!(result.leitner_box >= leitner_box);
        }
    }

    #[test]
    fn test_incorrect_resets_to_box_one() {
        let config = LeitnerConfig::default();
        for leitner_box in MIN_BOX..=MAX_BOX {
            let result = advance(&config, &card_in_box(leitner_box), ReviewOutcome::Incorrect, now());
            assert_eq!(result.leitner_box, 1);
        }
    }

    #[test]
    fn test_box_two_correct_schedules_four_days_out() {
        let config = LeitnerConfig::default();
        let mut card = card_in_box(2);
        card.last_review = Some(now() - Duration::days(3));
        card.next_review = Some(now() - Duration::days(1));

        let result = advance(&config, &card, ReviewOutcome::Correct, now());

        assert_eq!(result.leitner_box, 3);
        assert_eq!(result.last_review, now());
        assert_eq!(result.next_review, now() + Duration::days(4));
    }

    #[test]
    fn test_box_one_is_due_same_day() {
        let config = LeitnerConfig::default();
        let result = advance(&config, &card_in_box(3), ReviewOutcome::Incorrect, now());
        assert_eq!(result.next_review, now());
        assert!(result.next_review >= result.last_review);
    }

    #[test]
    fn test_out_of_range_box_is_clamped() {
        let config = LeitnerConfig::default();

        let low = advance(&config, &card_in_box(0), ReviewOutcome::Correct, now());
        assert_eq!(low.leitner_box, 2);

        let high = advance(&config, &card_in_box(9), ReviewOutcome::Correct, now());
        assert_eq!(high.leitner_box, MAX_BOX);
        assert_eq!(high.next_review, now() + Duration::days(14));
    }

    #[test]
    fn test_step_back_demotion() {
        let config = LeitnerConfig {
            demotion: Demotion::StepBack,
            ..LeitnerConfig::default()
        };

        let result = advance(&config, &card_in_box(4), ReviewOutcome::Incorrect, now());
        assert_eq!(result.leitner_box, 3);

        let floor = advance(&config, &card_in_box(1), ReviewOutcome::Incorrect, now());
        assert_eq!(floor.leitner_box, 1);
    }

    #[test]
    fn test_preview() {
        let config = LeitnerConfig::default();
        let preview = preview(&config, &card_in_box(3), now());
        assert_eq!(preview.correct, now() + Duration::days(7));
        assert_eq!(preview.incorrect, now());
    }

    #[test]
    fn test_validate_rejects_shrinking_intervals() {
        let config = LeitnerConfig {
            intervals: [0, 3, 2, 7, 14],
            ..LeitnerConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(LeitnerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(1), "1d");
        assert_eq!(format_interval(4), "4d");
        assert_eq!(format_interval(7), "1w");
        assert_eq!(format_interval(14), "2w");
        assert_eq!(format_interval(90), "3mo");
        assert_eq!(format_interval(730), "2y");
    }

    #[test]
    fn test_validate_rejects_oversized_interval() {
        let config = LeitnerConfig {
            intervals: [0, 2, 4, 7, 200_000_000],
            ..LeitnerConfig::default()
        };
        assert!(config.validate().is_err());

        let at_limit = LeitnerConfig {
            intervals: [0, 2, 4, 7, MAX_INTERVAL_DAYS],
            ..LeitnerConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_advance_saturates_instead_of_overflowing() {
        let config = LeitnerConfig {
            intervals: [0, 2, 4, 7, u32::MAX],
            ..LeitnerConfig::default()
        };

        let result = advance(&config, &card_in_box(4), ReviewOutcome::Correct, now());
        assert_eq!(result.leitner_box, 5);
        assert_eq!(result.next_review, DateTime::<Utc>::MAX_UTC);
    }
}
