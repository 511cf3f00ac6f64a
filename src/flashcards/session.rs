//! Review sessions: pick the due cards, order them, and persist outcomes

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::algorithm::{advance, LeitnerConfig};
use super::models::{
    CardPatch, Flashcard, ReviewOutcome, ReviewStats, SessionSummary, TopicSuggestion,
};
use super::storage::CardStore;
use crate::error::{CoreError, Result};

/// Lowest box first, then longest-neglected, then id
fn review_order(a: &Flashcard, b: &Flashcard) -> Ordering {
    a.current_box()
        .cmp(&b.current_box())
        .then_with(|| a.last_review.cmp(&b.last_review))
        .then_with(|| a.id.cmp(&b.id))
}

/// Cards due at `now`, in review order
pub fn select_due(cards: &[Flashcard], now: DateTime<Utc>) -> Vec<Flashcard> {
    let mut due: Vec<Flashcard> = cards.iter().filter(|c| c.is_due(now)).cloned().collect();
    due.sort_by(review_order);
    due
}

/// Get review statistics for a set of cards
pub fn review_stats(cards: &[Flashcard], now: DateTime<Utc>) -> ReviewStats {
    let mut stats = ReviewStats {
        total_cards: cards.len(),
        ..ReviewStats::default()
    };

    for card in cards {
        stats.per_box[(card.current_box() - 1) as usize] += 1;
        if card.is_due(now) {
            stats.due_cards += 1;
        }
        if card.last_review.is_none() {
            stats.never_reviewed += 1;
        }
    }

    stats
}

/// Rank topics by what to study next: least confident first, then least recently reviewed
pub fn suggest_topics(cards: &[Flashcard], now: DateTime<Utc>, limit: usize) -> Vec<TopicSuggestion> {
    let mut by_topic: BTreeMap<&str, Vec<&Flashcard>> = BTreeMap::new();
    for card in cards {
        by_topic.entry(card.topic.as_str()).or_default().push(card);
    }

    let mut suggestions: Vec<TopicSuggestion> = by_topic
        .into_iter()
        .map(|(topic, cards)| {
            let box_total: u32 = cards.iter().map(|c| u32::from(c.current_box())).sum();
            // An unreviewed card counts as the oldest possible review
            let oldest_review = if cards.iter().any(|c| c.last_review.is_none()) {
                None
            } else {
                cards.iter().filter_map(|c| c.last_review).min()
            };

            TopicSuggestion {
                topic: topic.to_string(),
                card_count: cards.len(),
                due_count: cards.iter().filter(|c| c.is_due(now)).count(),
                mean_box: box_total as f32 / cards.len() as f32,
                oldest_review,
            }
        })
        .collect();

    suggestions.sort_by(|a, b| {
        a.mean_box
            .total_cmp(&b.mean_box)
            .then_with(|| a.oldest_review.cmp(&b.oldest_review))
            .then_with(|| a.topic.cmp(&b.topic))
    });
    suggestions.truncate(limit);
    suggestions
}

/// A single user's pass over their cards
///
/// Holds a transient copy of the store's cards. Applying an outcome needs
/// `&mut self`, so a session reviews one card at a time.
pub struct ReviewSession {
    store: Arc<dyn CardStore>,
    config: LeitnerConfig,
    cards: Vec<Flashcard>,
    summary: SessionSummary,
}

impl ReviewSession {
    pub fn new(store: Arc<dyn CardStore>, config: LeitnerConfig) -> Self {
        Self {
            store,
            config,
            cards: Vec::new(),
            summary: SessionSummary::default(),
        }
    }

    /// Refresh the session's view from the store; on failure the old view is kept
    pub async fn load(&mut self) -> Result<&[Flashcard]> {
        let cards = self.store.select_all().await.map_err(|e| {
            log::warn!("Failed to load cards: {}", e);
            CoreError::StoreRead(e)
        })?;
        log::debug!("Loaded {} cards", cards.len());
        self.cards = cards;
        Ok(&self.cards)
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    pub fn due(&self, now: DateTime<Utc>) -> Vec<Flashcard> {
        select_due(&self.cards, now)
    }

    /// The card to show next, if any is due
    pub fn next_due(&self, now: DateTime<Utc>) -> Option<&Flashcard> {
        self.cards
            .iter()
            .filter(|c| c.is_due(now))
            .min_by(|a, b| review_order(a, b))
    }

    pub fn stats(&self, now: DateTime<Utc>) -> ReviewStats {
        review_stats(&self.cards, now)
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Schedule a card from its review outcome and persist it with one store write
    ///
    /// The local copy only changes once the store has accepted the update.
    /// Failures are returned as-is; nothing is retried.
    pub async fn apply_outcome(
        &mut self,
        card_id: &str,
        outcome: ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<Flashcard> {
        let index = self
            .cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or_else(|| CoreError::NotFound(format!("card {}", card_id)))?;

        let patch: CardPatch = advance(&self.config, &self.cards[index], outcome, now).into();

        if let Err(e) = self.store.update_by_id(card_id, &patch).await {
            log::warn!("Failed to save review of card {}: {}", card_id, e);
            return Err(CoreError::StoreWrite(e));
        }

        let card = &mut self.cards[index];
        log::debug!(
            "Card {} moved from box {} to box {}",
            card_id,
            card.leitner_box,
            patch.leitner_box
        );
        card.apply_patch(&patch);

        self.summary.reviewed += 1;
        if outcome.is_correct() {
            self.summary.correct += 1;
        } else {
            self.summary.incorrect += 1;
        }

        Ok(card.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::storage::MemoryCardStore;
    use crate::storage::StoreError;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn card(id: &str, leitner_box: u8, topic: &str) -> Flashcard {
        let mut card = Flashcard::new(id, format!("Q {}", id), format!("A {}", id), topic.to_string());
        card.leitner_box = leitner_box;
        card
    }

    fn reviewed(mut card: Flashcard, last_days_ago: i64, next_in_days: i64) -> Flashcard {
        card.last_review = Some(now() - Duration::days(last_days_ago));
        card.next_review = Some(now() + Duration::days(next_in_days));
        card
    }

    /// Store whose writes always fail, counting attempts
    struct FailingStore {
        inner: MemoryCardStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl CardStore for FailingStore {
        async fn select_all(&self) -> crate::storage::Result<Vec<Flashcard>> {
            self.inner.select_all().await
        }

        async fn update_by_id(&self, _id: &str, _patch: &CardPatch) -> crate::storage::Result<()> {
            self.writes.fetch_add(1, AtomicOrdering::SeqCst);
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn test_select_due_excludes_future_cards() {
        let cards = vec![
            reviewed(card("future", 2, "a"), 1, 1),
            reviewed(card("past", 2, "a"), 3, -1),
            card("new", 1, "a"),
        ];

        let due = select_due(&cards, now());

        let ids: Vec<&str> = due.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "past"]);
        assert!(due.iter().all(|c| c.next_review.map_or(true, |n| n <= now())));
    }

    #[test]
    fn test_due_exactly_now() {
        let mut c = card("edge", 3, "a");
        c.next_review = Some(now());
        assert_eq!(select_due(&[c], now()).len(), 1);
    }

    #[test]
    fn test_select_due_ordering() {
        let cards = vec![
            reviewed(card("c", 2, "a"), 2, -1),
            reviewed(card("b", 2, "a"), 5, -1),
            reviewed(card("z", 1, "a"), 1, 0),
            reviewed(card("a", 2, "a"), 5, -1),
            card("never", 2, "a"),
        ];

        let due = select_due(&cards, now());

        let ids: Vec<&str> = due.iter().map(|c| c.id.as_str()).collect();
        // box 1 first; within box 2 unreviewed, then oldest review, then id
        assert_eq!(ids, vec!["z", "never", "a", "b", "c"]);
    }

    #[test]
    fn test_review_stats() {
        let cards = vec![
            card("a", 1, "x"),
            reviewed(card("b", 3, "x"), 2, 2),
            reviewed(card("c", 5, "y"), 20, -1),
        ];

        let stats = review_stats(&cards, now());

        assert_eq!(stats.total_cards, 3);
        assert_eq!(stats.due_cards, 2);
        assert_eq!(stats.never_reviewed, 1);
        assert_eq!(stats.per_box, [1, 0, 1, 0, 1]);
    }

    #[test]
    fn test_suggest_topics_prefers_low_confidence() {
        let cards = vec![
            reviewed(card("a1", 5, "algebra"), 1, 10),
            reviewed(card("a2", 4, "algebra"), 1, 5),
            reviewed(card("b1", 1, "biology"), 2, 0),
            reviewed(card("c1", 1, "chemistry"), 9, 0),
        ];

        let suggestions = suggest_topics(&cards, now(), 2);

        assert_eq!(suggestions.len(), 2);
        // equal confidence, chemistry was reviewed longer ago
        assert_eq!(suggestions[0].topic, "chemistry");
        assert_eq!(suggestions[1].topic, "biology");
        assert_eq!(suggestions[0].due_count, 1);
    }

    #[tokio::test]
    async fn test_apply_outcome_persists() {
        let mut c = reviewed(card("q1", 2, "a"), 3, -1);
        c.next_review = Some(now() - Duration::days(1));
        let store = Arc::new(MemoryCardStore::new(vec![c]));
        let mut session = ReviewSession::new(store.clone(), LeitnerConfig::default());
        session.load().await.unwrap();

        let updated = session
            .apply_outcome("q1", ReviewOutcome::Correct, now())
            .await
            .unwrap();

        assert_eq!(updated.leitner_box, 3);
        assert_eq!(updated.last_review, Some(now()));
        assert_eq!(updated.next_review, Some(now() + Duration::days(4)));

        let stored = store.select_all().await.unwrap();
        assert_eq!(stored[0], updated);
        assert_eq!(session.summary().reviewed, 1);
        assert_eq!(session.summary().correct, 1);
        assert!(session.next_due(now()).is_none());
    }

    #[tokio::test]
    async fn test_store_failure_leaves_card_unchanged() {
        let original = reviewed(card("q1", 4, "a"), 8, -1);
        let store = Arc::new(FailingStore {
            inner: MemoryCardStore::new(vec![original.clone()]),
            writes: AtomicUsize::new(0),
        });
        let mut session = ReviewSession::new(store.clone(), LeitnerConfig::default());
        session.load().await.unwrap();

        let result = session
            .apply_outcome("q1", ReviewOutcome::Incorrect, now())
            .await;

        assert!(matches!(result, Err(CoreError::StoreWrite(_))));
        assert_eq!(session.cards()[0], original);
        assert_eq!(store.writes.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(session.summary(), SessionSummary::default());
    }

    #[tokio::test]
    async fn test_unknown_card_is_not_found() {
        let store = Arc::new(MemoryCardStore::new(vec![card("q1", 1, "a")]));
        let mut session = ReviewSession::new(store, LeitnerConfig::default());
        session.load().await.unwrap();

        let result = session
            .apply_outcome("missing", ReviewOutcome::Correct, now())
            .await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_incorrect_answer_requeues_card() {
        let store = Arc::new(MemoryCardStore::new(vec![reviewed(card("q1", 3, "a"), 4, 0)]));
        let mut session = ReviewSession::new(store, LeitnerConfig::default());
        session.load().await.unwrap();

        session
            .apply_outcome("q1", ReviewOutcome::Incorrect, now())
            .await
            .unwrap();

        let next = session.next_due(now()).unwrap();
        assert_eq!(next.id, "q1");
        assert_eq!(next.leitner_box, 1);
        assert_eq!(session.summary().incorrect, 1);
    }
}
