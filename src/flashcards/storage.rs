//! Card record store contract and bundled implementations
//!
//! The review session only needs two operations from the store: read every
//! card and write back scheduling fields by id. Layout of the JSON store:
//! ```text
//! {data-dir}/
//! └── cards.json   # Array of all cards with their Leitner state
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::models::{CardPatch, Flashcard};
use crate::storage::{read_json_or_default, write_json, Result, StoreError};

/// Durable keyed storage of flashcards
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Read every card
    async fn select_all(&self) -> Result<Vec<Flashcard>>;

    /// Write scheduling fields for one card
    async fn update_by_id(&self, id: &str, patch: &CardPatch) -> Result<()>;
}

/// In-process card store
#[derive(Debug, Default)]
pub struct MemoryCardStore {
    cards: RwLock<Vec<Flashcard>>,
}

impl MemoryCardStore {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self {
            cards: RwLock::new(cards),
        }
    }
}

#[async_trait]
impl CardStore for MemoryCardStore {
    async fn select_all(&self) -> Result<Vec<Flashcard>> {
        Ok(self.cards.read().await.clone())
    }

    async fn update_by_id(&self, id: &str, patch: &CardPatch) -> Result<()> {
        let mut cards = self.cards.write().await;
        let card = cards
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("card {}", id)))?;
        card.apply_patch(patch);
        Ok(())
    }
}

/// Card store backed by a single JSON file
pub struct JsonCardStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    write_lock: Mutex<()>,
}

impl JsonCardStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("cards.json"),
            write_lock: Mutex::new(()),
        }
    }

    /// Seed or refresh cards from an external source
    ///
    /// Cards are matched by id. An imported card replaces the content of an
    /// existing one but keeps its scheduling state, so re-importing a deck
    /// does not reset review progress.
    pub async fn import(&self, incoming: Vec<Flashcard>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut cards: Vec<Flashcard> = read_json_or_default(&self.path).await?;
        let count = incoming.len();

        for card in incoming {
            match cards.iter_mut().find(|c| c.id == card.id) {
                Some(existing) => {
                    existing.question = card.question;
                    existing.answer = card.answer;
                    existing.topic = card.topic;
                    existing.difficulty = card.difficulty;
                }
                None => cards.push(card),
            }
        }

        write_json(&self.path, &cards).await?;
        log::info!("Imported {} cards into {:?}", count, self.path);
        Ok(count)
    }
}

#[async_trait]
impl CardStore for JsonCardStore {
    async fn select_all(&self) -> Result<Vec<Flashcard>> {
        read_json_or_default(&self.path).await
    }

    async fn update_by_id(&self, id: &str, patch: &CardPatch) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut cards: Vec<Flashcard> = read_json_or_default(&self.path).await?;
        let card = cards
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("card {}", id)))?;
        card.apply_patch(patch);
        write_json(&self.path, &cards).await
    }
}
