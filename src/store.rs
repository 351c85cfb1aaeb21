//! Persistence boundary.
//!
//! The core only needs four things from the game store: look a game up, save
//! the drawn seat order, and record the start and the finish. Everything else
//! about the store is opaque.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::board::{SeatColor, SeatId};
use crate::error::GameError;

/// Stored game status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Waiting,
    Playing,
    Finished,
}

/// One seat of the stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatOrderRecord {
    pub nickname: String,
    pub seat: SeatId,
    pub color: SeatColor,
    pub die_value: u8,
    pub order: usize,
}

/// The stored view of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub game_id: String,
    pub creator: String,
    pub max_players: usize,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub seat_order: Vec<SeatOrderRecord>,
    #[serde(default)]
    pub winner: Option<String>,
}

impl GameRecord {
    pub fn new(game_id: impl Into<String>, creator: impl Into<String>, max_players: usize) -> Self {
        Self {
            game_id: game_id.into(),
            creator: creator.into(),
            max_players,
            status: RecordStatus::Waiting,
            seat_order: Vec::new(),
            winner: None,
        }
    }
}

/// Game store consumed at phase transitions.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Look a game up by id.
    async fn fetch_game(&self, game_id: &str) -> Result<Option<GameRecord>, GameError>;

    /// Save the drawn seat order.
    async fn record_seat_order(
        &self,
        game_id: &str,
        order: &[SeatOrderRecord],
    ) -> Result<(), GameError>;

    /// Record that play has begun.
    async fn mark_started(&self, game_id: &str) -> Result<(), GameError>;

    /// Record the winner.
    async fn mark_finished(&self, game_id: &str, winner: &str) -> Result<(), GameError>;
}

/// In-memory store for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryGameStore {
    games: Mutex<HashMap<String, GameRecord>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_games(records: impl IntoIterator<Item = GameRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    pub fn insert(&self, record: GameRecord) {
        self.lock().insert(record.game_id.clone(), record);
    }

    pub fn get(&self, game_id: &str) -> Option<GameRecord> {
        self.lock().get(game_id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, GameRecord>> {
        self.games.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(
        &self,
        game_id: &str,
        apply: impl FnOnce(&mut GameRecord),
    ) -> Result<(), GameError> {
        let mut games = self.lock();
        let record = games
            .get_mut(game_id)
            .ok_or_else(|| GameError::SessionNotFound(game_id.to_string()))?;
        apply(record);
        Ok(())
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn fetch_game(&self, game_id: &str) -> Result<Option<GameRecord>, GameError> {
        Ok(self.get(game_id))
    }

    async fn record_seat_order(
        &self,
        game_id: &str,
        order: &[SeatOrderRecord],
    ) -> Result<(), GameError> {
        self.update(game_id, |record| record.seat_order = order.to_vec())
    }

    async fn mark_started(&self, game_id: &str) -> Result<(), GameError> {
        self.update(game_id, |record| record.status = RecordStatus::Playing)
    }

    async fn mark_finished(&self, game_id: &str, winner: &str) -> Result<(), GameError> {
        self.update(game_id, |record| {
            record.status = RecordStatus::Finished;
            record.winner = Some(winner.to_string());
        })
    }
}
