//! Session state and the registry that owns it.
//!
//! - `phase` - Session phase machine (forming, rolling, playing, finished)
//! - `roster` - Who sits where, host and readiness
//! - `session` - One game: occupancy, turn order, win detection
//! - `connection` - Connection to session index
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       SessionRegistry                         │
//! │                                                               │
//! │  session_id ──▶ Arc<Mutex<Option<GameSession>>>               │
//! │                  (one async lock per session)                 │
//! │                                                               │
//! │  ┌─────────────────────────────────────────────────────────┐ │
//! │  │ GameSession                                              │ │
//! │  │   Roster ── seats, host, ready flags                     │ │
//! │  │   Occupancy ── 121 cells                                 │ │
//! │  │   SessionPhase ── Forming ▶ RollingOrder ▶ Playing ▶ ... │ │
//! │  └─────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The index map sits behind a plain mutex that is only held for lookups.
//! Everything that touches a session goes through its slot lock, which is
//! held across store calls so two events for the same session never
//! interleave. Distinct sessions never share a lock.

pub mod connection;
pub mod phase;
pub mod roster;
pub mod session;

pub use connection::{Connection, ConnectionId, ConnectionManager};
pub use phase::{InvalidTransition, PhaseEvent, SessionPhase};
pub use roster::{Participant, Roster};
pub use session::{GameSession, JoinOutcome, MoveOutcome, OrderEntry};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OwnedMutexGuard;
use tracing::info;

use crate::board::BoardTopology;
use crate::config::RegistryConfig;
use crate::error::GameError;

type Slot = Arc<tokio::sync::Mutex<Option<GameSession>>>;

/// Index of live sessions.
#[derive(Debug)]
pub struct SessionRegistry {
    board: Arc<BoardTopology>,
    config: RegistryConfig,
    slots: Mutex<HashMap<String, Slot>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Arc::new(BoardTopology::new()), RegistryConfig::default())
    }
}

impl SessionRegistry {
    pub fn new(board: Arc<BoardTopology>, config: RegistryConfig) -> Self {
        Self {
            board,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Shared board, handed to every session created here.
    pub fn board(&self) -> Arc<BoardTopology> {
        Arc::clone(&self.board)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Lock an existing session.
    pub async fn lock(&self, session_id: &str) -> Result<SessionGuard<'_>, GameError> {
        loop {
            let Some(slot) = self.slots().get(session_id).cloned() else {
                return Err(GameError::SessionNotFound(session_id.to_string()));
            };
            if let Some(guard) = self.enter(session_id, slot).await {
                if guard.get().is_some() {
                    return Ok(guard);
                }
                return Err(GameError::SessionNotFound(session_id.to_string()));
            }
        }
    }

    /// Lock a session, reserving an empty slot if none exists yet.
    ///
    /// The caller fills an empty slot with [`SessionGuard::create`]. A slot
    /// still empty when the guard drops is discarded.
    pub async fn lock_or_reserve(&self, session_id: &str) -> SessionGuard<'_> {
        loop {
            let slot = Arc::clone(
                self.slots()
                    .entry(session_id.to_string())
                    .or_insert_with(Slot::default),
            );
            if let Some(guard) = self.enter(session_id, slot).await {
                return guard;
            }
        }
    }

    /// Wait for a slot's lock. `None` if the slot was retired meanwhile.
    async fn enter(&self, session_id: &str, slot: Slot) -> Option<SessionGuard<'_>> {
        let guard = Arc::clone(&slot).lock_owned().await;
        if !self.is_registered(session_id, &slot) {
            return None;
        }
        Some(SessionGuard {
            registry: self,
            session_id: session_id.to_string(),
            slot,
            guard,
        })
    }

    /// Check if a live session exists.
    pub fn contains(&self, session_id: &str) -> bool {
        self.slots().contains_key(session_id)
    }

    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.slots().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn count(&self) -> usize {
        self.slots().len()
    }

    /// Destroy finished sessions older than the retention window.
    ///
    /// Sessions busy with a request are skipped and picked up next pass.
    pub fn reap_finished(&self, now: chrono::DateTime<chrono::Utc>) -> Vec<String> {
        let retention = self.config.finished_retention();
        let candidates: Vec<(String, Slot)> = self
            .slots()
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect();

        let mut reaped = Vec::new();
        for (session_id, slot) in candidates {
            let Ok(guard) = Arc::clone(&slot).try_lock_owned() else {
                continue;
            };
            if !self.is_registered(&session_id, &slot) {
                continue;
            }
            let mut guard = SessionGuard {
                registry: self,
                session_id,
                slot,
                guard,
            };

            let expired = guard.get().is_some_and(|session| {
                session.phase.is_terminal()
                    && session
                        .finished_at
                        .is_some_and(|at| at + retention <= now)
            });
            if expired {
                guard.destroy();
                reaped.push(guard.session_id.clone());
            }
        }

        if !reaped.is_empty() {
            info!(count = reaped.len(), "reaped finished sessions");
        }
        reaped
    }

    fn is_registered(&self, session_id: &str, slot: &Slot) -> bool {
        self.slots()
            .get(session_id)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    fn unregister(&self, session_id: &str, slot: &Slot) {
        let mut slots = self.slots();
        if slots
            .get(session_id)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            slots.remove(session_id);
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive access to one session slot.
///
/// Dropping a guard whose slot is empty removes the slot from the registry
/// before the lock is released, so waiters retry against a fresh lookup.
pub struct SessionGuard<'a> {
    registry: &'a SessionRegistry,
    session_id: String,
    slot: Slot,
    guard: OwnedMutexGuard<Option<GameSession>>,
}

impl SessionGuard<'_> {
    pub fn get(&self) -> Option<&GameSession> {
        (*self.guard).as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut GameSession> {
        (*self.guard).as_mut()
    }

    /// The session, or `SessionNotFound` for an empty slot.
    pub fn session(&self) -> Result<&GameSession, GameError> {
        (*self.guard)
            .as_ref()
            .ok_or_else(|| GameError::SessionNotFound(self.session_id.clone()))
    }

    pub fn session_mut(&mut self) -> Result<&mut GameSession, GameError> {
        let session_id = &self.session_id;
        (*self.guard)
            .as_mut()
            .ok_or_else(|| GameError::SessionNotFound(session_id.clone()))
    }

    /// Fill the slot with a freshly created session.
    pub fn create(&mut self, session: GameSession) -> &mut GameSession {
        self.guard.insert(session)
    }

    /// Empty the slot. The registry forgets it when the guard drops.
    pub fn destroy(&mut self) -> Option<GameSession> {
        let session = self.guard.take();
        if session.is_some() {
            info!(session = %self.session_id, "session destroyed");
        }
        session
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if self.guard.is_none() {
            self.registry.unregister(&self.session_id, &self.slot);
        }
    }
}

impl std::fmt::Debug for SessionGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("session_id", &self.session_id)
            .field("occupied", &self.guard.is_some())
            .finish()
    }
}
