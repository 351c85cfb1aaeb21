//! Room coordinator.
//!
//! Routes inbound channel events to the right session, authorizes them
//! against the roster and turns session results into outbound dispatches.
//! A connection only ever acts as the seat it was given at join: seats and
//! host flags sent by clients are never trusted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::board::CellId;
use crate::dice::DieRoller;
use crate::error::GameError;
use crate::protocol::{Dispatch, InboundEvent, OutboundEvent, PlayerView, RolledSeat};
use crate::state::{ConnectionId, ConnectionManager, GameSession, SessionRegistry};
use crate::store::{GameStore, SeatOrderRecord};

/// Event router shared by every connection of the server.
pub struct RoomCoordinator {
    registry: Arc<SessionRegistry>,
    store: Arc<dyn GameStore>,
    die: Arc<dyn DieRoller>,
    connections: Mutex<ConnectionManager>,
}

impl RoomCoordinator {
    pub fn new(
        registry: Arc<SessionRegistry>,
        store: Arc<dyn GameStore>,
        die: Arc<dyn DieRoller>,
    ) -> Self {
        Self {
            registry,
            store,
            die,
            connections: Mutex::new(ConnectionManager::new()),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Session a connection has joined, if any.
    pub fn session_of(&self, connection: ConnectionId) -> Option<String> {
        self.connections()
            .session_of(connection)
            .map(str::to_string)
    }

    /// Outbound messages addressed to a connection so far.
    pub fn messages_sent(&self, connection: ConnectionId) -> u64 {
        self.connections()
            .get(connection)
            .map_or(0, |c| c.messages_sent)
    }

    pub fn connection_count(&self) -> usize {
        self.connections().count()
    }

    /// Parse and handle a raw JSON event.
    pub async fn handle_json(&self, connection: ConnectionId, text: &str) -> Vec<Dispatch> {
        match InboundEvent::from_json_str(text) {
            Ok(event) => self.handle(connection, event).await,
            Err(err) => {
                self.connections().touch(connection);
                let err = GameError::MalformedEvent(err.to_string());
                warn!(%connection, code = err.code(), "request rejected: {}", err);
                self.deliver(vec![Dispatch::unicast(
                    connection,
                    OutboundEvent::rejected(&err),
                )])
            }
        }
    }

    /// Handle one inbound event.
    ///
    /// Errors never escape: they become a `rejected` message for the sender.
    pub async fn handle(&self, connection: ConnectionId, event: InboundEvent) -> Vec<Dispatch> {
        self.connections().touch(connection);
        let name = event.name();

        let result = match event {
            InboundEvent::Join {
                session_id,
                nickname,
            } => self.join(connection, &session_id, nickname).await,
            InboundEvent::MarkReady {
                session_id,
                nickname,
                is_host,
            } => {
                self.mark_ready(connection, &session_id, &nickname, is_host)
                    .await
            }
            InboundEvent::RequestMoves {
                session_id,
                from_cell,
            } => self.request_moves(connection, &session_id, from_cell).await,
            InboundEvent::Move {
                session_id,
                from_cell,
                to_cell,
            } => {
                self.apply_move(connection, &session_id, from_cell, to_cell)
                    .await
            }
            InboundEvent::Chat {
                session_id,
                message,
            } => self.chat(connection, &session_id, &message).await,
            InboundEvent::Leave => Ok(self.leave(connection).await),
        };

        let dispatches = match result {
            Ok(dispatches) => dispatches,
            Err(err) => {
                warn!(%connection, event = name, code = err.code(), "request rejected: {}", err);
                vec![Dispatch::unicast(connection, OutboundEvent::rejected(&err))]
            }
        };
        self.deliver(dispatches)
    }

    /// Transport lost the connection.
    pub async fn disconnect(&self, connection: ConnectionId) -> Vec<Dispatch> {
        let dispatches = self.leave(connection).await;
        let dispatches = self.deliver(dispatches);
        self.connections().remove(connection);
        debug!(%connection, "connection closed");
        dispatches
    }

    /// Destroy expired finished sessions and release their connections.
    pub fn reap_finished(&self, now: chrono::DateTime<chrono::Utc>) -> Vec<String> {
        let reaped = self.registry.reap_finished(now);
        let mut connections = self.connections();
        for session_id in &reaped {
            let released = connections.unbind_session(session_id);
            debug!(session = %session_id, count = released.len(), "released connections");
        }
        reaped
    }

    async fn join(
        &self,
        connection: ConnectionId,
        session_id: &str,
        nickname: String,
    ) -> Result<Vec<Dispatch>, GameError> {
        if !self.registry.config().accepts_nickname(&nickname) {
            return Err(GameError::InvalidNickname);
        }
        let nickname = nickname.trim().to_string();

        // Claimed before any await so a second join cannot slip in
        if !self.connections().try_bind(connection, session_id) {
            return Err(GameError::AlreadyJoined);
        }

        let result = self.take_seat(connection, session_id, nickname).await;
        if result.is_err() {
            self.connections().unbind(connection);
        }
        result
    }

    async fn take_seat(
        &self,
        connection: ConnectionId,
        session_id: &str,
        nickname: String,
    ) -> Result<Vec<Dispatch>, GameError> {
        let mut guard = self.registry.lock_or_reserve(session_id).await;
        if guard.get().is_none() {
            let record = self
                .store
                .fetch_game(session_id)
                .await?
                .ok_or_else(|| GameError::SessionNotFound(session_id.to_string()))?;
            let session = GameSession::new(
                session_id.to_string(),
                record.max_players,
                self.registry.board(),
                Some(record.creator),
            )?;
            info!(session = %session_id, players = record.max_players, "session created");
            guard.create(session);
        }

        let session = guard.session_mut()?;
        let outcome = match session.join(connection, nickname.clone()) {
            Ok(outcome) => outcome,
            Err(err) => {
                if session.roster().is_empty() {
                    guard.destroy();
                }
                return Err(err);
            }
        };
        info!(session = %session_id, %connection, seat = %outcome.seat, nickname = %nickname, "participant joined");

        let mut dispatches = vec![Dispatch::room(
            session.roster(),
            OutboundEvent::ParticipantJoined {
                nickname,
                players: PlayerView::roster(session.roster()),
            },
        )];

        if outcome.roster_filled {
            let entries = session.roll_order(self.die.as_ref())?;
            let records: Vec<SeatOrderRecord> = entries
                .iter()
                .enumerate()
                .map(|(order, entry)| SeatOrderRecord {
                    nickname: entry.nickname.clone(),
                    seat: entry.seat,
                    color: entry.seat.color(),
                    die_value: entry.die_value,
                    order,
                })
                .collect();
            if let Err(err) = self.store.record_seat_order(session_id, &records).await {
                warn!(session = %session_id, error = %err, "failed to record seat order");
            }

            dispatches.push(Dispatch::room(
                session.roster(),
                OutboundEvent::OrderRolled {
                    players: entries.iter().map(RolledSeat::from).collect(),
                },
            ));

            // Guests may have readied while the roster was still forming
            if session.try_start()? {
                dispatches.extend(self.started(session).await);
            }
        }

        Ok(dispatches)
    }

    async fn mark_ready(
        &self,
        connection: ConnectionId,
        session_id: &str,
        nickname: &str,
        is_host: bool,
    ) -> Result<Vec<Dispatch>, GameError> {
        let mut guard = self.registry.lock(session_id).await?;
        let session = guard.session_mut()?;

        let nickname = nickname.trim();
        let (own_nickname, host) = session
            .roster()
            .get_member(connection)
            .map(|m| (m.nickname.clone(), m.is_host))
            .ok_or(GameError::SeatNotAssigned)?;
        if own_nickname != nickname {
            warn!(session = %session_id, %connection, claimed = %nickname, actual = %own_nickname, "ready for another participant");
            return Err(GameError::SeatNotAssigned);
        }
        if host != is_host {
            warn!(session = %session_id, %connection, claimed = is_host, actual = host, "client host flag disagrees with roster");
        }

        let started = session.mark_ready(connection)?;
        debug!(session = %session_id, nickname = %own_nickname, "participant ready");

        let mut dispatches = vec![Dispatch::room(
            session.roster(),
            OutboundEvent::ParticipantReady {
                nickname: own_nickname,
            },
        )];
        if started {
            dispatches.extend(self.started(session).await);
        }
        Ok(dispatches)
    }

    async fn chat(
        &self,
        connection: ConnectionId,
        session_id: &str,
        message: &str,
    ) -> Result<Vec<Dispatch>, GameError> {
        let guard = self.registry.lock(session_id).await?;
        let session = guard.session()?;

        let nickname = session
            .roster()
            .get_member(connection)
            .map(|m| m.nickname.clone())
            .ok_or(GameError::SeatNotAssigned)?;
        if !self.registry.config().accepts_message(message) {
            return Err(GameError::InvalidMessage);
        }

        Ok(vec![Dispatch::room(
            session.roster(),
            OutboundEvent::ChatMessage {
                nickname,
                message: message.trim().to_string(),
                sent_at: chrono::Utc::now(),
            },
        )])
    }

    async fn request_moves(
        &self,
        connection: ConnectionId,
        session_id: &str,
        from_cell: u32,
    ) -> Result<Vec<Dispatch>, GameError> {
        let guard = self.registry.lock(session_id).await?;
        let session = guard.session()?;

        let seat = session
            .seat_of(connection)
            .ok_or(GameError::SeatNotAssigned)?;
        let from = resolve_cell(session, from_cell)?;

        let destinations: Vec<CellId> = session
            .legal_destinations(seat, from)
            .into_iter()
            .collect();
        debug!(session = %session_id, %seat, %from, count = destinations.len(), "moves requested");

        Ok(vec![Dispatch::unicast(
            connection,
            OutboundEvent::MovesForCell {
                from_cell: from,
                destinations,
            },
        )])
    }

    async fn apply_move(
        &self,
        connection: ConnectionId,
        session_id: &str,
        from_cell: u32,
        to_cell: u32,
    ) -> Result<Vec<Dispatch>, GameError> {
        let mut guard = self.registry.lock(session_id).await?;
        let session = guard.session_mut()?;

        let seat = session
            .seat_of(connection)
            .ok_or(GameError::SeatNotAssigned)?;
        let from = resolve_cell(session, from_cell)?;
        let to = resolve_cell(session, to_cell)?;

        let outcome = session.apply_move(seat, from, to)?;

        let mut dispatches = vec![Dispatch::room(
            session.roster(),
            OutboundEvent::MoveApplied {
                from_cell: outcome.from,
                to_cell: outcome.to,
                seat: outcome.seat,
                occupancy: session.occupancy().clone(),
                next_seat: outcome.next_seat,
            },
        )];

        if let Some(winner) = outcome.winner {
            let winner_nickname = session
                .roster()
                .by_seat(winner)
                .map(|m| m.nickname.clone());
            if let Some(name) = &winner_nickname {
                if let Err(err) = self.store.mark_finished(session_id, name).await {
                    warn!(session = %session_id, error = %err, "failed to record winner");
                }
            }
            dispatches.push(Dispatch::room(
                session.roster(),
                OutboundEvent::SessionFinished {
                    winner_seat: winner,
                    winner_nickname,
                },
            ));
        } else if let Some(next) = outcome.next_seat {
            dispatches.push(Dispatch::room(
                session.roster(),
                OutboundEvent::TurnChanged { current_seat: next },
            ));
        }

        Ok(dispatches)
    }

    /// Drop a connection from its session.
    ///
    /// Game state is left alone; the last participant out destroys the
    /// session.
    async fn leave(&self, connection: ConnectionId) -> Vec<Dispatch> {
        let Some(session_id) = self.session_of(connection) else {
            return Vec::new();
        };
        self.connections().unbind(connection);

        let Ok(mut guard) = self.registry.lock(&session_id).await else {
            return Vec::new();
        };
        let Some(session) = guard.get_mut() else {
            return Vec::new();
        };
        let Some(left) = session.leave(connection) else {
            return Vec::new();
        };
        info!(session = %session_id, %connection, nickname = %left.nickname, "participant left");

        if session.roster().is_empty() {
            guard.destroy();
            return Vec::new();
        }

        vec![Dispatch::room(
            session.roster(),
            OutboundEvent::ParticipantLeft {
                nickname: left.nickname,
                players: PlayerView::roster(session.roster()),
            },
        )]
    }

    /// Record the start with the store and build the broadcast.
    async fn started(&self, session: &GameSession) -> Option<Dispatch> {
        let current_seat = session.current_seat()?;
        if let Err(err) = self.store.mark_started(&session.id).await {
            warn!(session = %session.id, error = %err, "failed to mark session started");
        }

        Some(Dispatch::room(
            session.roster(),
            OutboundEvent::SessionStarted {
                occupancy: session.occupancy().clone(),
                seat_order: session.seat_order().to_vec(),
                current_seat,
            },
        ))
    }

    fn deliver(&self, dispatches: Vec<Dispatch>) -> Vec<Dispatch> {
        let mut connections = self.connections();
        for dispatch in &dispatches {
            connections.record_sent(&dispatch.recipients());
        }
        dispatches
    }

    fn connections(&self) -> MutexGuard<'_, ConnectionManager> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn resolve_cell(session: &GameSession, raw: u32) -> Result<CellId, GameError> {
    session
        .board()
        .cell_id(raw)
        .ok_or(GameError::UnknownCell(raw))
}

impl std::fmt::Debug for RoomCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomCoordinator")
            .field("sessions", &self.registry.count())
            .field("connections", &self.connection_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDie;
    use crate::store::GameRecord;
    use async_trait::async_trait;

    /// Knows one game but fails every write.
    struct ReadOnlyStore;

    #[async_trait]
    impl GameStore for ReadOnlyStore {
        async fn fetch_game(&self, game_id: &str) -> Result<Option<GameRecord>, GameError> {
            Ok((game_id == "g-1").then(|| GameRecord::new("g-1", "ana", 2)))
        }

        async fn record_seat_order(
            &self,
            _game_id: &str,
            _order: &[SeatOrderRecord],
        ) -> Result<(), GameError> {
            Err(GameError::Store("read only".into()))
        }

        async fn mark_started(&self, _game_id: &str) -> Result<(), GameError> {
            Err(GameError::Store("read only".into()))
        }

        async fn mark_finished(&self, _game_id: &str, _winner: &str) -> Result<(), GameError> {
            Err(GameError::Store("read only".into()))
        }
    }

    fn join_event(nickname: &str) -> InboundEvent {
        InboundEvent::Join {
            session_id: "g-1".into(),
            nickname: nickname.into(),
        }
    }

    #[tokio::test]
    async fn test_store_write_failures_do_not_block_play() {
        let coordinator = RoomCoordinator::new(
            Arc::new(SessionRegistry::default()),
            Arc::new(ReadOnlyStore),
            Arc::new(ScriptedDie::new([3, 4])),
        );

        coordinator.handle(ConnectionId(1), join_event("ana")).await;
        let out = coordinator.handle(ConnectionId(2), join_event("bo")).await;
        assert!(matches!(out[1].event, OutboundEvent::OrderRolled { .. }));

        let out = coordinator
            .handle(
                ConnectionId(2),
                InboundEvent::MarkReady {
                    session_id: "g-1".into(),
                    nickname: "bo".into(),
                    is_host: true,
                },
            )
            .await;
        assert!(matches!(
            out[1].event,
            OutboundEvent::SessionStarted {
                current_seat: crate::board::SeatId(2),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unknown_cell_rejected() {
        let coordinator = RoomCoordinator::new(
            Arc::new(SessionRegistry::default()),
            Arc::new(ReadOnlyStore),
            Arc::new(ScriptedDie::new([3, 4])),
        );
        coordinator.handle(ConnectionId(1), join_event("ana")).await;

        let out = coordinator
            .handle(
                ConnectionId(1),
                InboundEvent::RequestMoves {
                    session_id: "g-1".into(),
                    from_cell: 121,
                },
            )
            .await;
        assert_eq!(out.len(), 1);
        assert!(matches!(
            &out[0].event,
            OutboundEvent::Rejected { code, .. } if code == "unknown_cell"
        ));
    }
}
