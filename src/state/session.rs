//! Game session state.
//!
//! A `GameSession` owns one board occupancy, its roster, the drawn turn order
//! and the turn pointer. It is the only thing that mutates game state.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::connection::ConnectionId;
use super::phase::{InvalidTransition, PhaseEvent, SessionPhase};
use super::roster::{Participant, Roster};
use crate::board::{BoardTopology, CellId, MoveGenerator, Occupancy, SeatConfig, SeatId};
use crate::dice::DieRoller;
use crate::error::GameError;

/// Result of a successful join.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub seat: SeatId,
    /// The join completed the roster and the session moved to `RollingOrder`
    pub roster_filled: bool,
}

/// Result of a successful move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub seat: SeatId,
    pub from: CellId,
    pub to: CellId,
    /// Set when the move won the game
    pub winner: Option<SeatId>,
    /// Seat to move next, unless the game just finished
    pub next_seat: Option<SeatId>,
}

/// One entry of the drawn turn order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    pub seat: SeatId,
    pub nickname: String,
    pub die_value: u8,
}

/// Game session state.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Unique session ID
    pub id: String,

    /// Current phase
    pub phase: SessionPhase,

    board: Arc<BoardTopology>,

    config: SeatConfig,

    roster: Roster,

    /// Active seats in turn order, fixed once drawn
    seat_order: Vec<SeatId>,

    /// Index into `seat_order`
    current_turn_index: usize,

    occupancy: Occupancy,

    /// Winning seat once finished
    pub winner: Option<SeatId>,

    /// Successful moves applied
    pub move_count: u32,

    /// When session was created
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// When session entered `Playing`
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,

    /// When session finished
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl GameSession {
    /// Create a forming session for `player_count` players.
    pub fn new(
        id: String,
        player_count: usize,
        board: Arc<BoardTopology>,
        host_nickname: Option<String>,
    ) -> Result<Self, GameError> {
        let config = SeatConfig::for_players(&board, player_count)?;
        let seats: Vec<SeatId> = config.seats().iter().map(|s| s.seat).collect();
        let occupancy = Occupancy::initial(&config);

        Ok(Self {
            id,
            phase: SessionPhase::Forming,
            board,
            roster: Roster::new(&seats, host_nickname),
            config,
            seat_order: Vec::new(),
            current_turn_index: 0,
            occupancy,
            winner: None,
            move_count: 0,
            created_at: chrono::Utc::now(),
            started_at: None,
            finished_at: None,
        })
    }

    pub fn player_count(&self) -> usize {
        self.config.player_count
    }

    pub fn config(&self) -> &SeatConfig {
        &self.config
    }

    pub fn board(&self) -> &BoardTopology {
        &self.board
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn seat_order(&self) -> &[SeatId] {
        &self.seat_order
    }

    pub fn current_turn_index(&self) -> usize {
        self.current_turn_index
    }

    /// Seat whose turn it is, once the order is drawn.
    pub fn current_seat(&self) -> Option<SeatId> {
        self.seat_order.get(self.current_turn_index).copied()
    }

    /// Seat held by a connection.
    pub fn seat_of(&self, connection_id: ConnectionId) -> Option<SeatId> {
        self.roster.get_member(connection_id).map(|m| m.seat)
    }

    /// Add a participant during `Forming`.
    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        nickname: String,
    ) -> Result<JoinOutcome, GameError> {
        if !self.phase.accepts_joins() {
            return Err(GameError::SessionFull);
        }

        let seat = self.roster.add_member(connection_id, nickname)?.seat;

        let roster_filled = self.roster.is_full();
        if roster_filled {
            self.phase.apply_mut(PhaseEvent::RosterFilled)?;
            info!(session = %self.id, "roster filled");
        }

        Ok(JoinOutcome {
            seat,
            roster_filled,
        })
    }

    /// Remove a participant. Board and turn state are left untouched.
    pub fn leave(&mut self, connection_id: ConnectionId) -> Option<Participant> {
        self.roster.remove_member(connection_id)
    }

    /// Draw the turn order: highest die first, ties by nickname ascending.
    ///
    /// The order is drawn once and reused for the rest of the session.
    pub fn roll_order(&mut self, die: &dyn DieRoller) -> Result<Vec<OrderEntry>, GameError> {
        if self.phase != SessionPhase::RollingOrder || !self.seat_order.is_empty() {
            return Err(InvalidTransition {
                from: self.phase,
                event: PhaseEvent::RosterFilled,
                reason: "Turn order is drawn once, on a filled roster",
            }
            .into());
        }

        let mut entries: Vec<OrderEntry> = self
            .roster
            .members_mut()
            .map(|m| {
                let value = die.roll();
                m.die_value = Some(value);
                OrderEntry {
                    seat: m.seat,
                    nickname: m.nickname.clone(),
                    die_value: value,
                }
            })
            .collect();
        entries.sort_by(compare_order);

        self.seat_order = entries.iter().map(|e| e.seat).collect();
        self.current_turn_index = 0;
        info!(session = %self.id, order = ?self.seat_order, "turn order drawn");

        Ok(entries)
    }

    /// Mark a participant ready and start play when every guest is ready.
    ///
    /// Returns `true` if this call moved the session to `Playing`.
    pub fn mark_ready(&mut self, connection_id: ConnectionId) -> Result<bool, GameError> {
        self.roster.set_ready(connection_id, true)?;
        self.try_start()
    }

    /// Enter `Playing` if the order is drawn and every non-host is ready.
    pub fn try_start(&mut self) -> Result<bool, GameError> {
        if self.phase != SessionPhase::RollingOrder
            || self.seat_order.is_empty()
            || !self.roster.guests_ready()
        {
            return Ok(false);
        }

        self.phase.apply_mut(PhaseEvent::AllReady)?;
        self.started_at = Some(chrono::Utc::now());
        info!(session = %self.id, "session started");
        Ok(true)
    }

    /// Legal destinations for the piece on `from`, for `seat`.
    pub fn legal_destinations(&self, seat: SeatId, from: CellId) -> BTreeSet<CellId> {
        MoveGenerator::new(&self.board).legal_destinations(&self.occupancy, from, seat)
    }

    /// Apply a move. The only mutator of the board.
    pub fn apply_move(
        &mut self,
        seat: SeatId,
        from: CellId,
        to: CellId,
    ) -> Result<MoveOutcome, GameError> {
        if !self.phase.is_playing() {
            return Err(GameError::NotPlaying);
        }
        if self.current_seat() != Some(seat) {
            return Err(GameError::NotYourTurn);
        }

        MoveGenerator::new(&self.board).check_move(&self.occupancy, from, to, seat)?;

        self.occupancy.relocate(from, to);
        self.move_count += 1;
        debug!(session = %self.id, %seat, %from, %to, "move applied");

        if self.check_win(seat) {
            self.phase.apply_mut(PhaseEvent::Won)?;
            self.winner = Some(seat);
            self.finished_at = Some(chrono::Utc::now());
            info!(session = %self.id, winner = %seat, moves = self.move_count, "session finished");
            return Ok(MoveOutcome {
                seat,
                from,
                to,
                winner: Some(seat),
                next_seat: None,
            });
        }

        self.advance_turn();
        Ok(MoveOutcome {
            seat,
            from,
            to,
            winner: None,
            next_seat: self.current_seat(),
        })
    }

    /// Check if `seat` holds every cell of its target arm.
    pub fn check_win(&self, seat: SeatId) -> bool {
        self.config.get(seat).is_some_and(|desc| {
            desc.target_cells
                .iter()
                .all(|cell| self.occupancy.get(*cell) == Some(seat))
        })
    }

    fn advance_turn(&mut self) {
        if !self.seat_order.is_empty() {
            self.current_turn_index = (self.current_turn_index + 1) % self.seat_order.len();
        }
    }

    /// Convert full session state to a JSON snapshot.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "sessionId": self.id,
            "playerCount": self.player_count(),
            "phase": self.phase.as_str(),
            "players": self.roster.to_json(),
            "seatOrder": self.seat_order,
            "currentSeat": self.current_seat(),
            "occupancy": self.occupancy,
            "winnerSeat": self.winner,
            "moveCount": self.move_count
        })
    }

    #[cfg(test)]
    pub(crate) fn set_occupancy(&mut self, occupancy: Occupancy) {
        self.occupancy = occupancy;
    }
}

fn compare_order(a: &OrderEntry, b: &OrderEntry) -> Ordering {
    b.die_value
        .cmp(&a.die_value)
        .then_with(|| a.nickname.cmp(&b.nickname))
}
