//! Session roster.
//!
//! The roster records who sits where. Seats are handed out at join and never
//! change for the life of the session, so it is the only authority on which
//! seat a connection may act as.

use serde::Serialize;

use super::connection::ConnectionId;
use crate::board::{SeatColor, SeatId};
use crate::error::GameError;

/// A participant's state within a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Connection acting for this participant
    #[serde(skip)]
    pub connection_id: ConnectionId,

    /// Seat assigned at join
    pub seat: SeatId,

    /// Display name, unique within the session
    pub nickname: String,

    /// Seat colour
    pub color: SeatColor,

    /// Whether participant signalled ready
    pub is_ready: bool,

    /// Host readiness does not gate the start
    pub is_host: bool,

    /// Die value from the order roll
    pub die_value: Option<u8>,

    /// When participant joined
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl Participant {
    pub fn new(connection_id: ConnectionId, nickname: String, seat: SeatId) -> Self {
        Self {
            connection_id,
            seat,
            nickname,
            color: seat.color(),
            is_ready: false,
            is_host: false,
            die_value: None,
            joined_at: chrono::Utc::now(),
        }
    }
}

/// Participants of one session, in join order.
#[derive(Debug, Clone)]
pub struct Roster {
    /// Seats available, in assignment order
    seats: Vec<SeatId>,

    members: Vec<Participant>,

    /// Nickname that should hold the host flag when it joins
    host_nickname: Option<String>,
}

impl Roster {
    pub fn new(seats: &[SeatId], host_nickname: Option<String>) -> Self {
        Self {
            seats: seats.to_vec(),
            members: Vec::with_capacity(seats.len()),
            host_nickname,
        }
    }

    /// Add a participant on the first free seat.
    pub fn add_member(
        &mut self,
        connection_id: ConnectionId,
        nickname: String,
    ) -> Result<&Participant, GameError> {
        if self.has_member(connection_id) {
            return Err(GameError::AlreadyJoined);
        }
        if self.members.iter().any(|m| m.nickname == nickname) {
            return Err(GameError::NicknameTaken(nickname));
        }

        let seat = self
            .seats
            .iter()
            .copied()
            .find(|seat| self.by_seat(*seat).is_none())
            .ok_or(GameError::SessionFull)?;

        let mut member = Participant::new(connection_id, nickname, seat);
        if self.host_nickname.as_deref() == Some(member.nickname.as_str()) {
            for other in &mut self.members {
                other.is_host = false;
            }
            member.is_host = true;
        } else if self.host().is_none() {
            member.is_host = true;
        }

        self.members.push(member);
        Ok(&self.members[self.members.len() - 1])
    }

    /// Remove a participant. If the host left, the earliest remaining joiner
    /// becomes host.
    pub fn remove_member(&mut self, connection_id: ConnectionId) -> Option<Participant> {
        let index = self
            .members
            .iter()
            .position(|m| m.connection_id == connection_id)?;
        let member = self.members.remove(index);

        if member.is_host {
            if let Some(next) = self.members.first_mut() {
                next.is_host = true;
            }
        }

        Some(member)
    }

    pub fn get_member(&self, connection_id: ConnectionId) -> Option<&Participant> {
        self.members.iter().find(|m| m.connection_id == connection_id)
    }

    pub fn get_member_mut(&mut self, connection_id: ConnectionId) -> Option<&mut Participant> {
        self.members
            .iter_mut()
            .find(|m| m.connection_id == connection_id)
    }

    pub fn has_member(&self, connection_id: ConnectionId) -> bool {
        self.get_member(connection_id).is_some()
    }

    pub fn by_seat(&self, seat: SeatId) -> Option<&Participant> {
        self.members.iter().find(|m| m.seat == seat)
    }

    pub fn host(&self) -> Option<&Participant> {
        self.members.iter().find(|m| m.is_host)
    }

    /// Set participant ready state.
    pub fn set_ready(&mut self, connection_id: ConnectionId, ready: bool) -> Result<(), GameError> {
        let member = self
            .get_member_mut(connection_id)
            .ok_or(GameError::SeatNotAssigned)?;
        member.is_ready = ready;
        Ok(())
    }

    /// Check if every participant other than the host is ready.
    pub fn guests_ready(&self) -> bool {
        !self.members.is_empty() && self.members.iter().filter(|m| !m.is_host).all(|m| m.is_ready)
    }

    pub fn members(&self) -> impl Iterator<Item = &Participant> {
        self.members.iter()
    }

    pub fn members_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.members.iter_mut()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.members.iter().map(|m| m.connection_id).collect()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Convert to JSON for sending to clients.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self
            .members
            .iter()
            .map(|m| serde_json::json!({
                "nickname": m.nickname,
                "seat": m.seat,
                "color": m.color.as_str(),
                "isReady": m.is_ready,
                "isHost": m.is_host,
                "dieValue": m.die_value
            }))
            .collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEATS: [SeatId; 3] = [SeatId(0), SeatId(1), SeatId(3)];

    #[test]
    fn test_seats_assigned_in_order() {
        let mut roster = Roster::new(&SEATS, None);

        let seat = roster.add_member(ConnectionId(1), "ana".into()).unwrap().seat;
        assert_eq!(seat, SeatId(0));
        let seat = roster.add_member(ConnectionId(2), "bo".into()).unwrap().seat;
        assert_eq!(seat, SeatId(1));

        // A freed seat is reused before later ones
        roster.remove_member(ConnectionId(1));
        let seat = roster.add_member(ConnectionId(3), "cy".into()).unwrap().seat;
        assert_eq!(seat, SeatId(0));

        let seat = roster.add_member(ConnectionId(4), "di".into()).unwrap().seat;
        assert_eq!(seat, SeatId(3));
        assert!(roster.is_full());

        let result = roster.add_member(ConnectionId(5), "ed".into());
        assert!(matches!(result, Err(GameError::SessionFull)));
    }

    #[test]
    fn test_duplicate_join() {
        let mut roster = Roster::new(&SEATS, None);
        roster.add_member(ConnectionId(1), "ana".into()).unwrap();

        assert!(matches!(
            roster.add_member(ConnectionId(1), "other".into()),
            Err(GameError::AlreadyJoined)
        ));
        assert!(matches!(
            roster.add_member(ConnectionId(2), "ana".into()),
            Err(GameError::NicknameTaken(_))
        ));
    }

    #[test]
    fn test_host_from_creator() {
        let mut roster = Roster::new(&SEATS, Some("bo".into()));
        roster.add_member(ConnectionId(1), "ana".into()).unwrap();
        // No creator yet: first joiner holds the flag
        assert_eq!(roster.host().unwrap().nickname, "ana");

        roster.add_member(ConnectionId(2), "bo".into()).unwrap();
        assert_eq!(roster.host().unwrap().nickname, "bo");
        assert_eq!(roster.members().filter(|m| m.is_host).count(), 1);
    }

    #[test]
    fn test_host_transfer_on_leave() {
        let mut roster = Roster::new(&SEATS, None);
        roster.add_member(ConnectionId(1), "ana".into()).unwrap();
        roster.add_member(ConnectionId(2), "bo".into()).unwrap();

        roster.remove_member(ConnectionId(1));
        assert_eq!(roster.host().unwrap().nickname, "bo");
    }

    #[test]
    fn test_guests_ready_ignores_host() {
        let mut roster = Roster::new(&SEATS, None);
        roster.add_member(ConnectionId(1), "ana".into()).unwrap();
        roster.add_member(ConnectionId(2), "bo".into()).unwrap();
        roster.add_member(ConnectionId(3), "cy".into()).unwrap();

        assert!(!roster.guests_ready());
        roster.set_ready(ConnectionId(2), true).unwrap();
        assert!(!roster.guests_ready());
        roster.set_ready(ConnectionId(3), true).unwrap();
        assert!(roster.guests_ready());

        assert!(matches!(
            roster.set_ready(ConnectionId(9), true),
            Err(GameError::SeatNotAssigned)
        ));
    }
}
