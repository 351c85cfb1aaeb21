//! Channel message contract.
//!
//! Inbound and outbound events are tagged JSON objects: `{"type": "move", ...}`.
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::board::{CellId, Occupancy, SeatColor, SeatId};
use crate::error::GameError;
use crate::state::connection::ConnectionId;
use crate::state::roster::{Participant, Roster};
use crate::state::session::OrderEntry;

/// Events a client sends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundEvent {
    #[serde(rename_all = "camelCase")]
    Join { session_id: String, nickname: String },

    #[serde(rename_all = "camelCase")]
    MarkReady {
        session_id: String,
        nickname: String,
        #[serde(default)]
        is_host: bool,
    },

    #[serde(rename_all = "camelCase")]
    RequestMoves { session_id: String, from_cell: u32 },

    #[serde(rename_all = "camelCase")]
    Move {
        session_id: String,
        from_cell: u32,
        to_cell: u32,
    },

    /// Room chat; the sender's nickname comes from the roster
    #[serde(rename_all = "camelCase")]
    Chat { session_id: String, message: String },

    /// Explicit leave; a dropped connection implies the same
    Leave,
}

impl InboundEvent {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::MarkReady { .. } => "markReady",
            Self::RequestMoves { .. } => "requestMoves",
            Self::Move { .. } => "move",
            Self::Chat { .. } => "chat",
            Self::Leave => "leave",
        }
    }
}

/// A participant as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub nickname: String,
    pub seat: SeatId,
    pub color: SeatColor,
    pub is_ready: bool,
    pub is_host: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub die_value: Option<u8>,
}

impl From<&Participant> for PlayerView {
    fn from(p: &Participant) -> Self {
        Self {
            nickname: p.nickname.clone(),
            seat: p.seat,
            color: p.color,
            is_ready: p.is_ready,
            is_host: p.is_host,
            die_value: p.die_value,
        }
    }
}

impl PlayerView {
    pub fn roster(roster: &Roster) -> Vec<PlayerView> {
        roster.members().map(PlayerView::from).collect()
    }
}

/// One entry of the rolled order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolledSeat {
    pub nickname: String,
    pub seat: SeatId,
    pub die_value: u8,
}

impl From<&OrderEntry> for RolledSeat {
    fn from(entry: &OrderEntry) -> Self {
        Self {
            nickname: entry.nickname.clone(),
            seat: entry.seat,
            die_value: entry.die_value,
        }
    }
}

/// Events the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundEvent {
    #[serde(rename_all = "camelCase")]
    ParticipantJoined {
        nickname: String,
        players: Vec<PlayerView>,
    },

    #[serde(rename_all = "camelCase")]
    ParticipantReady { nickname: String },

    #[serde(rename_all = "camelCase")]
    OrderRolled { players: Vec<RolledSeat> },

    #[serde(rename_all = "camelCase")]
    SessionStarted {
        occupancy: Occupancy,
        seat_order: Vec<SeatId>,
        current_seat: SeatId,
    },

    #[serde(rename_all = "camelCase")]
    MovesForCell {
        from_cell: CellId,
        destinations: Vec<CellId>,
    },

    #[serde(rename_all = "camelCase")]
    MoveApplied {
        from_cell: CellId,
        to_cell: CellId,
        seat: SeatId,
        occupancy: Occupancy,
        next_seat: Option<SeatId>,
    },

    #[serde(rename_all = "camelCase")]
    TurnChanged { current_seat: SeatId },

    #[serde(rename_all = "camelCase")]
    SessionFinished {
        winner_seat: SeatId,
        winner_nickname: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    ParticipantLeft {
        nickname: String,
        players: Vec<PlayerView>,
    },

    #[serde(rename_all = "camelCase")]
    ChatMessage {
        nickname: String,
        message: String,
        sent_at: chrono::DateTime<chrono::Utc>,
    },

    #[serde(rename_all = "camelCase")]
    Rejected { code: String, reason: String },
}

impl OutboundEvent {
    pub fn rejected(err: &GameError) -> Self {
        Self::Rejected {
            code: err.code().to_string(),
            reason: err.to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Who receives an outbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    /// Only the requesting connection
    Connection(ConnectionId),
    /// Every participant of the room at send time
    Room(Vec<ConnectionId>),
}

/// An outbound event with its recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub to: Recipients,
    pub event: OutboundEvent,
}

impl Dispatch {
    pub fn unicast(connection: ConnectionId, event: OutboundEvent) -> Self {
        Self {
            to: Recipients::Connection(connection),
            event,
        }
    }

    pub fn room(roster: &Roster, event: OutboundEvent) -> Self {
        Self {
            to: Recipients::Room(roster.connection_ids()),
            event,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self.to, Recipients::Room(_))
    }

    /// Every connection this dispatch reaches.
    pub fn recipients(&self) -> Vec<ConnectionId> {
        match &self.to {
            Recipients::Connection(id) => vec![*id],
            Recipients::Room(ids) => ids.clone(),
        }
    }

    pub fn reaches(&self, connection: ConnectionId) -> bool {
        match &self.to {
            Recipients::Connection(id) => *id == connection,
            Recipients::Room(ids) => ids.contains(&connection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_inbound() {
        let event = InboundEvent::from_json_str(
            r#"{"type": "move", "sessionId": "g-1", "fromCell": 9, "toCell": 23}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            InboundEvent::Move {
                session_id: "g-1".into(),
                from_cell: 9,
                to_cell: 23
            }
        );

        let event = InboundEvent::from_json_str(
            r#"{"type": "markReady", "sessionId": "g-1", "nickname": "ana"}"#,
        )
        .unwrap();
        assert!(matches!(event, InboundEvent::MarkReady { is_host: false, .. }));

        let event = InboundEvent::from_json_str(
            r#"{"type": "chat", "sessionId": "g-1", "message": "gg"}"#,
        )
        .unwrap();
        assert_eq!(event.name(), "chat");

        let event = InboundEvent::from_json_str(r#"{"type": "leave"}"#).unwrap();
        assert_eq!(event, InboundEvent::Leave);

        assert!(InboundEvent::from_json_str(r#"{"type": "teleport"}"#).is_err());
    }

    #[test]
    fn test_outbound_shape() {
        let event = OutboundEvent::TurnChanged {
            current_seat: SeatId(2),
        };
        assert_eq!(
            event.to_json(),
            serde_json::json!({"type": "turnChanged", "currentSeat": 2})
        );

        let event = OutboundEvent::MovesForCell {
            from_cell: CellId(9),
            destinations: vec![CellId(22), CellId(23)],
        };
        assert_eq!(
            event.to_json(),
            serde_json::json!({"type": "movesForCell", "fromCell": 9, "destinations": [22, 23]})
        );

        let event = OutboundEvent::rejected(&GameError::NotYourTurn);
        assert_eq!(
            event.to_json(),
            serde_json::json!({
                "type": "rejected",
                "code": "not_your_turn",
                "reason": "it is not your turn"
            })
        );
    }

    #[test]
    fn test_dispatch_recipients() {
        let dispatch = Dispatch::unicast(
            ConnectionId(4),
            OutboundEvent::ParticipantReady {
                nickname: "ana".into(),
            },
        );
        assert!(!dispatch.is_broadcast());
        assert!(dispatch.reaches(ConnectionId(4)));
        assert!(!dispatch.reaches(ConnectionId(5)));
        assert_eq!(dispatch.recipients(), vec![ConnectionId(4)]);
    }
}
