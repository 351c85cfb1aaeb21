//! Request-level errors.
//!
//! Every variant is recoverable: it is reported to the connection that sent
//! the request and leaves session state untouched.

use serde::Serialize;

use crate::state::phase::InvalidTransition;

/// Why a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IllegalMoveReason {
    NotOwner,
    OccupiedDestination,
    Unreachable,
    WrongDirection,
}

impl IllegalMoveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotOwner => "not-owner",
            Self::OccupiedDestination => "occupied-destination",
            Self::Unreachable => "unreachable",
            Self::WrongDirection => "wrong-direction",
        }
    }
}

impl std::fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by session and coordinator operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("connection has no seat in this session")]
    SeatNotAssigned,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("illegal move: {reason}")]
    IllegalMove { reason: IllegalMoveReason },

    #[error("unsupported player count {0}")]
    InvalidPlayerCount(usize),

    #[error("no seat configuration for {0} players")]
    ConfigurationMissing(usize),

    #[error("session is not accepting players")]
    SessionFull,

    #[error("nickname {0} is already taken")]
    NicknameTaken(String),

    #[error("connection already joined a session")]
    AlreadyJoined,

    #[error("invalid nickname")]
    InvalidNickname,

    #[error("chat message is empty or too long")]
    InvalidMessage,

    #[error("session is not in play")]
    NotPlaying,

    #[error("unknown cell {0}")]
    UnknownCell(u32),

    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("game store: {0}")]
    Store(String),
}

impl GameError {
    /// Stable machine-readable code for the `rejected` message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "session_not_found",
            Self::SeatNotAssigned => "seat_not_assigned",
            Self::NotYourTurn => "not_your_turn",
            Self::IllegalMove { .. } => "illegal_move",
            Self::InvalidPlayerCount(_) => "invalid_player_count",
            Self::ConfigurationMissing(_) => "configuration_missing",
            Self::SessionFull => "session_full",
            Self::NicknameTaken(_) => "nickname_taken",
            Self::AlreadyJoined => "already_joined",
            Self::InvalidNickname => "invalid_nickname",
            Self::InvalidMessage => "invalid_message",
            Self::NotPlaying => "not_playing",
            Self::UnknownCell(_) => "unknown_cell",
            Self::MalformedEvent(_) => "malformed_event",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::Store(_) => "store_error",
        }
    }
}

impl From<IllegalMoveReason> for GameError {
    fn from(reason: IllegalMoveReason) -> Self {
        Self::IllegalMove { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = GameError::from(IllegalMoveReason::WrongDirection);
        assert_eq!(err.to_string(), "illegal move: wrong-direction");
        assert_eq!(err.code(), "illegal_move");

        let err = GameError::SessionNotFound("g-1".into());
        assert_eq!(err.to_string(), "session g-1 not found");
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GameError>();
    }
}
