//! Session phase state machine.
//!
//! # State Diagram
//!
//! ```text
//! ┌──────────┐  roster_filled  ┌──────────────┐  all_ready  ┌─────────┐
//! │ Forming  │────────────────▶│ RollingOrder │────────────▶│ Playing │
//! └──────────┘                 └──────────────┘             └────┬────┘
//!                                                                │ won
//!                                                                ▼
//!                                                          ┌──────────┐
//!                                                          │ Finished │
//!                                                          └──────────┘
//! ```
//!
//! `Finished` is terminal. Nothing moves a session backwards: a participant
//! leaving only changes the roster.

use std::fmt;

use serde::Serialize;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Accepting joins until the roster is full
    #[default]
    Forming,
    /// Turn order drawn, waiting for readiness
    RollingOrder,
    /// Moves are accepted
    Playing,
    /// A seat has won
    Finished,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forming => "forming",
            Self::RollingOrder => "rolling_order",
            Self::Playing => "playing",
            Self::Finished => "finished",
        }
    }

    pub fn accepts_joins(&self) -> bool {
        matches!(self, Self::Forming)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase transition events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    RosterFilled,
    AllReady,
    Won,
}

/// Error when a phase transition is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: SessionPhase,
    pub event: PhaseEvent,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid transition from {} via {:?}: {}",
            self.from, self.event, self.reason
        )
    }
}

impl std::error::Error for InvalidTransition {}

impl SessionPhase {
    /// Calculate the phase after `event`.
    pub fn transition(self, event: PhaseEvent) -> Result<SessionPhase, InvalidTransition> {
        use PhaseEvent::*;
        use SessionPhase::*;

        let invalid = |reason: &'static str| InvalidTransition {
            from: self,
            event,
            reason,
        };

        match (self, event) {
            (Forming, RosterFilled) => Ok(RollingOrder),
            (_, RosterFilled) => Err(invalid("Roster already filled")),

            (RollingOrder, AllReady) => Ok(Playing),
            (Forming, AllReady) => Err(invalid("Turn order not drawn yet")),
            (_, AllReady) => Err(invalid("Session already started")),

            (Playing, Won) => Ok(Finished),
            (Finished, Won) => Err(invalid("Session already finished")),
            (_, Won) => Err(invalid("Session not in play")),
        }
    }

    /// Apply `event` in place.
    pub fn apply_mut(&mut self, event: PhaseEvent) -> Result<(), InvalidTransition> {
        *self = self.transition(event)?;
        Ok(())
    }
}
