//! Hexstar Server Library
//!
//! This crate provides the game-state engine and room coordination for
//! star-board checkers: six corners, 121 cells, two to six players.
//!
//! # Overview
//!
//! - **Board** - Static star geometry, seat tables per player count, occupancy
//!   snapshots and legal-move generation with chained jumps.
//!
//! - **Session State Machine** - Forming, rolling the turn order, playing and
//!   finished, with validated transitions.
//!
//! - **Session Registry** - Indexed access to live sessions with one async
//!   lock per session.
//!
//! - **Room Coordinator** - Routes channel events, authorizes them against the
//!   roster, relays room chat and fans results out to the room.
//!
//! # Design Principles
//!
//! 1. **The session is the only mutator** - Moves, readiness and turn order all
//!    go through `GameSession`.
//!
//! 2. **Seats come from the roster** - Clients never choose which seat they
//!    act as.
//!
//! 3. **No transport** - The coordinator returns dispatches; delivering them
//!    over a socket is the embedding server's job.
//!
//! 4. **Serialization-ready** - Every outbound event is tagged JSON.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use hexstar_server::{
//!     ConnectionId, GameRecord, InboundEvent, MemoryGameStore, RoomCoordinator,
//!     ScriptedDie, SessionRegistry,
//! };
//!
//! # tokio_test_block(async {
//! let store = MemoryGameStore::with_games([GameRecord::new("g-1", "ana", 2)]);
//! let coordinator = RoomCoordinator::new(
//!     Arc::new(SessionRegistry::default()),
//!     Arc::new(store),
//!     Arc::new(ScriptedDie::new([6, 3])),
//! );
//!
//! let join = InboundEvent::Join {
//!     session_id: "g-1".into(),
//!     nickname: "ana".into(),
//! };
//! let dispatches = coordinator.handle(ConnectionId(1), join).await;
//! assert!(dispatches[0].is_broadcast());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

pub mod board;
pub mod config;
pub mod coordinator;
pub mod dice;
pub mod error;
pub mod protocol;
pub mod state;
pub mod store;

pub use board::{BoardTopology, CellId, MoveGenerator, Occupancy, SeatConfig, SeatId};
pub use config::RegistryConfig;
pub use coordinator::RoomCoordinator;
pub use dice::{DieRoller, ScriptedDie, ThreadRngDie};
pub use error::{GameError, IllegalMoveReason};
pub use protocol::{Dispatch, InboundEvent, OutboundEvent, Recipients};
pub use state::{ConnectionId, GameSession, SessionPhase, SessionRegistry};
pub use store::{GameRecord, GameStore, MemoryGameStore, RecordStatus};
