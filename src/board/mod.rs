//! Board geometry, seats, occupancy and move generation.
//!
//! Everything here is static or a pure function of an occupancy snapshot;
//! no module in `board` owns mutable game state.

pub mod moves;
pub mod occupancy;
pub mod seats;
pub mod topology;

pub use moves::MoveGenerator;
pub use occupancy::Occupancy;
pub use seats::{
    SeatColor, SeatConfig, SeatDescriptor, SeatId, PIECES_PER_SEAT, SUPPORTED_PLAYER_COUNTS,
};
pub use topology::{BoardTopology, Cell, CellId, Direction, Jump, Zone, CELL_COUNT};
