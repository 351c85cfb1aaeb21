//! Seat identities and per-player-count seat tables.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::topology::{BoardTopology, CellId, Direction};
use crate::error::GameError;

/// Pieces each seat starts with.
pub const PIECES_PER_SEAT: usize = 10;

/// Player counts the board supports.
pub const SUPPORTED_PLAYER_COUNTS: [usize; 4] = [2, 3, 4, 6];

/// One of the six fixed corner identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(pub u8);

impl SeatId {
    /// The seat whose home arm lies across the board.
    pub fn opposite(self) -> SeatId {
        match self.0 {
            0 => SeatId(2),
            1 => SeatId(4),
            2 => SeatId(0),
            3 => SeatId(5),
            4 => SeatId(1),
            _ => SeatId(3),
        }
    }

    pub fn color(self) -> SeatColor {
        match self.0 {
            0 => SeatColor::Red,
            1 => SeatColor::Yellow,
            2 => SeatColor::Green,
            3 => SeatColor::Blue,
            4 => SeatColor::Purple,
            _ => SeatColor::Orange,
        }
    }

    /// Directions a piece of this seat may take for a step or a chain's
    /// first hop: the two pointing at the target arm and the two lateral
    /// ones. The two retreating directions are never allowed.
    pub fn allowed_directions(self) -> [Direction; 4] {
        use Direction::*;
        match self.0 {
            // top -> bottom
            0 => [SouthWest, SouthEast, East, West],
            // lower-right -> upper-left
            1 => [NorthWest, West, NorthEast, SouthWest],
            // bottom -> top
            2 => [NorthWest, NorthEast, East, West],
            // lower-left -> upper-right
            3 => [NorthEast, East, NorthWest, SouthEast],
            // upper-left -> lower-right
            4 => [SouthEast, East, NorthEast, SouthWest],
            // upper-right -> lower-left
            _ => [SouthWest, West, NorthWest, SouthEast],
        }
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat-{}", self.0)
    }
}

/// Seat colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatColor {
    Red,
    Yellow,
    Green,
    Blue,
    Purple,
    Orange,
}

impl SeatColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Orange => "orange",
        }
    }
}

/// Everything fixed about a seat for one player count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatDescriptor {
    pub seat: SeatId,
    pub color: SeatColor,
    pub home_cells: Vec<CellId>,
    pub target_cells: Vec<CellId>,
    pub allowed_directions: [Direction; 4],
}

impl SeatDescriptor {
    fn build(board: &BoardTopology, seat: SeatId) -> Self {
        Self {
            seat,
            color: seat.color(),
            home_cells: board.arm_cells(seat),
            target_cells: board.arm_cells(seat.opposite()),
            allowed_directions: seat.allowed_directions(),
        }
    }

    pub fn allows(&self, direction: Direction) -> bool {
        self.allowed_directions.contains(&direction)
    }
}

/// The ordered seat table for a supported player count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatConfig {
    pub player_count: usize,
    seats: Vec<SeatDescriptor>,
}

impl SeatConfig {
    /// Seat ids active for `player_count`, in join order.
    pub fn seat_ids(player_count: usize) -> Result<&'static [SeatId], GameError> {
        const TWO: [SeatId; 2] = [SeatId(0), SeatId(2)];
        const THREE: [SeatId; 3] = [SeatId(0), SeatId(1), SeatId(3)];
        const FOUR: [SeatId; 4] = [SeatId(0), SeatId(1), SeatId(2), SeatId(4)];
        const SIX: [SeatId; 6] = [
            SeatId(0),
            SeatId(1),
            SeatId(2),
            SeatId(3),
            SeatId(4),
            SeatId(5),
        ];

        match player_count {
            2 => Ok(&TWO),
            3 => Ok(&THREE),
            4 => Ok(&FOUR),
            6 => Ok(&SIX),
            other => Err(GameError::ConfigurationMissing(other)),
        }
    }

    /// Build the table for `player_count`.
    pub fn for_players(board: &BoardTopology, player_count: usize) -> Result<Self, GameError> {
        if !SUPPORTED_PLAYER_COUNTS.contains(&player_count) {
            return Err(GameError::InvalidPlayerCount(player_count));
        }

        let seats = Self::seat_ids(player_count)?
            .iter()
            .map(|&seat| SeatDescriptor::build(board, seat))
            .collect();

        Ok(Self {
            player_count,
            seats,
        })
    }

    pub fn seats(&self) -> &[SeatDescriptor] {
        &self.seats
    }

    pub fn get(&self, seat: SeatId) -> Option<&SeatDescriptor> {
        self.seats.iter().find(|s| s.seat == seat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_unsupported_counts() {
        let board = BoardTopology::new();
        for n in [0, 1, 5, 7] {
            assert!(matches!(
                SeatConfig::for_players(&board, n),
                Err(GameError::InvalidPlayerCount(_))
            ));
        }
        assert!(matches!(
            SeatConfig::seat_ids(5),
            Err(GameError::ConfigurationMissing(5))
        ));
    }

    #[test]
    fn test_home_cells_disjoint() {
        let board = BoardTopology::new();

        for n in SUPPORTED_PLAYER_COUNTS {
            let config = SeatConfig::for_players(&board, n).unwrap();
            assert_eq!(config.seats().len(), n);

            let mut all = HashSet::new();
            for seat in config.seats() {
                assert_eq!(seat.home_cells.len(), PIECES_PER_SEAT);
                for cell in &seat.home_cells {
                    assert!(all.insert(*cell), "cell {} shared for n={}", cell, n);
                }
            }
            assert_eq!(all.len(), n * PIECES_PER_SEAT);
        }
    }

    #[test]
    fn test_targets_are_opposite_homes() {
        let board = BoardTopology::new();
        let config = SeatConfig::for_players(&board, 6).unwrap();

        for seat in config.seats() {
            let opposite = config.get(seat.seat.opposite()).unwrap();
            assert_eq!(seat.target_cells, opposite.home_cells);
            assert_eq!(seat.seat.opposite().opposite(), seat.seat);
        }
    }

    #[test]
    fn test_directions_never_retreat() {
        for seat in 0..6 {
            let seat = SeatId(seat);
            let forward = seat.allowed_directions();
            for dir in forward {
                // A direction and its reverse are never both allowed
                // unless they are the lateral pair.
                let reverse = dir.opposite();
                if forward.contains(&reverse) {
                    let lateral = &forward[2..];
                    assert!(lateral.contains(&dir) && lateral.contains(&reverse));
                }
            }
            // Opposite seats move in mirrored directions
            let mirrored: HashSet<_> = seat
                .opposite()
                .allowed_directions()
                .iter()
                .map(|d| d.opposite())
                .collect();
            let own: HashSet<_> = forward.iter().copied().collect();
            assert_eq!(own, mirrored);
        }
    }

    #[test]
    fn test_two_player_seats() {
        let board = BoardTopology::new();
        let config = SeatConfig::for_players(&board, 2).unwrap();
        let ids: Vec<_> = config.seats().iter().map(|s| s.seat).collect();
        assert_eq!(ids, vec![SeatId(0), SeatId(2)]);
        assert_eq!(config.get(SeatId(0)).unwrap().color, SeatColor::Red);
        assert!(config.get(SeatId(0)).unwrap().home_cells.contains(&CellId(0)));
        assert!(config.get(SeatId(2)).unwrap().home_cells.contains(&CellId(120)));
    }
}
