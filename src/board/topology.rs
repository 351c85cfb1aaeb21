//! Star board geometry.
//!
//! The board is scanned once from a fixed 17x25 template in doubled-width hex
//! coordinates: every playable position sits on a lattice point where
//! `row + col` is even, and horizontal neighbours are two columns apart.
//!
//! ```text
//!             0                 seat 0 (top)
//!            0 0
//!           0 0 0
//!          0 0 0 0
//! 4 4 4 4 o o o o o 5 5 5 5     seat 4 (upper-left), seat 5 (upper-right)
//!  4 4 4 o o o o o o 5 5 5
//!   4 4 o o o o o o o 5 5
//!    4 o o o o o o o o 5
//!     o o o o o o o o o
//!    3 o o o o o o o o 1
//!   3 3 o o o o o o o 1 1
//!  3 3 3 o o o o o o 1 1 1
//! 3 3 3 3 o o o o o 1 1 1 1     seat 3 (lower-left), seat 1 (lower-right)
//!          2 2 2 2
//!           2 2 2
//!            2 2
//!             2                 seat 2 (bottom)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::seats::SeatId;

/// Number of playable cells on the star.
pub const CELL_COUNT: usize = 121;

/// Template height in rows.
pub const TEMPLATE_ROWS: usize = 17;

/// Template width in columns.
pub const TEMPLATE_COLS: usize = 25;

/// Fixed board template. `o` marks the hexagonal core, digits mark the home
/// arm of that seat, `.` is rectangle padding and never receives an id.
const TEMPLATE: [&str; TEMPLATE_ROWS] = [
    "............0............",
    "...........0.0...........",
    "..........0.0.0..........",
    ".........0.0.0.0.........",
    "4.4.4.4.o.o.o.o.o.5.5.5.5",
    ".4.4.4.o.o.o.o.o.o.5.5.5.",
    "..4.4.o.o.o.o.o.o.o.5.5..",
    "...4.o.o.o.o.o.o.o.o.5...",
    "....o.o.o.o.o.o.o.o.o....",
    "...3.o.o.o.o.o.o.o.o.1...",
    "..3.3.o.o.o.o.o.o.o.1.1..",
    ".3.3.3.o.o.o.o.o.o.1.1.1.",
    "3.3.3.3.o.o.o.o.o.1.1.1.1",
    ".........2.2.2.2.........",
    "..........2.2.2..........",
    "...........2.2...........",
    "............2............",
];

/// Identifier of a playable cell, `0..CELL_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub u8);

impl CellId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which part of the star a cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// The central hexagon
    Core,
    /// A triangular arm, named by the seat whose home it is
    Arm(SeatId),
}

/// The six primary hex directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::SouthEast,
    ];

    /// (row, col) delta of one step in doubled-width coordinates.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::East => (0, 2),
            Self::NorthEast => (-1, 1),
            Self::NorthWest => (-1, -1),
            Self::West => (0, -2),
            Self::SouthWest => (1, -1),
            Self::SouthEast => (1, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Self::East => Self::West,
            Self::NorthEast => Self::SouthWest,
            Self::NorthWest => Self::SouthEast,
            Self::West => Self::East,
            Self::SouthWest => Self::NorthEast,
            Self::SouthEast => Self::NorthWest,
        }
    }
}

/// A playable cell. Immutable once the topology is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub id: CellId,
    pub row: u8,
    pub col: u8,
    pub zone: Zone,
}

/// A single jump: the landing cell and the pivot that must be occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jump {
    pub pivot: CellId,
    pub landing: CellId,
}

/// Static board geometry and neighbourhood queries.
#[derive(Debug, Clone)]
pub struct BoardTopology {
    cells: Vec<Cell>,
    grid: [[Option<CellId>; TEMPLATE_COLS]; TEMPLATE_ROWS],
}

impl BoardTopology {
    /// Scan the template and build the board.
    pub fn new() -> Self {
        let mut cells = Vec::with_capacity(CELL_COUNT);
        let mut grid = [[None; TEMPLATE_COLS]; TEMPLATE_ROWS];

        for (row, line) in TEMPLATE.iter().enumerate() {
            for (col, mark) in line.bytes().enumerate() {
                let zone = match mark {
                    b'o' => Zone::Core,
                    b'0'..=b'5' => Zone::Arm(SeatId(mark - b'0')),
                    _ => continue,
                };
                let id = CellId(cells.len() as u8);
                grid[row][col] = Some(id);
                cells.push(Cell {
                    id,
                    row: row as u8,
                    col: col as u8,
                    zone,
                });
            }
        }

        debug_assert_eq!(cells.len(), CELL_COUNT);
        Self { cells, grid }
    }

    /// Check if a raw id names a cell on the star.
    pub fn is_playable(&self, id: usize) -> bool {
        id < self.cells.len()
    }

    /// Get a cell by id.
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.index())
    }

    /// All cells in id order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Resolve a template coordinate. Padding and out-of-range positions
    /// resolve to `None`.
    pub fn lookup(&self, row: i32, col: i32) -> Option<CellId> {
        if row < 0 || col < 0 {
            return None;
        }
        self.grid
            .get(row as usize)
            .and_then(|line| line.get(col as usize))
            .copied()
            .flatten()
    }

    /// Resolve a raw wire id into a `CellId`.
    pub fn cell_id(&self, raw: u32) -> Option<CellId> {
        let raw = usize::try_from(raw).ok()?;
        self.is_playable(raw).then(|| CellId(raw as u8))
    }

    /// One step from `id` in `direction`.
    pub fn neighbor(&self, id: CellId, direction: Direction) -> Option<CellId> {
        self.offset(id, direction, 1)
    }

    /// Up to six playable neighbours with the direction leading to each.
    pub fn adjacency(&self, id: CellId) -> Vec<(Direction, CellId)> {
        Direction::ALL
            .iter()
            .filter_map(|&dir| self.neighbor(id, dir).map(|n| (dir, n)))
            .collect()
    }

    /// The landing two steps away in `direction`, with the pivot in between.
    pub fn jump_landing(&self, id: CellId, direction: Direction) -> Option<Jump> {
        let pivot = self.offset(id, direction, 1)?;
        let landing = self.offset(id, direction, 2)?;
        Some(Jump { pivot, landing })
    }

    /// Cells belonging to a seat's home arm, in id order.
    pub fn arm_cells(&self, seat: SeatId) -> Vec<CellId> {
        self.cells
            .iter()
            .filter(|c| c.zone == Zone::Arm(seat))
            .map(|c| c.id)
            .collect()
    }

    fn offset(&self, id: CellId, direction: Direction, steps: i32) -> Option<CellId> {
        let cell = self.cell(id)?;
        let (dr, dc) = direction.delta();
        self.lookup(
            i32::from(cell.row) + dr * steps,
            i32::from(cell.col) + dc * steps,
        )
    }
}

impl Default for BoardTopology {
    fn default() -> Self {
        Self::new()
    }
}
