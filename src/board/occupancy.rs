//! Which seat, if any, holds each cell.

use serde::{Deserialize, Serialize};

use super::seats::{SeatConfig, SeatId};
use super::topology::{CellId, CELL_COUNT};

/// Occupancy snapshot of the whole board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Occupancy {
    cells: Vec<Option<SeatId>>,
}

impl Occupancy {
    /// An empty board.
    pub fn empty() -> Self {
        Self {
            cells: vec![None; CELL_COUNT],
        }
    }

    /// Every active seat on its home cells.
    pub fn initial(config: &SeatConfig) -> Self {
        let mut occupancy = Self::empty();
        for seat in config.seats() {
            for cell in &seat.home_cells {
                occupancy.set(*cell, Some(seat.seat));
            }
        }
        occupancy
    }

    pub fn get(&self, cell: CellId) -> Option<SeatId> {
        self.cells.get(cell.index()).copied().flatten()
    }

    pub fn set(&mut self, cell: CellId, seat: Option<SeatId>) {
        if let Some(slot) = self.cells.get_mut(cell.index()) {
            *slot = seat;
        }
    }

    pub fn is_empty_cell(&self, cell: CellId) -> bool {
        self.get(cell).is_none()
    }

    pub fn is_occupied(&self, cell: CellId) -> bool {
        self.get(cell).is_some()
    }

    /// Move whatever is on `from` to `to`.
    pub fn relocate(&mut self, from: CellId, to: CellId) {
        let piece = self.get(from);
        self.set(from, None);
        self.set(to, piece);
    }

    /// Number of cells held by `seat`.
    pub fn count(&self, seat: SeatId) -> usize {
        self.cells.iter().filter(|c| **c == Some(seat)).count()
    }

    /// Cells held by `seat`, in id order.
    pub fn cells_of(&self, seat: SeatId) -> Vec<CellId> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Some(seat))
            .map(|(i, _)| CellId(i as u8))
            .collect()
    }

    /// Raw per-cell view.
    pub fn as_slice(&self) -> &[Option<SeatId>] {
        &self.cells
    }
}

impl Default for Occupancy {
    fn default() -> Self {
        Self::empty()
    }
}
