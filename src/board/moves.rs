//! Legal move generation.
//!
//! A turn is one contiguous move: either a single step onto an empty
//! neighbour, or a chain of single jumps over occupied pivots. Both are
//! filtered by the seat's allowed directions; for a chain only the first hop
//! is constrained.

use std::collections::{BTreeSet, HashSet};

use super::occupancy::Occupancy;
use super::seats::SeatId;
use super::topology::{BoardTopology, CellId, Direction};
use crate::error::IllegalMoveReason;

/// Computes destinations from an occupancy snapshot.
#[derive(Debug, Clone, Copy)]
pub struct MoveGenerator<'a> {
    board: &'a BoardTopology,
}

impl<'a> MoveGenerator<'a> {
    pub fn new(board: &'a BoardTopology) -> Self {
        Self { board }
    }

    /// Every cell `seat` may move the piece on `from` to this turn.
    ///
    /// Empty when `from` is not held by `seat`.
    pub fn legal_destinations(
        &self,
        occupancy: &Occupancy,
        from: CellId,
        seat: SeatId,
    ) -> BTreeSet<CellId> {
        if occupancy.get(from) != Some(seat) {
            return BTreeSet::new();
        }
        let allowed = seat.allowed_directions();
        self.reachable(occupancy, from, |dir| allowed.contains(&dir))
    }

    /// Empty neighbours of `from`, ignoring direction rules.
    pub fn adjacent_empty(&self, occupancy: &Occupancy, from: CellId) -> BTreeSet<CellId> {
        self.board
            .adjacency(from)
            .into_iter()
            .filter(|(_, n)| occupancy.is_empty_cell(*n))
            .map(|(_, n)| n)
            .collect()
    }

    /// Transitive closure of single jumps from `from`, ignoring direction
    /// rules.
    pub fn jump_reachable(&self, occupancy: &Occupancy, from: CellId) -> BTreeSet<CellId> {
        let mut result = BTreeSet::new();
        for dir in Direction::ALL {
            self.expand_chain(occupancy, from, dir, &mut result);
        }
        result
    }

    /// Explain why `from -> to` is not a legal move for `seat`.
    pub fn check_move(
        &self,
        occupancy: &Occupancy,
        from: CellId,
        to: CellId,
        seat: SeatId,
    ) -> Result<(), IllegalMoveReason> {
        if occupancy.get(from) != Some(seat) {
            return Err(IllegalMoveReason::NotOwner);
        }
        if occupancy.is_occupied(to) {
            return Err(IllegalMoveReason::OccupiedDestination);
        }
        if self.legal_destinations(occupancy, from, seat).contains(&to) {
            return Ok(());
        }
        if self.adjacent_empty(occupancy, from).contains(&to)
            || self.jump_reachable(occupancy, from).contains(&to)
        {
            return Err(IllegalMoveReason::WrongDirection);
        }
        Err(IllegalMoveReason::Unreachable)
    }

    fn reachable(
        &self,
        occupancy: &Occupancy,
        from: CellId,
        first_hop_allowed: impl Fn(Direction) -> bool,
    ) -> BTreeSet<CellId> {
        let mut result = BTreeSet::new();

        for (dir, neighbor) in self.board.adjacency(from) {
            if first_hop_allowed(dir) && occupancy.is_empty_cell(neighbor) {
                result.insert(neighbor);
            }
        }

        for dir in Direction::ALL {
            if first_hop_allowed(dir) {
                self.expand_chain(occupancy, from, dir, &mut result);
            }
        }

        result
    }

    /// Follow every chain whose first hop leaves `from` in `first`.
    ///
    /// The moving piece is lifted off `from`: it is never a pivot, and
    /// `from` is marked visited so it is never a landing.
    fn expand_chain(
        &self,
        occupancy: &Occupancy,
        from: CellId,
        first: Direction,
        result: &mut BTreeSet<CellId>,
    ) {
        let is_open_jump = |cell: CellId, dir: Direction| {
            self.board.jump_landing(cell, dir).filter(|jump| {
                jump.pivot != from
                    && occupancy.is_occupied(jump.pivot)
                    && occupancy.is_empty_cell(jump.landing)
            })
        };

        let Some(first_jump) = is_open_jump(from, first) else {
            return;
        };

        let mut visited = HashSet::from([from, first_jump.landing]);
        let mut frontier = vec![first_jump.landing];
        result.insert(first_jump.landing);

        while let Some(cell) = frontier.pop() {
            for dir in Direction::ALL {
                if let Some(jump) = is_open_jump(cell, dir) {
                    if visited.insert(jump.landing) {
                        result.insert(jump.landing);
                        frontier.push(jump.landing);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::SeatConfig;
    use pretty_assertions::assert_eq;

    const RED: SeatId = SeatId(0);
    const GREEN: SeatId = SeatId(2);

    fn at(board: &BoardTopology, row: i32, col: i32) -> CellId {
        board.lookup(row, col).unwrap()
    }

    fn cells(board: &BoardTopology, coords: &[(i32, i32)]) -> BTreeSet<CellId> {
        coords.iter().map(|&(r, c)| at(board, r, c)).collect()
    }

    fn place(board: &BoardTopology, occupancy: &mut Occupancy, seat: SeatId, coords: &[(i32, i32)]) {
        for &(r, c) in coords {
            occupancy.set(at(board, r, c), Some(seat));
        }
    }

    #[test]
    fn test_simple_steps_follow_direction_rules() {
        let board = BoardTopology::new();
        let moves = MoveGenerator::new(&board);
        let mut occupancy = Occupancy::empty();
        place(&board, &mut occupancy, RED, &[(8, 12)]);

        let dests = moves.legal_destinations(&occupancy, at(&board, 8, 12), RED);
        assert_eq!(dests, cells(&board, &[(9, 11), (9, 13), (8, 14), (8, 10)]));
    }

    #[test]
    fn test_single_jump() {
        let board = BoardTopology::new();
        let moves = MoveGenerator::new(&board);
        let mut occupancy = Occupancy::empty();
        place(&board, &mut occupancy, RED, &[(8, 12)]);
        place(&board, &mut occupancy, GREEN, &[(9, 13)]);

        let dests = moves.legal_destinations(&occupancy, at(&board, 8, 12), RED);
        assert!(dests.contains(&at(&board, 10, 14)));
        assert!(!dests.contains(&at(&board, 9, 13)));
        assert_eq!(dests.len(), 4);
    }

    #[test]
    fn test_chain_intermediate_hops_unconstrained() {
        let board = BoardTopology::new();
        let moves = MoveGenerator::new(&board);
        let mut occupancy = Occupancy::empty();
        place(&board, &mut occupancy, RED, &[(6, 12)]);
        place(&board, &mut occupancy, GREEN, &[(7, 13), (7, 15)]);

        // SE over (7,13) to (8,14), then NE over (7,15) to (6,16)
        let dests = moves.legal_destinations(&occupancy, at(&board, 6, 12), RED);
        assert_eq!(
            dests,
            cells(&board, &[(7, 11), (6, 14), (6, 10), (8, 14), (6, 16)])
        );
    }

    #[test]
    fn test_first_hop_direction_filtered() {
        let board = BoardTopology::new();
        let moves = MoveGenerator::new(&board);
        let mut occupancy = Occupancy::empty();
        place(&board, &mut occupancy, RED, &[(8, 12)]);
        place(&board, &mut occupancy, GREEN, &[(7, 11)]);

        let from = at(&board, 8, 12);
        let backwards = at(&board, 6, 10);
        assert!(!moves.legal_destinations(&occupancy, from, RED).contains(&backwards));
        assert!(moves.jump_reachable(&occupancy, from).contains(&backwards));
        assert_eq!(
            moves.check_move(&occupancy, from, backwards, RED),
            Err(IllegalMoveReason::WrongDirection)
        );
    }

    #[test]
    fn test_surrounded_piece_terminates() {
        let board = BoardTopology::new();
        let moves = MoveGenerator::new(&board);
        let mut occupancy = Occupancy::empty();
        place(&board, &mut occupancy, RED, &[(8, 12)]);
        place(
            &board,
            &mut occupancy,
            GREEN,
            &[(8, 14), (7, 13), (7, 11), (8, 10), (9, 11), (9, 13)],
        );

        let from = at(&board, 8, 12);
        let first = moves.legal_destinations(&occupancy, from, RED);
        assert_eq!(first, cells(&board, &[(10, 10), (10, 14), (8, 16), (8, 8)]));

        // Deterministic on repeat
        assert_eq!(moves.legal_destinations(&occupancy, from, RED), first);
    }

    #[test]
    fn test_not_owner_or_empty_origin() {
        let board = BoardTopology::new();
        let moves = MoveGenerator::new(&board);
        let mut occupancy = Occupancy::empty();
        place(&board, &mut occupancy, GREEN, &[(8, 12)]);

        let from = at(&board, 8, 12);
        assert!(moves.legal_destinations(&occupancy, from, RED).is_empty());
        assert!(moves
            .legal_destinations(&occupancy, at(&board, 8, 14), RED)
            .is_empty());
        assert_eq!(
            moves.check_move(&occupancy, from, at(&board, 9, 11), RED),
            Err(IllegalMoveReason::NotOwner)
        );
    }

    #[test]
    fn test_check_move_reasons() {
        let board = BoardTopology::new();
        let moves = MoveGenerator::new(&board);
        let mut occupancy = Occupancy::empty();
        place(&board, &mut occupancy, RED, &[(8, 12)]);
        place(&board, &mut occupancy, GREEN, &[(9, 13)]);
        let from = at(&board, 8, 12);

        assert_eq!(moves.check_move(&occupancy, from, at(&board, 9, 11), RED), Ok(()));
        assert_eq!(
            moves.check_move(&occupancy, from, at(&board, 9, 13), RED),
            Err(IllegalMoveReason::OccupiedDestination)
        );
        assert_eq!(
            moves.check_move(&occupancy, from, at(&board, 7, 11), RED),
            Err(IllegalMoveReason::WrongDirection)
        );
        assert_eq!(
            moves.check_move(&occupancy, from, at(&board, 12, 12), RED),
            Err(IllegalMoveReason::Unreachable)
        );
    }

    #[test]
    fn test_destinations_never_origin_or_occupied() {
        let board = BoardTopology::new();
        let moves = MoveGenerator::new(&board);
        let config = SeatConfig::for_players(&board, 6).unwrap();
        let occupancy = Occupancy::initial(&config);

        for seat in config.seats() {
            for from in &seat.home_cells {
                let dests = moves.legal_destinations(&occupancy, *from, seat.seat);
                assert!(!dests.contains(from));
                for to in &dests {
                    assert!(occupancy.is_empty_cell(*to));
                    assert_eq!(moves.check_move(&occupancy, *from, *to, seat.seat), Ok(()));
                }
                assert_eq!(moves.legal_destinations(&occupancy, *from, seat.seat), dests);
            }
        }
    }

    #[test]
    fn test_opening_moves_exist() {
        let board = BoardTopology::new();
        let moves = MoveGenerator::new(&board);
        let config = SeatConfig::for_players(&board, 2).unwrap();
        let occupancy = Occupancy::initial(&config);

        // Front row of the top arm can step into the core
        let front = at(&board, 3, 9);
        let dests = moves.legal_destinations(&occupancy, front, RED);
        assert_eq!(dests, cells(&board, &[(4, 8), (4, 10)]));

        // Second row can jump over the front row
        let second = at(&board, 2, 10);
        let dests = moves.legal_destinations(&occupancy, second, RED);
        assert_eq!(dests, cells(&board, &[(4, 8), (4, 12)]));
    }
}
