//! Grid model of the betting layout and the directional chip walk.
//!
//! ```text
//!        col 0   1   2   3  ...  12   13
//! row 0   00|0   3   6   9  ...  36   col 3
//! row 1    0     2   5   8  ...  35   col 2
//! row 2    0     1   4   7  ...  34   col 1
//! row 3          [ 1st 12 ][ 2nd 12 ][ 3rd 12 ]
//! row 4          [1-18][even][red][black][odd][19-36]
//! ```
//!
//! Group bets cover several cells. A single-zero table fills the whole zero column with `0`.

use croupier_types::roulette::{Slot, TableType};
use serde::Deserialize;

pub const ROWS: usize = 5;
pub const COLUMNS: usize = 14;

const OUTSIDE_ROW: [Slot; 6] = [Slot::Low, Slot::Even, Slot::Red, Slot::Black, Slot::Odd, Slot::High];

/// Direction on the table's own axes, or as a seated player sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Map a direction as seen from `side` onto the layout axes.
    pub fn relative_to(self, side: TableSide) -> Self {
        match side {
            TableSide::Front => self,
            TableSide::Back => self.opposite(),
        }
    }

    fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// Side of the table a seat faces the layout from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableSide {
    Front,
    Back,
}

impl TableSide {
    /// The first half of the seats face the layout from the front.
    pub fn for_seat(seat: usize, max_players: usize) -> Self {
        if seat < max_players.div_ceil(2) {
            TableSide::Front
        } else {
            TableSide::Back
        }
    }
}

/// Slot drawn at `(row, col)`, if any.
pub fn cell(table_type: TableType, row: usize, col: usize) -> Option<Slot> {
    match (row, col) {
        (0, 0) if table_type == TableType::American => Some(Slot::DoubleZero),
        (0..=2, 0) => Some(Slot::Zero),
        (0..=2, 1..=12) => Some(Slot::Number((3 * col - row) as u8)),
        (0..=2, 13) => Slot::column((3 - row) as u8),
        (3, 1..=12) => Slot::dozen(((col - 1) / 4 + 1) as u8),
        (4, 1..=12) => Some(OUTSIDE_ROW[(col - 1) / 2]),
        _ => None,
    }
}

/// First cell (row-major) covered by `slot`.
pub fn anchor(table_type: TableType, slot: Slot) -> Option<(usize, usize)> {
    (0..ROWS)
        .flat_map(|row| (0..COLUMNS).map(move |col| (row, col)))
        .find(|(row, col)| cell(table_type, *row, *col) == Some(slot))
}

/// Walk from `from` in `direction` to the nearest cell holding a different slot that
/// `is_legal` accepts. `None` when the walk leaves the grid first.
pub fn move_from_slot(
    table_type: TableType,
    from: Slot,
    direction: Direction,
    is_legal: impl Fn(Slot) -> bool,
) -> Option<Slot> {
    let (mut row, mut col) = anchor(table_type, from)?;
    let (d_row, d_col) = direction.delta();
    loop {
        row = row.checked_add_signed(d_row)?;
        col = col.checked_add_signed(d_col)?;
        if row >= ROWS || col >= COLUMNS {
            return None;
        }
        match cell(table_type, row, col) {
            Some(slot) if slot != from && is_legal(slot) => return Some(slot),
            _ => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn any(_: Slot) -> bool {
        true
    }

    #[test]
    fn test_grid_covers_every_slot_once_per_layout() {
        for table_type in [TableType::European, TableType::American] {
            let on_grid: BTreeSet<Slot> = (0..ROWS)
                .flat_map(|row| (0..COLUMNS).map(move |col| (row, col)))
                .filter_map(|(row, col)| cell(table_type, row, col))
                .collect();
            let expected: BTreeSet<Slot> = Slot::values(table_type, &BTreeSet::new())
                .into_iter()
                .collect();
            assert_eq!(on_grid, expected);
        }
    }

    #[test]
    fn test_number_positions() {
        assert_eq!(cell(TableType::European, 0, 1), Some(Slot::Number(3)));
        assert_eq!(cell(TableType::European, 2, 1), Some(Slot::Number(1)));
        assert_eq!(cell(TableType::European, 0, 12), Some(Slot::Number(36)));
        assert_eq!(cell(TableType::European, 2, 13), Some(Slot::Column(1)));
        assert_eq!(cell(TableType::European, 3, 5), Some(Slot::Dozen(2)));
        assert_eq!(cell(TableType::European, 4, 6), Some(Slot::Red));
        assert_eq!(cell(TableType::European, 3, 0), None);
    }

    #[test]
    fn test_walk_skips_cells_of_same_slot() {
        let next = move_from_slot(TableType::European, Slot::Red, Direction::Right, any);
        assert_eq!(next, Some(Slot::Black));
        let next = move_from_slot(TableType::European, Slot::Dozen(1), Direction::Right, any);
        assert_eq!(next, Some(Slot::Dozen(2)));
    }

    #[test]
    fn test_walk_stops_at_boundary() {
        assert_eq!(
            move_from_slot(TableType::European, Slot::Number(3), Direction::Up, any),
            None
        );
        assert_eq!(
            move_from_slot(TableType::European, Slot::High, Direction::Down, any),
            None
        );
        assert_eq!(
            move_from_slot(TableType::European, Slot::Column(2), Direction::Right, any),
            None
        );
    }

    #[test]
    fn test_zero_column_adjacency() {
        assert_eq!(
            move_from_slot(TableType::American, Slot::Number(1), Direction::Left, any),
            Some(Slot::Zero)
        );
        assert_eq!(
            move_from_slot(TableType::American, Slot::Zero, Direction::Up, any),
            Some(Slot::DoubleZero)
        );
        assert_eq!(
            move_from_slot(TableType::European, Slot::Number(3), Direction::Left, any),
            Some(Slot::Zero)
        );
        assert_eq!(
            move_from_slot(TableType::European, Slot::Zero, Direction::Up, any),
            None
        );
    }

    #[test]
    fn test_groups_attach_below_numbers() {
        assert_eq!(
            move_from_slot(TableType::European, Slot::Number(13), Direction::Down, any),
            Some(Slot::Dozen(2))
        );
        assert_eq!(
            move_from_slot(TableType::European, Slot::Dozen(1), Direction::Down, any),
            Some(Slot::Low)
        );
        assert_eq!(
            move_from_slot(TableType::European, Slot::Low, Direction::Up, any),
            Some(Slot::Dozen(1))
        );
        assert_eq!(
            move_from_slot(TableType::European, Slot::Number(34), Direction::Right, any),
            Some(Slot::Column(1))
        );
    }

    #[test]
    fn test_walk_skips_illegal_cells() {
        let next = move_from_slot(TableType::European, Slot::Low, Direction::Right, |slot| {
            slot != Slot::Even && slot != Slot::Red
        });
        assert_eq!(next, Some(Slot::Black));
    }

    #[test]
    fn test_back_seats_see_mirrored_directions() {
        assert_eq!(TableSide::for_seat(0, 10), TableSide::Front);
        assert_eq!(TableSide::for_seat(4, 10), TableSide::Front);
        assert_eq!(TableSide::for_seat(5, 10), TableSide::Back);
        assert_eq!(TableSide::for_seat(0, 1), TableSide::Front);
        assert_eq!(Direction::Left.relative_to(TableSide::Back), Direction::Right);
        assert_eq!(Direction::Up.relative_to(TableSide::Front), Direction::Up);
    }
}
