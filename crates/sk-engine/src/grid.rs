//! The 5×3 symbol grid

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::symbols::Symbol;

/// Number of reels (columns)
pub const REELS: usize = 5;
/// Visible rows per reel
pub const ROWS: usize = 3;
/// Total cells on the grid
pub const GRID_SIZE: usize = REELS * ROWS;

/// Fifteen symbols stored row-major: cell `p` sits in column `p % 5`, row `p / 5`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid([Symbol; GRID_SIZE]);

impl Grid {
    pub fn new(cells: [Symbol; GRID_SIZE]) -> Self {
        Self(cells)
    }

    /// Grid with every cell set to `symbol`
    pub fn filled(symbol: Symbol) -> Self {
        Self([symbol; GRID_SIZE])
    }

    /// Build from three rows of five, top row first
    pub fn from_rows(rows: [[Symbol; REELS]; ROWS]) -> Self {
        let mut cells = [Symbol::Zeki; GRID_SIZE];
        for (r, row) in rows.iter().enumerate() {
            cells[r * REELS..(r + 1) * REELS].copy_from_slice(row);
        }
        Self(cells)
    }

    pub fn get(&self, position: usize) -> Option<Symbol> {
        self.0.get(position).copied()
    }

    pub fn cells(&self) -> &[Symbol; GRID_SIZE] {
        &self.0
    }

    /// Top-to-bottom symbols of one reel, `None` past the last reel
    pub fn column(&self, reel: usize) -> Option<[Symbol; ROWS]> {
        if reel >= REELS {
            return None;
        }
        Some([self.0[reel], self.0[reel + REELS], self.0[reel + 2 * REELS]])
    }

    /// Left-to-right symbols of one row, `None` past the bottom row
    pub fn row(&self, row: usize) -> Option<[Symbol; REELS]> {
        if row >= ROWS {
            return None;
        }
        let mut out = [Symbol::Zeki; REELS];
        out.copy_from_slice(&self.0[row * REELS..(row + 1) * REELS]);
        Some(out)
    }

    /// Symbols at the given cell positions.
    ///
    /// # Panics
    ///
    /// Panics if a position is not below [`GRID_SIZE`]. Catalog paylines always
    /// satisfy this.
    pub fn pick(&self, positions: [usize; REELS]) -> [Symbol; REELS] {
        positions.map(|p| self.0[p])
    }

    /// Occurrences of `symbol` anywhere on the grid
    pub fn count(&self, symbol: Symbol) -> usize {
        self.0.iter().filter(|&&s| s == symbol).count()
    }

    /// Positions holding `symbol`
    pub fn positions_of(&self, symbol: Symbol) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == symbol)
            .map(|(p, _)| p)
            .collect()
    }
}

/// Column of a cell position
pub fn column_of(position: usize) -> usize {
    position % REELS
}

/// True for the leftmost and rightmost reels
pub fn is_edge_column(column: usize) -> bool {
    column == 0 || column == REELS - 1
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.0.chunks(REELS) {
            let cells: Vec<String> = row.iter().map(|s| format!("{:<11}", s.id())).collect();
            writeln!(f, "| {} |", cells.join(" ").trim_end())?;
        }
        Ok(())
    }
}
