//! Payline catalog for the 5×3 grid

use serde::Serialize;

use crate::grid::REELS;

/// A payline: one cell per reel, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Payline {
    /// Catalog index (0-based)
    pub index: usize,
    /// Display name
    pub name: &'static str,
    /// Grid positions, one per column
    pub cells: [usize; REELS],
}

/// The nine paylines, in evaluation order
pub static PAYLINES: [Payline; 9] = [
    Payline { index: 0, name: "Top Row", cells: [0, 1, 2, 3, 4] },
    Payline { index: 1, name: "Middle Row", cells: [5, 6, 7, 8, 9] },
    Payline { index: 2, name: "Bottom Row", cells: [10, 11, 12, 13, 14] },
    // Full zigzags
    Payline { index: 3, name: "Diagonal Down", cells: [0, 6, 12, 8, 4] },
    Payline { index: 4, name: "Diagonal Up", cells: [10, 6, 2, 8, 14] },
    // Shapes pivoting on the middle row
    Payline { index: 5, name: "V-Shape Top", cells: [0, 6, 7, 8, 9] },
    Payline { index: 6, name: "V-Shape Bottom", cells: [10, 6, 7, 8, 9] },
    Payline { index: 7, name: "Inverted V Top", cells: [0, 1, 7, 13, 14] },
    Payline { index: 8, name: "Inverted V Bottom", cells: [10, 11, 7, 3, 4] },
];

/// All paylines in catalog order
pub fn paylines() -> &'static [Payline] {
    &PAYLINES
}

pub fn payline(index: usize) -> Option<&'static Payline> {
    PAYLINES.get(index)
}

pub fn payline_by_name(name: &str) -> Option<&'static Payline> {
    PAYLINES.iter().find(|p| p.name == name)
}
