//! Weighted reel generation

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::config::RtpProfile;
use crate::error::{ProfileError, ProfileResult};
use crate::grid::{GRID_SIZE, Grid, column_of, is_edge_column};
use crate::symbols::Symbol;

/// Weighted distribution over a subset of the pool
#[derive(Debug, Clone)]
struct WeightedPool {
    symbols: Vec<Symbol>,
    index: WeightedIndex<u32>,
}

impl WeightedPool {
    fn new(entries: impl Iterator<Item = (Symbol, u32)>) -> Option<Self> {
        let (symbols, weights): (Vec<Symbol>, Vec<u32>) = entries.unzip();
        let index = WeightedIndex::new(weights).ok()?;
        Some(Self { symbols, index })
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Symbol {
        self.symbols[self.index.sample(rng)]
    }
}

/// Draws one symbol per cell from the profile's weighted pool.
///
/// The two edge reels draw from the pool with `wild` removed; the inner reels
/// draw from the full pool. Cells are independent draws with replacement.
/// The generator holds no RNG of its own; the caller supplies it, so a seeded
/// source reproduces grids exactly.
#[derive(Debug, Clone)]
pub struct ReelGenerator {
    full: WeightedPool,
    edge: WeightedPool,
}

impl ReelGenerator {
    pub fn new(profile: &RtpProfile) -> ProfileResult<Self> {
        let pool = profile.symbols().pool();

        let full = WeightedPool::new(pool.iter().map(|e| (e.symbol, e.weight)))
            .ok_or(ProfileError::EmptyPool)?;
        let edge = WeightedPool::new(
            pool.iter()
                .filter(|e| !e.symbol.is_wild())
                .map(|e| (e.symbol, e.weight)),
        )
        .ok_or(ProfileError::EmptyEdgePool)?;

        Ok(Self { full, edge })
    }

    /// Draw a complete grid
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Grid {
        let mut cells = [Symbol::Zeki; GRID_SIZE];
        for (position, cell) in cells.iter_mut().enumerate() {
            *cell = self.draw_cell(position, rng);
        }
        Grid::new(cells)
    }

    /// Draw the symbol for a single cell position
    pub fn draw_cell<R: Rng + ?Sized>(&self, position: usize, rng: &mut R) -> Symbol {
        if is_edge_column(column_of(position)) {
            self.edge.sample(rng)
        } else {
            self.full.sample(rng)
        }
    }
}
