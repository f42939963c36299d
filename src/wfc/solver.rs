//! The collapse loop: observe, propagate, repeat.
//!
//! Each observation pins the least-entropy undecided cell to one pattern
//! drawn by frequency weight; propagation then rules out everything that
//! lost support. A contradiction ends the run with None so the caller can
//! retry under a fresh seed.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::pattern::{PatternCatalog, PatternId};
use super::propagator::Propagator;
use super::wave::Wave;
use crate::grid::Grid;

/// Outcome of a single observation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserveStatus {
    /// Every cell is decided; the wave decodes to a grid.
    Success,
    /// Some cell has no possible pattern left.
    Contradiction,
    /// A cell was collapsed; propagation has to run next.
    Continue,
}

/// One solver run over a fixed-size wave.
pub struct WfcSolver<'a> {
    catalog: &'a PatternCatalog,
    wave: Wave,
    propagator: Propagator,
    rng: Xoshiro256PlusPlus,
}

impl<'a> WfcSolver<'a> {
    pub fn new(
        catalog: &'a PatternCatalog,
        height: usize,
        width: usize,
        periodic_output: bool,
        seed: u64,
    ) -> Self {
        Self {
            catalog,
            wave: Wave::new(height, width, catalog.frequencies()),
            propagator: Propagator::new(height, width, periodic_output, catalog),
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Pin (row, col) to exactly `pattern`. Callers force all constraints
    /// up front and then `propagate` once.
    pub fn force_pattern(&mut self, row: usize, col: usize, pattern: PatternId) {
        let cell = self.wave.index(row, col);
        for p in 0..self.catalog.len() {
            if p != pattern && self.wave.possible(cell, p) {
                self.wave.remove(cell, p);
                self.propagator.mark_removed(cell, p);
            }
        }
    }

    /// Flush pending removals through the wave.
    pub fn propagate(&mut self) {
        self.propagator.propagate(&mut self.wave, self.catalog);
    }

    /// Collapse the least-entropy undecided cell.
    pub fn observe(&mut self) -> ObserveStatus {
        if self.wave.is_impossible() {
            return ObserveStatus::Contradiction;
        }
        let cell = match self.wave.min_entropy_cell(&mut self.rng) {
            Some(cell) => cell,
            None => return ObserveStatus::Success,
        };

        let chosen = self.draw_pattern(cell);
        for p in 0..self.catalog.len() {
            if p != chosen && self.wave.possible(cell, p) {
                self.wave.remove(cell, p);
                self.propagator.mark_removed(cell, p);
            }
        }
        ObserveStatus::Continue
    }

    /// Run to completion. None signals a contradiction.
    pub fn run(&mut self) -> Option<Grid<char>> {
        loop {
            match self.observe() {
                ObserveStatus::Contradiction => return None,
                ObserveStatus::Success => return Some(self.decode()),
                ObserveStatus::Continue => self.propagate(),
            }
        }
    }

    /// Weighted draw among the patterns still possible in `cell`.
    fn draw_pattern(&mut self, cell: usize) -> PatternId {
        let freqs = self.catalog.frequencies();
        let total: f64 = (0..freqs.len())
            .filter(|&p| self.wave.possible(cell, p))
            .map(|p| freqs[p])
            .sum();

        let mut target = self.rng.gen_range(0.0..total);
        let mut chosen = (0..freqs.len())
            .rev()
            .find(|&p| self.wave.possible(cell, p))
            .unwrap_or(0);
        for p in 0..freqs.len() {
            if !self.wave.possible(cell, p) {
                continue;
            }
            target -= freqs[p];
            if target <= 0.0 {
                chosen = p;
                break;
            }
        }
        chosen
    }

    /// Map every decided cell to its pattern's center label.
    fn decode(&self) -> Grid<char> {
        Grid::from_fn(self.wave.height, self.wave.width, |row, col| {
            let cell = self.wave.index(row, col);
            let pattern = (0..self.catalog.len())
                .find(|&p| self.wave.possible(cell, p))
                .unwrap_or(0);
            self.catalog.center_value(pattern)
        })
    }
}
