//! Constraint propagation across the wave.
//!
//! For every (cell, pattern, direction) a support counter holds how many
//! patterns in the adjacent cell still agree with that pattern across the
//! shared overlap. Each removal decrements the counters it supported; a
//! counter reaching zero removes that pattern too, until the work-list
//! drains and the wave is at a fixed point.

use super::pattern::{PatternCatalog, PatternId};
use super::wave::Wave;
use crate::grid::Dir;

#[derive(Debug, Clone)]
pub struct Propagator {
    height: usize,
    width: usize,
    pattern_count: usize,
    periodic: bool,
    support: Vec<[i32; 4]>,
    pending: Vec<(usize, PatternId)>,
}

impl Propagator {
    pub fn new(height: usize, width: usize, periodic: bool, catalog: &PatternCatalog) -> Self {
        let pattern_count = catalog.len();
        let mut initial = Vec::with_capacity(pattern_count);
        for pattern in 0..pattern_count {
            let mut counts = [0i32; 4];
            for dir in Dir::ALL {
                // Support on a side equals the number of patterns that fit
                // on the opposite side of the neighbor.
                counts[dir.index()] = catalog.compatible(pattern, dir.opposite()).len() as i32;
            }
            initial.push(counts);
        }

        let mut support = Vec::with_capacity(height * width * pattern_count);
        for _ in 0..height * width {
            support.extend_from_slice(&initial);
        }

        Self {
            height,
            width,
            pattern_count,
            periodic,
            support,
            pending: Vec::new(),
        }
    }

    /// Record that `pattern` was removed from `cell`. The wave must already
    /// reflect the removal; propagation happens on the next `propagate`.
    pub fn mark_removed(&mut self, cell: usize, pattern: PatternId) {
        self.support[pattern + cell * self.pattern_count] = [0; 4];
        self.pending.push((cell, pattern));
    }

    /// Drain the work-list to a fixed point, removing every pattern that
    /// loses its last support.
    pub fn propagate(&mut self, wave: &mut Wave, catalog: &PatternCatalog) {
        while let Some((cell, pattern)) = self.pending.pop() {
            let row = (cell / self.width) as i32;
            let col = (cell % self.width) as i32;

            for dir in Dir::ALL {
                let delta = dir.delta();
                let (nrow, ncol) = if self.periodic {
                    (
                        (row + delta.row).rem_euclid(self.height as i32) as usize,
                        (col + delta.col).rem_euclid(self.width as i32) as usize,
                    )
                } else {
                    let nrow = row + delta.row;
                    let ncol = col + delta.col;
                    if nrow < 0
                        || nrow >= self.height as i32
                        || ncol < 0
                        || ncol >= self.width as i32
                    {
                        continue;
                    }
                    (nrow as usize, ncol as usize)
                };

                let neighbor = ncol + nrow * self.width;
                for &other in catalog.compatible(pattern, dir) {
                    let counts = &mut self.support[other + neighbor * self.pattern_count];
                    counts[dir.index()] -= 1;
                    if counts[dir.index()] == 0 {
                        self.mark_removed(neighbor, other);
                        wave.remove(neighbor, other);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::wfc::WfcOptions;

    fn checkerboard_catalog() -> PatternCatalog {
        let seed = Grid::from_lines(&["ab", "ba"]).unwrap();
        let options = WfcOptions {
            pattern_size: 2,
            symmetry: 1,
            periodic_input: true,
            periodic_output: false,
        };
        PatternCatalog::from_seed(&seed, &options).unwrap()
    }

    fn force(wave: &mut Wave, prop: &mut Propagator, cell: usize, keep: PatternId) {
        for p in 0..wave.pattern_count() {
            if p != keep && wave.possible(cell, p) {
                wave.remove(cell, p);
                prop.mark_removed(cell, p);
            }
        }
    }

    #[test]
    fn test_propagation_decides_neighbor() {
        let catalog = checkerboard_catalog();
        let mut wave = Wave::new(1, 2, catalog.frequencies());
        let mut prop = Propagator::new(1, 2, false, &catalog);

        force(&mut wave, &mut prop, 0, 0);
        prop.propagate(&mut wave, &catalog);

        assert!(!wave.is_impossible());
        assert_eq!(
            wave.decided_pattern(1),
            Some(1),
            "The checkerboard alternates, so the neighbor is forced"
        );
    }

    #[test]
    fn test_propagation_is_transitive() {
        let catalog = checkerboard_catalog();
        let mut wave = Wave::new(1, 4, catalog.frequencies());
        let mut prop = Propagator::new(1, 4, false, &catalog);

        force(&mut wave, &mut prop, 0, 0);
        prop.propagate(&mut wave, &catalog);

        assert_eq!(wave.decided_pattern(1), Some(1));
        assert_eq!(wave.decided_pattern(2), Some(0));
        assert_eq!(wave.decided_pattern(3), Some(1));
    }

    #[test]
    fn test_conflicting_forces_contradict() {
        let catalog = checkerboard_catalog();
        let mut wave = Wave::new(1, 2, catalog.frequencies());
        let mut prop = Propagator::new(1, 2, false, &catalog);

        // Adjacent cells pinned to the same pattern cannot both hold.
        force(&mut wave, &mut prop, 0, 0);
        force(&mut wave, &mut prop, 1, 0);
        prop.propagate(&mut wave, &catalog);

        assert!(wave.is_impossible());
    }

    #[test]
    fn test_periodic_odd_cycle_contradicts() {
        let catalog = checkerboard_catalog();
        let mut wave = Wave::new(2, 3, catalog.frequencies());
        let mut prop = Propagator::new(2, 3, true, &catalog);

        // An alternating pattern cannot close an odd wrapping cycle.
        force(&mut wave, &mut prop, 0, 0);
        prop.propagate(&mut wave, &catalog);

        assert!(wave.is_impossible());
    }

    #[test]
    fn test_periodic_even_cycle_holds() {
        let catalog = checkerboard_catalog();
        let mut wave = Wave::new(2, 4, catalog.frequencies());
        let mut prop = Propagator::new(2, 4, true, &catalog);

        force(&mut wave, &mut prop, 0, 0);
        prop.propagate(&mut wave, &catalog);

        assert!(!wave.is_impossible());
        assert_eq!(wave.decided_pattern(3), Some(1), "Wrap neighbor must alternate");
        assert_eq!(wave.decided_pattern(4), Some(1), "Row below must alternate too");
    }

    #[test]
    fn test_border_cells_keep_options_without_neighbors() {
        let catalog = checkerboard_catalog();
        let mut wave = Wave::new(1, 3, catalog.frequencies());
        let mut prop = Propagator::new(1, 3, false, &catalog);

        force(&mut wave, &mut prop, 1, 0);
        prop.propagate(&mut wave, &catalog);

        // Non-periodic edges do not wrap; both ends stay consistent.
        assert_eq!(wave.decided_pattern(0), Some(1));
        assert_eq!(wave.decided_pattern(2), Some(1));
        assert!(!wave.is_impossible());
    }
}
