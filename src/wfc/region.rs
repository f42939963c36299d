//! Region-sized fills with forced exits.
//!
//! Pads the requested interior by one pattern margin, pins the padded
//! border to the empty pattern at pattern-size stride (hallway patterns at
//! the planned exits instead), runs the solver, then crops and keeps only
//! the connected component around the first exit. A result is returned
//! only when every requested exit is part of that component; everything
//! else retries under a fresh sub-seed until the attempt budget runs out.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::pattern::{PatternCatalog, PatternId};
use super::solver::WfcSolver;
use super::WfcOptions;
use crate::error::GenerationError;
use crate::grid::flood::flood_fill;
use crate::grid::{Dir, Grid, Location};

/// Where a region touches its boundary: a side plus an offset along that
/// side counted in pattern-size units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitLocation {
    pub side: Dir,
    pub offset: usize,
}

impl ExitLocation {
    /// Physical cell of this exit on a grid of the given size. `centered`
    /// shifts by half a pattern along the side, onto the corridor line.
    pub fn cell(&self, height: usize, width: usize, pattern_size: usize, centered: bool) -> Location {
        let shift = if centered { pattern_size / 2 } else { 0 };
        let along = (self.offset * pattern_size + shift) as i32;
        match self.side {
            Dir::Top => Location::new(0, along),
            Dir::Bottom => Location::new(height as i32 - 1, along),
            Dir::Left => Location::new(along, 0),
            Dir::Right => Location::new(along, width as i32 - 1),
        }
    }
}

/// The boundary vocabulary the driver pins: the blank label, the all-blank
/// pattern and the two hallway patterns exits are forced to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryPatterns {
    pub blank: char,
    pub empty: Grid<char>,
    pub hallway_h: Grid<char>,
    pub hallway_v: Grid<char>,
}

/// Settings of the retry loop around a single region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionWfcSettings {
    /// Attempts before giving up; each gets a fresh wave and sub-seed.
    pub max_attempts: u32,
    /// Exits carved per requested side, spread evenly along it.
    pub exits_per_side: usize,
}

impl Default for RegionWfcSettings {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            exits_per_side: 1,
        }
    }
}

/// A finished region fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionFill {
    pub grid: Grid<char>,
    pub exits: Vec<ExitLocation>,
    pub attempts: u32,
}

impl RegionFill {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Region driver bound to one catalog and boundary vocabulary.
#[derive(Debug)]
pub struct RegionWfc<'a> {
    catalog: &'a PatternCatalog,
    options: WfcOptions,
    blank: char,
    empty_pattern: PatternId,
    exit_patterns: [PatternId; 4],
}

impl<'a> RegionWfc<'a> {
    pub fn new(
        catalog: &'a PatternCatalog,
        options: WfcOptions,
        boundary: &BoundaryPatterns,
    ) -> Result<Self, GenerationError> {
        options.validate()?;
        let n = options.pattern_size;
        for (name, grid) in [
            ("empty", &boundary.empty),
            ("hallway_h", &boundary.hallway_h),
            ("hallway_v", &boundary.hallway_v),
        ] {
            if grid.height != n || grid.width != n {
                return Err(GenerationError::InvalidOptions(format!(
                    "boundary pattern {} is {}x{}, expected {}x{}",
                    name, grid.height, grid.width, n, n
                )));
            }
        }

        let empty_pattern = catalog
            .find(&boundary.empty)
            .ok_or_else(|| GenerationError::UnknownPattern("empty boundary pattern".to_string()))?;
        let hallway_h = catalog
            .find(&boundary.hallway_h)
            .ok_or_else(|| GenerationError::UnknownPattern("horizontal hallway pattern".to_string()))?;
        let hallway_v = catalog
            .find(&boundary.hallway_v)
            .ok_or_else(|| GenerationError::UnknownPattern("vertical hallway pattern".to_string()))?;

        // Top/Bottom exits carry a vertical corridor, Left/Right a
        // horizontal one.
        let mut exit_patterns = [0; 4];
        for dir in Dir::ALL {
            exit_patterns[dir.index()] = if dir.is_vertical() { hallway_v } else { hallway_h };
        }

        Ok(Self {
            catalog,
            options,
            blank: boundary.blank,
            empty_pattern,
            exit_patterns,
        })
    }

    /// Fill a region of `target_height` x `target_width` with exits on the
    /// given sides. The caller's rng seeds every attempt, so a fixed caller
    /// seed reproduces the fill exactly.
    pub fn generate<R: Rng>(
        &self,
        target_height: usize,
        target_width: usize,
        exit_sides: &[Dir],
        settings: &RegionWfcSettings,
        rng: &mut R,
    ) -> Result<RegionFill, GenerationError> {
        let n = self.options.pattern_size;
        let margin = n - 1;
        let exits = self.plan_exits(target_height, target_width, exit_sides, settings)?;

        let gen_h = target_height + 2 * margin;
        let gen_w = target_width + 2 * margin;

        let mut contradictions = 0u32;
        let mut unreachable_exits = 0u32;

        for attempt in 1..=settings.max_attempts {
            let sub_seed: u64 = rng.gen();
            let mut solver =
                WfcSolver::new(self.catalog, gen_h, gen_w, self.options.periodic_output, sub_seed);
            self.pin_border(&mut solver, gen_h, gen_w, &exits);
            solver.propagate();

            let raw = match solver.run() {
                Some(raw) => raw,
                None => {
                    contradictions += 1;
                    debug!("region attempt {} hit a contradiction", attempt);
                    continue;
                }
            };

            let cropped = raw.center_crop(margin);
            match self.isolate(&cropped, &exits) {
                Some(grid) => {
                    debug!(
                        "region {}x{} filled on attempt {} ({} exits)",
                        target_height,
                        target_width,
                        attempt,
                        exits.len()
                    );
                    return Ok(RegionFill {
                        grid,
                        exits,
                        attempts: attempt,
                    });
                }
                None => {
                    unreachable_exits += 1;
                    debug!("region attempt {} left an exit unreachable", attempt);
                }
            }
        }

        warn!(
            "region {}x{} exhausted {} attempts",
            target_height, target_width, settings.max_attempts
        );
        Err(GenerationError::RetryExhausted {
            attempts: settings.max_attempts,
            contradictions,
            unreachable_exits,
        })
    }

    /// Evenly spaced exit offsets for every requested side.
    fn plan_exits(
        &self,
        target_height: usize,
        target_width: usize,
        exit_sides: &[Dir],
        settings: &RegionWfcSettings,
    ) -> Result<Vec<ExitLocation>, GenerationError> {
        if exit_sides.is_empty() {
            return Err(GenerationError::InvalidOptions(
                "a region needs at least one exit side".to_string(),
            ));
        }
        let per_side = settings.exits_per_side;
        if per_side == 0 {
            return Err(GenerationError::InvalidOptions(
                "exits_per_side must be at least 1".to_string(),
            ));
        }

        let n = self.options.pattern_size;
        let mut exits = Vec::new();
        for side in Dir::ALL {
            if !exit_sides.contains(&side) {
                continue;
            }
            let len = if side.is_vertical() { target_width } else { target_height };
            let slots = len / n;
            if slots < per_side {
                return Err(GenerationError::InvalidOptions(format!(
                    "side {:?} of length {} fits {} exits, {} requested",
                    side, len, slots, per_side
                )));
            }
            for i in 1..=per_side {
                exits.push(ExitLocation {
                    side,
                    offset: slots * i / (per_side + 1),
                });
            }
        }
        Ok(exits)
    }

    /// Pin the padded border: empty at pattern-size stride, hallways at the
    /// exits. Stride cells within a pattern length of an exit stay free so
    /// the hallway never sits directly against a pinned empty.
    fn pin_border(&self, solver: &mut WfcSolver<'_>, gen_h: usize, gen_w: usize, exits: &[ExitLocation]) {
        let n = self.options.pattern_size;
        let margin = n - 1;

        for side in Dir::ALL {
            let len = if side.is_vertical() { gen_w } else { gen_h };
            let exit_positions: Vec<usize> = exits
                .iter()
                .filter(|e| e.side == side)
                .map(|e| margin + e.offset * n + n / 2)
                .collect();

            for p in (0..len).step_by(n) {
                if exit_positions.iter().any(|&e| p.abs_diff(e) < n) {
                    continue;
                }
                let (row, col) = ring_cell(side, p, gen_h, gen_w);
                solver.force_pattern(row, col, self.empty_pattern);
            }
            for &e in &exit_positions {
                let (row, col) = ring_cell(side, e, gen_h, gen_w);
                solver.force_pattern(row, col, self.exit_patterns[side.index()]);
            }
        }
    }

    /// Keep only the component reachable from the first exit; None when any
    /// requested exit is cut off from it.
    fn isolate(&self, cropped: &Grid<char>, exits: &[ExitLocation]) -> Option<Grid<char>> {
        let n = self.options.pattern_size;
        let cells: Vec<Location> = exits
            .iter()
            .map(|e| e.cell(cropped.height, cropped.width, n, true))
            .collect();
        let first = *cells.first()?;

        let blank = self.blank;
        let region = flood_fill(cropped, first, |&c| c != blank);
        if region.is_empty() {
            return None;
        }

        let mut mask = Grid::filled(cropped.height, cropped.width, false);
        for loc in &region {
            if let Some(cell) = mask.at_mut(*loc) {
                *cell = true;
            }
        }
        if !cells.iter().all(|c| mask.get_or(*c, false)) {
            return None;
        }

        Some(Grid::from_fn(cropped.height, cropped.width, |r, c| {
            if *mask.get(r, c) {
                *cropped.get(r, c)
            } else {
                blank
            }
        }))
    }
}

fn ring_cell(side: Dir, p: usize, gen_h: usize, gen_w: usize) -> (usize, usize) {
    match side {
        Dir::Top => (0, p),
        Dir::Bottom => (gen_h - 1, p),
        Dir::Left => (p, 0),
        Dir::Right => (p, gen_w - 1),
    }
}
