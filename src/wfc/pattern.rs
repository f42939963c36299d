//! Pattern catalog for the overlapping model.
//!
//! Slides an N x N window over the seed image (torically when the input is
//! periodic), folds in rotation/reflection variants, deduplicates into
//! weighted patterns and precomputes the per-direction adjacency table the
//! propagator consumes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::WfcOptions;
use crate::error::GenerationError;
use crate::grid::{Dir, Grid};

/// Index of a pattern in catalog order.
pub type PatternId = usize;

/// Deduplicated pattern set with frequency weights and adjacency.
///
/// Immutable after construction; region fills running in parallel share one
/// catalog by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternCatalog {
    pattern_size: usize,
    patterns: Vec<Grid<char>>,
    frequencies: Vec<f64>,
    compatible: Vec<[Vec<PatternId>; 4]>,
}

impl PatternCatalog {
    /// Extract the catalog from a seed image.
    pub fn from_seed(seed: &Grid<char>, options: &WfcOptions) -> Result<Self, GenerationError> {
        options.validate()?;
        let n = options.pattern_size;
        if seed.height < n || seed.width < n {
            return Err(GenerationError::InvalidSeed(format!(
                "seed {}x{} is smaller than pattern size {}",
                seed.height, seed.width, n
            )));
        }

        let (rows, cols) = if options.periodic_input {
            (seed.height, seed.width)
        } else {
            (seed.height - n + 1, seed.width - n + 1)
        };

        let mut index: HashMap<Grid<char>, PatternId> = HashMap::new();
        let mut patterns: Vec<Grid<char>> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();

        for top in 0..rows {
            for left in 0..cols {
                for variant in symmetry_variants(seed.sub_grid(top, left, n, n), options.symmetry)
                {
                    if let Some(&id) = index.get(&variant) {
                        weights[id] += 1.0;
                    } else {
                        let id = patterns.len();
                        index.insert(variant.clone(), id);
                        patterns.push(variant);
                        weights.push(1.0);
                    }
                }
            }
        }

        let total: f64 = weights.iter().sum();
        let frequencies = weights.into_iter().map(|w| w / total).collect();
        let compatible = build_compatibility(&patterns, n);

        Ok(Self {
            pattern_size: n,
            patterns,
            frequencies,
            compatible,
        })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn pattern_size(&self) -> usize {
        self.pattern_size
    }

    pub fn pattern(&self, id: PatternId) -> &Grid<char> {
        &self.patterns[id]
    }

    /// Normalized frequency weights, in catalog order.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Patterns that may sit one step in `dir` from `id`.
    pub fn compatible(&self, id: PatternId, dir: Dir) -> &[PatternId] {
        &self.compatible[id][dir.index()]
    }

    /// The label a decided cell takes from this pattern.
    pub fn center_value(&self, id: PatternId) -> char {
        let mid = self.pattern_size / 2;
        *self.patterns[id].get(mid, mid)
    }

    /// Locate a pattern by exact content. Used to force the special
    /// empty/hallway patterns; a miss means the seed never exhibits them.
    pub fn find(&self, wanted: &Grid<char>) -> Option<PatternId> {
        self.patterns.iter().position(|p| p == wanted)
    }
}

/// The first `symmetry` entries of the variant chain
/// base, reflect, rotate, reflect, rotate, ...
fn symmetry_variants(base: Grid<char>, symmetry: usize) -> Vec<Grid<char>> {
    let mut variants = Vec::with_capacity(symmetry);
    variants.push(base);
    for k in 1..symmetry {
        let next = if k % 2 == 1 {
            variants[k - 1].reflected()
        } else {
            variants[k - 2].rotated()
        };
        variants.push(next);
    }
    variants
}

/// Two patterns agree in `dir` when the (N-1)-wide strip where their
/// footprints overlap matches exactly.
fn agrees(a: &Grid<char>, b: &Grid<char>, dir: Dir, n: usize) -> bool {
    let d = dir.delta();
    let (r0, r1) = overlap_span(d.row, n);
    let (c0, c1) = overlap_span(d.col, n);
    for r in r0..r1 {
        for c in c0..c1 {
            let br = (r as i32 - d.row) as usize;
            let bc = (c as i32 - d.col) as usize;
            if a.get(r, c) != b.get(br, bc) {
                return false;
            }
        }
    }
    true
}

fn overlap_span(delta: i32, n: usize) -> (usize, usize) {
    if delta < 0 {
        (0, (n as i32 + delta) as usize)
    } else {
        (delta as usize, n)
    }
}

fn build_compatibility(patterns: &[Grid<char>], n: usize) -> Vec<[Vec<PatternId>; 4]> {
    let mut table = Vec::with_capacity(patterns.len());
    for a in patterns {
        let mut entry: [Vec<PatternId>; 4] = Default::default();
        for dir in Dir::ALL {
            for (id, b) in patterns.iter().enumerate() {
                if agrees(a, b, dir, n) {
                    entry[dir.index()].push(id);
                }
            }
        }
        table.push(entry);
    }
    table
}
