//! Overlapping-model wave function collapse.
//!
//! A seed image is sliced into overlapping square windows which become the
//! pattern catalog; a wave of per-cell candidate sets is collapsed one
//! observation at a time while arc consistency is restored after each
//! removal. The region module wraps the raw solver in the boundary and
//! retry policy used for ship interiors.

pub mod pattern;
pub mod propagator;
pub mod region;
pub mod solver;
pub mod wave;

#[allow(unused_imports)]
pub use pattern::{PatternCatalog, PatternId};
#[allow(unused_imports)]
pub use region::{BoundaryPatterns, ExitLocation, RegionFill, RegionWfc, RegionWfcSettings};
#[allow(unused_imports)]
pub use solver::{ObserveStatus, WfcSolver};
#[allow(unused_imports)]
pub use wave::Wave;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Knobs of the overlapping model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WfcOptions {
    /// Side length of the square windows sliced from the seed.
    pub pattern_size: usize,
    /// How many symmetry variants each window contributes, 1 to 8 in the
    /// order base, reflection, rotation, reflected rotation and so on.
    pub symmetry: usize,
    /// Treat the seed image as toric when slicing windows.
    pub periodic_input: bool,
    /// Wrap the output grid when propagating.
    pub periodic_output: bool,
}

impl Default for WfcOptions {
    fn default() -> Self {
        Self {
            pattern_size: 3,
            symmetry: 4,
            periodic_input: true,
            periodic_output: false,
        }
    }
}

impl WfcOptions {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.pattern_size < 2 {
            return Err(GenerationError::InvalidOptions(format!(
                "pattern_size must be at least 2, got {}",
                self.pattern_size
            )));
        }
        if self.symmetry < 1 || self.symmetry > 8 {
            return Err(GenerationError::InvalidOptions(format!(
                "symmetry must be between 1 and 8, got {}",
                self.symmetry
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
