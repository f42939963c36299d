//! Built-in palettes, seed images and grammar rulesets.
//!
//! A palette names the three tile characters a generator works with; a
//! preset bundles a palette with an example image and the boundary patterns
//! the region driver pins. The example image is drawn so its catalog always
//! contains clean empty, hallway, crossing, dead-end and room vocabulary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::GenerationError;
use crate::grammar::{GrammarRuleset, GraphTemplate, RegionLabel, RulePool};
use crate::grid::Grid;
use crate::wfc::BoundaryPatterns;

/// Tile characters of one generator vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePalette {
    pub blank: char,
    pub hallway: char,
    pub room: char,
}

impl TilePalette {
    pub const MEDIUM_HALLS: TilePalette = TilePalette {
        blank: '_',
        hallway: 'c',
        room: 'B',
    };

    /// All-blank pattern of side `n`.
    pub fn empty_pattern(&self, n: usize) -> Grid<char> {
        Grid::filled(n, n, self.blank)
    }

    /// Corridor along the middle row.
    pub fn hallway_h(&self, n: usize) -> Grid<char> {
        Grid::from_fn(n, n, |r, _| if r == n / 2 { self.hallway } else { self.blank })
    }

    /// Corridor along the middle column.
    pub fn hallway_v(&self, n: usize) -> Grid<char> {
        Grid::from_fn(n, n, |_, c| if c == n / 2 { self.hallway } else { self.blank })
    }

    /// The boundary vocabulary the region driver pins, at pattern size `n`.
    pub fn boundary(&self, n: usize) -> BoundaryPatterns {
        BoundaryPatterns {
            blank: self.blank,
            empty: self.empty_pattern(n),
            hallway_h: self.hallway_h(n),
            hallway_v: self.hallway_v(n),
        }
    }
}

/// Example image for the medium-halls palette.
///
/// Three rooms joined by corridors, one corridor crossing, and corridor
/// stubs that dead-end into open space. Sliced periodically this yields
/// every junction orientation while keeping corridors terminable.
pub const MEDIUM_HALLS_SEED: &[&str] = &[
    "________________",
    "________________",
    "__BBBB___c______",
    "__BBBB___c__BBB_",
    "__BBBBccccccBBB_",
    "__BBBB___c__BBB_",
    "___c_____c__BBB_",
    "___c____________",
    "___c____________",
    "___c____________",
    "__BBBBBB________",
    "__BBBBBB________",
    "__BBBBBB________",
    "________________",
    "________________",
];

/// A palette with its example image and pinned boundary patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WfcPreset {
    pub palette: TilePalette,
    pub seed: Grid<char>,
    pub boundary: BoundaryPatterns,
}

/// Which bundled generator configuration to use for a region.
///
/// Only one exists today; the indirection keeps room for palette variants
/// without touching the generator surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GeneratorPreset {
    #[default]
    MediumHalls,
}

impl GeneratorPreset {
    pub fn build(self) -> WfcPreset {
        match self {
            GeneratorPreset::MediumHalls => medium_halls(),
        }
    }
}

/// The medium-halls preset at the default pattern size of 3.
pub fn medium_halls() -> WfcPreset {
    let palette = TilePalette::MEDIUM_HALLS;
    let seed = Grid::from_lines(MEDIUM_HALLS_SEED)
        .unwrap_or_else(|| palette.empty_pattern(3));
    WfcPreset {
        palette,
        seed,
        boundary: palette.boundary(3),
    }
}

/// Default ruleset: a corridor spine between entrance and objective, grown
/// sideways with optional hall wings hanging below.
pub fn standard_grammar() -> GrammarRuleset {
    let mut rules = HashMap::new();
    rules.insert(
        RegionLabel::FillerH,
        RulePool {
            terminal: vec![GraphTemplate::new([">h>"]), GraphTemplate::new([">hh>"])],
            expanding: vec![
                GraphTemplate::new([">h_>"]),
                GraphTemplate::new([">_h>"]),
                GraphTemplate::new([">hh>", "  | "]),
            ],
        },
    );
    rules.insert(
        RegionLabel::FillerV,
        RulePool {
            terminal: vec![GraphTemplate::new([">h>"]), GraphTemplate::new([">hh>"])],
            expanding: vec![GraphTemplate::new([">h_>"])],
        },
    );
    GrammarRuleset {
        start: GraphTemplate::new(["e_o"]),
        rules,
    }
}

/// A seed image as stored on disk (RON), one string per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedImage {
    pub rows: Vec<String>,
}

impl SeedImage {
    pub fn from_grid(grid: &Grid<char>) -> Self {
        Self {
            rows: grid.rows().map(|row| row.iter().collect()).collect(),
        }
    }

    pub fn to_grid(&self) -> Result<Grid<char>, GenerationError> {
        let lines: Vec<&str> = self.rows.iter().map(String::as_str).collect();
        Grid::from_lines(&lines).ok_or_else(|| {
            GenerationError::InvalidSeed("seed image rows are empty or ragged".to_string())
        })
    }

    pub fn from_ron_str(text: &str) -> Result<Self, GenerationError> {
        ron::from_str(text)
            .map_err(|e| GenerationError::InvalidSeed(format!("bad seed image: {}", e)))
    }

    pub fn from_ron_file(path: &Path) -> Result<Self, GenerationError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GenerationError::InvalidSeed(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_ron_str(&text)
    }

    pub fn to_ron(&self) -> String {
        ron::to_string(self).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wfc::{PatternCatalog, WfcOptions};

    #[test]
    fn test_bundled_seed_is_rectangular() {
        let preset = medium_halls();
        assert_eq!(preset.seed.height, 15);
        assert_eq!(preset.seed.width, 16);
        let palette = preset.palette;
        for row in preset.seed.rows() {
            for &c in row {
                assert!(
                    c == palette.blank || c == palette.hallway || c == palette.room,
                    "Seed contains a character outside the palette: {}",
                    c
                );
            }
        }
    }

    #[test]
    fn test_palette_patterns_shape() {
        let palette = TilePalette::MEDIUM_HALLS;
        let hh = palette.hallway_h(3);
        assert_eq!(hh, Grid::from_lines(&["___", "ccc", "___"]).unwrap());
        let hv = palette.hallway_v(3);
        assert_eq!(hv, Grid::from_lines(&["_c_", "_c_", "_c_"]).unwrap());
        let empty = palette.empty_pattern(3);
        assert!(empty.rows().all(|row| row.iter().all(|&c| c == '_')));
    }

    #[test]
    fn test_boundary_patterns_exist_in_catalog() {
        let preset = medium_halls();
        let catalog = PatternCatalog::from_seed(&preset.seed, &WfcOptions::default()).unwrap();
        assert!(catalog.find(&preset.boundary.empty).is_some(), "Empty pattern missing");
        assert!(catalog.find(&preset.boundary.hallway_h).is_some(), "Hallway H missing");
        assert!(catalog.find(&preset.boundary.hallway_v).is_some(), "Hallway V missing");
    }

    #[test]
    fn test_standard_grammar_validates() {
        let ruleset = standard_grammar();
        assert!(ruleset.validate(0).is_err(), "Start has a filler, depth 0 is unusable");
        assert!(ruleset.validate(1).is_ok());
        assert!(ruleset.validate(3).is_ok());
    }

    #[test]
    fn test_seed_image_round_trip() {
        let preset = medium_halls();
        let image = SeedImage::from_grid(&preset.seed);
        let back = image.to_grid().unwrap();
        assert_eq!(back, preset.seed);
    }

    #[test]
    fn test_seed_image_rejects_ragged_rows() {
        let image = SeedImage {
            rows: vec!["__".to_string(), "___".to_string()],
        };
        assert!(matches!(
            image.to_grid(),
            Err(GenerationError::InvalidSeed(_))
        ));
    }

    #[test]
    fn test_seed_image_from_ron() {
        let image = SeedImage::from_ron_str(r#"(rows: ["_c_", "_c_", "_c_"])"#).unwrap();
        let grid = image.to_grid().unwrap();
        assert_eq!(grid, TilePalette::MEDIUM_HALLS.hallway_v(3));
    }

    #[test]
    fn test_seed_image_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("halls.ron");
        let image = SeedImage::from_grid(&medium_halls().seed);
        std::fs::write(&path, image.to_ron()).unwrap();

        let back = SeedImage::from_ron_file(&path).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn test_missing_seed_file_errors() {
        let err = SeedImage::from_ron_file(Path::new("/definitely/not/here.ron")).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidSeed(_)));
    }
}
