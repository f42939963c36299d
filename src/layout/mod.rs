//! Ship layout assembly.
//!
//! Drives the two generators end to end: the grammar grows the macro
//! topology, then every region gets a constraint-solved interior whose
//! exits follow the region's occupied neighbor slots, and the fills are
//! blitted into one tile grid. Each region draws its randomness from a
//! hash lane of the root seed, so regions are independent and a layout is
//! reproducible whether regions are filled sequentially or in parallel.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;
use tracing::{debug, info};

use crate::error::GenerationError;
use crate::grammar::{GrammarRuleset, GrammarSettings, RegionGrammar, RegionGraph, RegionLabel};
use crate::grid::flood::flood_fill;
use crate::grid::{Dir, Grid, Location};
use crate::presets::{self, GeneratorPreset, TilePalette, WfcPreset};
use crate::wfc::{ExitLocation, PatternCatalog, RegionFill, RegionWfc, RegionWfcSettings, WfcOptions};

/// Root seed of a layout; every region's randomness derives from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSeed {
    pub seed: u64,
}

impl Default for LayoutSeed {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl LayoutSeed {
    /// Deterministic sub-seed for one hash lane.
    fn stream(&self, lane: u64) -> u64 {
        let mut hasher = Sha3_256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(lane.to_le_bytes());
        let result = hasher.finalize();
        u64::from_le_bytes(result[0..8].try_into().unwrap())
    }

    /// Lane feeding grammar expansion.
    pub fn graph_hash(&self) -> u64 {
        self.stream(u64::MAX)
    }

    /// Lane feeding the fill of one region, by region index.
    pub fn region_hash(&self, region_id: u64) -> u64 {
        self.stream(region_id)
    }
}

/// Everything the generator needs besides the seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipGeneratorConfig {
    pub preset: GeneratorPreset,
    pub wfc: WfcOptions,
    pub grammar: GrammarSettings,
    pub region: RegionWfcSettings,
    /// Side length of each region's interior, in tiles.
    pub region_size: usize,
}

impl Default for ShipGeneratorConfig {
    fn default() -> Self {
        Self {
            preset: GeneratorPreset::default(),
            wfc: WfcOptions::default(),
            grammar: GrammarSettings::default(),
            region: RegionWfcSettings::default(),
            region_size: 12,
        }
    }
}

impl ShipGeneratorConfig {
    pub fn validate(&self) -> Result<(), GenerationError> {
        self.wfc.validate()?;
        let slots = self.region_size / self.wfc.pattern_size;
        if slots == 0 {
            return Err(GenerationError::InvalidOptions(format!(
                "region_size {} is smaller than pattern_size {}",
                self.region_size, self.wfc.pattern_size
            )));
        }
        if slots < self.region.exits_per_side {
            return Err(GenerationError::InvalidOptions(format!(
                "region_size {} fits {} exits per side, {} requested",
                self.region_size, slots, self.region.exits_per_side
            )));
        }
        Ok(())
    }
}

/// Per-tile facts handed to the consumer alongside the raw labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellProperties {
    pub label: char,
    /// Room component index, -1 outside rooms.
    pub room: i32,
    /// Whether the tile faces open space per direction, in `Dir::ALL` order.
    pub edges: [bool; 4],
}

/// One region of the finished layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSummary {
    pub label: RegionLabel,
    /// Coordinate in region units.
    pub location: Location,
    pub exits: Vec<ExitLocation>,
    /// Solver attempts the region's fill took.
    pub attempts: u32,
}

/// A completed ship interior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipLayout {
    pub grid: Grid<char>,
    pub cells: Grid<CellProperties>,
    pub regions: Vec<RegionSummary>,
    pub palette: TilePalette,
}

impl ShipLayout {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }

    /// Number of distinct rooms found in the post-pass.
    pub fn room_count(&self) -> usize {
        self.cells
            .rows()
            .flatten()
            .map(|c| c.room + 1)
            .max()
            .unwrap_or(0) as usize
    }
}

impl fmt::Display for ShipLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.grid)
    }
}

/// Label grid to tile properties: room components and open-space edges.
pub fn derive_cells(grid: &Grid<char>, palette: &TilePalette) -> Grid<CellProperties> {
    let mut rooms: Grid<i32> = Grid::filled(grid.height, grid.width, -1);
    let mut next_room = 0;
    for row in 0..grid.height {
        for col in 0..grid.width {
            if *grid.get(row, col) != palette.room || *rooms.get(row, col) != -1 {
                continue;
            }
            let seed = Location::new(row as i32, col as i32);
            let room = palette.room;
            for loc in flood_fill(grid, seed, |&c| c == room) {
                if let Some(cell) = rooms.at_mut(loc) {
                    *cell = next_room;
                }
            }
            next_room += 1;
        }
    }

    Grid::from_fn(grid.height, grid.width, |row, col| {
        let label = *grid.get(row, col);
        let mut edges = [false; 4];
        if label != palette.blank {
            let here = Location::new(row as i32, col as i32);
            for dir in Dir::ALL {
                edges[dir.index()] = grid.get_or(here.step(dir), palette.blank) == palette.blank;
            }
        }
        CellProperties {
            label,
            room: *rooms.get(row, col),
            edges,
        }
    })
}

/// Work order for one region's fill.
struct RegionTask {
    label: RegionLabel,
    location: Location,
    exit_sides: Vec<Dir>,
    hash: u64,
}

/// End-to-end generator bound to one configuration.
///
/// The pattern catalog is built once and shared read-only by every fill;
/// each fill owns its wave, propagator and random stream.
pub struct ShipGenerator {
    config: ShipGeneratorConfig,
    preset: WfcPreset,
    catalog: PatternCatalog,
    grammar: RegionGrammar,
}

impl ShipGenerator {
    /// Generator with the bundled grammar ruleset.
    pub fn new(config: ShipGeneratorConfig) -> Result<Self, GenerationError> {
        Self::with_ruleset(config, presets::standard_grammar())
    }

    pub fn with_ruleset(
        config: ShipGeneratorConfig,
        ruleset: GrammarRuleset,
    ) -> Result<Self, GenerationError> {
        config.validate()?;
        let mut preset = config.preset.build();
        preset.boundary = preset.palette.boundary(config.wfc.pattern_size);
        let catalog = PatternCatalog::from_seed(&preset.seed, &config.wfc)?;
        let grammar = RegionGrammar::new(ruleset, config.grammar)?;
        info!(
            "ship generator ready: {} patterns at size {}, region size {}",
            catalog.len(),
            config.wfc.pattern_size,
            config.region_size
        );
        Ok(Self {
            config,
            preset,
            catalog,
            grammar,
        })
    }

    pub fn config(&self) -> &ShipGeneratorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Generate a layout, filling regions one after another.
    pub fn generate(&self, seed: u64) -> Result<ShipLayout, GenerationError> {
        let (graph, tasks) = self.plan(seed)?;
        let driver = RegionWfc::new(&self.catalog, self.config.wfc, &self.preset.boundary)?;
        let fills: Vec<RegionFill> = tasks
            .iter()
            .map(|task| self.fill(&driver, task))
            .collect::<Result<_, _>>()?;
        Ok(self.assemble(&graph, &tasks, fills))
    }

    /// Generate a layout, filling regions across the rayon pool. Produces
    /// the same layout as [`generate`](Self::generate) for the same seed.
    pub fn par_generate(&self, seed: u64) -> Result<ShipLayout, GenerationError> {
        let (graph, tasks) = self.plan(seed)?;
        let driver = RegionWfc::new(&self.catalog, self.config.wfc, &self.preset.boundary)?;
        let fills: Vec<RegionFill> = tasks
            .par_iter()
            .map(|task| self.fill(&driver, task))
            .collect::<Result<_, _>>()?;
        Ok(self.assemble(&graph, &tasks, fills))
    }

    /// Grow the topology and derive one work order per region.
    fn plan(&self, seed: u64) -> Result<(RegionGraph, Vec<RegionTask>), GenerationError> {
        let layout_seed = LayoutSeed { seed };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(layout_seed.graph_hash());
        let graph = self.grammar.generate(&mut rng)?;

        let mut tasks = Vec::with_capacity(graph.len());
        for (region_id, idx) in graph.indices().into_iter().enumerate() {
            let Some(node) = graph.node(idx) else {
                continue;
            };
            tasks.push(RegionTask {
                label: node.label,
                location: node.location,
                exit_sides: graph.occupied_dirs(idx),
                hash: layout_seed.region_hash(region_id as u64),
            });
        }
        debug!("planned {} region fills", tasks.len());
        Ok((graph, tasks))
    }

    fn fill(&self, driver: &RegionWfc<'_>, task: &RegionTask) -> Result<RegionFill, GenerationError> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(task.hash);
        driver.generate(
            self.config.region_size,
            self.config.region_size,
            &task.exit_sides,
            &self.config.region,
            &mut rng,
        )
    }

    fn assemble(&self, graph: &RegionGraph, tasks: &[RegionTask], fills: Vec<RegionFill>) -> ShipLayout {
        let rs = self.config.region_size;
        let (_, max) = graph.bounds();
        let height = (max.row + 1) as usize * rs;
        let width = (max.col + 1) as usize * rs;

        let palette = self.preset.palette;
        let mut grid = Grid::filled(height, width, palette.blank);
        let mut regions = Vec::with_capacity(tasks.len());
        let mut total_attempts = 0;

        for (task, fill) in tasks.iter().zip(fills) {
            let top = task.location.row as usize * rs;
            let left = task.location.col as usize * rs;
            for row in 0..fill.grid.height {
                for col in 0..fill.grid.width {
                    *grid.get_mut(top + row, left + col) = *fill.grid.get(row, col);
                }
            }
            total_attempts += fill.attempts;
            regions.push(RegionSummary {
                label: task.label,
                location: task.location,
                exits: fill.exits,
                attempts: fill.attempts,
            });
        }

        let cells = derive_cells(&grid, &palette);
        info!(
            "ship layout {}x{} assembled from {} regions in {} fill attempts",
            height,
            width,
            regions.len(),
            total_attempts
        );
        ShipLayout {
            grid,
            cells,
            regions,
            palette,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
