//! Derelict Ship - Procedural Core Library
//!
//! This crate provides deterministic interior generation for derelict
//! spaceships and similar dungeon-like structures:
//! - Region grammar (graph rewriting over ASCII templates)
//! - Overlapping-model constraint solver (pattern catalog, wave, propagator)
//! - Region fills with pinned boundaries and carved exits
//! - Layout assembly (per-region hash lanes, sequential or parallel fills)
//! - Tile post-pass (room components, open-space edges)
//!
//! Everything is seed-driven: the same seed and configuration always
//! produce the same layout, byte for byte.

pub mod error;
pub mod grammar;
pub mod grid;
pub mod layout;
pub mod logging;
pub mod presets;
pub mod wfc;

#[allow(unused_imports)]
pub use error::GenerationError;
#[allow(unused_imports)]
pub use grid::{Dir, Grid, Location};
#[allow(unused_imports)]
pub use layout::{LayoutSeed, ShipGenerator, ShipGeneratorConfig, ShipLayout};
