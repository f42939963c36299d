//! Command-line demo: generate a ship interior and print it.
//!
//! Usage: `derelict-procedural-core [seed] [region_size] [max_depth]`

use anyhow::{Context, Result};
use tracing::info;

use derelict_core::grammar::GrammarSettings;
use derelict_core::layout::{ShipGenerator, ShipGeneratorConfig};
use derelict_core::logging;

fn main() -> Result<()> {
    logging::init_tracing_default();

    let mut args = std::env::args().skip(1);
    let seed: u64 = match args.next() {
        Some(raw) => raw.parse().context("seed must be an unsigned integer")?,
        None => 42,
    };

    let mut config = ShipGeneratorConfig::default();
    if let Some(raw) = args.next() {
        config.region_size = raw.parse().context("region_size must be a positive integer")?;
    }
    if let Some(raw) = args.next() {
        config.grammar = GrammarSettings {
            max_depth: raw.parse().context("max_depth must be an unsigned integer")?,
        };
    }

    let generator = ShipGenerator::new(config).context("invalid generator configuration")?;
    let layout = generator
        .par_generate(seed)
        .with_context(|| format!("generation failed for seed {seed}"))?;

    info!(
        "seed {}: {} regions, {} rooms",
        seed,
        layout.regions.len(),
        layout.room_count()
    );
    println!("{layout}");
    Ok(())
}
