//! Edge case & boundary tests
//!
//! Behavior at system boundaries:
//! - Undersized / malformed seed images
//! - Out-of-range solver options (pattern size, symmetry)
//! - Boundary patterns the seed image never exhibits
//! - Degenerate region requests (no exit sides, zero exits, zero attempts)
//! - Ruleset validation (zero depth, missing pools, connector arity)
//! - Maximum seed values, malformed JSON and RON input

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use derelict_core::error::GenerationError;
use derelict_core::grammar::{GrammarRuleset, GrammarSettings, GraphTemplate, RegionGrammar, RegionLabel, RulePool};
use derelict_core::grid::{Dir, Grid};
use derelict_core::layout::{ShipGenerator, ShipGeneratorConfig, ShipLayout};
use derelict_core::presets::{self, SeedImage, TilePalette};
use derelict_core::wfc::{PatternCatalog, RegionWfc, RegionWfcSettings, WfcOptions};

// ============================================================
// Helpers
// ============================================================

fn default_catalog_for(seed: &Grid<char>) -> Result<PatternCatalog, GenerationError> {
    PatternCatalog::from_seed(seed, &WfcOptions::default())
}

// ============================================================
// 1. Seed image boundaries
// ============================================================

#[test]
fn undersized_seed_image_rejected() {
    let seed = Grid::filled(2, 2, '_');
    let err = default_catalog_for(&seed).unwrap_err();
    assert!(
        matches!(err, GenerationError::InvalidSeed(_)),
        "2x2 seed under a 3x3 window should be InvalidSeed, got {err}"
    );
}

#[test]
fn minimal_seed_image_accepted() {
    // Exactly one window is the smallest legal input.
    let seed = Grid::filled(3, 3, '_');
    let catalog = default_catalog_for(&seed).unwrap();
    assert_eq!(catalog.len(), 1);
}

#[test]
fn ragged_seed_image_rejected() {
    let image = SeedImage {
        rows: vec!["___".to_string(), "__".to_string()],
    };
    assert!(matches!(
        image.to_grid(),
        Err(GenerationError::InvalidSeed(_))
    ));
}

#[test]
fn malformed_ron_rejected() {
    assert!(matches!(
        SeedImage::from_ron_str("(rows: [oops"),
        Err(GenerationError::InvalidSeed(_))
    ));
}

// ============================================================
// 2. Solver option boundaries
// ============================================================

#[test]
fn pattern_size_below_two_rejected() {
    for pattern_size in [0, 1] {
        let options = WfcOptions {
            pattern_size,
            ..WfcOptions::default()
        };
        assert!(
            matches!(options.validate(), Err(GenerationError::InvalidOptions(_))),
            "pattern_size {pattern_size} should be rejected"
        );
    }
}

#[test]
fn symmetry_out_of_range_rejected() {
    for symmetry in [0, 9, 100] {
        let options = WfcOptions {
            symmetry,
            ..WfcOptions::default()
        };
        assert!(options.validate().is_err(), "symmetry {symmetry} should be rejected");
    }
}

// ============================================================
// 3. Boundary patterns missing from the catalog
// ============================================================

#[test]
fn blank_seed_has_no_hallway_patterns() {
    // An all-blank image exhibits the empty pattern but never a corridor,
    // so the region driver cannot pin exits from it.
    let palette = TilePalette::MEDIUM_HALLS;
    let seed = Grid::filled(6, 6, palette.blank);
    let catalog = default_catalog_for(&seed).unwrap();

    let err = RegionWfc::new(&catalog, WfcOptions::default(), &palette.boundary(3)).unwrap_err();
    assert!(matches!(err, GenerationError::UnknownPattern(_)));
}

#[test]
fn mismatched_boundary_size_rejected() {
    let preset = presets::medium_halls();
    let catalog = default_catalog_for(&preset.seed).unwrap();

    // 4x4 boundary grids against a 3x3 window.
    let bad = preset.palette.boundary(4);
    let err = RegionWfc::new(&catalog, WfcOptions::default(), &bad).unwrap_err();
    assert!(matches!(err, GenerationError::InvalidOptions(_)));
}

// ============================================================
// 4. Degenerate region requests
// ============================================================

#[test]
fn region_without_exit_sides_rejected() {
    let preset = presets::medium_halls();
    let catalog = default_catalog_for(&preset.seed).unwrap();
    let driver = RegionWfc::new(&catalog, WfcOptions::default(), &preset.boundary).unwrap();

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    let err = driver
        .generate(9, 9, &[], &RegionWfcSettings::default(), &mut rng)
        .unwrap_err();
    assert!(matches!(err, GenerationError::InvalidOptions(_)));
}

#[test]
fn zero_exits_per_side_rejected() {
    let preset = presets::medium_halls();
    let catalog = default_catalog_for(&preset.seed).unwrap();
    let driver = RegionWfc::new(&catalog, WfcOptions::default(), &preset.boundary).unwrap();

    let settings = RegionWfcSettings {
        max_attempts: 10,
        exits_per_side: 0,
    };
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    let err = driver.generate(9, 9, &[Dir::Top], &settings, &mut rng).unwrap_err();
    assert!(matches!(err, GenerationError::InvalidOptions(_)));
}

#[test]
fn overfull_exit_side_rejected() {
    let preset = presets::medium_halls();
    let catalog = default_catalog_for(&preset.seed).unwrap();
    let driver = RegionWfc::new(&catalog, WfcOptions::default(), &preset.boundary).unwrap();

    // A 9-wide side fits three pattern slots; five exits cannot.
    let settings = RegionWfcSettings {
        max_attempts: 10,
        exits_per_side: 5,
    };
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    let err = driver.generate(9, 9, &[Dir::Top], &settings, &mut rng).unwrap_err();
    assert!(matches!(err, GenerationError::InvalidOptions(_)));
}

#[test]
fn target_smaller_than_pattern_rejected() {
    let preset = presets::medium_halls();
    let catalog = default_catalog_for(&preset.seed).unwrap();
    let driver = RegionWfc::new(&catalog, WfcOptions::default(), &preset.boundary).unwrap();

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    let err = driver
        .generate(2, 2, &[Dir::Top], &RegionWfcSettings::default(), &mut rng)
        .unwrap_err();
    assert!(matches!(err, GenerationError::InvalidOptions(_)));
}

#[test]
fn zero_attempts_exhausts_immediately() {
    let preset = presets::medium_halls();
    let catalog = default_catalog_for(&preset.seed).unwrap();
    let driver = RegionWfc::new(&catalog, WfcOptions::default(), &preset.boundary).unwrap();

    let settings = RegionWfcSettings {
        max_attempts: 0,
        exits_per_side: 1,
    };
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    match driver.generate(9, 9, &[Dir::Top], &settings, &mut rng) {
        Err(GenerationError::RetryExhausted {
            attempts,
            contradictions,
            unreachable_exits,
        }) => {
            assert_eq!(attempts, 0);
            assert_eq!(contradictions, 0);
            assert_eq!(unreachable_exits, 0);
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
}

// ============================================================
// 5. Ruleset validation
// ============================================================

#[test]
fn zero_depth_with_filler_start_rejected() {
    let grammar = RegionGrammar::new(
        presets::standard_grammar(),
        GrammarSettings { max_depth: 0 },
    );
    assert!(matches!(grammar, Err(GenerationError::InvalidRuleset(_))));
}

#[test]
fn zero_depth_without_fillers_accepted() {
    let ruleset = GrammarRuleset {
        start: GraphTemplate::new(["eo"]),
        rules: Default::default(),
    };
    let grammar =
        RegionGrammar::new(ruleset, GrammarSettings { max_depth: 0 }).unwrap();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
    let graph = grammar.generate(&mut rng).unwrap();
    assert_eq!(graph.len(), 2);
}

#[test]
fn missing_filler_pool_rejected() {
    // The start names a vertical filler but only the horizontal pool exists.
    let mut ruleset = presets::standard_grammar();
    ruleset.rules.remove(&RegionLabel::FillerV);
    ruleset.start = GraphTemplate::new(["e|o"]);
    assert!(RegionGrammar::new(ruleset, GrammarSettings { max_depth: 1 }).is_err());
}

#[test]
fn terminal_template_with_filler_rejected() {
    let mut ruleset = presets::standard_grammar();
    if let Some(pool) = ruleset.rules.get_mut(&RegionLabel::FillerH) {
        pool.terminal = vec![GraphTemplate::new([">_>"])];
    }
    assert!(RegionGrammar::new(ruleset, GrammarSettings { max_depth: 1 }).is_err());
}

#[test]
fn wrong_connector_arity_rejected() {
    let mut ruleset = presets::standard_grammar();
    if let Some(pool) = ruleset.rules.get_mut(&RegionLabel::FillerH) {
        pool.terminal = vec![GraphTemplate::new(["h>"])];
    }
    assert!(RegionGrammar::new(ruleset, GrammarSettings { max_depth: 1 }).is_err());
}

#[test]
fn pool_keyed_by_non_filler_rejected() {
    let mut ruleset = presets::standard_grammar();
    ruleset.rules.insert(
        RegionLabel::Entrance,
        RulePool {
            terminal: vec![GraphTemplate::new([">h>"])],
            expanding: vec![],
        },
    );
    assert!(RegionGrammar::new(ruleset, GrammarSettings { max_depth: 1 }).is_err());
}

// ============================================================
// 6. Generator configuration boundaries
// ============================================================

#[test]
fn region_size_below_pattern_rejected() {
    let config = ShipGeneratorConfig {
        region_size: 2,
        ..Default::default()
    };
    assert!(matches!(
        ShipGenerator::new(config),
        Err(GenerationError::InvalidOptions(_))
    ));
}

#[test]
fn exit_density_beyond_region_rejected() {
    let config = ShipGeneratorConfig {
        region_size: 9,
        region: RegionWfcSettings {
            max_attempts: 10,
            exits_per_side: 4,
        },
        ..Default::default()
    };
    assert!(ShipGenerator::new(config).is_err());
}

#[test]
fn zero_attempt_config_propagates_exhaustion() {
    let config = ShipGeneratorConfig {
        region_size: 9,
        grammar: GrammarSettings { max_depth: 1 },
        region: RegionWfcSettings {
            max_attempts: 0,
            exits_per_side: 1,
        },
        ..Default::default()
    };
    let generator = ShipGenerator::new(config).unwrap();
    assert!(matches!(
        generator.generate(1),
        Err(GenerationError::RetryExhausted { .. })
    ));
}

#[test]
fn maximum_seed_value_works() {
    let config = ShipGeneratorConfig {
        region_size: 9,
        grammar: GrammarSettings { max_depth: 1 },
        region: RegionWfcSettings {
            max_attempts: 200,
            exits_per_side: 1,
        },
        ..Default::default()
    };
    let generator = ShipGenerator::new(config).unwrap();
    let layout = generator.generate(u64::MAX).unwrap();
    assert!(!layout.grid.is_empty());
}

// ============================================================
// 7. Malformed serialized input
// ============================================================

#[test]
fn layout_from_garbage_json_is_none() {
    assert!(ShipLayout::from_json("").is_none());
    assert!(ShipLayout::from_json("not json").is_none());
    assert!(ShipLayout::from_json("{\"grid\": 3}").is_none());
}
