//! Region-grammar graph rewriting.
//!
//! A ship's macro topology starts as a tiny text template and grows by
//! substitution: filler nodes are repeatedly replaced with randomly chosen
//! sub-templates whose connector symbols stitch onto the filler's old
//! neighbors. Expansion is depth-bounded; at the final depth only
//! filler-free replacements are drawn, so the finished graph never carries
//! a placeholder. Coordinates are derived afterwards from adjacency alone.

pub mod graph;

#[allow(unused_imports)]
pub use graph::{RegionGraph, RegionNode};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::GenerationError;
use crate::grid::Dir;

/// Template cell that stays empty.
pub const BLANK_SYMBOL: char = ' ';
/// Template cell that binds to an already-existing node instead of adding
/// one.
pub const CONNECTOR_SYMBOL: char = '>';

/// Vocabulary of region kinds a node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionLabel {
    Entrance,
    Objective,
    MediumHalls,
    /// Placeholder that must be replaced by a sideways-growing sub-template.
    FillerH,
    /// Placeholder that must be replaced by a downward-growing sub-template.
    FillerV,
}

impl RegionLabel {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'e' => Some(Self::Entrance),
            'o' => Some(Self::Objective),
            'h' => Some(Self::MediumHalls),
            '_' => Some(Self::FillerH),
            '|' => Some(Self::FillerV),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Entrance => 'e',
            Self::Objective => 'o',
            Self::MediumHalls => 'h',
            Self::FillerH => '_',
            Self::FillerV => '|',
        }
    }

    pub fn is_filler(self) -> bool {
        matches!(self, Self::FillerH | Self::FillerV)
    }

    /// The label after a 90 degree template transpose: fillers swap their
    /// growth axis, everything else is unchanged.
    pub fn rotated(self) -> Self {
        match self {
            Self::FillerH => Self::FillerV,
            Self::FillerV => Self::FillerH,
            other => other,
        }
    }
}

/// Which neighbor slots a filler's replacement stitches onto, and whether
/// the replacement template is instantiated transposed.
fn filler_axes(label: RegionLabel) -> Option<(Dir, Dir, bool)> {
    match label {
        RegionLabel::FillerH => Some((Dir::Left, Dir::Right, false)),
        RegionLabel::FillerV => Some((Dir::Top, Dir::Bottom, true)),
        _ => None,
    }
}

/// A rectangular text block describing a subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphTemplate {
    pub rows: Vec<String>,
}

impl GraphTemplate {
    pub fn new<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
        }
    }

    fn symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.rows.iter().flat_map(|r| r.chars())
    }

    pub fn labels(&self) -> impl Iterator<Item = RegionLabel> + '_ {
        self.symbols().filter_map(RegionLabel::from_char)
    }

    pub fn has_filler(&self) -> bool {
        self.labels().any(|l| l.is_filler())
    }

    fn connector_count(&self) -> usize {
        self.symbols().filter(|&c| c == CONNECTOR_SYMBOL).count()
    }

    fn check_symbols(&self) -> Result<(), GenerationError> {
        for c in self.symbols() {
            if c != BLANK_SYMBOL && c != CONNECTOR_SYMBOL && RegionLabel::from_char(c).is_none() {
                return Err(GenerationError::InvalidRuleset(format!(
                    "template symbol '{}' is not a region label",
                    c
                )));
            }
        }
        Ok(())
    }
}

/// Replacement candidates for one filler kind.
///
/// `terminal` templates carry no filler and are the only pool drawn at the
/// final expansion depth; `expanding` templates each keep at least one
/// filler alive so growth can continue below that depth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulePool {
    pub terminal: Vec<GraphTemplate>,
    pub expanding: Vec<GraphTemplate>,
}

/// Start template plus the replacement pools, keyed by filler label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarRuleset {
    pub start: GraphTemplate,
    pub rules: HashMap<RegionLabel, RulePool>,
}

impl GrammarRuleset {
    /// Reject configurations that could wedge or outlive the depth bound.
    pub fn validate(&self, max_depth: u32) -> Result<(), GenerationError> {
        self.start.check_symbols()?;
        if self.start.labels().next().is_none() {
            return Err(GenerationError::InvalidRuleset(
                "start template has no regions".to_string(),
            ));
        }
        if max_depth == 0 && self.start.has_filler() {
            return Err(GenerationError::InvalidRuleset(
                "start template contains fillers but max_depth is 0".to_string(),
            ));
        }

        for (label, pool) in &self.rules {
            if !label.is_filler() {
                return Err(GenerationError::InvalidRuleset(format!(
                    "rules may only replace fillers, found a pool for {:?}",
                    label
                )));
            }
            for template in pool.terminal.iter().chain(&pool.expanding) {
                template.check_symbols()?;
                if template.labels().next().is_none() {
                    return Err(GenerationError::InvalidRuleset(format!(
                        "a replacement for {:?} has no regions",
                        label
                    )));
                }
                if template.connector_count() != 2 {
                    return Err(GenerationError::InvalidRuleset(format!(
                        "a replacement for {:?} needs exactly two connectors",
                        label
                    )));
                }
            }
            for template in &pool.terminal {
                if template.has_filler() {
                    return Err(GenerationError::InvalidRuleset(format!(
                        "a terminal replacement for {:?} still contains a filler",
                        label
                    )));
                }
            }
            for template in &pool.expanding {
                if !template.has_filler() {
                    return Err(GenerationError::InvalidRuleset(format!(
                        "an expanding replacement for {:?} contains no filler",
                        label
                    )));
                }
            }
        }

        for label in self.reachable_fillers() {
            let pool = self.rules.get(&label).ok_or_else(|| {
                GenerationError::InvalidRuleset(format!("no rules for filler {:?}", label))
            })?;
            if pool.terminal.is_empty() {
                return Err(GenerationError::InvalidRuleset(format!(
                    "filler {:?} has no terminal replacement for the final depth",
                    label
                )));
            }
            if max_depth >= 2 && pool.expanding.is_empty() {
                return Err(GenerationError::InvalidRuleset(format!(
                    "filler {:?} has no expanding replacement below the final depth",
                    label
                )));
            }
        }

        Ok(())
    }

    /// Filler labels that can ever occur, starting from the start template
    /// and following expanding rules. A pool keyed by the vertical filler is
    /// instantiated transposed, so its fillers count axis-swapped.
    fn reachable_fillers(&self) -> HashSet<RegionLabel> {
        let mut reachable: HashSet<RegionLabel> = self
            .start
            .labels()
            .filter(|l| l.is_filler())
            .collect();
        let mut frontier: Vec<RegionLabel> = reachable.iter().copied().collect();

        while let Some(label) = frontier.pop() {
            let Some(pool) = self.rules.get(&label) else {
                continue;
            };
            let transposed = label == RegionLabel::FillerV;
            for template in &pool.expanding {
                for found in template.labels().filter(|l| l.is_filler()) {
                    let found = if transposed { found.rotated() } else { found };
                    if reachable.insert(found) {
                        frontier.push(found);
                    }
                }
            }
        }
        reachable
    }
}

/// Knobs of grammar expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarSettings {
    /// Number of substitution levels applied after the start template.
    pub max_depth: u32,
}

impl Default for GrammarSettings {
    fn default() -> Self {
        Self { max_depth: 3 }
    }
}

/// The graph rewriter. Validates its ruleset once, then produces graphs on
/// demand from a caller-supplied random source.
#[derive(Debug)]
pub struct RegionGrammar {
    ruleset: GrammarRuleset,
    settings: GrammarSettings,
}

impl RegionGrammar {
    pub fn new(ruleset: GrammarRuleset, settings: GrammarSettings) -> Result<Self, GenerationError> {
        ruleset.validate(settings.max_depth)?;
        Ok(Self { ruleset, settings })
    }

    pub fn settings(&self) -> GrammarSettings {
        self.settings
    }

    /// Grow the macro topology graph and assign region coordinates.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Result<RegionGraph, GenerationError> {
        let mut graph = RegionGraph::default();
        graph.instantiate(&self.ruleset.start, false, None, None, 0)?;

        for depth in 1..=self.settings.max_depth {
            let fillers = graph.fillers();
            if fillers.is_empty() {
                break;
            }
            debug!(
                "expanding {} filler regions at depth {}",
                fillers.len(),
                depth
            );
            for idx in fillers {
                self.expand(&mut graph, idx, depth, rng)?;
            }
        }

        graph.assign_locations()?;
        debug!("region graph complete with {} regions", graph.len());
        Ok(graph)
    }

    /// Replace one filler node with a drawn sub-template.
    fn expand<R: Rng>(
        &self,
        graph: &mut RegionGraph,
        idx: petgraph::stable_graph::NodeIndex,
        depth: u32,
        rng: &mut R,
    ) -> Result<(), GenerationError> {
        let Some(label) = graph.node(idx).map(|n| n.label) else {
            return Ok(());
        };
        let Some((side_a, side_b, rotated)) = filler_axes(label) else {
            return Ok(());
        };

        let pool = self.ruleset.rules.get(&label).ok_or_else(|| {
            GenerationError::InvalidRuleset(format!("no rules for filler {:?}", label))
        })?;
        let templates = if depth == self.settings.max_depth {
            &pool.terminal
        } else {
            &pool.expanding
        };
        if templates.is_empty() {
            return Err(GenerationError::InvalidRuleset(format!(
                "filler {:?} has no replacement at depth {}",
                label, depth
            )));
        }
        let choice = &templates[rng.gen_range(0..templates.len())];

        let connector_a = graph.neighbor(idx, side_a);
        let connector_b = graph.neighbor(idx, side_b);
        graph.instantiate(choice, rotated, connector_a, connector_b, depth)?;
        graph.remove(idx);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
