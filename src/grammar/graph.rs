//! Region graph arena.
//!
//! Regions live in a stable-index arena; adjacency is a pair of directed
//! edges tagged with the direction from source to target, so a node shared
//! by several neighbors (the stitch points templates create) is just a
//! node with several incoming edges. Indices stay valid across removals,
//! which the filler substitution step relies on.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use crate::error::GenerationError;
use crate::grid::{Dir, Grid, Location};

use super::{GraphTemplate, RegionLabel, BLANK_SYMBOL, CONNECTOR_SYMBOL};

/// One region of the macro layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionNode {
    pub label: RegionLabel,
    /// Expansion level that created this node, 0 for the start template.
    pub depth: u32,
    /// Grid coordinate in region units, meaningful after
    /// [`RegionGraph::assign_locations`].
    pub location: Location,
    pub visited: bool,
}

/// Arena of labeled regions linked in the four cardinal directions.
#[derive(Debug, Clone, Default)]
pub struct RegionGraph {
    graph: StableDiGraph<RegionNode, Dir>,
}

impl RegionGraph {
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&RegionNode> {
        self.graph.node_weight(idx)
    }

    /// All node indices in arena order.
    pub fn indices(&self) -> Vec<NodeIndex> {
        self.graph.node_indices().collect()
    }

    /// The node one step in `dir`, if that slot is occupied.
    pub fn neighbor(&self, idx: NodeIndex, dir: Dir) -> Option<NodeIndex> {
        self.graph
            .edges(idx)
            .find(|e| *e.weight() == dir)
            .map(|e| e.target())
    }

    /// Directions whose neighbor slot is occupied, in fixed order.
    pub fn occupied_dirs(&self, idx: NodeIndex) -> Vec<Dir> {
        Dir::ALL
            .into_iter()
            .filter(|&dir| self.neighbor(idx, dir).is_some())
            .collect()
    }

    /// Indices of every filler node currently in the graph.
    pub fn fillers(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .node_weight(idx)
                    .map(|n| n.label.is_filler())
                    .unwrap_or(false)
            })
            .collect()
    }

    pub(crate) fn remove(&mut self, idx: NodeIndex) {
        self.graph.remove_node(idx);
    }

    /// Record that `b` sits one step in `dir` from `a`.
    fn connect(&mut self, a: NodeIndex, b: NodeIndex, dir: Dir) {
        self.graph.update_edge(a, b, dir);
        self.graph.update_edge(b, a, dir.opposite());
    }

    /// Materialize a template into the arena.
    ///
    /// Walks the text row-major (col-major when `rotated`), adding one node
    /// per label cell and linking each new cell to whatever the walk already
    /// placed above and to its left. The first connector symbol stands for
    /// `connector_a`, every later one for `connector_b`; connector cells add
    /// no node of their own, they splice the surrounding cells onto those
    /// existing nodes. Filler labels are axis-swapped when `rotated` so a
    /// sideways-growing filler stays sideways-growing after the transpose.
    pub(crate) fn instantiate(
        &mut self,
        template: &GraphTemplate,
        rotated: bool,
        connector_a: Option<NodeIndex>,
        connector_b: Option<NodeIndex>,
        depth: u32,
    ) -> Result<Vec<NodeIndex>, GenerationError> {
        let rows = template.rows.len();
        let cols = template
            .rows
            .iter()
            .map(|r| r.chars().count())
            .max()
            .unwrap_or(0);
        let (scratch_h, scratch_w) = if rotated { (cols, rows) } else { (rows, cols) };
        let mut scratch: Grid<Option<NodeIndex>> =
            Grid::filled(scratch_h.max(1), scratch_w.max(1), None);

        let mut out = Vec::new();
        let mut hit_first_connector = false;

        for (row, line) in template.rows.iter().enumerate() {
            for (col, symbol) in line.chars().enumerate() {
                if symbol == BLANK_SYMBOL {
                    continue;
                }

                let loc = if rotated {
                    Location::new(col as i32, row as i32)
                } else {
                    Location::new(row as i32, col as i32)
                };

                if symbol == CONNECTOR_SYMBOL {
                    let bound = if hit_first_connector {
                        connector_b
                    } else {
                        hit_first_connector = true;
                        connector_a
                    };
                    if let Some(cell) = scratch.at_mut(loc) {
                        *cell = bound;
                    }
                    // A connector can trail the cell it stitches, so link it
                    // to its already-placed neighbors here rather than
                    // waiting for a later cell to look back at it.
                    if let Some(bound) = bound {
                        for dir in [Dir::Top, Dir::Left] {
                            if let Some(other) = scratch.at(loc.step(dir)).copied().flatten() {
                                self.connect(bound, other, dir);
                            }
                        }
                    }
                    continue;
                }

                let mut label = RegionLabel::from_char(symbol).ok_or_else(|| {
                    GenerationError::InvalidRuleset(format!(
                        "template symbol '{}' is not a region label",
                        symbol
                    ))
                })?;
                if rotated {
                    label = label.rotated();
                }

                let idx = self.graph.add_node(RegionNode {
                    label,
                    depth,
                    location: Location::default(),
                    visited: false,
                });
                out.push(idx);
                if let Some(cell) = scratch.at_mut(loc) {
                    *cell = Some(idx);
                }
                for dir in [Dir::Top, Dir::Left] {
                    if let Some(other) = scratch.at(loc.step(dir)).copied().flatten() {
                        self.connect(idx, other, dir);
                    }
                }
            }
        }

        Ok(out)
    }

    /// Derive every node's grid coordinate from adjacency alone.
    ///
    /// Breadth-first from the first node: each newly reached neighbor gets
    /// the current location plus the slot's direction offset. Afterwards
    /// locations are shifted so the minimum is (0, 0), and the result is
    /// checked: one connected component, every edge consistent with the
    /// assigned coordinates, no two regions on the same cell.
    pub fn assign_locations(&mut self) -> Result<(), GenerationError> {
        let Some(root) = self.graph.node_indices().next() else {
            return Ok(());
        };

        for idx in self.indices() {
            if let Some(node) = self.graph.node_weight_mut(idx) {
                node.visited = false;
                node.location = Location::default();
            }
        }

        let mut queue = VecDeque::new();
        if let Some(node) = self.graph.node_weight_mut(root) {
            node.visited = true;
        }
        queue.push_back(root);

        while let Some(current) = queue.pop_front() {
            let here = match self.graph.node_weight(current) {
                Some(n) => n.location,
                None => continue,
            };
            for dir in Dir::ALL {
                let Some(next) = self.neighbor(current, dir) else {
                    continue;
                };
                let Some(node) = self.graph.node_weight_mut(next) else {
                    continue;
                };
                if node.visited {
                    continue;
                }
                node.visited = true;
                node.location = here + dir.delta();
                queue.push_back(next);
            }
        }

        if let Some(idx) = self
            .graph
            .node_indices()
            .find(|&idx| self.graph.node_weight(idx).map(|n| !n.visited).unwrap_or(false))
        {
            return Err(GenerationError::InvalidRuleset(format!(
                "region graph is disconnected, node {:?} unreachable from the start",
                idx
            )));
        }

        for edge in self.graph.edge_references() {
            let a = &self.graph[edge.source()];
            let b = &self.graph[edge.target()];
            if b.location != a.location + edge.weight().delta() {
                return Err(GenerationError::InvalidRuleset(format!(
                    "region locations are inconsistent across the {:?} edge at {}",
                    edge.weight(),
                    a.location
                )));
            }
        }

        let (min, _) = self.bounds();
        for idx in self.indices() {
            if let Some(node) = self.graph.node_weight_mut(idx) {
                node.location = node.location - min;
            }
        }

        let mut seen = HashSet::new();
        for idx in self.indices() {
            if let Some(node) = self.graph.node_weight(idx) {
                if !seen.insert(node.location) {
                    return Err(GenerationError::InvalidRuleset(format!(
                        "two regions share location {}",
                        node.location
                    )));
                }
            }
        }

        Ok(())
    }

    /// Inclusive (min, max) over node locations; zeros for an empty graph.
    pub fn bounds(&self) -> (Location, Location) {
        let mut min = Location::default();
        let mut max = Location::default();
        let mut first = true;
        for idx in self.graph.node_indices() {
            let Some(node) = self.graph.node_weight(idx) else {
                continue;
            };
            if first {
                min = node.location;
                max = node.location;
                first = false;
                continue;
            }
            min.row = min.row.min(node.location.row);
            min.col = min.col.min(node.location.col);
            max.row = max.row.max(node.location.row);
            max.col = max.col.max(node.location.col);
        }
        (min, max)
    }

    /// One character per region cell, blanks where no region sits.
    pub fn ascii(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let (min, max) = self.bounds();
        let height = (max.row - min.row + 1) as usize;
        let width = (max.col - min.col + 1) as usize;
        let mut canvas = Grid::filled(height, width, BLANK_SYMBOL);
        for idx in self.graph.node_indices() {
            if let Some(node) = self.graph.node_weight(idx) {
                if let Some(cell) = canvas.at_mut(node.location - min) {
                    *cell = node.label.as_char();
                }
            }
        }
        canvas.to_string()
    }
}
