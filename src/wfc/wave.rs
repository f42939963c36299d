//! Wave state for the collapse loop.
//!
//! Tracks, per cell, which patterns are still possible, plus running sums
//! (weight, weight*log(weight), possibility count) so entropy updates and
//! queries stay O(1) per removal. Tie-breaking noise on the entropy scan is
//! bounded well below the smallest real entropy gap.

use rand::Rng;

/// Per-cell possibility bitset over patterns with memoised statistics.
#[derive(Debug, Clone)]
pub struct Wave {
    pub height: usize,
    pub width: usize,
    pattern_count: usize,
    possible: Vec<bool>,
    frequencies: Vec<f64>,
    plogp: Vec<f64>,
    noise_bound: f64,
    impossible: bool,
    plogp_sum: Vec<f64>,
    weight_sum: Vec<f64>,
    log_weight_sum: Vec<f64>,
    possible_count: Vec<usize>,
    entropy: Vec<f64>,
}

impl Wave {
    /// Fresh wave with every pattern possible in every cell.
    /// `frequencies` are the catalog's normalized weights.
    pub fn new(height: usize, width: usize, frequencies: &[f64]) -> Self {
        let pattern_count = frequencies.len();
        let size = height * width;

        let plogp: Vec<f64> = frequencies.iter().map(|&f| f * f.ln()).collect();
        let noise_bound = plogp
            .iter()
            .map(|p| (p / 2.0).abs())
            .fold(f64::INFINITY, f64::min);

        let base_plogp: f64 = plogp.iter().sum();
        let base_weight: f64 = frequencies.iter().sum();
        let base_log = base_weight.ln();
        let base_entropy = base_log - base_plogp / base_weight;

        Self {
            height,
            width,
            pattern_count,
            possible: vec![true; size * pattern_count],
            frequencies: frequencies.to_vec(),
            plogp,
            noise_bound,
            impossible: false,
            plogp_sum: vec![base_plogp; size],
            weight_sum: vec![base_weight; size],
            log_weight_sum: vec![base_log; size],
            possible_count: vec![pattern_count; size],
            entropy: vec![base_entropy; size],
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }

    pub fn index(&self, row: usize, col: usize) -> usize {
        col + row * self.width
    }

    pub fn possible(&self, cell: usize, pattern: usize) -> bool {
        self.possible[pattern + cell * self.pattern_count]
    }

    pub fn possible_count(&self, cell: usize) -> usize {
        self.possible_count[cell]
    }

    /// True once any cell has lost its last pattern.
    pub fn is_impossible(&self) -> bool {
        self.impossible
    }

    /// Rule `pattern` out of `cell`, updating the memoised statistics.
    /// Removing an already-impossible pattern is a no-op.
    pub fn remove(&mut self, cell: usize, pattern: usize) {
        let slot = pattern + cell * self.pattern_count;
        if !self.possible[slot] {
            return;
        }
        self.possible[slot] = false;

        self.plogp_sum[cell] -= self.plogp[pattern];
        self.weight_sum[cell] -= self.frequencies[pattern];
        self.log_weight_sum[cell] = self.weight_sum[cell].ln();
        self.possible_count[cell] -= 1;
        self.entropy[cell] = self.log_weight_sum[cell] - self.plogp_sum[cell] / self.weight_sum[cell];
        if self.possible_count[cell] == 0 {
            self.impossible = true;
        }
    }

    /// The undecided cell with minimal entropy, with a small random noise
    /// added per candidate to break ties. None when every cell is decided.
    pub fn min_entropy_cell<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        let mut min = f64::INFINITY;
        let mut argmin = None;

        for cell in 0..self.len() {
            if self.possible_count[cell] <= 1 {
                continue;
            }
            let entropy = self.entropy[cell];
            if entropy <= min {
                let noise = rng.gen_range(0.0..=self.noise_bound);
                if entropy + noise < min {
                    min = entropy + noise;
                    argmin = Some(cell);
                }
            }
        }
        argmin
    }

    /// The single surviving pattern of a decided cell.
    pub fn decided_pattern(&self, cell: usize) -> Option<usize> {
        if self.possible_count[cell] != 1 {
            return None;
        }
        (0..self.pattern_count).find(|&p| self.possible(cell, p))
    }
}
