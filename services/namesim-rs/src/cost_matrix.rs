//! Symmetric phoneme edit costs, and the counts they are estimated from.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use ndarray::Array2;
use tracing::debug;

use crate::error::{NameSimError, Result};
use crate::phoneme::{id_for_symbol, symbol_for_id, EMPTY, NUM_SYMBOLS};

/// Ceiling for any single edit cost.
pub const MAX_EDIT_COST: u32 = 100;

/// Scale applied to `-ln(p)` when turning counts into costs.
pub const COST_MULTIPLIER: f64 = 8.0;

#[inline]
fn canonical(a: usize, b: usize) -> (usize, usize) {
    if b < a {
        (b, a)
    } else {
        (a, b)
    }
}

/// Observed (source, target) symbol pair counts from best paths.
///
/// Only the upper triangle is used; `add` canonicalizes the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCounts {
    counts: Array2<u64>,
}

impl Default for EditCounts {
    fn default() -> Self {
        Self::new()
    }
}

impl EditCounts {
    pub fn new() -> Self {
        Self {
            counts: Array2::zeros((NUM_SYMBOLS, NUM_SYMBOLS)),
        }
    }

    pub fn add(&mut self, a: usize, b: usize) {
        self.counts[canonical(a, b)] += 1;
    }

    pub fn get(&self, a: usize, b: usize) -> u64 {
        self.counts[canonical(a, b)]
    }

    /// Sum another table into this one.
    pub fn merge(mut self, other: EditCounts) -> Self {
        self.counts += &other.counts;
        self
    }

    pub fn total(&self) -> u64 {
        upper_triangle().map(|(i, j)| self.counts[[i, j]]).sum()
    }
}

fn upper_triangle() -> impl Iterator<Item = (usize, usize)> {
    (0..NUM_SYMBOLS).flat_map(|i| (i..NUM_SYMBOLS).map(move |j| (i, j)))
}

/// `(N+1)×(N+1)` integer cost table indexed by symbol id, [`EMPTY`] included.
///
/// `cost(a, b) == cost(b, a)` holds because lookups canonicalize the index
/// order; only the upper triangle is stored meaningfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostMatrix {
    costs: Array2<u32>,
}

impl Default for CostMatrix {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl CostMatrix {
    /// All costs zero. The usual starting point for training.
    pub fn zeroed() -> Self {
        Self {
            costs: Array2::zeros((NUM_SYMBOLS, NUM_SYMBOLS)),
        }
    }

    /// Flat costs: `matched` on the diagonal, `substitute` between distinct
    /// phonemes, `indel` against [`EMPTY`]. Values above [`MAX_EDIT_COST`] are clipped.
    pub fn uniform(matched: u32, substitute: u32, indel: u32) -> Self {
        let mut matrix = Self::zeroed();
        for (i, j) in upper_triangle() {
            let cost = if i == EMPTY || j == EMPTY {
                if i == j {
                    0
                } else {
                    indel
                }
            } else if i == j {
                matched
            } else {
                substitute
            };
            matrix.costs[[i, j]] = cost.min(MAX_EDIT_COST);
        }
        matrix
    }

    /// Recompute costs from counts: `min(MAX, trunc(-ln(count/total) * 8))`,
    /// with pairs never observed costing [`MAX_EDIT_COST`].
    ///
    /// `smooth` adds one to every pair before totalling.
    pub fn from_counts(counts: &EditCounts, smooth: bool) -> Self {
        let bump = u64::from(smooth);
        let total: u64 = upper_triangle()
            .map(|(i, j)| counts.counts[[i, j]] + bump)
            .sum();

        let mut matrix = Self::zeroed();
        for (i, j) in upper_triangle() {
            let count = counts.counts[[i, j]] + bump;
            matrix.costs[[i, j]] = if count < 1 {
                MAX_EDIT_COST
            } else {
                let cost = -((count as f64) / (total as f64)).ln() * COST_MULTIPLIER;
                cost.min(f64::from(MAX_EDIT_COST)) as u32
            };
        }
        matrix
    }

    #[inline]
    pub fn cost(&self, a: usize, b: usize) -> u32 {
        self.costs[canonical(a, b)]
    }

    /// Set the cost of a pair, in either order.
    pub fn set_cost(&mut self, a: usize, b: usize, cost: u32) {
        self.costs[canonical(a, b)] = cost.min(MAX_EDIT_COST);
    }

    /// Sum of absolute per-pair differences over the upper triangle.
    pub fn difference(&self, other: &CostMatrix) -> u64 {
        upper_triangle()
            .map(|(i, j)| u64::from(self.costs[[i, j]].abs_diff(other.costs[[i, j]])))
            .sum()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| NameSimError::io(path, e))?;
        let matrix = Self::from_reader(file)?;
        debug!(path = %path.display(), "loaded cost matrix");
        Ok(matrix)
    }

    /// Parse `a|b,cost` lines. A missing or empty symbol is [`EMPTY`].
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut matrix = Self::zeroed();
        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let malformed = || NameSimError::MalformedCostLine {
                line_no: idx + 1,
                line: line.clone(),
            };
            let (pair, cost) = line.rsplit_once(',').ok_or_else(malformed)?;
            let cost: u32 = cost.trim().parse().map_err(|_| malformed())?;
            if cost > MAX_EDIT_COST {
                return Err(malformed());
            }
            let (a, b) = pair.split_once('|').unwrap_or((pair, ""));
            matrix.set_cost(id_for_symbol(a.trim())?, id_for_symbol(b.trim())?, cost);
        }
        Ok(matrix)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| NameSimError::io(path, e))?;
        self.write_to(BufWriter::new(file))
            .map_err(|e| NameSimError::io(path, e))
    }

    /// Write one `a|b,cost` line per unordered pair.
    pub fn write_to(&self, mut writer: impl Write) -> std::io::Result<()> {
        for (i, j) in upper_triangle() {
            writeln!(
                writer,
                "{}|{},{}",
                symbol_for_id(i),
                symbol_for_id(j),
                self.costs[[i, j]]
            )?;
        }
        writer.flush()
    }
}
