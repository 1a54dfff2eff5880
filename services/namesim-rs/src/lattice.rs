//! Weighted phoneme edit distance over an alignment lattice.
//!
//! The lattice is a `(|source|+1)×(|target|+1)` grid filled row-major with
//! insert, delete and substitute transitions. Each cell keeps its cheapest
//! accumulated cost and predecessor; ties keep the first path found.

use std::cell::RefCell;
use std::sync::Arc;

use ndarray::Array2;

use crate::cost_matrix::{CostMatrix, EditCounts};
use crate::phoneme::{Phoneme, PhonemeSequence, EMPTY};
use crate::types::EditStep;

#[derive(Debug, Clone, Copy)]
struct Cell {
    cost: u32,
    prev_x: usize,
    prev_y: usize,
}

const UNREACHED: Cell = Cell {
    cost: u32::MAX,
    prev_x: usize::MAX,
    prev_y: usize::MAX,
};

/// Scratch grid for one comparison at a time.
///
/// The buffer only grows, so a lattice kept per thread stops allocating
/// once it has seen the longest names.
#[derive(Debug, Clone)]
pub struct AlignmentLattice {
    cells: Array2<Cell>,
    source: Vec<usize>,
    target: Vec<usize>,
}

impl Default for AlignmentLattice {
    fn default() -> Self {
        Self::new()
    }
}

/// Position-weighted sum of self-substitution costs.
fn self_cost(ids: &[usize], costs: &CostMatrix, smooth: f64) -> f64 {
    ids.iter()
        .enumerate()
        .map(|(i, &id)| f64::from(costs.cost(id, id)) / (i as f64 + smooth))
        .sum()
}

impl AlignmentLattice {
    pub fn new() -> Self {
        Self::with_capacity(16, 16)
    }

    pub fn with_capacity(max_source: usize, max_target: usize) -> Self {
        Self {
            cells: Array2::from_elem((max_source + 1, max_target + 1), UNREACHED),
            source: Vec::with_capacity(max_source),
            target: Vec::with_capacity(max_target),
        }
    }

    fn reset(&mut self, source: &PhonemeSequence, target: &PhonemeSequence) {
        self.source.clear();
        self.source.extend(source.iter().map(Phoneme::id));
        self.target.clear();
        self.target.extend(target.iter().map(Phoneme::id));

        let (rows, cols) = self.cells.dim();
        let (need_rows, need_cols) = (self.source.len() + 1, self.target.len() + 1);
        if rows < need_rows || cols < need_cols {
            self.cells =
                Array2::from_elem((rows.max(need_rows), cols.max(need_cols)), UNREACHED);
        }
        for x in 0..need_rows {
            for y in 0..need_cols {
                self.cells[[x, y]] = UNREACHED;
            }
        }
        self.cells[[0, 0]].cost = 0;
    }

    #[inline]
    fn relax(&mut self, from: (usize, usize), to: (usize, usize), cost: u32) {
        let cell = &mut self.cells[[to.0, to.1]];
        if cost < cell.cost {
            *cell = Cell {
                cost,
                prev_x: from.0,
                prev_y: from.1,
            };
        }
    }

    /// Fill the lattice for `source → target`. Returns the best total cost.
    pub fn compute_best_path(
        &mut self,
        source: &PhonemeSequence,
        target: &PhonemeSequence,
        costs: &CostMatrix,
    ) -> u32 {
        self.reset(source, target);
        let (len_x, len_y) = (self.source.len(), self.target.len());

        for x in 0..=len_x {
            for y in 0..=len_y {
                let current = self.cells[[x, y]].cost;
                if y < len_y {
                    let step = costs.cost(EMPTY, self.target[y]);
                    self.relax((x, y), (x, y + 1), current + step);
                }
                if x < len_x {
                    let step = costs.cost(self.source[x], EMPTY);
                    self.relax((x, y), (x + 1, y), current + step);
                }
                if x < len_x && y < len_y {
                    let step = costs.cost(self.source[x], self.target[y]);
                    self.relax((x, y), (x + 1, y + 1), current + step);
                }
            }
        }
        self.cells[[len_x, len_y]].cost
    }

    /// Best-path symbol pairs from start to end, [`EMPTY`] marking indels.
    fn path(&self) -> Vec<(usize, usize)> {
        let (mut to_x, mut to_y) = (self.source.len(), self.target.len());
        let mut steps = Vec::with_capacity(to_x + to_y);
        while to_x > 0 || to_y > 0 {
            let cell = self.cells[[to_x, to_y]];
            let (from_x, from_y) = (cell.prev_x, cell.prev_y);
            let a = if from_x == to_x { EMPTY } else { self.source[from_x] };
            let b = if from_y == to_y { EMPTY } else { self.target[from_y] };
            steps.push((a, b));
            to_x = from_x;
            to_y = from_y;
        }
        steps.reverse();
        steps
    }

    /// Normalized cost of the last computed path.
    ///
    /// Step `i` from the start weighs `1/(i+smooth)`, so early differences
    /// count more. The sum is divided by the larger self-cost of the two
    /// sequences; when both self-costs are zero the raw sum is returned.
    /// Higher means less alike, and the value is direction-dependent.
    pub fn best_path_score(&self, costs: &CostMatrix, smooth: f64) -> f64 {
        let total: f64 = self
            .path()
            .into_iter()
            .enumerate()
            .map(|(i, (a, b))| f64::from(costs.cost(a, b)) / (i as f64 + smooth))
            .sum();
        let norm = self_cost(&self.source, costs, smooth).max(self_cost(&self.target, costs, smooth));
        if norm > 0.0 {
            total / norm
        } else {
            total
        }
    }

    /// Count every pair on the last computed path into `counts`.
    pub fn update_counts(&self, counts: &mut EditCounts) {
        for (a, b) in self.path() {
            counts.add(a, b);
        }
    }

    /// The last computed path as edit steps.
    pub fn edit_script(&self, costs: &CostMatrix) -> Vec<EditStep> {
        self.path()
            .into_iter()
            .map(|(a, b)| EditStep {
                from: Phoneme::from_id(a),
                to: Phoneme::from_id(b),
                cost: costs.cost(a, b),
            })
            .collect()
    }
}

thread_local! {
    static LATTICE: RefCell<AlignmentLattice> = RefCell::new(AlignmentLattice::new());
}

/// Scores phoneme sequences against a shared, read-only cost matrix.
///
/// Cheap to clone. Each thread reuses its own scratch lattice.
#[derive(Debug, Clone)]
pub struct WeightedEditDistance {
    costs: Arc<CostMatrix>,
    smoothing: f64,
}

impl WeightedEditDistance {
    pub fn new(costs: Arc<CostMatrix>, smoothing: f64) -> Self {
        Self { costs, smoothing }
    }

    pub fn costs(&self) -> &CostMatrix {
        &self.costs
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// One-directional normalized score, `source → target`.
    pub fn score(&self, source: &PhonemeSequence, target: &PhonemeSequence) -> f64 {
        LATTICE.with(|lattice| {
            let mut lattice = lattice.borrow_mut();
            lattice.compute_best_path(source, target, &self.costs);
            lattice.best_path_score(&self.costs, self.smoothing)
        })
    }

    /// The smaller of the two directional scores.
    pub fn symmetric_score(&self, a: &PhonemeSequence, b: &PhonemeSequence) -> f64 {
        self.score(a, b).min(self.score(b, a))
    }

    pub fn align(&self, source: &PhonemeSequence, target: &PhonemeSequence) -> Vec<EditStep> {
        LATTICE.with(|lattice| {
            let mut lattice = lattice.borrow_mut();
            lattice.compute_best_path(source, target, &self.costs);
            lattice.edit_script(&self.costs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EditOp;
    use crate::phoneme::Phoneme::{B, P, V};

    fn seq(phonemes: &[Phoneme]) -> PhonemeSequence {
        PhonemeSequence::new(phonemes.to_vec())
    }

    fn distance() -> WeightedEditDistance {
        WeightedEditDistance::new(Arc::new(CostMatrix::uniform(2, 10, 8)), 1.0)
    }

    #[test]
    fn test_best_path_cost() {
        let costs = CostMatrix::uniform(2, 10, 8);
        let mut lattice = AlignmentLattice::new();
        assert_eq!(lattice.compute_best_path(&seq(&[B, V]), &seq(&[V, P, B]), &costs), 26);
        assert_eq!(lattice.compute_best_path(&seq(&[B, V, P]), &seq(&[B, V]), &costs), 12);
        assert_eq!(lattice.compute_best_path(&seq(&[]), &seq(&[]), &costs), 0);
    }

    #[test]
    fn test_identical_sequences_score_one() {
        let d = distance();
        assert!((d.score(&seq(&[B, V]), &seq(&[B, V])) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_is_directional() {
        let d = distance();
        let (a, b) = (seq(&[B, V]), seq(&[V, P, B]));
        let forward = d.score(&a, &b);
        let backward = d.score(&b, &a);
        assert!((forward - 4.0).abs() < 1e-12);
        assert!((backward - 41.0 / 11.0).abs() < 1e-12);
        assert_ne!(forward, backward);
        assert_eq!(d.symmetric_score(&a, &b), d.symmetric_score(&b, &a));
        assert_eq!(d.symmetric_score(&a, &b), backward);
    }

    #[test]
    fn test_trailing_indel() {
        let d = distance();
        let (long, short) = (seq(&[B, V, P]), seq(&[B, V]));
        assert!((d.score(&long, &short) - 17.0 / 11.0).abs() < 1e-12);
        assert!((d.score(&short, &long) - 17.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_sequences() {
        let d = distance();
        assert_eq!(d.score(&seq(&[]), &seq(&[])), 0.0);
        assert!((d.score(&seq(&[]), &seq(&[B])) - 4.0).abs() < 1e-12);
        assert!((d.score(&seq(&[B]), &seq(&[])) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_ties_keep_first_path() {
        // inserting the first b and matching the second ties with the
        // reverse order; the insertion is relaxed first
        let d = distance();
        let script = d.align(&seq(&[B]), &seq(&[B, B]));
        let ops: Vec<_> = script.iter().map(EditStep::op).collect();
        assert_eq!(ops, [EditOp::Insert, EditOp::Match]);
        assert!((d.score(&seq(&[B]), &seq(&[B, B])) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_update_counts_follows_path() {
        let costs = CostMatrix::uniform(2, 10, 8);
        let mut lattice = AlignmentLattice::new();
        lattice.compute_best_path(&seq(&[V, P, B]), &seq(&[B, V]), &costs);
        let mut counts = EditCounts::new();
        lattice.update_counts(&mut counts);
        // ins b, v|v, del p, del b; b|EMPTY and EMPTY|b share one cell
        assert_eq!(counts.get(B.id(), EMPTY), 2);
        assert_eq!(counts.get(V.id(), V.id()), 1);
        assert_eq!(counts.get(P.id(), EMPTY), 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_lattice_grows() {
        let costs = CostMatrix::uniform(2, 10, 8);
        let mut lattice = AlignmentLattice::with_capacity(1, 1);
        let long = seq(&[B; 20]);
        assert_eq!(lattice.compute_best_path(&long, &long, &costs), 40);
        assert_eq!(lattice.compute_best_path(&seq(&[B]), &seq(&[P]), &costs), 10);
    }
}
