//! Hard-EM re-estimation of the cost matrix from known-equivalent pairs.
//!
//! Each iteration aligns every pair under the current costs, counts the
//! symbol pairs on the best paths, and rebuilds the costs from the counts.
//! Training stops when the total change between two matrices drops below
//! the convergence threshold or the iteration cap is reached.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::cost_matrix::{CostMatrix, EditCounts};
use crate::lattice::AlignmentLattice;
use crate::phoneme::PhonemeSequence;
use crate::tokenizer::PhonemeTokenizer;

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub matrix: CostMatrix,
    pub iterations: usize,
    /// Total difference from the previous matrix, per iteration.
    pub history: Vec<u64>,
    pub converged: bool,
}

#[derive(Debug, Clone)]
pub struct Trainer {
    pub max_iterations: usize,
    pub convergence_threshold: u64,
    /// Add one to every pair count before computing costs.
    pub smooth: bool,
}

impl Default for Trainer {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            convergence_threshold: 10,
            smooth: true,
        }
    }
}

impl Trainer {
    /// Tokenize name pairs for training.
    pub fn tokenize_pairs(
        tokenizer: &PhonemeTokenizer,
        names: &[(String, String)],
    ) -> Vec<(PhonemeSequence, PhonemeSequence)> {
        names
            .par_iter()
            .map(|(a, b)| (tokenizer.tokenize(a), tokenizer.tokenize(b)))
            .collect()
    }

    /// Count best-path symbol pairs for every training pair under `costs`.
    pub fn count_edits(
        pairs: &[(PhonemeSequence, PhonemeSequence)],
        costs: &CostMatrix,
    ) -> EditCounts {
        pairs
            .par_iter()
            .fold(
                || (AlignmentLattice::new(), EditCounts::new()),
                |(mut lattice, mut counts), (source, target)| {
                    lattice.compute_best_path(source, target, costs);
                    lattice.update_counts(&mut counts);
                    (lattice, counts)
                },
            )
            .map(|(_, counts)| counts)
            .reduce(EditCounts::new, EditCounts::merge)
    }

    pub fn train(
        &self,
        pairs: &[(PhonemeSequence, PhonemeSequence)],
        initial: CostMatrix,
    ) -> TrainingReport {
        let mut matrix = initial;
        let mut history = Vec::with_capacity(self.max_iterations);
        let mut converged = false;

        for iteration in 1..=self.max_iterations {
            let counts = Self::count_edits(pairs, &matrix);
            let next = CostMatrix::from_counts(&counts, self.smooth);
            let difference = matrix.difference(&next);
            debug!(iteration, difference, observed = counts.total(), "training iteration");
            history.push(difference);
            matrix = next;
            if difference < self.convergence_threshold {
                converged = true;
                break;
            }
        }

        info!(
            pairs = pairs.len(),
            iterations = history.len(),
            converged,
            "cost matrix training finished"
        );
        TrainingReport {
            matrix,
            iterations: history.len(),
            history,
            converged,
        }
    }
}
