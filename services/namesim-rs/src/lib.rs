//! namesim core: phonetic name similarity for genealogical search.
//!
//! Provides:
//! - Phoneme tokenization around a pluggable G2P model
//! - Weighted phoneme alignment with a trainable cost matrix
//! - Feature extraction and pluggable pair scoring
//! - Cluster-indexed similar-name generation
//! - Similar-name table maintenance (add, augment, prune)
//! - Evaluation against labeled pairs
//!
//! Python bindings are built with the `python` feature.

pub mod cluster;
pub mod config;
pub mod cost_matrix;
pub mod engine;
pub mod error;
pub mod eval;
pub mod features;
pub mod generator;
pub mod graph;
pub mod lattice;
pub mod maintenance;
pub mod normalize;
pub mod phoneme;
pub mod scorer;
pub mod tokenizer;
pub mod training;
pub mod types;

#[cfg(feature = "python")]
mod python;

pub use cluster::{build_clusters, Cluster, ClusterSet};
pub use config::{EngineConfig, GeneratorConfig};
pub use cost_matrix::{CostMatrix, EditCounts, MAX_EDIT_COST};
pub use engine::NameEngine;
pub use error::{NameSimError, Result};
pub use features::{Codes, FeatureVector, FeaturesGenerator};
pub use generator::SimilarNameGenerator;
pub use graph::{GraphStats, SimilarNameGraph};
pub use lattice::{AlignmentLattice, WeightedEditDistance};
pub use normalize::{NameNormalizer, SimpleNormalizer};
pub use phoneme::{Phoneme, PhonemeSequence};
pub use scorer::{FeatureScorer, LinearScorer, Scorer};
pub use tokenizer::{GraphemeToPhoneme, LetterRules, Lexicon, PhonemeTokenizer};
pub use training::{Trainer, TrainingReport};
pub use types::{EditOp, EditStep, NameScore, NameType};

pub use namesim_phonetic::{CodeKind, DmSoundex};
