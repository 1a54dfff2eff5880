//! Turning feature vectors into similarity scores.
//!
//! The combination function is a separately trained artifact. The engine
//! only fixes the feature contract; [`LinearScorer`] is the artifact format
//! shipped with it, and any [`FeatureScorer`] can stand in.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NameSimError, Result};
use crate::features::{Codes, FeatureVector, FeaturesGenerator};
use crate::types::NameType;

/// Higher score means more similar. No fixed range.
pub trait FeatureScorer: Send + Sync {
    fn score(&self, features: &FeatureVector) -> f64;
}

impl<F> FeatureScorer for F
where
    F: Fn(&FeatureVector) -> f64 + Send + Sync,
{
    fn score(&self, features: &FeatureVector) -> f64 {
        self(features)
    }
}

/// Per-feature weights of a [`LinearScorer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub edit_cost: f64,
    pub nysiis_match: f64,
    pub soundex_match: f64,
    pub refined_soundex_match: f64,
    pub dm_soundex_match: f64,
    pub levenshtein: f64,
}

impl FeatureWeights {
    fn as_array(&self) -> [f64; 6] {
        [
            self.edit_cost,
            self.nysiis_match,
            self.soundex_match,
            self.refined_soundex_match,
            self.dm_soundex_match,
            self.levenshtein,
        ]
    }
}

/// `bias + Σ weight·feature`, loaded from a versioned JSON artifact.
///
/// ```json
/// { "version": "2011-06", "name_type": "surname", "bias": 3.1,
///   "weights": { "edit_cost": -2.4, "soundex_match": 0.6, "levenshtein": -0.3 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearScorer {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_type: Option<NameType>,
    pub bias: f64,
    pub weights: FeatureWeights,
}

impl LinearScorer {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| NameSimError::io(path, e))?;
        let scorer = Self::from_json(&text)?;
        debug!(path = %path.display(), version = %scorer.version, "loaded scorer");
        Ok(scorer)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let scorer: LinearScorer = serde_json::from_str(text).map_err(|source| NameSimError::Decode {
            what: "scorer artifact",
            source,
        })?;
        scorer.validate()?;
        Ok(scorer)
    }

    /// Reject weights that would make the score move against a feature's
    /// intuitive direction: distances must not raise it, matches must not lower it.
    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        if !self.bias.is_finite() || w.as_array().iter().any(|v| !v.is_finite()) {
            return Err(NameSimError::InvalidConfig(format!(
                "scorer {} has non-finite parameters",
                self.version
            )));
        }
        if w.edit_cost > 0.0 || w.levenshtein > 0.0 {
            return Err(NameSimError::InvalidConfig(format!(
                "scorer {}: distance weights must be <= 0",
                self.version
            )));
        }
        let matches = [
            w.nysiis_match,
            w.soundex_match,
            w.refined_soundex_match,
            w.dm_soundex_match,
        ];
        if matches.iter().any(|&v| v < 0.0) {
            return Err(NameSimError::InvalidConfig(format!(
                "scorer {}: code match weights must be >= 0",
                self.version
            )));
        }
        Ok(())
    }
}

impl FeatureScorer for LinearScorer {
    fn score(&self, features: &FeatureVector) -> f64 {
        self.weights
            .as_array()
            .iter()
            .zip(features.as_array())
            .fold(self.bias, |acc, (w, f)| acc + w * f)
    }
}

/// Scores name pairs: features from a [`FeaturesGenerator`], combined by a model.
#[derive(Clone)]
pub struct Scorer {
    features: FeaturesGenerator,
    model: Arc<dyn FeatureScorer>,
}

impl Scorer {
    pub fn new(features: FeaturesGenerator, model: Arc<dyn FeatureScorer>) -> Self {
        Self { features, model }
    }

    pub fn features(&self) -> &FeaturesGenerator {
        &self.features
    }

    pub fn codes(&self, name: &str) -> Codes {
        self.features.codes(name)
    }

    /// Score two normalized name pieces.
    pub fn score_pair(&self, name1: &str, name2: &str) -> f64 {
        let codes1 = self.features.codes(name1);
        let codes2 = self.features.codes(name2);
        self.score_codes(name1, &codes1, name2, &codes2)
    }

    /// Score with precomputed codes.
    pub fn score_codes(&self, name1: &str, codes1: &Codes, name2: &str, codes2: &Codes) -> f64 {
        let features = self.features.features(name1, codes1, name2, codes2);
        self.model.score(&features)
    }

    pub fn score_features(&self, features: &FeatureVector) -> f64 {
        self.model.score(features)
    }
}
