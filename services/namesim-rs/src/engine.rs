//! One loaded engine per name type, built from an [`EngineConfig`].

use std::sync::Arc;

use namesim_phonetic::DmSoundex;
use tracing::info;

use crate::cluster::ClusterSet;
use crate::config::EngineConfig;
use crate::cost_matrix::CostMatrix;
use crate::error::{NameSimError, Result};
use crate::features::{Codes, FeaturesGenerator};
use crate::generator::SimilarNameGenerator;
use crate::lattice::WeightedEditDistance;
use crate::scorer::{FeatureScorer, LinearScorer, Scorer};
use crate::tokenizer::{GraphemeToPhoneme, LetterRules, Lexicon, PhonemeTokenizer};
use crate::types::{NameScore, NameType};

/// Scorer and candidate generator sharing one set of loaded artifacts.
///
/// Read-only after construction; share it behind the returned `Arc`.
pub struct NameEngine {
    config: EngineConfig,
    generator: SimilarNameGenerator,
}

impl NameEngine {
    /// Load every artifact the config names. Any missing or malformed
    /// artifact fails construction.
    pub fn from_config(config: &EngineConfig) -> Result<Arc<Self>> {
        config.validate()?;

        let costs = CostMatrix::from_file(&config.cost_matrix_path)?;
        let model = LinearScorer::from_file(&config.scorer_path)?;
        if let Some(trained_for) = model.name_type {
            if trained_for != config.name_type {
                return Err(NameSimError::InvalidConfig(format!(
                    "scorer {} was trained for {trained_for} names, engine is for {}",
                    model.version, config.name_type
                )));
            }
        }
        let g2p: Arc<dyn GraphemeToPhoneme> = match &config.lexicon_path {
            Some(path) => Arc::new(Lexicon::from_file(path)?.with_fallback(Arc::new(LetterRules))),
            None => Arc::new(LetterRules),
        };
        let clusters = match &config.clusters_path {
            Some(path) => ClusterSet::from_file(path)?,
            None => ClusterSet::default(),
        };

        let engine = Self::from_parts(config.clone(), g2p, costs, Arc::new(model), &clusters);
        info!(
            name_type = %config.name_type,
            clusters = clusters.len(),
            "name engine ready"
        );
        Ok(Arc::new(engine))
    }

    /// Assemble an engine from already-loaded parts.
    pub fn from_parts(
        config: EngineConfig,
        g2p: Arc<dyn GraphemeToPhoneme>,
        costs: CostMatrix,
        model: Arc<dyn FeatureScorer>,
        clusters: &ClusterSet,
    ) -> Self {
        let features = FeaturesGenerator::new(
            config.name_type,
            PhonemeTokenizer::new(g2p),
            WeightedEditDistance::new(Arc::new(costs), config.position_smoothing),
            DmSoundex::new(config.dm_max_code_len),
        );
        let scorer = Scorer::new(features, model);
        let generator = SimilarNameGenerator::new(scorer, clusters, config.generator());
        Self { config, generator }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn name_type(&self) -> NameType {
        self.config.name_type
    }

    pub fn scorer(&self) -> &Scorer {
        self.generator.scorer()
    }

    pub fn generator(&self) -> &SimilarNameGenerator {
        &self.generator
    }

    pub fn codes(&self, name: &str) -> Codes {
        self.scorer().codes(name)
    }

    pub fn score(&self, name1: &str, name2: &str) -> f64 {
        self.scorer().score_pair(name1, name2)
    }

    pub fn generate(&self, name: &str) -> Vec<NameScore> {
        self.generator.generate(name)
    }

    pub fn similar_names(&self, name: &str) -> Vec<String> {
        self.generator.similar_names(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;

    #[test]
    fn test_from_parts() {
        let clusters = ClusterSet::from_reader("ann: anne annie\n".as_bytes()).unwrap();
        let mut config = EngineConfig::new(NameType::Given, "unused", "unused");
        config.generator = Some(crate::config::GeneratorConfig {
            classifier_threshold: -1.0,
            cluster_threshold: -2.0,
            max_names: None,
            use_clusters: true,
        });
        let engine = NameEngine::from_parts(
            config,
            Arc::new(LetterRules),
            CostMatrix::uniform(2, 10, 8),
            Arc::new(|f: &FeatureVector| -f.levenshtein),
            &clusters,
        );
        assert_eq!(engine.name_type(), NameType::Given);
        assert_eq!(engine.score("ann", "anne"), -1.0);
        assert_eq!(engine.similar_names("ann"), ["anne"]);
        assert!(engine.codes("ann").nysiis.is_none());
    }

    #[test]
    fn test_missing_artifacts_fail() {
        let config = EngineConfig::new(NameType::Surname, "/nonexistent/costs.txt", "/nonexistent/scorer.json");
        assert!(matches!(
            NameEngine::from_config(&config),
            Err(NameSimError::Io { .. })
        ));
    }
}
