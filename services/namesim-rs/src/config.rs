//! Engine configuration.
//!
//! One [`EngineConfig`] per name type, read from JSON. Missing fields take
//! the per-name-type defaults.

use std::fs;
use std::path::{Path, PathBuf};

use namesim_phonetic::DEFAULT_MAX_CODE_LEN;
use serde::{Deserialize, Serialize};

use crate::error::{NameSimError, Result};
use crate::types::NameType;

pub const GIVEN_CLASSIFIER_THRESHOLD: f64 = 2.3;
pub const GIVEN_CLUSTER_THRESHOLD: f64 = -0.75;
pub const SURNAME_CLASSIFIER_THRESHOLD: f64 = 0.7;
pub const SURNAME_CLUSTER_THRESHOLD: f64 = -2.0;

/// Candidate generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Keep candidates scoring at least this.
    pub classifier_threshold: f64,
    /// Search clusters whose representative scores at least this.
    pub cluster_threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_names: Option<usize>,
    #[serde(default = "default_use_clusters")]
    pub use_clusters: bool,
}

fn default_use_clusters() -> bool {
    true
}

impl GeneratorConfig {
    pub fn for_name_type(name_type: NameType) -> Self {
        let (classifier_threshold, cluster_threshold) = match name_type {
            NameType::Given => (GIVEN_CLASSIFIER_THRESHOLD, GIVEN_CLUSTER_THRESHOLD),
            NameType::Surname => (SURNAME_CLASSIFIER_THRESHOLD, SURNAME_CLUSTER_THRESHOLD),
        };
        Self {
            classifier_threshold,
            cluster_threshold,
            max_names: None,
            use_clusters: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub name_type: NameType,
    pub cost_matrix_path: PathBuf,
    pub scorer_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters_path: Option<PathBuf>,
    /// Pronouncing dictionary; letter rules cover words it lacks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexicon_path: Option<PathBuf>,
    #[serde(default = "default_position_smoothing")]
    pub position_smoothing: f64,
    #[serde(default = "default_dm_max_code_len")]
    pub dm_max_code_len: usize,
    /// Defaults follow `name_type` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorConfig>,
}

fn default_position_smoothing() -> f64 {
    1.0
}

fn default_dm_max_code_len() -> usize {
    DEFAULT_MAX_CODE_LEN
}

impl EngineConfig {
    pub fn new(name_type: NameType, cost_matrix_path: impl Into<PathBuf>, scorer_path: impl Into<PathBuf>) -> Self {
        Self {
            name_type,
            cost_matrix_path: cost_matrix_path.into(),
            scorer_path: scorer_path.into(),
            clusters_path: None,
            lexicon_path: None,
            position_smoothing: default_position_smoothing(),
            dm_max_code_len: default_dm_max_code_len(),
            generator: None,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| NameSimError::io(path, e))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(text).map_err(|source| NameSimError::Decode {
            what: "engine config",
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Generator settings, falling back to the name type's defaults.
    pub fn generator(&self) -> GeneratorConfig {
        self.generator
            .clone()
            .unwrap_or_else(|| GeneratorConfig::for_name_type(self.name_type))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.position_smoothing > 0.0 && self.position_smoothing.is_finite()) {
            return Err(NameSimError::InvalidConfig(format!(
                "position_smoothing must be positive, got {}",
                self.position_smoothing
            )));
        }
        if self.dm_max_code_len == 0 {
            return Err(NameSimError::InvalidConfig(
                "dm_max_code_len must be at least 1".to_string(),
            ));
        }
        let generator = self.generator();
        if generator.classifier_threshold.is_nan() || generator.cluster_threshold.is_nan() {
            return Err(NameSimError::InvalidConfig(
                "generator thresholds must be numbers".to_string(),
            ));
        }
        if generator.max_names == Some(0) {
            return Err(NameSimError::InvalidConfig(
                "max_names must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_by_name_type() {
        let config = EngineConfig::from_json(
            r#"{"name_type": "surname", "cost_matrix_path": "c.txt", "scorer_path": "s.json"}"#,
        )
        .unwrap();
        assert_eq!(config.position_smoothing, 1.0);
        assert_eq!(config.dm_max_code_len, 6);
        let generator = config.generator();
        assert_eq!(generator.classifier_threshold, 0.7);
        assert_eq!(generator.cluster_threshold, -2.0);
        assert!(generator.use_clusters);

        let given = GeneratorConfig::for_name_type(NameType::Given);
        assert_eq!(given.classifier_threshold, 2.3);
        assert_eq!(given.cluster_threshold, -0.75);
    }

    #[test]
    fn test_explicit_generator() {
        let config = EngineConfig::from_json(
            r#"{"name_type": "given", "cost_matrix_path": "c", "scorer_path": "s",
                "generator": {"classifier_threshold": 1.0, "cluster_threshold": -1.0, "max_names": 20}}"#,
        )
        .unwrap();
        let generator = config.generator();
        assert_eq!(generator.max_names, Some(20));
        assert!(generator.use_clusters);
    }

    #[test]
    fn test_validate() {
        let mut config = EngineConfig::new(NameType::Given, "c", "s");
        assert!(config.validate().is_ok());
        config.position_smoothing = 0.0;
        assert!(config.validate().is_err());
        config.position_smoothing = 1.0;
        config.dm_max_code_len = 0;
        assert!(config.validate().is_err());
        config.dm_max_code_len = 6;
        config.generator = Some(GeneratorConfig {
            classifier_threshold: f64::NAN,
            ..GeneratorConfig::for_name_type(NameType::Given)
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"name_type": "middle"}"#),
            Err(NameSimError::Decode { .. })
        ));
    }
}
