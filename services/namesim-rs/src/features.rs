//! Per-name code bundles and the pairwise feature vector.

use namesim_phonetic::{levenshtein, CodeKind, DmSoundex, EncodeError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lattice::WeightedEditDistance;
use crate::phoneme::PhonemeSequence;
use crate::tokenizer::PhonemeTokenizer;
use crate::types::NameType;

/// Everything computed once per name for scoring.
///
/// A code that failed to encode is `None`, which never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Codes {
    pub phonemes: PhonemeSequence,
    pub nysiis: Option<String>,
    pub soundex: Option<String>,
    pub refined_soundex: Option<String>,
    pub dm_soundex: Option<String>,
}

impl Codes {
    pub fn get(&self, kind: CodeKind) -> Option<&str> {
        match kind {
            CodeKind::Nysiis => self.nysiis.as_deref(),
            CodeKind::Soundex => self.soundex.as_deref(),
            CodeKind::RefinedSoundex => self.refined_soundex.as_deref(),
            CodeKind::DmSoundex => self.dm_soundex.as_deref(),
        }
    }

    fn slot(&mut self, kind: CodeKind) -> &mut Option<String> {
        match kind {
            CodeKind::Nysiis => &mut self.nysiis,
            CodeKind::Soundex => &mut self.soundex,
            CodeKind::RefinedSoundex => &mut self.refined_soundex,
            CodeKind::DmSoundex => &mut self.dm_soundex,
        }
    }
}

/// Similarity signals for one ordered name pair.
///
/// Code features are 1.0 on a match and 0.0 otherwise. `edit_cost` and
/// `levenshtein` are distances: lower means more alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureVector {
    pub edit_cost: f64,
    pub nysiis_match: f64,
    pub soundex_match: f64,
    pub refined_soundex_match: f64,
    pub dm_soundex_match: f64,
    pub levenshtein: f64,
}

impl FeatureVector {
    pub const NAMES: [&'static str; 6] = [
        "edit_cost",
        "nysiis_match",
        "soundex_match",
        "refined_soundex_match",
        "dm_soundex_match",
        "levenshtein",
    ];

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.edit_cost,
            self.nysiis_match,
            self.soundex_match,
            self.refined_soundex_match,
            self.dm_soundex_match,
            self.levenshtein,
        ]
    }

    fn code_match_mut(&mut self, kind: CodeKind) -> &mut f64 {
        match kind {
            CodeKind::Nysiis => &mut self.nysiis_match,
            CodeKind::Soundex => &mut self.soundex_match,
            CodeKind::RefinedSoundex => &mut self.refined_soundex_match,
            CodeKind::DmSoundex => &mut self.dm_soundex_match,
        }
    }
}

const GIVEN_NAME_CODES: [CodeKind; 3] = [
    CodeKind::Soundex,
    CodeKind::RefinedSoundex,
    CodeKind::DmSoundex,
];

/// Computes [`Codes`] and [`FeatureVector`]s for one name type.
#[derive(Clone)]
pub struct FeaturesGenerator {
    name_type: NameType,
    tokenizer: PhonemeTokenizer,
    distance: WeightedEditDistance,
    dm: DmSoundex,
}

impl FeaturesGenerator {
    pub fn new(
        name_type: NameType,
        tokenizer: PhonemeTokenizer,
        distance: WeightedEditDistance,
        dm: DmSoundex,
    ) -> Self {
        Self {
            name_type,
            tokenizer,
            distance,
            dm,
        }
    }

    pub fn name_type(&self) -> NameType {
        self.name_type
    }

    pub fn tokenizer(&self) -> &PhonemeTokenizer {
        &self.tokenizer
    }

    pub fn distance(&self) -> &WeightedEditDistance {
        &self.distance
    }

    /// Code kinds that feed features for this name type. NYSIIS is surname-only.
    pub fn code_kinds(&self) -> &'static [CodeKind] {
        match self.name_type {
            NameType::Surname => &CodeKind::ALL,
            NameType::Given => &GIVEN_NAME_CODES,
        }
    }

    pub fn encode(&self, kind: CodeKind, name: &str) -> Result<String, EncodeError> {
        match kind {
            CodeKind::DmSoundex => Ok(self.dm.encode(name)),
            other => other.encode(name),
        }
    }

    pub fn codes(&self, name: &str) -> Codes {
        let mut codes = Codes {
            phonemes: self.tokenizer.tokenize(name),
            ..Codes::default()
        };
        for &kind in self.code_kinds() {
            match self.encode(kind, name) {
                Ok(code) => *codes.slot(kind) = Some(code),
                Err(err) => warn!(name, code = kind.name(), %err, "cannot encode name"),
            }
        }
        codes
    }

    pub fn features(&self, name1: &str, codes1: &Codes, name2: &str, codes2: &Codes) -> FeatureVector {
        let mut features = FeatureVector {
            edit_cost: self
                .distance
                .symmetric_score(&codes1.phonemes, &codes2.phonemes),
            levenshtein: levenshtein(name1, name2) as f64,
            ..FeatureVector::default()
        };
        for &kind in self.code_kinds() {
            let matched = matches!(
                (codes1.get(kind), codes2.get(kind)),
                (Some(a), Some(b)) if a == b
            );
            *features.code_match_mut(kind) = if matched { 1.0 } else { 0.0 };
        }
        features
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cost_matrix::CostMatrix;
    use crate::tokenizer::LetterRules;

    fn generator(name_type: NameType) -> FeaturesGenerator {
        FeaturesGenerator::new(
            name_type,
            PhonemeTokenizer::new(Arc::new(LetterRules)),
            WeightedEditDistance::new(Arc::new(CostMatrix::uniform(2, 10, 8)), 1.0),
            DmSoundex::default(),
        )
    }

    fn features(generator: &FeaturesGenerator, a: &str, b: &str) -> FeatureVector {
        generator.features(a, &generator.codes(a), b, &generator.codes(b))
    }

    #[test]
    fn test_identical_surnames() {
        let g = generator(NameType::Surname);
        let f = features(&g, "smith", "smith");
        assert_eq!(f.nysiis_match, 1.0);
        assert_eq!(f.soundex_match, 1.0);
        assert_eq!(f.refined_soundex_match, 1.0);
        assert_eq!(f.dm_soundex_match, 1.0);
        assert_eq!(f.levenshtein, 0.0);
        assert!((f.edit_cost - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_given_names_skip_nysiis() {
        let g = generator(NameType::Given);
        assert!(g.codes("mary").nysiis.is_none());
        assert_eq!(features(&g, "mary", "mary").nysiis_match, 0.0);
    }

    #[test]
    fn test_code_features() {
        let g = generator(NameType::Surname);
        let f = features(&g, "robert", "rupert");
        assert_eq!(f.soundex_match, 1.0);
        assert_eq!(f.levenshtein, 2.0);
        let f = features(&g, "smith", "jones");
        assert_eq!(f.soundex_match, 0.0);
        assert_eq!(f.dm_soundex_match, 0.0);
    }

    #[test]
    fn test_edit_cost_is_direction_free() {
        let g = generator(NameType::Given);
        assert_eq!(
            features(&g, "dallan", "allan").edit_cost,
            features(&g, "allan", "dallan").edit_cost
        );
    }

    #[test]
    fn test_encoding_failure_leaves_feature_zero() {
        let g = generator(NameType::Surname);
        let codes = g.codes("m\u{fc}ller");
        assert!(codes.soundex.is_none());
        assert!(codes.dm_soundex.is_some());
        let f = features(&g, "m\u{fc}ller", "muller");
        assert_eq!(f.soundex_match, 0.0);
        assert_eq!(f.refined_soundex_match, 0.0);
    }

    #[test]
    fn test_serde_field_names() {
        let json = serde_json::to_value(FeatureVector::default()).unwrap();
        for name in FeatureVector::NAMES {
            assert!(json.get(name).is_some(), "{name}");
        }
    }
}
