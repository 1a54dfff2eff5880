//! Precision/recall of a pair matcher against hand-labeled name pairs.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use namesim_phonetic::{CodeKind, DmSoundex};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{NameSimError, Result};
use crate::graph::SimilarNameGraph;
use crate::normalize::NameNormalizer;
use crate::scorer::Scorer;
use crate::types::NameType;

/// Decides whether two normalized names refer to the same name.
pub trait PairMatcher: Sync {
    fn matches(&self, name1: &str, name2: &str) -> bool;
}

impl<F> PairMatcher for F
where
    F: Fn(&str, &str) -> bool + Sync,
{
    fn matches(&self, name1: &str, name2: &str) -> bool {
        self(name1, name2)
    }
}

/// Match when both names get the same phonetic code.
#[derive(Debug, Clone, Copy)]
pub struct CodeMatcher {
    pub kind: CodeKind,
    pub dm: DmSoundex,
}

impl CodeMatcher {
    pub fn new(kind: CodeKind) -> Self {
        Self {
            kind,
            dm: DmSoundex::default(),
        }
    }

    pub fn encode(&self, name: &str) -> Result<String> {
        match self.kind {
            CodeKind::DmSoundex => Ok(self.dm.encode(name)),
            kind => Ok(kind.encode(name)?),
        }
    }
}

impl PairMatcher for CodeMatcher {
    fn matches(&self, name1: &str, name2: &str) -> bool {
        match (self.encode(name1), self.encode(name2)) {
            (Ok(a), Ok(b)) => a == b,
            (Err(err), _) | (_, Err(err)) => {
                warn!(name1, name2, code = self.kind.name(), %err, "cannot encode pair");
                false
            }
        }
    }
}

/// Match when the scorer rates the pair at least `threshold`.
pub struct ScoreMatcher<'a> {
    pub scorer: &'a Scorer,
    pub threshold: f64,
}

impl PairMatcher for ScoreMatcher<'_> {
    fn matches(&self, name1: &str, name2: &str) -> bool {
        self.scorer.score_pair(name1, name2) >= self.threshold
    }
}

/// Match when either name lists the other as similar. A name always
/// matches itself.
pub struct TableMatcher<'a> {
    pub graph: &'a SimilarNameGraph,
}

impl PairMatcher for TableMatcher<'_> {
    fn matches(&self, name1: &str, name2: &str) -> bool {
        name1 == name2 || self.graph.has_edge(name1, name2) || self.graph.has_edge(name2, name1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_pos: usize,
    pub false_pos: usize,
    pub false_neg: usize,
    pub true_neg: usize,
}

impl ConfusionMatrix {
    pub fn record(&mut self, labeled_match: bool, predicted_match: bool) {
        match (labeled_match, predicted_match) {
            (true, true) => self.true_pos += 1,
            (true, false) => self.false_neg += 1,
            (false, true) => self.false_pos += 1,
            (false, false) => self.true_neg += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_pos + self.false_pos + self.false_neg + self.true_neg
    }

    /// NaN when nothing was predicted a match.
    pub fn precision(&self) -> f64 {
        self.true_pos as f64 / (self.true_pos + self.false_pos) as f64
    }

    /// NaN when nothing was labeled a match.
    pub fn recall(&self) -> f64 {
        self.true_pos as f64 / (self.true_pos + self.false_neg) as f64
    }

    /// Harmonic mean of precision and recall.
    pub fn f_measure(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        2.0 * p * r / (p + r)
    }
}

/// One labeled pair, already normalized to single pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledPair {
    pub name1: String,
    pub name2: String,
    pub is_match: bool,
}

/// Read a labeled file.
///
/// The header decides whether a `"Nickname"` column sits between the label
/// and the names. Rows are `label,"name1","name2"`: an empty label is a
/// match, `1` a non-match, anything else is skipped. Names that do not
/// normalize to exactly one piece are logged and skipped.
pub fn read_labeled_pairs(
    reader: impl Read,
    normalizer: &dyn NameNormalizer,
    name_type: NameType,
) -> Result<Vec<LabeledPair>> {
    let mut lines = BufReader::new(reader).lines();
    let header = match lines.next() {
        Some(header) => header?,
        None => return Ok(Vec::new()),
    };
    let offset = usize::from(header.split(',').nth(1) == Some("\"Nickname\""));

    let mut pairs = Vec::new();
    for (idx, line) in lines.enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split(',').collect();
        let is_match = match fields[0] {
            "" => true,
            "1" => false,
            _ => continue,
        };
        let (Some(raw1), Some(raw2)) = (fields.get(1 + offset), fields.get(2 + offset)) else {
            warn!(line_no = idx + 2, line = %line, "labeled row is missing a name");
            continue;
        };
        let names1 = normalizer.normalize(&raw1.replace('"', ""), name_type);
        let names2 = normalizer.normalize(&raw2.replace('"', ""), name_type);
        match (names1.as_slice(), names2.as_slice()) {
            ([name1], [name2]) => pairs.push(LabeledPair {
                name1: name1.clone(),
                name2: name2.clone(),
                is_match,
            }),
            _ => warn!(line_no = idx + 2, line = %line, "invalid labeled pair"),
        }
    }
    Ok(pairs)
}

pub fn read_labeled_file(
    path: impl AsRef<Path>,
    normalizer: &dyn NameNormalizer,
    name_type: NameType,
) -> Result<Vec<LabeledPair>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| NameSimError::io(path, e))?;
    read_labeled_pairs(file, normalizer, name_type)
}

pub fn evaluate(pairs: &[LabeledPair], matcher: &dyn PairMatcher) -> ConfusionMatrix {
    let mut confusion = ConfusionMatrix::default();
    for pair in pairs {
        confusion.record(pair.is_match, matcher.matches(&pair.name1, &pair.name2));
    }
    info!(
        true_pos = confusion.true_pos,
        false_neg = confusion.false_neg,
        false_pos = confusion.false_pos,
        true_neg = confusion.true_neg,
        precision = confusion.precision(),
        recall = confusion.recall(),
        "evaluated labeled pairs"
    );
    confusion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::SimpleNormalizer;

    const LABELED: &str = "\"Label\",\"Nickname\",\"Name1\",\"Name2\"\n\
        ,\"\",\"Smith\",\"Smyth\"\n\
        1,\"\",\"Smith\",\"Jones\"\n\
        ,\"\",\"Catt\",\"Kat\"\n\
        1,\"\",\"Robert\",\"Rupert\"\n\
        2,\"\",\"Maybe\",\"Not\"\n\
        ,\"\",\"Mary Ann\",\"Marian\"\n";

    fn pairs() -> Vec<LabeledPair> {
        read_labeled_pairs(LABELED.as_bytes(), &SimpleNormalizer::default(), NameType::Surname).unwrap()
    }

    #[test]
    fn test_read_labeled_pairs() {
        let pairs = pairs();
        assert_eq!(pairs.len(), 4);
        assert_eq!(
            pairs[0],
            LabeledPair {
                name1: "smith".into(),
                name2: "smyth".into(),
                is_match: true
            }
        );
        assert!(!pairs[1].is_match);

        let plain = "\"Label\",\"Name1\",\"Name2\"\n,\"Ann\",\"Anne\"\n";
        let pairs = read_labeled_pairs(plain.as_bytes(), &SimpleNormalizer::default(), NameType::Given).unwrap();
        assert_eq!(pairs[0].name2, "anne");
    }

    #[test]
    fn test_soundex_evaluation() {
        // smith/smyth S530 match; catt C300 vs kat K300 miss; robert R163 vs rupert R163 false match
        let confusion = evaluate(&pairs(), &CodeMatcher::new(CodeKind::Soundex));
        assert_eq!(
            confusion,
            ConfusionMatrix {
                true_pos: 1,
                false_pos: 1,
                false_neg: 1,
                true_neg: 1
            }
        );
        assert_eq!(confusion.total(), 4);
        assert!((confusion.precision() - 0.5).abs() < 1e-12);
        assert!((confusion.recall() - 0.5).abs() < 1e-12);
        assert!((confusion.f_measure() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_code_matcher_encode_failure() {
        let soundex = CodeMatcher::new(CodeKind::Soundex);
        assert!(matches!(soundex.encode("--"), Err(NameSimError::Encode(_))));
        assert!(!soundex.matches("--", "--"));
        assert_eq!(CodeMatcher::new(CodeKind::DmSoundex).encode("--").unwrap(), "");
    }

    #[test]
    fn test_table_matcher() {
        let mut graph = SimilarNameGraph::new();
        graph.insert_edge("kat", "catt");
        let confusion = evaluate(&pairs(), &TableMatcher { graph: &graph });
        assert_eq!(confusion.true_pos, 1);
        assert_eq!(confusion.false_neg, 1);
        assert_eq!(confusion.true_neg, 2);
        assert!(confusion.precision() == 1.0);
    }

    #[test]
    fn test_closure_matcher() {
        let confusion = evaluate(&pairs(), &|a: &str, b: &str| a.len() == b.len());
        // smith/smyth, smith/jones, robert/rupert are equal length
        assert_eq!(confusion.true_pos, 1);
        assert_eq!(confusion.false_pos, 2);
    }
}
