//! Shared data structures for the name-similarity engine.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::NameSimError;
use crate::phoneme::Phoneme;

/// Given names and surnames use separate models and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameType {
    Given,
    Surname,
}

impl NameType {
    pub fn as_str(self) -> &'static str {
        match self {
            NameType::Given => "given",
            NameType::Surname => "surname",
        }
    }
}

impl fmt::Display for NameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NameType {
    type Err = NameSimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "given" => Ok(NameType::Given),
            "surname" => Ok(NameType::Surname),
            other => Err(NameSimError::InvalidConfig(format!("unknown name type {other:?}"))),
        }
    }
}

/// A candidate name with its classifier score.
///
/// Orders best-first: higher score, then name ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameScore {
    pub name: String,
    pub score: OrderedFloat<f64>,
}

impl NameScore {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score: OrderedFloat(score),
        }
    }
}

impl Ord for NameScore {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for NameScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Edit operation in a phoneme alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOp {
    Match,
    Substitute,
    Insert,
    Delete,
}

/// One step of a best path: source phoneme to target phoneme.
///
/// `None` is the empty symbol. Both sides are never `None` together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditStep {
    pub from: Option<Phoneme>,
    pub to: Option<Phoneme>,
    pub cost: u32,
}

impl EditStep {
    pub fn op(&self) -> EditOp {
        match (self.from, self.to) {
            (Some(a), Some(b)) if a == b => EditOp::Match,
            (Some(_), Some(_)) => EditOp::Substitute,
            (None, _) => EditOp::Insert,
            (Some(_), None) => EditOp::Delete,
        }
    }
}

impl fmt::Display for EditStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |p: Option<Phoneme>| p.map_or("", Phoneme::symbol);
        write!(f, "{}|{}:{}", side(self.from), side(self.to), self.cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_score_orders_best_first() {
        let mut scores = vec![
            NameScore::new("carl", 0.5),
            NameScore::new("karl", 2.0),
            NameScore::new("caryl", 0.5),
        ];
        scores.sort();
        let names: Vec<_> = scores.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["karl", "carl", "caryl"]);
    }

    #[test]
    fn test_name_type_parse() {
        assert_eq!("Surname".parse::<NameType>().unwrap(), NameType::Surname);
        assert!("middle".parse::<NameType>().is_err());
        assert_eq!(serde_json::to_string(&NameType::Given).unwrap(), "\"given\"");
    }

    #[test]
    fn test_edit_step_op() {
        let step = |from, to| EditStep { from, to, cost: 0 };
        assert_eq!(step(Some(Phoneme::B), Some(Phoneme::B)).op(), EditOp::Match);
        assert_eq!(step(Some(Phoneme::B), Some(Phoneme::P)).op(), EditOp::Substitute);
        assert_eq!(step(None, Some(Phoneme::P)).op(), EditOp::Insert);
        assert_eq!(step(Some(Phoneme::B), None).op(), EditOp::Delete);
        assert_eq!(step(Some(Phoneme::B), None).to_string(), "b|:0");
    }
}
