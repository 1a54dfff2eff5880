//! Raw name → cleaned name pieces.
//!
//! Full normalization (titles, conjunctions, surname prefixes) lives with
//! the search layer. The engine only needs the seam and a plain default.

use tracing::debug;

use crate::types::NameType;

pub trait NameNormalizer: Send + Sync {
    /// Cleaned pieces in original order. Empty when nothing usable remains.
    fn normalize(&self, raw: &str, name_type: NameType) -> Vec<String>;
}

impl<F> NameNormalizer for F
where
    F: Fn(&str, NameType) -> Vec<String> + Send + Sync,
{
    fn normalize(&self, raw: &str, name_type: NameType) -> Vec<String> {
        self(raw, name_type)
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || (c.is_ascii_punctuation() && c != '\'')
}

/// Lowercase ASCII letters, split on whitespace and punctuation.
///
/// A trailing possessive `'s` is dropped. Anything else outside A-Z
/// (apostrophes, digits, accents) is removed without splitting the piece.
#[derive(Debug, Clone, Copy)]
pub struct SimpleNormalizer {
    pub max_pieces: usize,
}

impl Default for SimpleNormalizer {
    fn default() -> Self {
        Self { max_pieces: 8 }
    }
}

impl NameNormalizer for SimpleNormalizer {
    fn normalize(&self, raw: &str, _name_type: NameType) -> Vec<String> {
        let raw = raw
            .strip_suffix("'s")
            .or_else(|| raw.strip_suffix("'S"))
            .unwrap_or(raw);
        let mut pieces = Vec::new();
        let mut piece = String::new();
        for c in raw.chars() {
            if c.is_ascii_alphabetic() {
                piece.push(c.to_ascii_lowercase());
            } else if is_delimiter(c) {
                if !piece.is_empty() {
                    pieces.push(std::mem::take(&mut piece));
                    if pieces.len() == self.max_pieces {
                        return pieces;
                    }
                }
            } else if c.is_alphabetic() {
                debug!(name = raw, letter = %c, "dropping unmapped letter");
            }
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }
        pieces
    }
}
