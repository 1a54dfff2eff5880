//! Phonetic name codes and plain edit distance.
//!
//! Each encoder maps an already-cleaned name piece to a short code that
//! collapses spelling variation:
//! - Daitch-Mokotoff soundex (longest-match, context-sensitive tables)
//! - NYSIIS (ordered chain of string rewrites)
//! - Soundex and Refined Soundex (commons-codec compatible)
//!
//! DM and NYSIIS are total. The Soundex family rejects input it has no
//! mapping for, see [`EncodeError`].

use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

mod dm_soundex;
mod nysiis;
mod soundex;

pub use dm_soundex::{DmSoundex, DEFAULT_MAX_CODE_LEN};
pub use nysiis::nysiis;
pub use soundex::{refined_soundex, soundex};

/// Reasons an encoder could not produce a code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Nothing encodable was left after cleaning.
    #[error("no letters to encode in {0:?}")]
    Empty(String),

    /// A letter outside the encoder's alphabet.
    #[error("character {ch:?} is not mapped (input {input:?})")]
    Unmapped { ch: char, input: String },
}

/// The closed set of phonetic code kinds a name can be reduced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
    Nysiis,
    Soundex,
    RefinedSoundex,
    DmSoundex,
}

impl CodeKind {
    pub const ALL: [CodeKind; 4] = [
        CodeKind::Nysiis,
        CodeKind::Soundex,
        CodeKind::RefinedSoundex,
        CodeKind::DmSoundex,
    ];

    /// Encode a name with this kind's default settings.
    pub fn encode(self, name: &str) -> Result<String, EncodeError> {
        match self {
            CodeKind::Nysiis => Ok(nysiis(name)),
            CodeKind::Soundex => soundex(name),
            CodeKind::RefinedSoundex => refined_soundex(name),
            CodeKind::DmSoundex => Ok(DmSoundex::default().encode(name)),
        }
    }

    /// Parse the names used on the command line and in config files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "nysiis" => Some(CodeKind::Nysiis),
            "soundex" => Some(CodeKind::Soundex),
            "refinedsoundex" | "refined_soundex" => Some(CodeKind::RefinedSoundex),
            "dmsoundex" | "dm_soundex" => Some(CodeKind::DmSoundex),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CodeKind::Nysiis => "nysiis",
            CodeKind::Soundex => "soundex",
            CodeKind::RefinedSoundex => "refinedsoundex",
            CodeKind::DmSoundex => "dmsoundex",
        }
    }
}

/// Levenshtein distance between two names, counted over grapheme clusters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let segments_a: Vec<&str> = a.graphemes(true).collect();
    let segments_b: Vec<&str> = b.graphemes(true).collect();
    levenshtein_segments(&segments_a, &segments_b)
}

fn levenshtein_segments(a: &[&str], b: &[&str]) -> usize {
    let len_a = a.len();
    let len_b = b.len();

    if len_a == 0 {
        return len_b;
    }
    if len_b == 0 {
        return len_a;
    }

    let mut prev_row: Vec<usize> = (0..=len_b).collect();
    let mut curr_row = vec![0; len_b + 1];

    for (i, seg_a) in a.iter().enumerate() {
        curr_row[0] = i + 1;

        for (j, seg_b) in b.iter().enumerate() {
            let cost = if seg_a == seg_b { 0 } else { 1 };

            curr_row[j + 1] = std::cmp::min(
                std::cmp::min(
                    curr_row[j] + 1,      // insertion
                    prev_row[j + 1] + 1,  // deletion
                ),
                prev_row[j] + cost,       // substitution
            );
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[len_b]
}
