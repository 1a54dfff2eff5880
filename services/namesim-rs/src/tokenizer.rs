//! Name → phoneme sequence.
//!
//! Grapheme-to-phoneme conversion is delegated to a [`GraphemeToPhoneme`]
//! model. [`PhonemeTokenizer`] wraps the model with a few correction rules
//! for patterns it handles poorly in names.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::{NameSimError, Result};
use crate::phoneme::{Phoneme, PhonemeSequence};

/// A grapheme-to-phoneme model: spelling in, phoneme symbols out.
///
/// An empty result is allowed; the tokenizer copes with it.
pub trait GraphemeToPhoneme: Send + Sync {
    fn convert(&self, spelling: &str) -> Vec<String>;
}

impl<F> GraphemeToPhoneme for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn convert(&self, spelling: &str) -> Vec<String> {
        self(spelling)
    }
}

/// Short spellings models commonly return nothing for.
const EMPTY_RESULT_SUBSTITUTES: &[(&str, &[&str])] = &[
    ("e", &["iy1"]),
    ("ae", &["ey1"]),
    ("h", &["hh"]),
    ("hh", &["hh"]),
];

fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// Applies pre/post rules around a G2P model and maps symbols to ids.
#[derive(Clone)]
pub struct PhonemeTokenizer {
    model: Arc<dyn GraphemeToPhoneme>,
}

impl PhonemeTokenizer {
    pub fn new(model: Arc<dyn GraphemeToPhoneme>) -> Self {
        Self { model }
    }

    /// Phoneme symbols for a cleaned, lower-case word.
    pub fn phonemes(&self, word: &str) -> Vec<String> {
        // a leading y before a consonant reads as a vowel in most names (ybarra)
        let bytes = word.as_bytes();
        let spelling = if bytes.len() > 2 && bytes[0] == b'y' && !is_vowel(bytes[1]) {
            format!("i{}", &word[1..])
        } else {
            word.to_string()
        };

        let mut phonemes = self.model.convert(&spelling);
        if phonemes.is_empty() {
            match EMPTY_RESULT_SUBSTITUTES.iter().find(|(s, _)| *s == spelling) {
                Some((_, subst)) => phonemes = subst.iter().map(|p| p.to_string()).collect(),
                None => warn!(word = %spelling, "0-length phoneme string"),
            }
        }

        // models drop the initial vowel of names like aragon
        let starts_with_a_or_o = matches!(spelling.as_bytes().first(), Some(b'a' | b'o'));
        if starts_with_a_or_o && phonemes.first().map(String::as_str) == Some("r") {
            phonemes.insert(0, Phoneme::Ax.symbol().to_string());
        }

        phonemes
    }

    /// Tokenize a cleaned word into a phoneme sequence.
    pub fn tokenize(&self, word: &str) -> PhonemeSequence {
        let phonemes = self
            .phonemes(word)
            .into_iter()
            .filter_map(|symbol| {
                let phoneme = Phoneme::from_symbol(&symbol);
                if phoneme.is_none() {
                    warn!(word, symbol = %symbol, "model returned a symbol outside the alphabet");
                }
                phoneme
            })
            .collect::<Vec<_>>();
        PhonemeSequence::new(phonemes)
    }
}

/// Fold a pronouncing-dictionary symbol (`AH0`, `IY2`, `HH`) onto the alphabet.
///
/// Primary and secondary stress select the stressed variant when the
/// alphabet has one.
fn fold_dictionary_symbol(raw: &str) -> Option<Phoneme> {
    let lower = raw.to_ascii_lowercase();
    let base = lower.trim_end_matches(|c: char| c.is_ascii_digit());
    let stressed = matches!(lower.as_bytes().last(), Some(b'1' | b'2'));
    if stressed {
        if let Some(p) = Phoneme::from_symbol(&format!("{base}1")) {
            return Some(p);
        }
    }
    Phoneme::from_symbol(base)
}

/// A pronouncing dictionary with an optional model for unknown words.
///
/// File lines are `WORD  PH1 PH2 ...`. `;;;` comments and alternate
/// pronunciations (`WORD(2)`) are skipped.
pub struct Lexicon {
    entries: FxHashMap<String, Vec<Phoneme>>,
    fallback: Option<Arc<dyn GraphemeToPhoneme>>,
}

impl Lexicon {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| NameSimError::io(path, e))?;
        let lexicon = Self::from_reader(file)?;
        debug!(path = %path.display(), entries = lexicon.len(), "loaded lexicon");
        Ok(lexicon)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut entries = FxHashMap::default();
        for (line_no, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with(";;;") {
                continue;
            }
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };
            if word.ends_with(')') {
                continue;
            }
            let phonemes: Option<Vec<Phoneme>> = fields.map(fold_dictionary_symbol).collect();
            match phonemes {
                Some(phonemes) => {
                    entries.insert(word.to_lowercase(), phonemes);
                }
                None => warn!(line_no = line_no + 1, line, "skipping lexicon entry with unknown symbol"),
            }
        }
        Ok(Self {
            entries,
            fallback: None,
        })
    }

    /// Consult `fallback` for words the dictionary does not list.
    pub fn with_fallback(mut self, fallback: Arc<dyn GraphemeToPhoneme>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GraphemeToPhoneme for Lexicon {
    fn convert(&self, spelling: &str) -> Vec<String> {
        match self.entries.get(spelling) {
            Some(phonemes) => phonemes.iter().map(|p| p.symbol().to_string()).collect(),
            None => self
                .fallback
                .as_ref()
                .map(|model| model.convert(spelling))
                .unwrap_or_default(),
        }
    }
}

const CONSONANT_GROUPS: &[(&str, &[&str])] = &[
    ("tch", &["ch"]),
    ("sch", &["s", "k"]),
    ("ch", &["ch"]),
    ("sh", &["sh"]),
    ("th", &["th"]),
    ("ph", &["f"]),
    ("gh", &[]),
    ("ng", &["ng"]),
    ("ck", &["k"]),
    ("qu", &["k", "w"]),
    ("wh", &["w"]),
];

const VOWEL_TEAMS: &[(&str, &str)] = &[
    ("ee", "iy"),
    ("ea", "iy"),
    ("ie", "iy"),
    ("oo", "uw"),
    ("ou", "aw"),
    ("ow", "ow"),
    ("ai", "ey"),
    ("ay", "ey"),
    ("ei", "ey"),
    ("oi", "oy"),
    ("oy", "oy"),
    ("au", "ao"),
    ("aw", "ao"),
];

/// Deterministic letter-to-sound rules.
///
/// Crude next to a trained model, but total and dependency-free, so it
/// serves as the fallback for out-of-dictionary names. The first vowel
/// carries stress.
#[derive(Debug, Clone, Copy, Default)]
pub struct LetterRules;

impl LetterRules {
    fn push_vowel(out: &mut Vec<String>, base: &str, stressed: &mut bool) {
        if !*stressed {
            *stressed = true;
            let with_stress = format!("{base}1");
            if Phoneme::from_symbol(&with_stress).is_some() {
                out.push(with_stress);
                return;
            }
        }
        out.push(base.to_string());
    }
}

impl GraphemeToPhoneme for LetterRules {
    fn convert(&self, spelling: &str) -> Vec<String> {
        let word: Vec<u8> = spelling
            .bytes()
            .filter(u8::is_ascii_alphabetic)
            .map(|b| b.to_ascii_lowercase())
            .collect();
        let len = word.len();
        let mut out = Vec::with_capacity(len);
        let mut stressed = false;
        let mut i = 0;

        while i < len {
            let rest = &word[i..];
            if i == 0 && rest.starts_with(b"kn") {
                out.push("n".to_string());
                i += 2;
                continue;
            }
            if let Some((group, phones)) = CONSONANT_GROUPS
                .iter()
                .find(|(group, _)| rest.starts_with(group.as_bytes()))
            {
                out.extend(phones.iter().map(|p| p.to_string()));
                i += group.len();
                continue;
            }
            if let Some((team, base)) = VOWEL_TEAMS
                .iter()
                .find(|(team, _)| rest.starts_with(team.as_bytes()))
            {
                Self::push_vowel(&mut out, base, &mut stressed);
                i += team.len();
                continue;
            }

            let c = word[i];
            let next = word.get(i + 1).copied();
            let softens = matches!(next, Some(b'e' | b'i' | b'y'));
            if i > 0 && c == word[i - 1] && !is_vowel(c) {
                i += 1;
                continue;
            }
            match c {
                b'a' => Self::push_vowel(&mut out, "ae", &mut stressed),
                b'e' if i == len - 1 && len > 2 => {}
                b'e' => Self::push_vowel(&mut out, "eh", &mut stressed),
                b'i' => Self::push_vowel(&mut out, "ih", &mut stressed),
                b'o' => Self::push_vowel(&mut out, "aa", &mut stressed),
                b'u' => Self::push_vowel(&mut out, "ah", &mut stressed),
                b'y' if i == 0 => out.push("y".to_string()),
                b'y' => Self::push_vowel(&mut out, "iy", &mut stressed),
                b'c' if softens => out.push("s".to_string()),
                b'c' | b'q' => out.push("k".to_string()),
                b'g' if softens => out.push("jh".to_string()),
                b'h' => out.push("hh".to_string()),
                b'j' => out.push("jh".to_string()),
                b'x' => {
                    out.push("k".to_string());
                    out.push("s".to_string());
                }
                other => out.push(char::from(other).to_string()),
            }
            i += 1;
        }
        out
    }
}
