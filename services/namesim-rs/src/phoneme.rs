//! The closed phoneme alphabet and phoneme sequences.
//!
//! Symbol ids are stable: they index the cost matrix and appear (as
//! symbols) in persisted cost files. The reserved id [`EMPTY`] stands for
//! "no phoneme" in insertions and deletions.

use std::fmt;

use crate::error::{NameSimError, Result};

macro_rules! phonemes {
    ($($variant:ident => $symbol:literal),+ $(,)?) => {
        /// One sound unit. The discriminant is the symbol id.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Phoneme {
            $($variant),+
        }

        impl Phoneme {
            /// Every phoneme, in id order.
            pub const ALL: &'static [Phoneme] = &[$(Phoneme::$variant),+];

            pub fn symbol(self) -> &'static str {
                match self {
                    $(Phoneme::$variant => $symbol),+
                }
            }

            pub fn from_symbol(symbol: &str) -> Option<Phoneme> {
                match symbol {
                    $($symbol => Some(Phoneme::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

phonemes! {
    B => "b", V => "v", P => "p",
    F => "f",
    Hh => "hh",
    Jh => "jh",
    K => "k", Ch => "ch", G => "g",
    L => "l",
    M => "m",
    N => "n", Ng => "ng",
    R => "r",
    Er => "er", Er1 => "er1",
    S => "s", Sh => "sh", Z => "z", Zh => "zh",
    T => "t", Th => "th", D => "d", Dh => "dh",
    W => "w",
    Y => "y",
    Ae => "ae", Ae1 => "ae1", Ey => "ey", Ey1 => "ey1",
    Eh => "eh", Eh1 => "eh1", Iy => "iy", Iy1 => "iy1",
    Ih => "ih", Ih1 => "ih1", Ay => "ay", Ay1 => "ay1",
    Aa => "aa", Aa1 => "aa1", Ow => "ow", Ow1 => "ow1", Ao => "ao", Ao1 => "ao1",
    Ax => "ax", Oy => "oy", Oy1 => "oy1", Aw => "aw", Aw1 => "aw1",
    Ah => "ah", Ah1 => "ah1", Uw => "uw", Uw1 => "uw1", Uh => "uh", Uh1 => "uh1",
}

/// Size of the alphabet, N.
pub const NUM_PHONEMES: usize = Phoneme::ALL.len();

/// Reserved id for the empty symbol, equal to N.
pub const EMPTY: usize = NUM_PHONEMES;

/// Number of ids including [`EMPTY`]; the cost matrix is this wide.
pub const NUM_SYMBOLS: usize = NUM_PHONEMES + 1;

impl Phoneme {
    pub fn id(self) -> usize {
        self as usize
    }

    pub fn from_id(id: usize) -> Option<Phoneme> {
        Phoneme::ALL.get(id).copied()
    }
}

impl fmt::Display for Phoneme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Symbol text for an id; the empty symbol is the empty string.
pub fn symbol_for_id(id: usize) -> &'static str {
    Phoneme::from_id(id).map_or("", Phoneme::symbol)
}

/// Id for symbol text; the empty string maps to [`EMPTY`].
pub fn id_for_symbol(symbol: &str) -> Result<usize> {
    if symbol.is_empty() {
        return Ok(EMPTY);
    }
    Phoneme::from_symbol(symbol)
        .map(Phoneme::id)
        .ok_or_else(|| NameSimError::UnknownPhoneme(symbol.to_string()))
}

/// Ordered phonemes for one name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PhonemeSequence(Vec<Phoneme>);

impl PhonemeSequence {
    pub fn new(phonemes: Vec<Phoneme>) -> Self {
        Self(phonemes)
    }

    /// Parse space-separated symbols, e.g. `"k ae1 t"`.
    pub fn parse(symbols: &str) -> Result<Self> {
        symbols
            .split_whitespace()
            .map(|s| Phoneme::from_symbol(s).ok_or_else(|| NameSimError::UnknownPhoneme(s.to_string())))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Phoneme] {
        &self.0
    }

    /// Symbol id at `index`.
    pub fn id_at(&self, index: usize) -> usize {
        self.0[index].id()
    }

    pub fn iter(&self) -> impl Iterator<Item = Phoneme> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<Phoneme>> for PhonemeSequence {
    fn from(phonemes: Vec<Phoneme>) -> Self {
        Self(phonemes)
    }
}

impl fmt::Display for PhonemeSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(p.symbol())?;
        }
        Ok(())
    }
}
