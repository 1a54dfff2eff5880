//! Daitch-Mokotoff soundex.
//!
//! Where the published rules allow alternative codes (ch, ck, c, j, rs, rz)
//! only the first one is produced, so every name has exactly one code.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

pub const DEFAULT_MAX_CODE_LEN: usize = 6;

/// Longest key in any table.
const MAX_KEY_LEN: usize = 7;

const VOWELS: [u8; 5] = [b'a', b'e', b'i', b'o', b'u'];

type CodeTable = &'static [(&'static str, &'static [&'static str])];

const START_CODES: CodeTable = &[
    ("0", &["ai", "aj", "ay", "au", "a", "ei", "ej", "ey", "e", "i", "oi", "oj", "oy", "o", "ui", "uj", "uy", "u", "ue"]),
    ("1", &["eu", "ia", "ie", "io", "iu", "j", "y"]),
    ("2", &[
        "schtsch", "schtsh", "schtch", "shtch", "shch", "shtsh", "sht", "scht", "schd", "stch",
        "stsch", "sc", "strz", "strs", "stsh", "st", "szcz", "szcs", "szt", "shd", "szd", "sd",
        "zdz", "zdzh", "zhdzh", "zd", "zhd",
    ]),
    ("3", &["d", "dt", "th", "t"]),
    ("4", &[
        "cz", "czs", "csz", "drz", "drs", "ds", "dsh", "dsz", "dz", "dzh", "dzs", "sch", "sh", "sz", "s",
        "tch", "ttch", "ttsch", "trz", "trs", "tsch", "tsh", "ts", "tts", "ttsz", "tc", "tz", "ttz", "tzs", "tsz",
        "zh", "zs", "zsch", "zsh", "z",
    ]),
    ("5", &["chs", "ch", "ck", "c", "g", "h", "ks", "kh", "k", "q", "x"]),
    ("6", &["m", "n"]),
    ("7", &["b", "fb", "f", "p", "pf", "ph", "v", "w"]),
    ("8", &["l"]),
    ("9", &["r"]),
    ("94", &["rz", "rs"]),
];

const SIBILANTS: &[&str] = &[
    "cz", "czs", "csz", "drz", "drs", "ds", "dsh", "dsz", "dz", "dzh", "dzs", "sch", "sh", "sz", "s",
    "schtsch", "schtsh", "schtch", "shtch", "shch", "shtsh", "stch", "stsch", "sc", "strz", "strs", "stsh",
    "szcz", "szcs", "zdz", "zdzh", "zhdzh",
    "tch", "ttch", "ttsch", "trz", "trs", "tsch", "tsh", "ts", "tts", "ttsz", "tc", "tz", "ttz", "tzs", "tsz",
    "zh", "zs", "zsch", "zsh", "z",
];

const BEFORE_VOWEL_CODES: CodeTable = &[
    ("1", &["ai", "aj", "ay", "ei", "ej", "ey", "eu", "oi", "oj", "oy", "ui", "uj", "uy"]),
    ("3", &["d", "dt", "th", "t"]),
    ("4", SIBILANTS),
    ("5", &["ch", "ck", "c", "g", "h", "kh", "k", "q"]),
    ("6", &["m", "n"]),
    ("7", &["au", "b", "fb", "f", "p", "pf", "ph", "v", "w"]),
    ("8", &["l"]),
    ("9", &["r"]),
    ("43", &["sht", "scht", "schd", "st", "szt", "shd", "szd", "sd", "zd", "zhd"]),
    ("54", &["chs", "ks", "x"]),
    ("66", &["mn", "nm"]),
    ("94", &["rz", "rs"]),
];

const OTHER_CODES: CodeTable = &[
    ("3", &["d", "dt", "th", "t"]),
    ("4", SIBILANTS),
    ("5", &["ch", "ck", "c", "g", "kh", "k", "q"]),
    ("6", &["m", "n"]),
    ("7", &["b", "fb", "f", "p", "pf", "ph", "v", "w"]),
    ("8", &["l"]),
    ("9", &["r"]),
    ("43", &["sht", "scht", "schd", "st", "szt", "shd", "szd", "sd", "zd", "zhd"]),
    ("54", &["chs", "ks", "x"]),
    ("66", &["mn", "nm"]),
    ("94", &["rz", "rs"]),
];

/// Position context selecting which table a substring is looked up in.
#[derive(Debug, Clone, Copy)]
enum Context {
    Start,
    BeforeVowel,
    Other,
}

struct Tables {
    start: FxHashMap<&'static str, &'static str>,
    before_vowel: FxHashMap<&'static str, &'static str>,
    other: FxHashMap<&'static str, &'static str>,
}

impl Tables {
    fn get(&self, context: Context, token: &str) -> Option<&'static str> {
        let table = match context {
            Context::Start => &self.start,
            Context::BeforeVowel => &self.before_vowel,
            Context::Other => &self.other,
        };
        table.get(token).copied()
    }
}

fn build_table(codes: CodeTable) -> FxHashMap<&'static str, &'static str> {
    let mut map = FxHashMap::default();
    for (code, keys) in codes {
        for key in keys.iter() {
            map.insert(*key, *code);
        }
    }
    map
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| Tables {
        start: build_table(START_CODES),
        before_vowel: build_table(BEFORE_VOWEL_CODES),
        other: build_table(OTHER_CODES),
    })
}

/// Daitch-Mokotoff encoder with a configurable maximum code length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmSoundex {
    max_code_len: usize,
}

impl Default for DmSoundex {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CODE_LEN)
    }
}

impl DmSoundex {
    pub fn new(max_code_len: usize) -> Self {
        Self { max_code_len }
    }

    pub fn max_code_len(&self) -> usize {
        self.max_code_len
    }

    /// Encode a romanized name. Characters no table knows are skipped.
    pub fn encode(&self, name: &str) -> String {
        let name = name.to_ascii_lowercase();
        let bytes = name.as_bytes();
        let tables = tables();

        let mut code = String::with_capacity(self.max_code_len + 1);
        let mut pos = 0;
        let mut at_begin = true;
        let mut prev_skipped = false;

        while pos < bytes.len() && code.len() < self.max_code_len {
            let mut matched = None;
            for len in (1..=MAX_KEY_LEN.min(bytes.len() - pos)).rev() {
                let next_pos = pos + len;
                // non-ASCII input can split a char; such slices never match
                let Some(token) = name.get(pos..next_pos) else {
                    continue;
                };
                let context = if at_begin {
                    Context::Start
                } else if next_pos < bytes.len() && VOWELS.contains(&bytes[next_pos]) {
                    Context::BeforeVowel
                } else {
                    Context::Other
                };
                if let Some(digits) = tables.get(context, token) {
                    matched = Some((digits, next_pos));
                    break;
                }
            }
            at_begin = false;

            match matched {
                Some((digits, next_pos)) => {
                    let repeats_last =
                        digits.len() == 1 && code.as_bytes().last() == Some(&digits.as_bytes()[0]);
                    if prev_skipped || !repeats_last {
                        code.push_str(digits);
                    }
                    pos = next_pos;
                    prev_skipped = false;
                }
                None => {
                    prev_skipped = true;
                    pos += 1;
                }
            }
        }

        code.truncate(self.max_code_len);
        code
    }
}
