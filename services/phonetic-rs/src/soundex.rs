//! Soundex and Refined Soundex.
//!
//! The codes themselves come from `rphonetic`, which follows commons-codec.
//! commons-codec refuses letters outside A-Z, and so do these wrappers.

use rphonetic::{Encoder, RefinedSoundex, Soundex};

use crate::EncodeError;

/// Reject unmapped letters and return the ASCII letters to encode.
fn clean(name: &str) -> Result<String, EncodeError> {
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_alphabetic() && !c.is_ascii_alphabetic())
    {
        return Err(EncodeError::Unmapped {
            ch,
            input: name.to_string(),
        });
    }
    let cleaned: String = name.chars().filter(char::is_ascii_alphabetic).collect();
    if cleaned.is_empty() {
        return Err(EncodeError::Empty(name.to_string()));
    }
    Ok(cleaned)
}

/// American Soundex: first letter plus three digits.
pub fn soundex(name: &str) -> Result<String, EncodeError> {
    let cleaned = clean(name)?;
    Ok(Soundex::default().encode(&cleaned))
}

/// Refined Soundex: first letter plus one digit per sound, unpadded.
pub fn refined_soundex(name: &str) -> Result<String, EncodeError> {
    let cleaned = clean(name)?;
    Ok(RefinedSoundex::default().encode(&cleaned))
}
