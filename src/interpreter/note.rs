//! Note name and scale handling

use crate::error::InterpretError;
use std::fmt;

/// Chromatic note names and their semitone offsets from C
const NOTE_NAMES: [(&str, u8); 12] = [
    ("C", 0),
    ("C#", 1),
    ("D", 2),
    ("D#", 3),
    ("E", 4),
    ("F", 5),
    ("F#", 6),
    ("G", 7),
    ("G#", 8),
    ("A", 9),
    ("A#", 10),
    ("B", 11),
];

/// Highest pitch representable in the container
pub const MAX_PITCH: u8 = 127;

/// One of the twelve chromatic pitch classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);

    /// Parse `C`, `c#`, `G#` ... (case-insensitive, as SCALE roots are)
    pub fn parse(name: &str) -> Option<Self> {
        NOTE_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, offset)| PitchClass(offset))
    }

    /// Exact match against the upper-case names used in note tokens
    pub fn from_note_name(name: &str) -> Option<Self> {
        NOTE_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, offset)| PitchClass(offset))
    }

    /// Semitone offset from C
    pub fn offset(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(NOTE_NAMES[self.0 as usize].0)
    }
}

/// Scale modes accepted by SCALE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    Major,
    Minor,
    Dorian,
    Mixolydian,
}

impl ScaleMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "major" => Some(ScaleMode::Major),
            "minor" => Some(ScaleMode::Minor),
            "dorian" => Some(ScaleMode::Dorian),
            "mixolydian" => Some(ScaleMode::Mixolydian),
            _ => None,
        }
    }

    /// Semitone offsets of the seven scale degrees
    pub fn intervals(self) -> [u8; 7] {
        match self {
            ScaleMode::Major => [0, 2, 4, 5, 7, 9, 11],
            ScaleMode::Minor => [0, 2, 3, 5, 7, 8, 10],
            ScaleMode::Dorian => [0, 2, 3, 5, 7, 9, 10],
            ScaleMode::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
        }
    }
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScaleMode::Major => "major",
            ScaleMode::Minor => "minor",
            ScaleMode::Dorian => "dorian",
            ScaleMode::Mixolydian => "mixolydian",
        };
        f.write_str(name)
    }
}

/// A token is a note candidate when it starts with a letter and ends with a digit
pub fn looks_like_note(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic())
        && matches!(token.chars().last(), Some(c) if c.is_ascii_digit())
}

/// Convert a note token like `C4` or `G#3` to its pitch code.
///
/// The last character is the octave; pitch = (octave + 1) * 12 + offset.
/// Names are case-sensitive: `c4` is not a note.
pub fn note_to_pitch(token: &str) -> Result<u8, InterpretError> {
    let invalid = || InterpretError::InvalidNoteName(token.to_string());

    let (name, octave) = match token.char_indices().last() {
        Some((idx, c)) => (&token[..idx], c.to_digit(10).ok_or_else(invalid)?),
        None => return Err(invalid()),
    };
    let class = PitchClass::from_note_name(name).ok_or_else(invalid)?;

    let pitch = (octave + 1) * 12 + class.offset() as u32;
    if pitch > MAX_PITCH as u32 {
        return Err(invalid());
    }
    Ok(pitch as u8)
}
