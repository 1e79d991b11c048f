//! Note naming: lattice coordinates to spelled note names and pitch-class labels.
//!
//! Names are derived from the position along the line of fifths, so every
//! lattice coordinate gets a consistent enharmonic spelling. All functions are
//! pure and total over `i32` coordinates; the naming index is carried as `i64`
//! so the line-of-fifths position never overflows.

use serde::{Deserialize, Serialize};

/// SMuFL accidental glyphs (Bravura code points).
const SHARP: &str = "\u{E262}";
const FLAT: &str = "\u{E260}";
const DOUBLE_SHARP: &str = "\u{E263}";
const DOUBLE_FLAT: &str = "\u{E264}";
const TRIPLE_SHARP: &str = "\u{E265}";
const TRIPLE_FLAT: &str = "\u{E266}";

/// Natural names in line-of-fifths order, starting on F.
const ENGLISH: [&str; 7] = ["F", "C", "G", "D", "A", "E", "B"];
const SOLFEGE: [&str; 7] = ["fa", "do", "sol", "re", "la", "mi", "si"];
const GERMAN: [&str; 7] = ["F", "C", "G", "D", "A", "E", "H"];
const DUTCH: [&str; 7] = ["F", "C", "G", "D", "A", "E", "B"];

/// Notation system used when spelling note names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NamingMode {
    #[default]
    English,
    Solfege,
    German,
    Dutch,
}

impl NamingMode {
    pub const ALL: [NamingMode; 4] = [
        NamingMode::English,
        NamingMode::Solfege,
        NamingMode::German,
        NamingMode::Dutch,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NamingMode::English => "English",
            NamingMode::Solfege => "Solfège",
            NamingMode::German => "Deutsch",
            NamingMode::Dutch => "Nederlands",
        }
    }

    fn naturals(&self) -> &'static [&'static str; 7] {
        match self {
            NamingMode::English => &ENGLISH,
            NamingMode::Solfege => &SOLFEGE,
            NamingMode::German => &GERMAN,
            NamingMode::Dutch => &DUTCH,
        }
    }
}

/// What a pitch button shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisplayMode {
    PitchClass,
    Frequency,
    #[default]
    NoteName,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 3] = [
        DisplayMode::PitchClass,
        DisplayMode::Frequency,
        DisplayMode::NoteName,
    ];
}

/// Position on the line of fifths, with A at 4 and each major third worth four fifths.
pub fn naming_index(fifths: i32, thirds: i32) -> i64 {
    i64::from(fifths) + 4 + 4 * i64::from(thirds)
}

/// Spell the note at `naming_index` in the given notation.
pub fn note_name(naming_index: i64, mode: NamingMode) -> String {
    let letter = mode.naturals()[naming_index.rem_euclid(7) as usize];
    let accidentals = naming_index.div_euclid(7);
    match mode {
        NamingMode::English | NamingMode::Solfege => glyph_name(letter, accidentals),
        NamingMode::German | NamingMode::Dutch => suffix_name(letter, accidentals, mode),
    }
}

/// Pitch-class label for a lattice coordinate (A-based: A is 9 with fifths = 0).
pub fn pitch_class(fifths: i32, thirds: i32) -> String {
    pitch_class_number(fifths, thirds).to_string()
}

pub fn pitch_class_number(fifths: i32, thirds: i32) -> u8 {
    let total = 9i64 + 7 * fifths as i64 + 4 * thirds as i64;
    total.rem_euclid(12) as u8
}

/// Format a pitch for display. Shared by lattice entries and recorded pitches.
pub fn label(
    display: DisplayMode,
    naming: NamingMode,
    frequency: f64,
    naming_index: i64,
    pitch_class: &str,
) -> String {
    match display {
        DisplayMode::Frequency => format!("{:.1}", frequency),
        DisplayMode::NoteName => note_name(naming_index, naming),
        DisplayMode::PitchClass => pitch_class.to_string(),
    }
}

fn overflow_marker(accidentals: i64) -> &'static str {
    if accidentals > 0 {
        "+"
    } else {
        "-"
    }
}

fn glyph_name(letter: &str, accidentals: i64) -> String {
    let suffix = match accidentals {
        0 => "",
        1 => SHARP,
        -1 => FLAT,
        2 => DOUBLE_SHARP,
        -2 => DOUBLE_FLAT,
        3 => TRIPLE_SHARP,
        -3 => TRIPLE_FLAT,
        n => overflow_marker(n),
    };
    format!("{}{}", letter, suffix)
}

/// German and Dutch spell accidentals as syllables, with a few fixed exceptions.
fn suffix_name(letter: &str, accidentals: i64, mode: NamingMode) -> String {
    let vowel_letter = letter == "E" || letter == "A";
    match accidentals {
        0 => letter.to_string(),
        1 => format!("{}is", letter),
        2 => format!("{}isis", letter),
        -1 if mode == NamingMode::German && letter == "H" => "B".to_string(),
        -1 if vowel_letter => format!("{}s", letter),
        -1 => format!("{}es", letter),
        -2 if letter == "E" => "Eses".to_string(),
        -2 if letter == "A" => "Asas".to_string(),
        -2 => format!("{}eses", letter),
        3 => format!("{}{}", letter, TRIPLE_SHARP),
        -3 => format!("{}{}", letter, TRIPLE_FLAT),
        n => format!("{}{}", letter, overflow_marker(n)),
    }
}
