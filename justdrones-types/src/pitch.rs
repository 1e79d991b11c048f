use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::naming::{self, DisplayMode, NamingMode};

static NEXT_PITCH_ID: AtomicU32 = AtomicU32::new(1);

/// Stable identity of a pitch. Unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PitchId(u32);

impl PitchId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        PitchId(NEXT_PITCH_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PitchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tunable lattice position. Only `frequency` changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchEntry {
    id: PitchId,
    fifths: i32,
    thirds: i32,
    pub frequency: f64,
}

impl PitchEntry {
    pub fn new(fifths: i32, thirds: i32) -> Self {
        Self {
            id: PitchId::next(),
            fifths,
            thirds,
            frequency: 0.0,
        }
    }

    pub fn id(&self) -> PitchId {
        self.id
    }

    pub fn fifths(&self) -> i32 {
        self.fifths
    }

    pub fn thirds(&self) -> i32 {
        self.thirds
    }

    pub fn naming_index(&self) -> i64 {
        naming::naming_index(self.fifths, self.thirds)
    }

    pub fn pitch_class(&self) -> String {
        naming::pitch_class(self.fifths, self.thirds)
    }

    pub fn note_name(&self, mode: NamingMode) -> String {
        naming::note_name(self.naming_index(), mode)
    }

    pub fn label(&self, display: DisplayMode, naming_mode: NamingMode) -> String {
        naming::label(
            display,
            naming_mode,
            self.frequency,
            self.naming_index(),
            &self.pitch_class(),
        )
    }
}

/// A value copy of an activated pitch, detached from the live lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedPitch {
    #[serde(skip, default = "PitchId::next")]
    id: PitchId,
    pub frequency: f64,
    pub naming_index: i64,
    pub pitch_class: String,
}

impl RecordedPitch {
    pub fn new(frequency: f64, naming_index: i64, pitch_class: impl Into<String>) -> Self {
        Self {
            id: PitchId::next(),
            frequency,
            naming_index,
            pitch_class: pitch_class.into(),
        }
    }

    pub fn id(&self) -> PitchId {
        self.id
    }

    /// A copy carrying a new identity, so it can sound next to the original.
    pub fn duplicate(&self) -> Self {
        Self {
            id: PitchId::next(),
            ..self.clone()
        }
    }

    pub fn note_name(&self, mode: NamingMode) -> String {
        naming::note_name(self.naming_index, mode)
    }

    pub fn label(&self, display: DisplayMode, naming_mode: NamingMode) -> String {
        naming::label(
            display,
            naming_mode,
            self.frequency,
            self.naming_index,
            &self.pitch_class,
        )
    }
}

impl From<&PitchEntry> for RecordedPitch {
    fn from(entry: &PitchEntry) -> Self {
        RecordedPitch::new(entry.frequency, entry.naming_index(), entry.pitch_class())
    }
}

/// A named, saved recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub list: Vec<RecordedPitch>,
}

/// What the voice controller needs to sound a pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivePitch {
    pub id: PitchId,
    pub frequency: f64,
}

impl From<&PitchEntry> for ActivePitch {
    fn from(entry: &PitchEntry) -> Self {
        Self {
            id: entry.id(),
            frequency: entry.frequency,
        }
    }
}

impl From<&RecordedPitch> for ActivePitch {
    fn from(pitch: &RecordedPitch) -> Self {
        Self {
            id: pitch.id(),
            frequency: pitch.frequency,
        }
    }
}
