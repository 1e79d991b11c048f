use std::fmt;

use justdrones_types::{PitchEntry, Preset, RecordedPitch};

use super::persistence::{KeyValueStore, SharedStore, StoreResult, KEY_PRESETS};

/// Why a preset operation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetError {
    EmptyName,
    DuplicateName(String),
    NotFound(String),
    IndexOutOfRange(usize),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::EmptyName => write!(f, "preset name is empty"),
            PresetError::DuplicateName(name) => write!(f, "a preset named '{}' already exists", name),
            PresetError::NotFound(name) => write!(f, "no preset named '{}'", name),
            PresetError::IndexOutOfRange(i) => write!(f, "no preset at index {}", i),
        }
    }
}

impl std::error::Error for PresetError {}

/// Recorded pitches, the pedal cursor over them, and the saved presets.
pub struct RecordingStore {
    store: SharedStore,
    recorded: Vec<RecordedPitch>,
    recording: bool,
    cursor: usize,
    presets: Vec<Preset>,
}

impl RecordingStore {
    /// Load saved presets. A missing or unreadable list starts empty.
    pub fn new(store: SharedStore) -> Self {
        let presets = match read_presets(&store) {
            Ok(presets) => presets,
            Err(e) => {
                log::warn!(target: "recording", "could not load presets: {}", e);
                Vec::new()
            }
        };
        Self {
            store,
            recorded: Vec::new(),
            recording: false,
            cursor: 0,
            presets,
        }
    }

    // ── Recording ───────────────────────────────────────────────────

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn start_recording(&mut self) {
        self.recording = true;
    }

    pub fn stop_recording(&mut self) {
        self.recording = false;
    }

    /// Copy a lattice entry's value onto the end of the recording.
    pub fn append(&mut self, entry: &PitchEntry) {
        self.recorded.push(RecordedPitch::from(entry));
    }

    /// Record an already-recorded pitch again, under a new identity.
    pub fn append_recorded(&mut self, pitch: &RecordedPitch) {
        self.recorded.push(pitch.duplicate());
    }

    pub fn recorded(&self) -> &[RecordedPitch] {
        &self.recorded
    }

    pub fn clear(&mut self) {
        self.recorded.clear();
        self.cursor = 0;
    }

    // ── Presets ─────────────────────────────────────────────────────

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Snapshot the current recording under `name`.
    pub fn save(&mut self, name: &str) -> Result<(), PresetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        if self.presets.iter().any(|p| p.name == name) {
            return Err(PresetError::DuplicateName(name.to_string()));
        }
        self.presets.push(Preset {
            name: name.to_string(),
            list: self.recorded.clone(),
        });
        self.persist();
        log::info!(target: "recording", "saved preset '{}' ({} pitches)", name, self.recorded.len());
        Ok(())
    }

    /// Replace the recording with a copy of the named preset.
    pub fn load(&mut self, name: &str) -> Result<(), PresetError> {
        let name = name.trim();
        let preset = self
            .presets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))?;
        self.recorded = preset.list.iter().map(RecordedPitch::duplicate).collect();
        self.cursor = 0;
        log::info!(target: "recording", "loaded preset '{}'", name);
        Ok(())
    }

    pub fn delete_preset(&mut self, index: usize) -> Result<Preset, PresetError> {
        if index >= self.presets.len() {
            return Err(PresetError::IndexOutOfRange(index));
        }
        let removed = self.presets.remove(index);
        self.persist();
        Ok(removed)
    }

    /// Move the preset at `from` so it ends up at `to`. A `to` past the end
    /// moves it last.
    pub fn move_preset(&mut self, from: usize, to: usize) -> Result<(), PresetError> {
        if from >= self.presets.len() {
            return Err(PresetError::IndexOutOfRange(from));
        }
        let preset = self.presets.remove(from);
        let to = to.min(self.presets.len());
        self.presets.insert(to, preset);
        self.persist();
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = write_presets(&self.store, &self.presets) {
            log::warn!(target: "recording", "could not save presets: {}", e);
        }
    }

    // ── Pedal cursor ────────────────────────────────────────────────

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Pitch under the cursor, if the recording is non-empty.
    pub fn current(&self) -> Option<&RecordedPitch> {
        self.recorded.get(self.cursor)
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Step forward. Returns `None` at the last pitch, leaving the cursor put.
    pub fn advance(&mut self) -> Option<&RecordedPitch> {
        if self.cursor + 1 >= self.recorded.len() {
            return None;
        }
        self.cursor += 1;
        self.recorded.get(self.cursor)
    }

    /// Step back. Returns `None` at the first pitch, leaving the cursor put.
    pub fn retreat(&mut self) -> Option<&RecordedPitch> {
        if self.cursor == 0 || self.recorded.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.recorded.get(self.cursor)
    }
}

fn read_presets(store: &SharedStore) -> StoreResult<Vec<Preset>> {
    match store.get_blob(KEY_PRESETS)? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
        None => Ok(Vec::new()),
    }
}

fn write_presets(store: &SharedStore, presets: &[Preset]) -> StoreResult {
    let bytes = serde_json::to_vec(presets)?;
    store.set_blob(KEY_PRESETS, &bytes)
}
