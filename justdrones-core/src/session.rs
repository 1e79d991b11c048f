//! `DroneSession` ties the lattice, the voices and the recorder together and
//! performs the cross-cutting side effects none of them should know about:
//! recording on activation, retuning sounding voices after a tuning change,
//! clearing the queue on a mode switch, and the pedal drone.

use justdrones_types::{DisplayMode, NamingMode, PitchEntry, PitchId, RecordedPitch, Temperament};

use crate::audio::{AudioBackend, BackendResult, EffectParameters, EnqueueOutcome, VoiceController};
use crate::config::{Config, TuningDefaults};
use crate::state::lattice::{Tonus, TuningError, TuningLattice};
use crate::state::persistence::SharedStore;
use crate::state::recording::RecordingStore;

/// Which set of pitches the player is choosing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TuningMode {
    #[default]
    Tonnetz,
    CircleOfFifths,
    Recorded,
}

impl TuningMode {
    pub const ALL: [TuningMode; 3] = [
        TuningMode::Tonnetz,
        TuningMode::CircleOfFifths,
        TuningMode::Recorded,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TuningMode::Tonnetz => "Tonnetz",
            TuningMode::CircleOfFifths => "Circle of Fifths",
            TuningMode::Recorded => "Recorded",
        }
    }
}

pub struct DroneSession {
    lattice: TuningLattice,
    voices: VoiceController,
    recorder: RecordingStore,
    mode: TuningMode,
    naming_mode: NamingMode,
    display_mode: DisplayMode,
    tonus: Tonus,
    pedal: Option<PitchId>,
}

impl DroneSession {
    /// Build a session from config defaults and whatever `store` remembers.
    /// Fails only if the audio engine can't start.
    pub fn new(backend: Box<dyn AudioBackend>, store: SharedStore, config: &Config) -> BackendResult<Self> {
        Self::with_defaults(
            backend,
            store,
            &config.tuning_defaults(),
            &config.effect_defaults(),
        )
    }

    pub fn with_defaults(
        backend: Box<dyn AudioBackend>,
        store: SharedStore,
        tuning: &TuningDefaults,
        effects: &EffectParameters,
    ) -> BackendResult<Self> {
        let voices = VoiceController::new(backend, store.clone(), effects)?;
        Ok(Self {
            lattice: TuningLattice::new(store.clone(), tuning),
            voices,
            recorder: RecordingStore::new(store),
            mode: TuningMode::default(),
            naming_mode: NamingMode::default(),
            display_mode: DisplayMode::default(),
            tonus: Tonus::default(),
            pedal: None,
        })
    }

    pub fn lattice(&self) -> &TuningLattice {
        &self.lattice
    }

    pub fn voices(&self) -> &VoiceController {
        &self.voices
    }

    /// Effect parameters and switches are set straight on the controller.
    pub fn voices_mut(&mut self) -> &mut VoiceController {
        &mut self.voices
    }

    pub fn recorder(&self) -> &RecordingStore {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut RecordingStore {
        &mut self.recorder
    }

    // ── Modes ───────────────────────────────────────────────────────

    pub fn mode(&self) -> TuningMode {
        self.mode
    }

    /// Switching to a different mode silences everything.
    pub fn set_mode(&mut self, mode: TuningMode) {
        if self.mode == mode {
            return;
        }
        self.clear();
        self.mode = mode;
        log::debug!(target: "voices", "mode -> {}", mode.name());
    }

    pub fn naming_mode(&self) -> NamingMode {
        self.naming_mode
    }

    pub fn set_naming_mode(&mut self, mode: NamingMode) {
        self.naming_mode = mode;
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
    }

    pub fn tonus(&self) -> Tonus {
        self.tonus
    }

    pub fn set_tonus(&mut self, tonus: Tonus) {
        self.tonus = tonus;
    }

    pub fn label(&self, entry: &PitchEntry) -> String {
        entry.label(self.display_mode, self.naming_mode)
    }

    pub fn recorded_label(&self, pitch: &RecordedPitch) -> String {
        pitch.label(self.display_mode, self.naming_mode)
    }

    // ── Activation ──────────────────────────────────────────────────

    /// Sound a lattice entry or a recorded pitch by id. While recording, a
    /// pitch that actually started is appended to the recording. Returns
    /// `None` if no pitch has that id.
    pub fn activate(&mut self, id: PitchId) -> Option<EnqueueOutcome> {
        if let Some(entry) = self.lattice.entry(id).cloned() {
            let outcome = self.voices.enqueue(&entry);
            if outcome.started() && self.recorder.is_recording() {
                self.recorder.append(&entry);
            }
            return Some(outcome);
        }
        let pitch = self.recorder.recorded().iter().find(|p| p.id() == id).cloned()?;
        let outcome = self.voices.enqueue(&pitch);
        if outcome.started() && self.recorder.is_recording() {
            self.recorder.append_recorded(&pitch);
        }
        Some(outcome)
    }

    pub fn deactivate(&mut self, id: PitchId) -> bool {
        if self.pedal == Some(id) {
            self.pedal = None;
        }
        self.voices.dequeue(id).is_some()
    }

    /// Activate if silent, deactivate if sounding.
    pub fn toggle(&mut self, id: PitchId) -> Option<EnqueueOutcome> {
        if self.voices.is_active(id) {
            self.deactivate(id);
            None
        } else {
            self.activate(id)
        }
    }

    pub fn clear(&mut self) {
        self.pedal = None;
        self.voices.clear();
    }

    // ── Tuning ──────────────────────────────────────────────────────

    pub fn set_reference_pitch(&mut self, hz: f64) -> Result<(), TuningError> {
        self.lattice.set_reference_pitch(hz)?;
        self.retune_sounding();
        Ok(())
    }

    pub fn set_stop(&mut self, feet: u32) -> Result<(), TuningError> {
        self.lattice.set_stop(feet)?;
        self.retune_sounding();
        Ok(())
    }

    pub fn set_fifth_ratio(&mut self, ratio: f64) -> Result<(), TuningError> {
        self.lattice.set_fifth_ratio(ratio)?;
        self.retune_sounding();
        Ok(())
    }

    pub fn set_temperament(&mut self, temperament: Temperament) {
        self.lattice.set_temperament(temperament);
        self.retune_sounding();
    }

    /// Follow recomputed lattice frequencies with any sounding lattice voice.
    /// Recorded pitches are snapshots and keep their frequency.
    fn retune_sounding(&mut self) {
        let changes: Vec<(PitchId, f64)> = self
            .voices
            .queue()
            .iter()
            .filter_map(|active| {
                let entry = self.lattice.entry(active.id)?;
                (entry.frequency != active.frequency).then_some((active.id, entry.frequency))
            })
            .collect();
        for (id, hz) in changes {
            self.voices.retune(id, hz);
        }
    }

    // ── Pedal drone ─────────────────────────────────────────────────

    /// The pedal pitch, while it is still sounding.
    pub fn pedal(&self) -> Option<PitchId> {
        self.pedal.filter(|id| self.voices.is_active(*id))
    }

    /// Sound the recorded pitch under the cursor as the only voice.
    pub fn pedal_start(&mut self) -> Option<EnqueueOutcome> {
        let pitch = self.recorder.current()?.clone();
        self.clear();
        let outcome = self.voices.enqueue(&pitch);
        if outcome.started() {
            self.pedal = Some(pitch.id());
        }
        Some(outcome)
    }

    /// Step to the next recorded pitch. Past the end the pedal stops.
    pub fn pedal_forward(&mut self) -> Option<PitchId> {
        let from = self.sounding_pedal()?;
        let Some(next) = self.recorder.advance().cloned() else {
            self.pedal_stop();
            return None;
        };
        let moved = self.pedal_move(from, &next);
        if moved.is_none() {
            self.recorder.retreat();
        }
        moved
    }

    /// Step to the previous recorded pitch. Before the start the pedal stops.
    pub fn pedal_back(&mut self) -> Option<PitchId> {
        let from = self.sounding_pedal()?;
        let Some(prev) = self.recorder.retreat().cloned() else {
            self.pedal_stop();
            return None;
        };
        let moved = self.pedal_move(from, &prev);
        if moved.is_none() {
            self.recorder.advance();
        }
        moved
    }

    /// Forget a pedal whose voice was stopped from outside.
    fn sounding_pedal(&mut self) -> Option<PitchId> {
        let id = self.pedal();
        if id.is_none() {
            self.pedal = None;
        }
        id
    }

    /// Hand the pedal voice to `to`. If `to` already sounds on its own voice
    /// the pedal stops; the caller puts the cursor back.
    fn pedal_move(&mut self, from: PitchId, to: &RecordedPitch) -> Option<PitchId> {
        if self.voices.reassign(from, to).is_none() {
            log::debug!(target: "voices", "pedal target {:?} already sounding, stopping pedal", to.id());
            self.pedal_stop();
            return None;
        }
        self.pedal = Some(to.id());
        Some(to.id())
    }

    pub fn pedal_stop(&mut self) {
        if let Some(id) = self.pedal.take() {
            self.voices.dequeue(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{SharedTestBackend, TestBackend, TestOp};
    use crate::state::persistence::MemoryStore;
    use justdrones_types::Stop;
    use std::sync::Arc;

    fn session() -> (DroneSession, Arc<TestBackend>) {
        let backend = Arc::new(TestBackend::new());
        let tuning = TuningDefaults {
            reference_pitch: 440.0,
            stop: Stop::Eight,
            temperament: Temperament::Pure,
        };
        let s = DroneSession::with_defaults(
            Box::new(SharedTestBackend(Arc::clone(&backend))),
            MemoryStore::shared(),
            &tuning,
            &EffectParameters::default(),
        )
        .unwrap();
        backend.clear();
        (s, backend)
    }

    fn rect_id(s: &DroneSession, fifths: i32, thirds: i32) -> PitchId {
        s.lattice().rectangular_entry(fifths, thirds).unwrap().id()
    }

    #[test]
    fn activation_records_only_when_started() {
        let (mut s, _) = session();
        s.recorder_mut().start_recording();
        let ids: Vec<_> = (-2..=2).map(|f| rect_id(&s, f, 0)).collect();
        for id in &ids {
            s.activate(*id);
        }
        // the fifth pitch was rejected, so only four were recorded
        assert_eq!(s.voices().len(), 4);
        assert_eq!(s.recorder().recorded().len(), 4);

        s.recorder_mut().stop_recording();
        s.deactivate(ids[0]);
        s.activate(ids[4]);
        assert_eq!(s.recorder().recorded().len(), 4);
    }

    #[test]
    fn unknown_id_is_ignored() {
        let (mut s, backend) = session();
        assert_eq!(s.activate(PitchId::next()), None);
        assert!(backend.operations().is_empty());
    }

    #[test]
    fn toggle_flips_activation() {
        let (mut s, _) = session();
        let id = rect_id(&s, 0, 0);
        assert!(s.toggle(id).unwrap().started());
        assert!(s.voices().is_active(id));
        assert_eq!(s.toggle(id), None);
        assert!(!s.voices().is_active(id));
    }

    #[test]
    fn mode_switch_clears_queue() {
        let (mut s, _) = session();
        s.activate(rect_id(&s, 0, 0));
        s.set_mode(TuningMode::Tonnetz);
        assert_eq!(s.voices().len(), 1);
        s.set_mode(TuningMode::CircleOfFifths);
        assert!(s.voices().is_empty());
        assert_eq!(s.mode(), TuningMode::CircleOfFifths);
    }

    #[test]
    fn tuning_change_retunes_sounding_voices() {
        let (mut s, backend) = session();
        let a = rect_id(&s, 0, 0);
        let circle_a = s.lattice().circular_lattice()[13].id();
        s.activate(a);
        s.activate(circle_a);
        backend.clear();

        s.set_reference_pitch(432.0).unwrap();
        assert!(backend.voices_started().is_empty());
        assert_eq!(
            backend.count(|op| matches!(op, TestOp::SetVoiceFrequencies { .. })),
            2
        );
        assert_eq!(s.voices().queue()[0].frequency, 432.0);

        // only the circle moves with the temperament
        backend.clear();
        s.set_temperament(Temperament::Equal);
        assert_eq!(
            backend.count(|op| matches!(op, TestOp::SetVoiceFrequencies { .. })),
            1
        );

        backend.clear();
        assert!(s.set_stop(5).is_err());
        assert!(backend.operations().is_empty());
    }

    #[test]
    fn pedal_steps_through_recording() {
        let (mut s, backend) = session();
        s.recorder_mut().start_recording();
        for f in 0..3 {
            s.activate(rect_id(&s, f, 0));
        }
        s.recorder_mut().stop_recording();
        s.clear();
        s.set_mode(TuningMode::Recorded);

        let outcome = s.pedal_start().unwrap();
        assert!(outcome.started());
        assert_eq!(s.voices().len(), 1);
        let first = s.pedal().unwrap();
        backend.clear();

        let second = s.pedal_forward().unwrap();
        assert_ne!(first, second);
        assert_eq!(s.voices().len(), 1);
        assert!(s.voices().is_active(second));
        assert!(backend.voices_started().is_empty());

        s.pedal_forward().unwrap();
        // past the end the pedal stops
        assert_eq!(s.pedal_forward(), None);
        assert_eq!(s.pedal(), None);
        assert!(s.voices().is_empty());
        assert_eq!(s.pedal_forward(), None);
    }

    #[test]
    fn pedal_back_at_start_stops() {
        let (mut s, _) = session();
        s.recorder_mut().start_recording();
        s.activate(rect_id(&s, 0, 0));
        s.recorder_mut().stop_recording();
        s.pedal_start();
        assert!(s.pedal().is_some());
        assert_eq!(s.pedal_back(), None);
        assert!(s.voices().is_empty());
    }

    fn record_fifths(s: &mut DroneSession, count: i32) {
        s.recorder_mut().start_recording();
        for f in 0..count {
            let id = rect_id(s, f, 0);
            s.activate(id);
        }
        s.recorder_mut().stop_recording();
        s.clear();
    }

    #[test]
    fn pedal_stops_when_next_pitch_already_sounds() {
        let (mut s, _) = session();
        record_fifths(&mut s, 3);
        s.pedal_start().unwrap();
        let first = s.pedal().unwrap();
        let second = s.recorder().recorded()[1].id();
        assert!(s.activate(second).unwrap().started());

        assert_eq!(s.pedal_forward(), None);
        assert_eq!(s.pedal(), None);
        // cursor stays on the pitch the pedal last held
        assert_eq!(s.recorder().cursor(), 0);
        assert!(!s.voices().is_active(first));
        assert!(s.voices().is_active(second));
        assert_eq!(s.voices().len(), 1);
    }

    #[test]
    fn pedal_back_onto_sounding_pitch_keeps_cursor() {
        let (mut s, _) = session();
        record_fifths(&mut s, 3);
        s.recorder_mut().advance();
        s.pedal_start().unwrap();
        let first = s.recorder().recorded()[0].id();
        s.activate(first);

        assert_eq!(s.pedal_back(), None);
        assert_eq!(s.pedal(), None);
        assert_eq!(s.recorder().cursor(), 1);
        assert_eq!(s.voices().queue().len(), 1);
        assert!(s.voices().is_active(first));
    }

    #[test]
    fn pedal_forgets_voice_stopped_elsewhere() {
        let (mut s, _) = session();
        record_fifths(&mut s, 3);
        s.pedal_start().unwrap();
        s.voices_mut().clear();
        assert_eq!(s.pedal(), None);
        assert_eq!(s.pedal_forward(), None);
        assert_eq!(s.recorder().cursor(), 0);
        assert!(s.voices().is_empty());

        assert!(s.pedal_start().unwrap().started());
        let id = s.pedal().unwrap();
        assert_eq!(id, s.recorder().recorded()[0].id());
        s.voices_mut().dequeue(id);
        assert_eq!(s.pedal_back(), None);
        assert_eq!(s.recorder().cursor(), 0);
    }

    #[test]
    fn pedal_start_without_recording_does_nothing() {
        let (mut s, _) = session();
        s.activate(rect_id(&s, 0, 0));
        assert_eq!(s.pedal_start(), None);
        assert_eq!(s.voices().len(), 1);
    }

    #[test]
    fn labels_follow_modes() {
        let (mut s, _) = session();
        let entry = s.lattice().rectangular_entry(-3, 0).unwrap().clone();
        assert_eq!(s.label(&entry), "C");
        s.set_naming_mode(NamingMode::Solfege);
        assert_eq!(s.label(&entry), "do");
        s.set_display_mode(DisplayMode::PitchClass);
        assert_eq!(s.label(&entry), "0");
    }
}
