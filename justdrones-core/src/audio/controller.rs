//! Voice controller: maps the active queue onto the fixed voice pool and
//! keeps the shared effect chain running exactly while something sounds.

use justdrones_types::{
    ActivePitch, EffectChain, EffectParam, EffectSwitch, LfoShape, PitchId, SubOctave,
};

use super::backend::{AudioBackend, BackendResult, SlotId};
use super::effects::EffectParameters;
use super::voice_allocator::{SlotState, VoiceAllocator, MAX_VOICES};
use crate::state::persistence::{self, SharedStore, KEY_SUB_OCTAVE};

/// Result of asking for a pitch to sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The pitch now sounds on this slot.
    Started(SlotId),
    /// Every voice is busy; nothing changed.
    Full,
    /// The pitch was already sounding on this slot; nothing changed.
    AlreadyActive(SlotId),
}

impl EnqueueOutcome {
    pub fn started(&self) -> bool {
        matches!(self, EnqueueOutcome::Started(_))
    }
}

pub struct VoiceController {
    backend: Box<dyn AudioBackend>,
    store: SharedStore,
    allocator: VoiceAllocator,
    queue: Vec<ActivePitch>,
    effects: EffectParameters,
    chain_running: bool,
}

impl VoiceController {
    /// Start the engine and push the persisted synth state to it.
    ///
    /// Engine startup failure is the one error reported upward.
    pub fn new(
        backend: Box<dyn AudioBackend>,
        store: SharedStore,
        defaults: &EffectParameters,
    ) -> BackendResult<Self> {
        backend.start_engine()?;
        let effects = EffectParameters::load(store.as_ref(), defaults);
        let controller = Self {
            backend,
            store,
            allocator: VoiceAllocator::new(),
            queue: Vec::with_capacity(MAX_VOICES),
            effects,
            chain_running: false,
        };
        for (param, value) in controller.effects.engine_values() {
            controller.send("set effect param", controller.backend.set_effect_param(param, value));
        }
        for switch in EffectSwitch::ALL {
            let enabled = controller.effects.switch(switch);
            controller.send("set switch", controller.backend.set_switch(switch, enabled));
        }
        log::info!(target: "voices", "audio engine started with {} voices", MAX_VOICES);
        Ok(controller)
    }

    fn send(&self, what: &str, result: BackendResult) {
        if let Err(e) = result {
            log::warn!(target: "voices", "{} failed: {}", what, e);
        }
    }

    // ── Queue ───────────────────────────────────────────────────────

    /// Sound a pitch on the next free voice.
    pub fn enqueue(&mut self, pitch: impl Into<ActivePitch>) -> EnqueueOutcome {
        let pitch = pitch.into();
        if let Some(slot) = self.allocator.slot_for(pitch.id) {
            return EnqueueOutcome::AlreadyActive(slot);
        }
        if self.queue.len() >= MAX_VOICES {
            log::debug!(target: "voices", "queue full, ignoring pitch {}", pitch.id);
            return EnqueueOutcome::Full;
        }
        let Some(slot) = self.allocator.free_slot() else {
            return EnqueueOutcome::Full;
        };

        let freqs = self.effects.voice_frequencies(pitch.frequency);
        self.allocator.assign(slot, pitch.id, freqs);
        self.queue.push(pitch);
        log::debug!(target: "voices", "pitch {} -> slot {} at {:.3} Hz", pitch.id, slot, pitch.frequency);
        self.send("start voice", self.backend.start_voice(slot, freqs));

        if self.queue.len() == 1 {
            self.start_chain();
        }
        EnqueueOutcome::Started(slot)
    }

    /// Silence a pitch. Absent ids are ignored.
    pub fn dequeue(&mut self, id: PitchId) -> Option<SlotId> {
        let pos = self.queue.iter().position(|p| p.id == id)?;
        self.queue.remove(pos);
        let slot = self.allocator.release(id)?;
        log::debug!(target: "voices", "pitch {} released slot {}", id, slot);
        self.send("stop voice", self.backend.stop_voice(slot));

        if self.queue.is_empty() {
            self.stop_chain();
        }
        Some(slot)
    }

    /// Stop every voice and the shared effects.
    pub fn clear(&mut self) {
        for slot in self.allocator.release_all() {
            self.send("stop voice", self.backend.stop_voice(slot));
        }
        self.queue.clear();
        self.send("stop shared effects", self.backend.stop_shared_effects());
        self.chain_running = false;
    }

    /// Move a sounding pitch to a new frequency without restarting it.
    pub fn retune(&mut self, id: PitchId, hz: f64) -> bool {
        let Some(slot) = self.allocator.slot_for(id) else {
            return false;
        };
        let freqs = self.effects.voice_frequencies(hz);
        self.allocator.update_frequencies(slot, freqs);
        if let Some(active) = self.queue.iter_mut().find(|p| p.id == id) {
            active.frequency = hz;
        }
        self.send("set voice frequencies", self.backend.set_voice_frequencies(slot, freqs));
        true
    }

    /// Hand the voice sounding `from` over to `pitch`, keeping its queue
    /// position. The slot's frequencies are re-derived from `pitch`.
    pub fn reassign(&mut self, from: PitchId, pitch: impl Into<ActivePitch>) -> Option<SlotId> {
        let pitch = pitch.into();
        let slot = self.allocator.slot_for(from)?;
        if pitch.id != from && self.allocator.slot_for(pitch.id).is_some() {
            return None;
        }
        let freqs = self.effects.voice_frequencies(pitch.frequency);
        self.allocator.assign(slot, pitch.id, freqs);
        if let Some(active) = self.queue.iter_mut().find(|p| p.id == from) {
            *active = pitch;
        }
        log::debug!(target: "voices", "slot {} reassigned {} -> {}", slot, from, pitch.id);
        self.send("set voice frequencies", self.backend.set_voice_frequencies(slot, freqs));
        Some(slot)
    }

    fn start_chain(&mut self) {
        let chain = self.effects.chain();
        self.send("start shared effects", self.backend.start_shared_effects(chain));
        self.chain_running = true;
    }

    fn stop_chain(&mut self) {
        self.send("stop shared effects", self.backend.stop_shared_effects());
        self.chain_running = false;
    }

    // ── Effects ─────────────────────────────────────────────────────

    /// Set a continuous parameter. The value is clamped into range, pushed
    /// to the engine and persisted. Returns the value actually applied, or
    /// `None` if the input was not a finite number.
    pub fn set_effect_param(&mut self, param: EffectParam, value: f32) -> Option<f32> {
        let changed = self.effects.set(param, value);
        for &(p, v) in &changed {
            persistence::persist_number(self.store.as_ref(), p.key(), f64::from(v));
            self.send("set effect param", self.backend.set_effect_param(p, p.engine_value(v)));
        }
        changed.first().map(|&(_, v)| v)
    }

    pub fn set_lfo_shape(&mut self, shape: LfoShape) {
        self.set_effect_param(EffectParam::LfoShape, shape.index());
    }

    /// Flip a bypass switch. Changing the chain composition while voices
    /// sound restarts the shared effects.
    pub fn set_switch(&mut self, switch: EffectSwitch, enabled: bool) {
        if !self.effects.set_switch(switch, enabled) {
            return;
        }
        persistence::persist_bool(self.store.as_ref(), switch.key(), enabled);
        self.send("set switch", self.backend.set_switch(switch, enabled));

        if matches!(switch, EffectSwitch::Filter | EffectSwitch::Phaser) && self.chain_running {
            self.stop_chain();
            self.start_chain();
        }
    }

    /// Change the sub-oscillator register. Sounding voices get new sub
    /// frequencies; their fundamentals are untouched.
    pub fn set_sub_octave(&mut self, octave: SubOctave) {
        if self.effects.sub_octave == octave {
            return;
        }
        self.effects.sub_octave = octave;
        persistence::persist_number(self.store.as_ref(), KEY_SUB_OCTAVE, octave.multiplier());

        let sounding: Vec<_> = self.allocator.sounding().collect();
        for (slot, _, freqs) in sounding {
            let updated = self.effects.voice_frequencies(freqs.osc1);
            self.allocator.update_frequencies(slot, updated);
            self.send("set voice frequencies", self.backend.set_voice_frequencies(slot, updated));
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Active pitches in activation order.
    pub fn queue(&self) -> &[ActivePitch] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.len() >= MAX_VOICES
    }

    pub fn is_active(&self, id: PitchId) -> bool {
        self.queue.iter().any(|p| p.id == id)
    }

    pub fn slot_of(&self, id: PitchId) -> Option<SlotId> {
        self.allocator.slot_for(id)
    }

    pub fn slot_state(&self, slot: SlotId) -> Option<SlotState> {
        self.allocator.state(slot)
    }

    pub fn sounding_count(&self) -> usize {
        self.allocator.sounding_count()
    }

    pub fn effects(&self) -> &EffectParameters {
        &self.effects
    }

    pub fn chain(&self) -> EffectChain {
        self.effects.chain()
    }

    pub fn chain_running(&self) -> bool {
        self.chain_running
    }
}
