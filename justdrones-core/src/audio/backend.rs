//! Audio backend trait: the voice controller's view of the synth engine.
//!
//! `AudioBackend` captures what the controller *means* to do (sound a voice,
//! silence it, push a parameter) independently of how a host renders audio.
//! Commands are fire-and-forget; only `start_engine` failure is meaningful
//! to callers.

use std::fmt;
use std::sync::{Arc, Mutex};

use justdrones_types::{EffectChain, EffectParam, EffectSwitch};

/// Result type for backend operations.
pub type BackendResult<T = ()> = Result<T, BackendError>;

/// Error from a backend operation.
#[derive(Debug, Clone)]
pub struct BackendError(pub String);

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        BackendError(e.to_string())
    }
}

impl From<String> for BackendError {
    fn from(s: String) -> Self {
        BackendError(s)
    }
}

/// Index of one physical voice in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(usize);

impl SlotId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three oscillator frequencies of one voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceFrequencies {
    pub osc1: f64,
    pub osc2: f64,
    pub sub: f64,
}

/// Semantic-level synth engine trait.
pub trait AudioBackend: Send {
    /// Bring the engine up. Called once, before any other command.
    fn start_engine(&self) -> BackendResult;

    /// Start a voice's oscillators (and sub) at the given frequencies.
    fn start_voice(&self, slot: SlotId, freqs: VoiceFrequencies) -> BackendResult;

    /// Stop a voice's oscillators and its sub.
    fn stop_voice(&self, slot: SlotId) -> BackendResult;

    /// Change a sounding voice's frequencies without restarting it.
    fn set_voice_frequencies(&self, slot: SlotId, freqs: VoiceFrequencies) -> BackendResult;

    /// Push an effect parameter, already converted to engine units.
    fn set_effect_param(&self, param: EffectParam, value: f32) -> BackendResult;

    /// Push an on/off switch.
    fn set_switch(&self, switch: EffectSwitch, enabled: bool) -> BackendResult;

    /// Start the shared effects named in `chain`.
    fn start_shared_effects(&self, chain: EffectChain) -> BackendResult;

    /// Stop every shared effect.
    fn stop_shared_effects(&self) -> BackendResult;
}

// ─── TestBackend ────────────────────────────────────────────────────

/// An operation recorded by `TestBackend` for assertion in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum TestOp {
    StartEngine,
    StartVoice {
        slot: SlotId,
        freqs: VoiceFrequencies,
    },
    StopVoice(SlotId),
    SetVoiceFrequencies {
        slot: SlotId,
        freqs: VoiceFrequencies,
    },
    SetEffectParam {
        param: EffectParam,
        value: f32,
    },
    SetSwitch {
        switch: EffectSwitch,
        enabled: bool,
    },
    StartSharedEffects(EffectChain),
    StopSharedEffects,
}

/// A test backend that records all operations into a vector for assertions.
/// All operations succeed unless built with `failing()`, in which case every
/// command is recorded and then reported as failed.
pub struct TestBackend {
    ops: Mutex<Vec<TestOp>>,
    fail: bool,
}

impl TestBackend {
    pub fn new() -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A backend whose engine never comes up.
    pub fn failing() -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Return all recorded operations.
    pub fn operations(&self) -> Vec<TestOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Clear recorded operations.
    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    /// Count operations matching a predicate.
    pub fn count<F: Fn(&TestOp) -> bool>(&self, f: F) -> usize {
        self.ops.lock().unwrap().iter().filter(|op| f(op)).count()
    }

    /// Find the first operation matching a predicate.
    pub fn find<F: Fn(&TestOp) -> bool>(&self, f: F) -> Option<TestOp> {
        self.ops.lock().unwrap().iter().find(|op| f(op)).cloned()
    }

    /// Return the most recent operation matching a predicate.
    pub fn last<F: Fn(&TestOp) -> bool>(&self, f: F) -> Option<TestOp> {
        self.ops.lock().unwrap().iter().rev().find(|op| f(op)).cloned()
    }

    /// Slots started, in order.
    pub fn voices_started(&self) -> Vec<(SlotId, VoiceFrequencies)> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                TestOp::StartVoice { slot, freqs } => Some((*slot, *freqs)),
                _ => None,
            })
            .collect()
    }

    /// Slots stopped, in order.
    pub fn voices_stopped(&self) -> Vec<SlotId> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                TestOp::StopVoice(slot) => Some(*slot),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: TestOp) -> BackendResult {
        self.ops.lock().unwrap().push(op);
        if self.fail {
            Err(BackendError("test backend failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for TestBackend {
    fn start_engine(&self) -> BackendResult {
        self.record(TestOp::StartEngine)
    }

    fn start_voice(&self, slot: SlotId, freqs: VoiceFrequencies) -> BackendResult {
        self.record(TestOp::StartVoice { slot, freqs })
    }

    fn stop_voice(&self, slot: SlotId) -> BackendResult {
        self.record(TestOp::StopVoice(slot))
    }

    fn set_voice_frequencies(&self, slot: SlotId, freqs: VoiceFrequencies) -> BackendResult {
        self.record(TestOp::SetVoiceFrequencies { slot, freqs })
    }

    fn set_effect_param(&self, param: EffectParam, value: f32) -> BackendResult {
        self.record(TestOp::SetEffectParam { param, value })
    }

    fn set_switch(&self, switch: EffectSwitch, enabled: bool) -> BackendResult {
        self.record(TestOp::SetSwitch { switch, enabled })
    }

    fn start_shared_effects(&self, chain: EffectChain) -> BackendResult {
        self.record(TestOp::StartSharedEffects(chain))
    }

    fn stop_shared_effects(&self) -> BackendResult {
        self.record(TestOp::StopSharedEffects)
    }
}

/// Wraps `Arc<TestBackend>` to implement `AudioBackend` so the controller can
/// own a boxed backend while the test keeps a handle for assertions.
pub struct SharedTestBackend(pub Arc<TestBackend>);

impl AudioBackend for SharedTestBackend {
    fn start_engine(&self) -> BackendResult {
        self.0.start_engine()
    }
    fn start_voice(&self, slot: SlotId, freqs: VoiceFrequencies) -> BackendResult {
        self.0.start_voice(slot, freqs)
    }
    fn stop_voice(&self, slot: SlotId) -> BackendResult {
        self.0.stop_voice(slot)
    }
    fn set_voice_frequencies(&self, slot: SlotId, freqs: VoiceFrequencies) -> BackendResult {
        self.0.set_voice_frequencies(slot, freqs)
    }
    fn set_effect_param(&self, param: EffectParam, value: f32) -> BackendResult {
        self.0.set_effect_param(param, value)
    }
    fn set_switch(&self, switch: EffectSwitch, enabled: bool) -> BackendResult {
        self.0.set_switch(switch, enabled)
    }
    fn start_shared_effects(&self, chain: EffectChain) -> BackendResult {
        self.0.start_shared_effects(chain)
    }
    fn stop_shared_effects(&self) -> BackendResult {
        self.0.stop_shared_effects()
    }
}

// ─── NullBackend ────────────────────────────────────────────────────

/// A no-op backend that silently succeeds. Useful when tuning is wanted
/// without sound.
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn start_engine(&self) -> BackendResult { Ok(()) }
    fn start_voice(&self, _: SlotId, _: VoiceFrequencies) -> BackendResult { Ok(()) }
    fn stop_voice(&self, _: SlotId) -> BackendResult { Ok(()) }
    fn set_voice_frequencies(&self, _: SlotId, _: VoiceFrequencies) -> BackendResult { Ok(()) }
    fn set_effect_param(&self, _: EffectParam, _: f32) -> BackendResult { Ok(()) }
    fn set_switch(&self, _: EffectSwitch, _: bool) -> BackendResult { Ok(()) }
    fn start_shared_effects(&self, _: EffectChain) -> BackendResult { Ok(()) }
    fn stop_shared_effects(&self) -> BackendResult { Ok(()) }
}
