use justdrones_types::{EffectChain, EffectParam, EffectSwitch, LfoShape, SubOctave};

use super::backend::VoiceFrequencies;
use crate::state::persistence::{self, KeyValueStore, KEY_SUB_OCTAVE};

/// Global synth state shared by every voice.
///
/// Values are kept in stored units (cutoff as a fraction of 2 kHz, phaser
/// depth and feedback in percent); `EffectParam::engine_value` converts on
/// the way to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectParameters {
    pub shape_balance: f32,
    pub osc1_morph: f32,
    pub osc2_morph: f32,
    pub cutoff: f32,
    pub resonance: f32,
    pub lfo_rate: f32,
    pub lfo_depth: f32,
    pub lfo_shape: f32,
    pub notch_floor: f32,
    pub notch_ceiling: f32,
    pub notch_frequency: f32,
    pub phaser_depth: f32,
    pub phaser_feedback: f32,
    pub phaser_rate: f32,
    pub master_gain: f32,
    pub filter: bool,
    pub phaser: bool,
    pub lfo: bool,
    pub sub: bool,
    pub sub_octave: SubOctave,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            shape_balance: 0.5,
            osc1_morph: 0.0,
            osc2_morph: 0.0,
            cutoff: 0.75,
            resonance: 0.25,
            lfo_rate: 1.0,
            lfo_depth: 1000.0,
            lfo_shape: 0.0,
            notch_floor: 1000.0,
            notch_ceiling: 5000.0,
            notch_frequency: 1.5,
            phaser_depth: 50.0,
            phaser_feedback: 20.0,
            phaser_rate: 30.0,
            master_gain: 0.0,
            filter: true,
            phaser: false,
            lfo: true,
            sub: true,
            sub_octave: SubOctave::Ottava,
        }
    }
}

impl EffectParameters {
    /// Load persisted values, falling back to `defaults` for anything missing
    /// or unusable.
    pub fn load(store: &dyn KeyValueStore, defaults: &EffectParameters) -> Self {
        let mut params = defaults.clone();
        for param in EffectParam::ALL {
            if let Some(value) = persistence::load_number(store, param.key()) {
                let value = value as f32;
                if value.is_finite() {
                    let bounded = params.bounded(param, value);
                    *params.slot_mut(param) = bounded;
                } else {
                    log::warn!(target: "store", "ignoring non-finite {}", param.key());
                }
            }
        }
        for switch in EffectSwitch::ALL {
            if let Some(enabled) = persistence::load_bool(store, switch.key()) {
                *params.switch_mut(switch) = enabled;
            }
        }
        if let Some(stored) = persistence::load_number(store, KEY_SUB_OCTAVE) {
            match SubOctave::from_multiplier(stored) {
                Some(octave) => params.sub_octave = octave,
                None => log::warn!(target: "store", "unknown sub octave {}", stored),
            }
        }
        if params.notch_ceiling < params.notch_floor {
            params.notch_ceiling = params.notch_floor;
        }
        params
    }

    pub fn get(&self, param: EffectParam) -> f32 {
        match param {
            EffectParam::ShapeBalance => self.shape_balance,
            EffectParam::Osc1Morph => self.osc1_morph,
            EffectParam::Osc2Morph => self.osc2_morph,
            EffectParam::Cutoff => self.cutoff,
            EffectParam::Resonance => self.resonance,
            EffectParam::LfoRate => self.lfo_rate,
            EffectParam::LfoDepth => self.lfo_depth,
            EffectParam::LfoShape => self.lfo_shape,
            EffectParam::NotchFloor => self.notch_floor,
            EffectParam::NotchCeiling => self.notch_ceiling,
            EffectParam::NotchFrequency => self.notch_frequency,
            EffectParam::PhaserDepth => self.phaser_depth,
            EffectParam::PhaserFeedback => self.phaser_feedback,
            EffectParam::PhaserRate => self.phaser_rate,
            EffectParam::MasterGain => self.master_gain,
        }
    }

    fn slot_mut(&mut self, param: EffectParam) -> &mut f32 {
        match param {
            EffectParam::ShapeBalance => &mut self.shape_balance,
            EffectParam::Osc1Morph => &mut self.osc1_morph,
            EffectParam::Osc2Morph => &mut self.osc2_morph,
            EffectParam::Cutoff => &mut self.cutoff,
            EffectParam::Resonance => &mut self.resonance,
            EffectParam::LfoRate => &mut self.lfo_rate,
            EffectParam::LfoDepth => &mut self.lfo_depth,
            EffectParam::LfoShape => &mut self.lfo_shape,
            EffectParam::NotchFloor => &mut self.notch_floor,
            EffectParam::NotchCeiling => &mut self.notch_ceiling,
            EffectParam::NotchFrequency => &mut self.notch_frequency,
            EffectParam::PhaserDepth => &mut self.phaser_depth,
            EffectParam::PhaserFeedback => &mut self.phaser_feedback,
            EffectParam::PhaserRate => &mut self.phaser_rate,
            EffectParam::MasterGain => &mut self.master_gain,
        }
    }

    pub fn switch(&self, switch: EffectSwitch) -> bool {
        match switch {
            EffectSwitch::Filter => self.filter,
            EffectSwitch::Phaser => self.phaser,
            EffectSwitch::Lfo => self.lfo,
            EffectSwitch::Sub => self.sub,
        }
    }

    fn switch_mut(&mut self, switch: EffectSwitch) -> &mut bool {
        match switch {
            EffectSwitch::Filter => &mut self.filter,
            EffectSwitch::Phaser => &mut self.phaser,
            EffectSwitch::Lfo => &mut self.lfo,
            EffectSwitch::Sub => &mut self.sub,
        }
    }

    /// Returns true if the switch changed.
    pub fn set_switch(&mut self, switch: EffectSwitch, enabled: bool) -> bool {
        let slot = self.switch_mut(switch);
        let changed = *slot != enabled;
        *slot = enabled;
        changed
    }

    /// Clamp into the legal range, including the floor-dependent ceiling bound.
    fn bounded(&self, param: EffectParam, value: f32) -> f32 {
        let clamped = param.clamp(value);
        match param {
            EffectParam::NotchCeiling => clamped.max(self.notch_floor),
            _ => clamped,
        }
    }

    /// Set a parameter, clamping into range. Returns every value that
    /// changed as a result; raising the notch floor above the ceiling drags
    /// the ceiling up with it. Non-finite input is ignored.
    pub fn set(&mut self, param: EffectParam, value: f32) -> Vec<(EffectParam, f32)> {
        if !value.is_finite() {
            return Vec::new();
        }
        let applied = self.bounded(param, value);
        *self.slot_mut(param) = applied;
        let mut changed = vec![(param, applied)];
        if param == EffectParam::NotchFloor && self.notch_ceiling < applied {
            self.notch_ceiling = applied;
            changed.push((EffectParam::NotchCeiling, applied));
        }
        changed
    }

    /// Shared effects that should run while any voice sounds.
    pub fn chain(&self) -> EffectChain {
        EffectChain {
            filter: self.filter,
            phaser: self.phaser,
        }
    }

    pub fn lfo_waveform(&self) -> LfoShape {
        LfoShape::from_index(self.lfo_shape)
    }

    /// Oscillator frequencies for a voice sounding `hz`.
    pub fn voice_frequencies(&self, hz: f64) -> VoiceFrequencies {
        VoiceFrequencies {
            osc1: hz,
            osc2: hz,
            sub: hz / self.sub_octave.divisor(),
        }
    }

    /// Every parameter in engine units, for pushing after engine start.
    pub fn engine_values(&self) -> Vec<(EffectParam, f32)> {
        EffectParam::ALL
            .into_iter()
            .map(|p| (p, p.engine_value(self.get(p))))
            .collect()
    }
}
