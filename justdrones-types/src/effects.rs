//! Synth parameter vocabulary shared by the voice controller, config and backends.

use serde::{Deserialize, Serialize};

/// Continuous synth parameters. Each has a fixed legal range; the notch
/// ceiling is additionally bounded below by the current notch floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectParam {
    ShapeBalance,
    Osc1Morph,
    Osc2Morph,
    Cutoff,
    Resonance,
    LfoRate,
    LfoDepth,
    LfoShape,
    NotchFloor,
    NotchCeiling,
    NotchFrequency,
    PhaserDepth,
    PhaserFeedback,
    PhaserRate,
    MasterGain,
}

impl EffectParam {
    pub const ALL: [EffectParam; 15] = [
        EffectParam::ShapeBalance,
        EffectParam::Osc1Morph,
        EffectParam::Osc2Morph,
        EffectParam::Cutoff,
        EffectParam::Resonance,
        EffectParam::LfoRate,
        EffectParam::LfoDepth,
        EffectParam::LfoShape,
        EffectParam::NotchFloor,
        EffectParam::NotchCeiling,
        EffectParam::NotchFrequency,
        EffectParam::PhaserDepth,
        EffectParam::PhaserFeedback,
        EffectParam::PhaserRate,
        EffectParam::MasterGain,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EffectParam::ShapeBalance => "Balance",
            EffectParam::Osc1Morph => "Osc 1 Morph",
            EffectParam::Osc2Morph => "Osc 2 Morph",
            EffectParam::Cutoff => "Cutoff",
            EffectParam::Resonance => "Resonance",
            EffectParam::LfoRate => "LFO Rate",
            EffectParam::LfoDepth => "LFO Depth",
            EffectParam::LfoShape => "LFO Shape",
            EffectParam::NotchFloor => "Notch Floor",
            EffectParam::NotchCeiling => "Notch Ceiling",
            EffectParam::NotchFrequency => "Notch Frequency",
            EffectParam::PhaserDepth => "Phaser Depth",
            EffectParam::PhaserFeedback => "Phaser Feedback",
            EffectParam::PhaserRate => "Phaser Rate",
            EffectParam::MasterGain => "Master Gain",
        }
    }

    /// Persistence key.
    pub fn key(&self) -> &'static str {
        match self {
            EffectParam::ShapeBalance => "synth.shapeBalance",
            EffectParam::Osc1Morph => "synth.O1Morph",
            EffectParam::Osc2Morph => "synth.O2Morph",
            EffectParam::Cutoff => "synth.cutoffFrequency",
            EffectParam::Resonance => "synth.resonance",
            EffectParam::LfoRate => "synth.lfoFrequency",
            EffectParam::LfoDepth => "synth.lfoDepth",
            EffectParam::LfoShape => "synth.lfoIndex",
            EffectParam::NotchFloor => "synth.notchFloor",
            EffectParam::NotchCeiling => "synth.notchCeiling",
            EffectParam::NotchFrequency => "synth.notchFrequency",
            EffectParam::PhaserDepth => "synth.phaserDepth",
            EffectParam::PhaserFeedback => "synth.phaserFeedback",
            EffectParam::PhaserRate => "synth.lfoBPM",
            EffectParam::MasterGain => "synth.compressorGain",
        }
    }

    /// Static legal range as `(min, max)`.
    pub fn range(&self) -> (f32, f32) {
        match self {
            EffectParam::ShapeBalance => (0.0, 1.0),
            EffectParam::Osc1Morph | EffectParam::Osc2Morph => (0.0, 3.0),
            EffectParam::Cutoff => (0.0, 1.0),
            EffectParam::Resonance => (0.0, 1.0),
            EffectParam::LfoRate => (0.0, 20.0),
            EffectParam::LfoDepth => (0.0, 2000.0),
            EffectParam::LfoShape => (0.0, 3.0),
            EffectParam::NotchFloor => (20.0, 5000.0),
            EffectParam::NotchCeiling => (20.0, 10000.0),
            EffectParam::NotchFrequency => (1.1, 4.0),
            EffectParam::PhaserDepth | EffectParam::PhaserFeedback => (0.0, 100.0),
            EffectParam::PhaserRate => (24.0, 360.0),
            EffectParam::MasterGain => (-12.0, 6.0),
        }
    }

    /// Clamp into the static range. LFO shape snaps to a whole index.
    pub fn clamp(&self, value: f32) -> f32 {
        let (min, max) = self.range();
        let clamped = value.clamp(min, max);
        match self {
            EffectParam::LfoShape => clamped.round(),
            _ => clamped,
        }
    }

    /// Convert a stored value into the unit the audio engine expects.
    pub fn engine_value(&self, value: f32) -> f32 {
        match self {
            // stored as a fraction of 2 kHz
            EffectParam::Cutoff => value * 2000.0,
            EffectParam::PhaserDepth | EffectParam::PhaserFeedback => value / 100.0,
            _ => value,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            EffectParam::LfoRate | EffectParam::LfoDepth => "Hz",
            EffectParam::NotchFloor | EffectParam::NotchCeiling | EffectParam::NotchFrequency => "Hz",
            EffectParam::PhaserDepth | EffectParam::PhaserFeedback => "%",
            EffectParam::PhaserRate => "BPM",
            EffectParam::MasterGain => "dB",
            _ => "",
        }
    }
}

/// On/off switches in the shared chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectSwitch {
    Filter,
    Phaser,
    Lfo,
    Sub,
}

impl EffectSwitch {
    pub const ALL: [EffectSwitch; 4] = [
        EffectSwitch::Filter,
        EffectSwitch::Phaser,
        EffectSwitch::Lfo,
        EffectSwitch::Sub,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            EffectSwitch::Filter => "synth.isFilter",
            EffectSwitch::Phaser => "synth.isPhaser",
            EffectSwitch::Lfo => "synth.isLFO",
            EffectSwitch::Sub => "synth.isSub",
        }
    }
}

/// Which shared effects run while at least one voice sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectChain {
    pub filter: bool,
    pub phaser: bool,
}

impl EffectChain {
    pub fn is_empty(&self) -> bool {
        !self.filter && !self.phaser
    }
}

/// How far below the fundamental the sub-oscillator sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubOctave {
    /// One octave down (8vb)
    #[default]
    Ottava,
    /// Two octaves down (15mb)
    Quindicesima,
}

impl SubOctave {
    pub const ALL: [SubOctave; 2] = [SubOctave::Ottava, SubOctave::Quindicesima];

    pub fn name(&self) -> &'static str {
        match self {
            SubOctave::Ottava => "8vb",
            SubOctave::Quindicesima => "15mb",
        }
    }

    pub fn divisor(&self) -> f64 {
        match self {
            SubOctave::Ottava => 2.0,
            SubOctave::Quindicesima => 4.0,
        }
    }

    /// Stored form: the multiplier applied to the fundamental.
    pub fn multiplier(&self) -> f64 {
        1.0 / self.divisor()
    }

    pub fn from_multiplier(value: f64) -> Option<SubOctave> {
        SubOctave::ALL
            .into_iter()
            .find(|s| (s.multiplier() - value).abs() < 1e-6)
    }
}

/// LFO waveform, by morph index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LfoShape {
    Sine,
    Square,
    Saw,
    ReverseSaw,
}

impl LfoShape {
    pub const ALL: [LfoShape; 4] = [
        LfoShape::Sine,
        LfoShape::Square,
        LfoShape::Saw,
        LfoShape::ReverseSaw,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LfoShape::Sine => "Sine",
            LfoShape::Square => "Square",
            LfoShape::Saw => "Sawtooth",
            LfoShape::ReverseSaw => "Reverse Sawtooth",
        }
    }

    pub fn index(&self) -> f32 {
        match self {
            LfoShape::Sine => 0.0,
            LfoShape::Square => 1.0,
            LfoShape::Saw => 2.0,
            LfoShape::ReverseSaw => 3.0,
        }
    }

    pub fn from_index(index: f32) -> LfoShape {
        match EffectParam::LfoShape.clamp(index) as u8 {
            0 => LfoShape::Sine,
            1 => LfoShape::Square,
            2 => LfoShape::Saw,
            _ => LfoShape::ReverseSaw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<&str> = EffectParam::ALL.iter().map(|p| p.key()).collect();
        keys.extend(EffectSwitch::ALL.iter().map(|s| s.key()));
        let count = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), count);
    }

    #[test]
    fn clamps_to_range() {
        assert_eq!(EffectParam::Cutoff.clamp(1.5), 1.0);
        assert_eq!(EffectParam::NotchFloor.clamp(5.0), 20.0);
        assert_eq!(EffectParam::PhaserRate.clamp(400.0), 360.0);
        assert_eq!(EffectParam::MasterGain.clamp(-30.0), -12.0);
        assert_eq!(EffectParam::LfoShape.clamp(1.6), 2.0);
    }

    #[test]
    fn engine_scaling() {
        assert_eq!(EffectParam::Cutoff.engine_value(0.75), 1500.0);
        assert_eq!(EffectParam::PhaserDepth.engine_value(50.0), 0.5);
        assert_eq!(EffectParam::Resonance.engine_value(0.25), 0.25);
    }

    #[test]
    fn sub_octave_multiplier_round_trip() {
        assert_eq!(SubOctave::from_multiplier(0.5), Some(SubOctave::Ottava));
        assert_eq!(SubOctave::from_multiplier(0.25), Some(SubOctave::Quindicesima));
        assert_eq!(SubOctave::from_multiplier(0.3), None);
        assert_eq!(SubOctave::Quindicesima.divisor(), 4.0);
    }

    #[test]
    fn lfo_shape_from_index() {
        assert_eq!(LfoShape::from_index(0.0), LfoShape::Sine);
        assert_eq!(LfoShape::from_index(2.2), LfoShape::Saw);
        assert_eq!(LfoShape::from_index(9.0), LfoShape::ReverseSaw);
        assert_eq!(LfoShape::from_index(-1.0), LfoShape::Sine);
    }
}
