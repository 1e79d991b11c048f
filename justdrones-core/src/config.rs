use std::path::PathBuf;

use serde::Deserialize;

use justdrones_types::{EffectParam, EffectSwitch, Stop, SubOctave, Temperament};

use crate::audio::EffectParameters;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    tuning: TuningConfig,
    #[serde(default)]
    synth: SynthConfig,
    #[serde(default)]
    storage: StorageConfig,
}

#[derive(Deserialize, Default)]
struct TuningConfig {
    reference_pitch: Option<f64>,
    stop: Option<u32>,
    temperament: Option<String>,
}

#[derive(Deserialize, Default)]
struct SynthConfig {
    filter: Option<bool>,
    phaser: Option<bool>,
    lfo: Option<bool>,
    sub: Option<bool>,
    sub_octave: Option<String>,
    shape_balance: Option<f32>,
    osc1_morph: Option<f32>,
    osc2_morph: Option<f32>,
    cutoff: Option<f32>,
    resonance: Option<f32>,
    lfo_rate: Option<f32>,
    lfo_depth: Option<f32>,
    lfo_shape: Option<f32>,
    notch_floor: Option<f32>,
    notch_ceiling: Option<f32>,
    notch_frequency: Option<f32>,
    phaser_depth: Option<f32>,
    phaser_feedback: Option<f32>,
    phaser_rate: Option<f32>,
    master_gain: Option<f32>,
}

#[derive(Deserialize, Default)]
struct StorageConfig {
    path: Option<PathBuf>,
}

/// Tuning parameters used when nothing usable has been persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningDefaults {
    pub reference_pitch: f64,
    pub stop: Stop,
    pub temperament: Temperament,
}

impl Default for TuningDefaults {
    fn default() -> Self {
        Self {
            reference_pitch: 440.0,
            stop: Stop::Sixteen,
            temperament: Temperament::Pure,
        }
    }
}

pub struct Config {
    tuning: TuningConfig,
    synth: SynthConfig,
    storage: StorageConfig,
}

impl Config {
    pub fn load() -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => merge(&mut base, user),
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            tuning: base.tuning,
            synth: base.synth,
            storage: base.storage,
        }
    }

    pub fn tuning_defaults(&self) -> TuningDefaults {
        let fallback = TuningDefaults::default();
        TuningDefaults {
            reference_pitch: match self.tuning.reference_pitch {
                Some(hz) if hz.is_finite() && hz > 0.0 => hz,
                Some(hz) => {
                    log::warn!(target: "config", "ignoring reference_pitch {}", hz);
                    fallback.reference_pitch
                }
                None => fallback.reference_pitch,
            },
            stop: self
                .tuning
                .stop
                .and_then(Stop::from_feet)
                .unwrap_or(fallback.stop),
            temperament: self
                .tuning
                .temperament
                .as_deref()
                .and_then(parse_temperament)
                .unwrap_or(fallback.temperament),
        }
    }

    /// Synth state used when nothing has been persisted. Values outside a
    /// parameter's range are clamped.
    pub fn effect_defaults(&self) -> EffectParameters {
        let mut params = EffectParameters::default();
        let s = &self.synth;
        let values = [
            (EffectParam::ShapeBalance, s.shape_balance),
            (EffectParam::Osc1Morph, s.osc1_morph),
            (EffectParam::Osc2Morph, s.osc2_morph),
            (EffectParam::Cutoff, s.cutoff),
            (EffectParam::Resonance, s.resonance),
            (EffectParam::LfoRate, s.lfo_rate),
            (EffectParam::LfoDepth, s.lfo_depth),
            (EffectParam::LfoShape, s.lfo_shape),
            (EffectParam::NotchFloor, s.notch_floor),
            (EffectParam::NotchCeiling, s.notch_ceiling),
            (EffectParam::NotchFrequency, s.notch_frequency),
            (EffectParam::PhaserDepth, s.phaser_depth),
            (EffectParam::PhaserFeedback, s.phaser_feedback),
            (EffectParam::PhaserRate, s.phaser_rate),
            (EffectParam::MasterGain, s.master_gain),
        ];
        for (param, value) in values {
            if let Some(value) = value {
                params.set(param, value);
            }
        }
        let switches = [
            (EffectSwitch::Filter, s.filter),
            (EffectSwitch::Phaser, s.phaser),
            (EffectSwitch::Lfo, s.lfo),
            (EffectSwitch::Sub, s.sub),
        ];
        for (switch, enabled) in switches {
            if let Some(enabled) = enabled {
                params.set_switch(switch, enabled);
            }
        }
        if let Some(octave) = s.sub_octave.as_deref().and_then(parse_sub_octave) {
            params.sub_octave = octave;
        }
        params
    }

    /// Where the settings database lives.
    pub fn store_path(&self) -> Option<PathBuf> {
        self.storage.path.clone().or_else(default_store_path)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("justdrones").join("config.toml"))
}

fn default_store_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("justdrones").join("settings.sqlite"))
}

fn take<T>(base: &mut Option<T>, user: Option<T>) {
    if user.is_some() {
        *base = user;
    }
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    let (b, u) = (&mut base.tuning, user.tuning);
    take(&mut b.reference_pitch, u.reference_pitch);
    take(&mut b.stop, u.stop);
    take(&mut b.temperament, u.temperament);

    let (b, u) = (&mut base.synth, user.synth);
    take(&mut b.filter, u.filter);
    take(&mut b.phaser, u.phaser);
    take(&mut b.lfo, u.lfo);
    take(&mut b.sub, u.sub);
    take(&mut b.sub_octave, u.sub_octave);
    take(&mut b.shape_balance, u.shape_balance);
    take(&mut b.osc1_morph, u.osc1_morph);
    take(&mut b.osc2_morph, u.osc2_morph);
    take(&mut b.cutoff, u.cutoff);
    take(&mut b.resonance, u.resonance);
    take(&mut b.lfo_rate, u.lfo_rate);
    take(&mut b.lfo_depth, u.lfo_depth);
    take(&mut b.lfo_shape, u.lfo_shape);
    take(&mut b.notch_floor, u.notch_floor);
    take(&mut b.notch_ceiling, u.notch_ceiling);
    take(&mut b.notch_frequency, u.notch_frequency);
    take(&mut b.phaser_depth, u.phaser_depth);
    take(&mut b.phaser_feedback, u.phaser_feedback);
    take(&mut b.phaser_rate, u.phaser_rate);
    take(&mut b.master_gain, u.master_gain);

    take(&mut base.storage.path, user.storage.path);
}

fn parse_temperament(s: &str) -> Option<Temperament> {
    match s {
        "Pure" | "pure" | "3/2" => Some(Temperament::Pure),
        "Equal" | "equal" | "ET" | "12-TET" => Some(Temperament::Equal),
        "1/4 Comma" | "QuarterComma" | "quarter-comma" => Some(Temperament::QuarterComma),
        "1/3 Comma" | "ThirdComma" | "third-comma" => Some(Temperament::ThirdComma),
        _ => None,
    }
}

fn parse_sub_octave(s: &str) -> Option<SubOctave> {
    match s {
        "8vb" | "Ottava" | "ottava" => Some(SubOctave::Ottava),
        "15mb" | "Quindicesima" | "quindicesima" => Some(SubOctave::Quindicesima),
        _ => None,
    }
}
