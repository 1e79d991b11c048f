//! # justdrones-types
//!
//! Shared type definitions and pure tuning logic for JustDrones.
//! Nothing in this crate holds state or talks to an audio engine; the
//! stateful pieces live in `justdrones-core`.

pub mod effects;
pub mod naming;
pub mod pitch;
pub mod tuning;

pub use effects::{EffectChain, EffectParam, EffectSwitch, LfoShape, SubOctave};
pub use naming::{DisplayMode, NamingMode};
pub use pitch::{ActivePitch, PitchEntry, PitchId, Preset, RecordedPitch};
pub use tuning::{Stop, Temperament};
