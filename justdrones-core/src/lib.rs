//! # justdrones-core
//!
//! Stateful side of JustDrones: the tuning lattice, the four-voice drone
//! controller, the recorder with its presets, and settings persistence.
//! Nothing here renders audio or draws UI; hosts supply an [`audio::AudioBackend`]
//! and a [`state::persistence::KeyValueStore`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use justdrones_core::audio::NullBackend;
//! use justdrones_core::config::Config;
//! use justdrones_core::session::DroneSession;
//! use justdrones_core::state::persistence::open_store;
//!
//! let config = Config::load();
//! let store = open_store(config.store_path().as_deref());
//! let mut session = DroneSession::new(Box::new(NullBackend), store, &config)?;
//!
//! let a = session.lattice().rectangular_entry(0, 0).unwrap().id();
//! session.activate(a);
//! session.set_reference_pitch(415.0)?; // the sounding A follows
//! ```
//!
//! ## Module Overview
//!
//! - [`session`]: `DroneSession`, the facade a UI talks to
//! - [`state`]: `TuningLattice`, `RecordingStore`, settings persistence
//! - [`audio`]: `VoiceController`, the voice pool, effect parameters, the
//!   `AudioBackend` trait and its test/null implementations
//! - [`config`]: TOML defaults with user overrides
//!
//! Pure tuning math and note naming live in `justdrones-types`.

pub mod audio;
pub mod config;
pub mod session;
pub mod state;

pub use audio::{AudioBackend, EnqueueOutcome, VoiceController};
pub use session::{DroneSession, TuningMode};
pub use state::{RecordingStore, Tonus, TuningLattice};
