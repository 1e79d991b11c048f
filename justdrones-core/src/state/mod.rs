pub mod lattice;
pub mod persistence;
pub mod recording;

pub use lattice::{Tonus, TuningError, TuningLattice};
pub use persistence::{KeyValueStore, MemoryStore, SharedStore, SqliteStore, StoreError};
pub use recording::{PresetError, RecordingStore};
