pub mod backend;
pub mod controller;
pub mod effects;
pub mod voice_allocator;

pub use backend::{
    AudioBackend, BackendError, BackendResult, NullBackend, SharedTestBackend, SlotId, TestBackend,
    TestOp, VoiceFrequencies,
};
pub use controller::{EnqueueOutcome, VoiceController};
pub use effects::EffectParameters;
pub use voice_allocator::{SlotState, VoiceAllocator, MAX_VOICES};
