use justdrones_types::PitchId;

use super::backend::{SlotId, VoiceFrequencies};

/// Number of physical voices.
pub const MAX_VOICES: usize = 4;

/// What one voice slot is doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotState {
    Idle,
    Sounding {
        pitch: PitchId,
        freqs: VoiceFrequencies,
    },
}

/// Tracks which pitch each voice slot is sounding.
///
/// The allocator owns slot bookkeeping only; `VoiceController` sends the
/// matching engine commands.
pub struct VoiceAllocator {
    slots: [SlotState; MAX_VOICES],
}

impl VoiceAllocator {
    pub fn new() -> Self {
        Self {
            slots: [SlotState::Idle; MAX_VOICES],
        }
    }

    pub fn state(&self, slot: SlotId) -> Option<SlotState> {
        self.slots.get(slot.get()).copied()
    }

    /// Lowest-numbered idle slot.
    pub fn free_slot(&self) -> Option<SlotId> {
        self.slots
            .iter()
            .position(|s| matches!(s, SlotState::Idle))
            .map(SlotId::new)
    }

    /// Slot currently sounding `pitch`.
    pub fn slot_for(&self, pitch: PitchId) -> Option<SlotId> {
        self.slots
            .iter()
            .position(|s| matches!(s, SlotState::Sounding { pitch: p, .. } if *p == pitch))
            .map(SlotId::new)
    }

    /// Mark `slot` as sounding `pitch`, replacing whatever it held.
    pub fn assign(&mut self, slot: SlotId, pitch: PitchId, freqs: VoiceFrequencies) {
        if let Some(state) = self.slots.get_mut(slot.get()) {
            *state = SlotState::Sounding { pitch, freqs };
        }
    }

    /// Replace the frequencies of a sounding slot. Idle slots are left alone.
    pub fn update_frequencies(&mut self, slot: SlotId, new_freqs: VoiceFrequencies) -> bool {
        match self.slots.get_mut(slot.get()) {
            Some(SlotState::Sounding { freqs, .. }) => {
                *freqs = new_freqs;
                true
            }
            _ => false,
        }
    }

    /// Free the slot sounding `pitch`, if any.
    pub fn release(&mut self, pitch: PitchId) -> Option<SlotId> {
        let slot = self.slot_for(pitch)?;
        self.slots[slot.get()] = SlotState::Idle;
        Some(slot)
    }

    /// Free every sounding slot, returning the ones that were sounding.
    pub fn release_all(&mut self) -> Vec<SlotId> {
        let mut released = Vec::new();
        for (i, state) in self.slots.iter_mut().enumerate() {
            if matches!(state, SlotState::Sounding { .. }) {
                *state = SlotState::Idle;
                released.push(SlotId::new(i));
            }
        }
        released
    }

    /// All sounding slots with their pitch and frequencies.
    pub fn sounding(&self) -> impl Iterator<Item = (SlotId, PitchId, VoiceFrequencies)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| match s {
            SlotState::Sounding { pitch, freqs } => Some((SlotId::new(i), *pitch, *freqs)),
            SlotState::Idle => None,
        })
    }

    pub fn sounding_count(&self) -> usize {
        self.sounding().count()
    }
}

impl Default for VoiceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(hz: f64) -> VoiceFrequencies {
        VoiceFrequencies {
            osc1: hz,
            osc2: hz,
            sub: hz / 2.0,
        }
    }

    #[test]
    fn fills_lowest_slot_first() {
        let mut alloc = VoiceAllocator::new();
        let a = PitchId::next();
        let b = PitchId::next();
        let slot = alloc.free_slot().unwrap();
        assert_eq!(slot, SlotId::new(0));
        alloc.assign(slot, a, freqs(440.0));
        assert_eq!(alloc.free_slot(), Some(SlotId::new(1)));
        alloc.assign(SlotId::new(1), b, freqs(330.0));

        assert_eq!(alloc.release(a), Some(SlotId::new(0)));
        // freed slot is reused before higher ones
        assert_eq!(alloc.free_slot(), Some(SlotId::new(0)));
        assert_eq!(alloc.slot_for(b), Some(SlotId::new(1)));
    }

    #[test]
    fn full_pool_has_no_free_slot() {
        let mut alloc = VoiceAllocator::new();
        for i in 0..MAX_VOICES {
            alloc.assign(SlotId::new(i), PitchId::next(), freqs(100.0 * (i + 1) as f64));
        }
        assert_eq!(alloc.free_slot(), None);
        assert_eq!(alloc.sounding_count(), MAX_VOICES);
        assert_eq!(alloc.release_all().len(), MAX_VOICES);
        assert_eq!(alloc.sounding_count(), 0);
    }

    #[test]
    fn release_unknown_pitch_is_noop() {
        let mut alloc = VoiceAllocator::new();
        assert_eq!(alloc.release(PitchId::next()), None);
    }

    #[test]
    fn update_frequencies_only_touches_sounding_slots() {
        let mut alloc = VoiceAllocator::new();
        let a = PitchId::next();
        alloc.assign(SlotId::new(2), a, freqs(440.0));
        assert!(alloc.update_frequencies(SlotId::new(2), freqs(220.0)));
        assert!(!alloc.update_frequencies(SlotId::new(0), freqs(220.0)));
        assert_eq!(
            alloc.state(SlotId::new(2)),
            Some(SlotState::Sounding { pitch: a, freqs: freqs(220.0) })
        );
        assert_eq!(alloc.state(SlotId::new(9)), None);
    }
}
