//! The two pitch grids and the tuning parameters they are computed from.
//!
//! Every setter validates, mutates, recomputes and persists in one call.
//! Entry identities and coordinates never change; only frequencies do.

use std::fmt;
use std::ops::RangeInclusive;

use justdrones_types::naming::{self, NamingMode};
use justdrones_types::tuning::{self, PURE_FIFTH};
use justdrones_types::{PitchEntry, PitchId, Stop, Temperament};

use super::persistence::{self, SharedStore, KEY_DIAPASON, KEY_STOP, KEY_TEMPERED_FIFTH};
use crate::config::TuningDefaults;

pub const RECT_FIFTHS: RangeInclusive<i32> = -4..=4;
pub const RECT_THIRDS: RangeInclusive<i32> = -2..=2;
const RECT_ROWS: usize = 5;

/// Ring size and the fifths offset of its first entry.
pub const CIRCLE_LEN: usize = 24;
pub const CIRCLE_FIRST_FIFTH: i32 = -12;

/// Number of positions shown on the circle at once.
pub const CIRCLE_POSITIONS: usize = 12;

/// Why a tuning change was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum TuningError {
    InvalidReferencePitch(f64),
    InvalidStop(u32),
    UnknownTemperament(f64),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::InvalidReferencePitch(hz) => {
                write!(f, "reference pitch must be a positive frequency, got {}", hz)
            }
            TuningError::InvalidStop(feet) => write!(f, "{}' is not an organ stop", feet),
            TuningError::UnknownTemperament(ratio) => {
                write!(f, "{} is not a known fifth ratio", ratio)
            }
        }
    }
}

impl std::error::Error for TuningError {}

/// Rotation of the circle: which ring entry sits at each of the twelve
/// visible positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tonus(u8);

impl Tonus {
    pub fn new(value: u8) -> Option<Self> {
        (usize::from(value) < CIRCLE_POSITIONS).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Ring index shown at `position`.
    pub fn ring_index(self, position: usize) -> Option<usize> {
        (position < CIRCLE_POSITIONS).then(|| CIRCLE_POSITIONS + position - usize::from(self.0))
    }

    /// Name of the pitch at the middle position.
    pub fn name(self, mode: NamingMode) -> String {
        naming::note_name(naming::naming_index(6 - i32::from(self.0), 0), mode)
    }
}

impl Default for Tonus {
    fn default() -> Self {
        Self(6)
    }
}

/// Tuning parameters plus the rectangular and circular pitch grids.
pub struct TuningLattice {
    store: SharedStore,
    reference_pitch: f64,
    stop: Stop,
    temperament: Temperament,
    rectangular: Vec<PitchEntry>,
    circular: Vec<PitchEntry>,
}

impl TuningLattice {
    /// Build both grids from persisted parameters, falling back to `defaults`.
    pub fn new(store: SharedStore, defaults: &TuningDefaults) -> Self {
        let reference_pitch = match persistence::load_number(store.as_ref(), KEY_DIAPASON) {
            Some(hz) if valid_reference(hz) => hz,
            Some(hz) => {
                log::warn!(target: "tuning", "ignoring stored reference pitch {}", hz);
                defaults.reference_pitch
            }
            None => defaults.reference_pitch,
        };
        let stop = match persistence::load_number(store.as_ref(), KEY_STOP) {
            Some(feet) => stop_from_number(feet).unwrap_or_else(|| {
                log::warn!(target: "tuning", "ignoring stored stop {}", feet);
                defaults.stop
            }),
            None => defaults.stop,
        };
        let temperament = match persistence::load_number(store.as_ref(), KEY_TEMPERED_FIFTH) {
            Some(ratio) => Temperament::from_ratio(ratio).unwrap_or_else(|| {
                log::warn!(target: "tuning", "ignoring stored fifth ratio {}", ratio);
                defaults.temperament
            }),
            None => defaults.temperament,
        };

        let rectangular = RECT_FIFTHS
            .flat_map(|f| RECT_THIRDS.map(move |t| PitchEntry::new(f, t)))
            .collect();
        let circular = (0..CIRCLE_LEN as i32)
            .map(|i| PitchEntry::new(CIRCLE_FIRST_FIFTH + i, 0))
            .collect();

        let mut lattice = Self {
            store,
            reference_pitch,
            stop,
            temperament,
            rectangular,
            circular,
        };
        lattice.tune_rectangular();
        lattice.tune_circular();
        lattice
    }

    pub fn reference_pitch(&self) -> f64 {
        self.reference_pitch
    }

    pub fn stop(&self) -> Stop {
        self.stop
    }

    pub fn temperament(&self) -> Temperament {
        self.temperament
    }

    pub fn fifth_ratio(&self) -> f64 {
        self.temperament.fifth_ratio()
    }

    // ── Setters ─────────────────────────────────────────────────────

    pub fn set_reference_pitch(&mut self, hz: f64) -> Result<(), TuningError> {
        if !valid_reference(hz) {
            return Err(TuningError::InvalidReferencePitch(hz));
        }
        self.reference_pitch = hz;
        self.tune_rectangular();
        self.tune_circular();
        persistence::persist_number(self.store.as_ref(), KEY_DIAPASON, hz);
        Ok(())
    }

    /// Set the register by its length in feet.
    pub fn set_stop(&mut self, feet: u32) -> Result<(), TuningError> {
        let stop = Stop::from_feet(feet).ok_or(TuningError::InvalidStop(feet))?;
        self.set_stop_register(stop);
        Ok(())
    }

    pub fn set_stop_register(&mut self, stop: Stop) {
        self.stop = stop;
        self.tune_rectangular();
        self.tune_circular();
        persistence::persist_number(self.store.as_ref(), KEY_STOP, f64::from(stop.feet()));
    }

    /// Set the circle's fifth by ratio. Only the four named ratios are accepted.
    pub fn set_fifth_ratio(&mut self, ratio: f64) -> Result<(), TuningError> {
        let temperament =
            Temperament::from_ratio(ratio).ok_or(TuningError::UnknownTemperament(ratio))?;
        self.set_temperament(temperament);
        Ok(())
    }

    /// The rectangular grid always uses the pure fifth, so only the circle moves.
    pub fn set_temperament(&mut self, temperament: Temperament) {
        self.temperament = temperament;
        self.tune_circular();
        persistence::persist_number(
            self.store.as_ref(),
            KEY_TEMPERED_FIFTH,
            temperament.fifth_ratio(),
        );
    }

    fn tune_rectangular(&mut self) {
        let (reference, stop) = (self.reference_pitch, self.stop);
        for entry in &mut self.rectangular {
            entry.frequency =
                tuning::tuned_frequency(PURE_FIFTH, entry.fifths(), entry.thirds(), reference, stop);
        }
        log::debug!(target: "tuning", "rectangular lattice at {} Hz, {}'", reference, stop.feet());
    }

    fn tune_circular(&mut self) {
        let (reference, stop) = (self.reference_pitch, self.stop);
        let ratio = self.temperament.fifth_ratio();
        for entry in &mut self.circular {
            entry.frequency = tuning::tuned_frequency(ratio, entry.fifths(), 0, reference, stop);
        }
        log::debug!(
            target: "tuning",
            "circle at {} Hz, {}', {}",
            reference,
            stop.feet(),
            self.temperament.name()
        );
    }

    // ── Lookup ──────────────────────────────────────────────────────

    /// The 9×5 grid, fifths-major: all thirds for fifths −4, then −3, and so on.
    pub fn rectangular_lattice(&self) -> &[PitchEntry] {
        &self.rectangular
    }

    pub fn rectangular_entry(&self, fifths: i32, thirds: i32) -> Option<&PitchEntry> {
        if !RECT_FIFTHS.contains(&fifths) || !RECT_THIRDS.contains(&thirds) {
            return None;
        }
        let col = (fifths - RECT_FIFTHS.start()) as usize;
        let row = (thirds - RECT_THIRDS.start()) as usize;
        self.rectangular.get(col * RECT_ROWS + row)
    }

    /// The 24-entry ring, fifths −12 through 11.
    pub fn circular_lattice(&self) -> &[PitchEntry] {
        &self.circular
    }

    /// Ring entry shown at `position` (0..12) under `tonus`.
    pub fn circle_entry(&self, position: usize, tonus: Tonus) -> Option<&PitchEntry> {
        tonus.ring_index(position).and_then(|i| self.circular.get(i))
    }

    /// Find an entry of either grid by id.
    pub fn entry(&self, id: PitchId) -> Option<&PitchEntry> {
        self.rectangular
            .iter()
            .chain(self.circular.iter())
            .find(|e| e.id() == id)
    }
}

fn valid_reference(hz: f64) -> bool {
    hz.is_finite() && hz > 0.0
}

fn stop_from_number(value: f64) -> Option<Stop> {
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return None;
    }
    Stop::from_feet(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::persistence::{FailingStore, KeyValueStore, MemoryStore};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn defaults() -> TuningDefaults {
        TuningDefaults {
            reference_pitch: 440.0,
            stop: Stop::Eight,
            temperament: Temperament::Pure,
        }
    }

    fn lattice() -> (TuningLattice, SharedStore) {
        let store = MemoryStore::shared();
        (TuningLattice::new(Arc::clone(&store), &defaults()), store)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn grids_have_fixed_shape() {
        let (l, _) = lattice();
        assert_eq!(l.rectangular_lattice().len(), 45);
        assert_eq!(l.circular_lattice().len(), CIRCLE_LEN);
        assert_eq!(l.circular_lattice()[0].fifths(), -12);
        assert_eq!(l.circular_lattice()[23].fifths(), 11);
        assert!(l.circular_lattice().iter().all(|e| e.thirds() == 0));

        let e = l.rectangular_entry(-4, 2).unwrap();
        assert_eq!((e.fifths(), e.thirds()), (-4, 2));
        let e = l.rectangular_entry(3, -1).unwrap();
        assert_eq!((e.fifths(), e.thirds()), (3, -1));
        assert!(l.rectangular_entry(5, 0).is_none());
        assert!(l.rectangular_entry(0, -3).is_none());
    }

    #[test]
    fn fifth_above_reference_stays_at_660() {
        let (l, _) = lattice();
        assert!(close(l.rectangular_entry(1, 0).unwrap().frequency, 660.0));
        assert!(close(l.rectangular_entry(0, 0).unwrap().frequency, 440.0));
    }

    #[test]
    fn ids_survive_recomputation() {
        let (mut l, _) = lattice();
        let before: Vec<_> = l.rectangular_lattice().iter().map(|e| e.id()).collect();
        let circle_before: Vec<_> = l.circular_lattice().iter().map(|e| e.id()).collect();
        l.set_reference_pitch(415.0).unwrap();
        l.set_stop(16).unwrap();
        l.set_temperament(Temperament::Equal);
        let after: Vec<_> = l.rectangular_lattice().iter().map(|e| e.id()).collect();
        let circle_after: Vec<_> = l.circular_lattice().iter().map(|e| e.id()).collect();
        assert_eq!(before, after);
        assert_eq!(circle_before, circle_after);

        let all: HashSet<_> = after.iter().chain(circle_after.iter()).collect();
        assert_eq!(all.len(), 45 + 24);
    }

    #[test]
    fn reference_pitch_rescales_everything() {
        let (mut l, store) = lattice();
        l.set_reference_pitch(432.0).unwrap();
        assert!(close(l.rectangular_entry(0, 0).unwrap().frequency, 432.0));
        assert!(close(l.circular_lattice()[12].frequency, 432.0));
        assert_eq!(store.get_number(KEY_DIAPASON).unwrap(), Some(432.0));
    }

    #[test]
    fn invalid_values_leave_state_untouched() {
        let (mut l, store) = lattice();
        let snapshot: Vec<f64> = l.rectangular_lattice().iter().map(|e| e.frequency).collect();

        assert_eq!(l.set_reference_pitch(0.0), Err(TuningError::InvalidReferencePitch(0.0)));
        assert!(l.set_reference_pitch(-440.0).is_err());
        assert!(l.set_reference_pitch(f64::NAN).is_err());
        assert_eq!(l.set_stop(12), Err(TuningError::InvalidStop(12)));
        assert_eq!(l.set_fifth_ratio(1.49), Err(TuningError::UnknownTemperament(1.49)));

        assert_eq!(l.reference_pitch(), 440.0);
        assert_eq!(l.stop(), Stop::Eight);
        assert_eq!(l.temperament(), Temperament::Pure);
        let after: Vec<f64> = l.rectangular_lattice().iter().map(|e| e.frequency).collect();
        assert_eq!(snapshot, after);
        assert_eq!(store.get_number(KEY_DIAPASON).unwrap(), None);
    }

    #[test]
    fn temperament_only_moves_the_circle() {
        let (mut l, store) = lattice();
        let rect: Vec<f64> = l.rectangular_lattice().iter().map(|e| e.frequency).collect();
        let circle: Vec<f64> = l.circular_lattice().iter().map(|e| e.frequency).collect();

        l.set_fifth_ratio(Temperament::QuarterComma.fifth_ratio()).unwrap();
        assert_eq!(l.temperament(), Temperament::QuarterComma);

        let rect_after: Vec<f64> = l.rectangular_lattice().iter().map(|e| e.frequency).collect();
        let circle_after: Vec<f64> = l.circular_lattice().iter().map(|e| e.frequency).collect();
        assert_eq!(rect, rect_after);
        assert_ne!(circle, circle_after);
        // the reference itself never moves
        assert!(close(circle_after[12], 440.0));
        assert_eq!(
            store.get_number(KEY_TEMPERED_FIFTH).unwrap(),
            Some(Temperament::QuarterComma.fifth_ratio())
        );
    }

    #[test]
    fn stop_shifts_by_octaves() {
        let (mut l, store) = lattice();
        l.set_stop(16).unwrap();
        assert!(close(l.rectangular_entry(0, 0).unwrap().frequency, 220.0));
        l.set_stop(2).unwrap();
        assert!(close(l.rectangular_entry(0, 0).unwrap().frequency, 1760.0));
        assert!(close(l.circular_lattice()[12].frequency, 1760.0));
        assert_eq!(store.get_number(KEY_STOP).unwrap(), Some(2.0));
    }

    #[test]
    fn loads_persisted_parameters() {
        let store = MemoryStore::shared();
        store.set_number(KEY_DIAPASON, 415.0).unwrap();
        store.set_number(KEY_STOP, 4.0).unwrap();
        store
            .set_number(KEY_TEMPERED_FIFTH, Temperament::ThirdComma.fifth_ratio())
            .unwrap();
        let l = TuningLattice::new(store, &defaults());
        assert_eq!(l.reference_pitch(), 415.0);
        assert_eq!(l.stop(), Stop::Four);
        assert_eq!(l.temperament(), Temperament::ThirdComma);
        assert!(close(l.rectangular_entry(0, 0).unwrap().frequency, 830.0));
    }

    #[test]
    fn bad_persisted_values_fall_back() {
        let store = MemoryStore::shared();
        store.set_number(KEY_DIAPASON, -1.0).unwrap();
        store.set_number(KEY_STOP, 12.0).unwrap();
        store.set_number(KEY_TEMPERED_FIFTH, 1.4).unwrap();
        let l = TuningLattice::new(store, &defaults());
        assert_eq!(l.reference_pitch(), 440.0);
        assert_eq!(l.stop(), Stop::Eight);
        assert_eq!(l.temperament(), Temperament::Pure);

        let l = TuningLattice::new(Arc::new(FailingStore), &defaults());
        assert_eq!(l.reference_pitch(), 440.0);
    }

    #[test]
    fn frequencies_are_positive_and_banded() {
        let (mut l, _) = lattice();
        for t in Temperament::ALL {
            l.set_temperament(t);
            for e in l.rectangular_lattice().iter().chain(l.circular_lattice()) {
                assert!(e.frequency >= 440.0 * 5.0 / 6.0 - 1e-9, "{} too low", e.frequency);
                assert!(e.frequency < 440.0 * 5.0 / 3.0, "{} too high", e.frequency);
            }
        }
    }

    #[test]
    fn tonus_rotates_the_circle() {
        let (l, _) = lattice();
        let tonus = Tonus::default();
        assert_eq!(tonus.get(), 6);
        assert_eq!(tonus.ring_index(0), Some(6));
        assert_eq!(tonus.ring_index(11), Some(17));
        assert_eq!(tonus.ring_index(12), None);
        assert_eq!(l.circle_entry(6, tonus).unwrap().fifths(), 0);
        assert_eq!(tonus.name(NamingMode::English), "A");

        let c = Tonus::new(9).unwrap();
        assert_eq!(l.circle_entry(6, c).unwrap().fifths(), -3);
        assert_eq!(c.name(NamingMode::English), "C");
        assert!(Tonus::new(12).is_none());
        assert_eq!(Tonus::new(0).unwrap().ring_index(11), Some(23));
    }

    #[test]
    fn entry_lookup_spans_both_grids() {
        let (l, _) = lattice();
        let rect_id = l.rectangular_lattice()[7].id();
        let circle_id = l.circular_lattice()[3].id();
        assert_eq!(l.entry(rect_id).unwrap().id(), rect_id);
        assert_eq!(l.entry(circle_id).unwrap().fifths(), -9);
        assert!(l.entry(PitchId::next()).is_none());
    }
}
