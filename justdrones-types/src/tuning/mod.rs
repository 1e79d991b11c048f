//! Tuning math: lattice coordinates to frequencies for several fifth temperaments.
//!
//! Pure functions with no audio dependencies.

use serde::{Deserialize, Serialize};

/// The pure fifth. The rectangular lattice always uses it.
pub const PURE_FIFTH: f64 = 3.0 / 2.0;

/// The pure major third. Thirds are never tempered.
pub const PURE_THIRD: f64 = 5.0 / 4.0;

/// Lower edge of the fold band, relative to the reference pitch.
pub const BAND_LOW: f64 = 5.0 / 6.0;
/// Upper edge of the fold band, relative to the reference pitch.
pub const BAND_HIGH: f64 = 6.0 / 5.0;

/// Reference pitches offered by pickers. Any positive pitch is accepted.
pub const STANDARD_DIAPASONS: [u32; 14] = [
    415, 422, 423, 432, 435, 436, 439, 440, 441, 442, 443, 444, 445, 446,
];

/// Size of the fifth used by the circle-of-fifths lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Temperament {
    /// Pure 3/2
    #[default]
    Pure,
    /// 12-tone equal temperament, 2^(7/12)
    Equal,
    /// Quarter-comma meantone, 5^(1/4)
    QuarterComma,
    /// Third-comma meantone, (10/3)^(1/3)
    ThirdComma,
}

impl Temperament {
    pub const ALL: [Temperament; 4] = [
        Temperament::Pure,
        Temperament::Equal,
        Temperament::QuarterComma,
        Temperament::ThirdComma,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Temperament::Pure => "Pure",
            Temperament::Equal => "Equal",
            Temperament::QuarterComma => "1/4 Comma",
            Temperament::ThirdComma => "1/3 Comma",
        }
    }

    pub fn fifth_ratio(&self) -> f64 {
        match self {
            Temperament::Pure => PURE_FIFTH,
            Temperament::Equal => 2.0_f64.powf(7.0 / 12.0),
            Temperament::QuarterComma => 5.0_f64.powf(0.25),
            Temperament::ThirdComma => (10.0_f64 / 3.0).powf(1.0 / 3.0),
        }
    }

    /// Recover a temperament from a stored fifth ratio.
    pub fn from_ratio(ratio: f64) -> Option<Temperament> {
        Temperament::ALL
            .into_iter()
            .find(|t| (t.fifth_ratio() - ratio).abs() < 1e-9)
    }
}

/// Organ stop in feet. 8' sounds at written pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stop {
    Two,
    Four,
    Eight,
    Sixteen,
    ThirtyTwo,
    SixtyFour,
}

impl Stop {
    pub const ALL: [Stop; 6] = [
        Stop::Two,
        Stop::Four,
        Stop::Eight,
        Stop::Sixteen,
        Stop::ThirtyTwo,
        Stop::SixtyFour,
    ];

    pub fn feet(&self) -> u32 {
        match self {
            Stop::Two => 2,
            Stop::Four => 4,
            Stop::Eight => 8,
            Stop::Sixteen => 16,
            Stop::ThirtyTwo => 32,
            Stop::SixtyFour => 64,
        }
    }

    pub fn from_feet(feet: u32) -> Option<Stop> {
        Stop::ALL.into_iter().find(|s| s.feet() == feet)
    }

    /// Octaves above written pitch: `3 - log2(feet)`.
    pub fn octave_shift(&self) -> i32 {
        3 - self.feet().trailing_zeros() as i32
    }
}

impl Default for Stop {
    fn default() -> Self {
        Stop::Sixteen
    }
}

/// Raw frequency of a lattice coordinate before octave folding.
///
/// Fifths use `ratio`, thirds always use the pure 5/4.
pub fn frequency(ratio: f64, fifths: i32, thirds: i32, reference: f64) -> f64 {
    let fifth_power = ratio.powf(f64::from(fifths.unsigned_abs()));
    let third_power = PURE_THIRD.powf(f64::from(thirds.unsigned_abs()));
    let mut freq = reference;
    if fifths < 0 {
        freq /= fifth_power;
    } else {
        freq *= fifth_power;
    }
    if thirds < 0 {
        freq /= third_power;
    } else {
        freq *= third_power;
    }
    freq
}

/// Fold `freq` toward the reference band, then transpose by the stop.
///
/// Halves while above `reference * 6/5`, then doubles while below
/// `reference * 5/6`. The band is narrower than an octave, so the folded
/// value lands in `[reference * 5/6, reference * 5/3)`.
pub fn normalize(freq: f64, reference: f64, stop: Stop) -> f64 {
    if !(freq > 0.0 && freq.is_finite() && reference > 0.0) {
        return freq;
    }
    let lower = reference * BAND_LOW;
    let upper = reference * BAND_HIGH;

    let mut folded = freq;
    while folded > upper {
        folded /= 2.0;
    }
    while folded < lower {
        folded *= 2.0;
    }

    let shift = stop.octave_shift();
    let power = 2.0_f64.powi(shift.abs());
    if shift < 0 {
        folded / power
    } else {
        folded * power
    }
}

/// Frequency of a lattice coordinate as it should sound.
pub fn tuned_frequency(ratio: f64, fifths: i32, thirds: i32, reference: f64, stop: Stop) -> f64 {
    normalize(frequency(ratio, fifths, thirds, reference), reference, stop)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A4: f64 = 440.0;

    #[test]
    fn pure_fifth_above_a() {
        let freq = frequency(Temperament::Pure.fifth_ratio(), 1, 0, A4);
        assert!((freq - 660.0).abs() < 1e-10);
    }

    #[test]
    fn fold_settles_at_660_on_eight_foot() {
        // 660 halves to 330, which is under the band, so it doubles back
        let freq = normalize(660.0, A4, Stop::Eight);
        assert!((freq - 660.0).abs() < 1e-10);
    }

    #[test]
    fn thirds_are_always_pure() {
        for t in Temperament::ALL {
            let freq = frequency(t.fifth_ratio(), 0, 1, A4);
            assert!((freq - 550.0).abs() < 1e-10, "{:?}", t);
        }
        let down = frequency(1.5, 0, -2, A4);
        assert!((down - A4 / 1.5625).abs() < 1e-10);
    }

    #[test]
    fn fifths_and_thirds_commute() {
        let a = frequency(1.5, 3, -2, A4);
        let b = A4 * 1.5_f64.powi(3) / 1.25_f64.powi(2);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn stop_shifts() {
        assert_eq!(Stop::Two.octave_shift(), 2);
        assert_eq!(Stop::Four.octave_shift(), 1);
        assert_eq!(Stop::Eight.octave_shift(), 0);
        assert_eq!(Stop::Sixteen.octave_shift(), -1);
        assert_eq!(Stop::ThirtyTwo.octave_shift(), -2);
        assert_eq!(Stop::SixtyFour.octave_shift(), -3);
        assert_eq!(Stop::from_feet(12), None);
        assert_eq!(Stop::from_feet(32), Some(Stop::ThirtyTwo));
    }

    #[test]
    fn stop_transposes_by_exact_octaves() {
        let unison = normalize(A4, A4, Stop::Eight);
        assert_eq!(unison, A4);
        assert_eq!(normalize(A4, A4, Stop::Sixteen), 220.0);
        assert_eq!(normalize(A4, A4, Stop::Two), 1760.0);
        assert_eq!(normalize(A4, A4, Stop::SixtyFour), 55.0);
    }

    #[test]
    fn folded_pitch_stays_near_reference() {
        for t in Temperament::ALL {
            for f in -50..=50 {
                let freq = normalize(frequency(t.fifth_ratio(), f, 0, A4), A4, Stop::Eight);
                assert!(freq >= A4 * BAND_LOW - 1e-9, "{:?} {} -> {}", t, f, freq);
                assert!(freq < A4 * 2.0 * BAND_LOW, "{:?} {} -> {}", t, f, freq);
            }
        }
    }

    #[test]
    fn tuned_pitch_is_positive_for_every_stop() {
        for t in Temperament::ALL {
            for f in -50..=50 {
                for stop in Stop::ALL {
                    let freq = tuned_frequency(t.fifth_ratio(), f, 0, A4, stop);
                    assert!(freq > 0.0 && freq.is_finite());
                }
            }
        }
    }

    #[test]
    fn raw_frequency_rises_with_fifths() {
        for t in Temperament::ALL {
            let ratio = t.fifth_ratio();
            for f in -50..50 {
                assert!(frequency(ratio, f + 1, 0, A4) > frequency(ratio, f, 0, A4));
            }
        }
    }

    #[test]
    fn temperament_ratio_round_trip() {
        for t in Temperament::ALL {
            assert_eq!(Temperament::from_ratio(t.fifth_ratio()), Some(t));
        }
        assert_eq!(Temperament::from_ratio(1.4), None);
    }

    #[test]
    fn equal_fifths_close_the_circle() {
        let ratio = Temperament::Equal.fifth_ratio();
        let twelve = frequency(ratio, 12, 0, A4);
        assert!((twelve / A4 - 128.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_input_is_returned_unchanged() {
        assert_eq!(normalize(0.0, A4, Stop::Eight), 0.0);
        assert!(normalize(f64::NAN, A4, Stop::Eight).is_nan());
    }
}
