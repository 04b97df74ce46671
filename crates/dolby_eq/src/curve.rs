//! Bass and Treble Curves
//!
//! Bass and treble boosts are not separate effect parameters: they are
//! superimposed onto the canonical gain array. Changing a level or curve
//! removes the old contribution and adds the new one on the same array.
//!
//! Removal is not exact once a slot has been clamped at the gain limit; a
//! slot pinned at +150 loses whatever part of the boost was cut off.

use serde::{Deserialize, Serialize};

use crate::band::{clamp_gain, CanonicalGains, GAIN_SLOTS};
use crate::error::EqError;

/// Gain per level unit for bass curves (tenths of dB)
pub const BASS_GAIN_MULTIPLIER: f32 = 1.4;

/// Gain per level unit for the treble shelf (tenths of dB)
pub const TREBLE_GAIN_MULTIPLIER: f32 = 1.2;

/// Canonical slots boosted by the treble shelf (top six)
pub const TREBLE_SLOTS: std::ops::Range<usize> = 14..GAIN_SLOTS;

/// Highest accepted bass/treble level
pub const MAX_LEVEL: u8 = 100;

/// Weight vectors, one per bass curve
const BASS_CURVE_WEIGHTS: [[f32; GAIN_SLOTS]; 3] = [
    // Deep: strongest at the very bottom, rolls off by 500 Hz
    [
        1.00, 0.95, 0.85, 0.70, 0.50, 0.30, 0.15, 0.05, 0.0, 0.0, //
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ],
    // Punchy: centered on the kick drum region
    [
        0.60, 0.80, 1.00, 0.90, 0.70, 0.45, 0.20, 0.05, 0.0, 0.0, //
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ],
    // Warm: broad low-mid lift
    [
        0.50, 0.60, 0.70, 0.80, 0.85, 0.80, 0.65, 0.45, 0.25, 0.10, //
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ],
];

/// Named bass curve shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BassCurve {
    #[default]
    Deep,
    Punchy,
    Warm,
}

impl BassCurve {
    pub const ALL: [BassCurve; 3] = [BassCurve::Deep, BassCurve::Punchy, BassCurve::Warm];

    /// Curve for a persisted id; unknown ids fall back to the first curve
    pub fn from_id(id: i32) -> Self {
        match id {
            1 => BassCurve::Punchy,
            2 => BassCurve::Warm,
            _ => BassCurve::Deep,
        }
    }

    pub fn id(self) -> i32 {
        match self {
            BassCurve::Deep => 0,
            BassCurve::Punchy => 1,
            BassCurve::Warm => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BassCurve::Deep => "Deep",
            BassCurve::Punchy => "Punchy",
            BassCurve::Warm => "Warm",
        }
    }

    pub fn weights(self) -> &'static [f32; GAIN_SLOTS] {
        &BASS_CURVE_WEIGHTS[self.id() as usize]
    }
}

/// Whether a contribution is being added or taken back out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Add,
    Remove,
}

impl Direction {
    fn sign(self) -> f32 {
        match self {
            Direction::Add => 1.0,
            Direction::Remove => -1.0,
        }
    }
}

/// Check a user-supplied bass/treble level
pub fn validate_level(level: i32) -> Result<u8, EqError> {
    if (0..=MAX_LEVEL as i32).contains(&level) {
        Ok(level as u8)
    } else {
        Err(EqError::LevelOutOfRange(level))
    }
}

#[inline]
fn shift_slot(gains: &mut CanonicalGains, slot: usize, delta: f32) {
    let delta = delta.round() as i32;
    if delta != 0 {
        gains[slot] = clamp_gain(gains[slot].saturating_add(delta));
    }
}

/// Add or remove a bass curve contribution in place
pub fn apply_bass_curve(gains: &mut CanonicalGains, level: u8, curve: BassCurve, direction: Direction) {
    let scale = level as f32 * BASS_GAIN_MULTIPLIER * direction.sign();
    for (slot, &weight) in curve.weights().iter().enumerate() {
        if weight > 0.0 {
            shift_slot(gains, slot, scale * weight);
        }
    }
}

/// Add or remove the treble shelf in place
pub fn apply_treble(gains: &mut CanonicalGains, level: u8, direction: Direction) {
    let delta = level as f32 * TREBLE_GAIN_MULTIPLIER * direction.sign();
    for slot in TREBLE_SLOTS {
        shift_slot(gains, slot, delta);
    }
}

/// Swap one bass setting for another: remove `old`, then add `new`
pub fn replace_bass_curve(
    gains: &mut CanonicalGains,
    old: (u8, BassCurve),
    new: (u8, BassCurve),
) {
    apply_bass_curve(gains, old.0, old.1, Direction::Remove);
    apply_bass_curve(gains, new.0, new.1, Direction::Add);
}

/// Swap one treble level for another: remove `old`, then add `new`
pub fn replace_treble(gains: &mut CanonicalGains, old: u8, new: u8) {
    apply_treble(gains, old, Direction::Remove);
    apply_treble(gains, new, Direction::Add);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::{MAX_GAIN, MIN_GAIN};

    #[test]
    fn test_bass_curve_slot_zero() {
        let mut gains = [0; GAIN_SLOTS];
        apply_bass_curve(&mut gains, 50, BassCurve::Deep, Direction::Add);
        assert_eq!(gains[0], 70);
        assert!(gains[8..].iter().all(|&g| g == 0));

        let mut gains = [0; GAIN_SLOTS];
        apply_bass_curve(&mut gains, 20, BassCurve::Deep, Direction::Add);
        // 20 * 1.4 * 0.95 = 26.6
        assert_eq!(gains[1], 27);
    }

    #[test]
    fn test_bass_add_then_remove_restores() {
        let original: CanonicalGains = core::array::from_fn(|i| i as i32 * 3 - 30);
        for curve in BassCurve::ALL {
            let mut gains = original;
            apply_bass_curve(&mut gains, 73, curve, Direction::Add);
            assert_ne!(gains, original);
            apply_bass_curve(&mut gains, 73, curve, Direction::Remove);
            assert_eq!(gains, original, "{}", curve.name());
        }
    }

    #[test]
    fn test_bass_clamps_and_loses_energy() {
        let mut gains = [0; GAIN_SLOTS];
        gains[0] = 100;
        apply_bass_curve(&mut gains, 100, BassCurve::Deep, Direction::Add);
        assert_eq!(gains[0], MAX_GAIN);

        // Taking the boost back out does not return to 100
        apply_bass_curve(&mut gains, 100, BassCurve::Deep, Direction::Remove);
        assert_eq!(gains[0], MAX_GAIN - 140);
    }

    #[test]
    fn test_negative_clamp() {
        let mut gains = [MIN_GAIN + 10; GAIN_SLOTS];
        apply_treble(&mut gains, 100, Direction::Remove);
        assert!(gains[TREBLE_SLOTS].iter().all(|&g| g == MIN_GAIN));
        assert_eq!(gains[0], MIN_GAIN + 10);
    }

    #[test]
    fn test_shift_saturates_on_unclamped_input() {
        let mut gains = [i32::MAX; GAIN_SLOTS];
        apply_treble(&mut gains, 100, Direction::Add);
        assert!(gains[TREBLE_SLOTS].iter().all(|&g| g == MAX_GAIN));

        let mut gains = [i32::MIN; GAIN_SLOTS];
        apply_bass_curve(&mut gains, 100, BassCurve::Deep, Direction::Remove);
        assert_eq!(gains[0], MIN_GAIN);
    }

    #[test]
    fn test_treble_only_touches_top_slots() {
        let mut gains = [0; GAIN_SLOTS];
        apply_treble(&mut gains, 50, Direction::Add);
        assert!(gains[..14].iter().all(|&g| g == 0));
        assert!(gains[14..].iter().all(|&g| g == 60));
    }

    #[test]
    fn test_replace_bass_curve() {
        let mut gains = [0; GAIN_SLOTS];
        apply_bass_curve(&mut gains, 40, BassCurve::Deep, Direction::Add);
        replace_bass_curve(&mut gains, (40, BassCurve::Deep), (40, BassCurve::Punchy));

        let mut expected = [0; GAIN_SLOTS];
        apply_bass_curve(&mut expected, 40, BassCurve::Punchy, Direction::Add);
        assert_eq!(gains, expected);
    }

    #[test]
    fn test_replace_treble() {
        let mut gains = [10; GAIN_SLOTS];
        apply_treble(&mut gains, 20, Direction::Add);
        replace_treble(&mut gains, 20, 0);
        assert_eq!(gains, [10; GAIN_SLOTS]);
    }

    #[test]
    fn test_validate_level() {
        assert_eq!(validate_level(0), Ok(0));
        assert_eq!(validate_level(100), Ok(100));
        assert_eq!(validate_level(101), Err(EqError::LevelOutOfRange(101)));
        assert_eq!(validate_level(-1), Err(EqError::LevelOutOfRange(-1)));
    }

    #[test]
    fn test_unknown_curve_falls_back() {
        assert_eq!(BassCurve::from_id(42), BassCurve::Deep);
        assert_eq!(BassCurve::from_id(-1), BassCurve::Deep);
        for curve in BassCurve::ALL {
            assert_eq!(BassCurve::from_id(curve.id()), curve);
        }
    }
}
