//! Band Modes and Gain Values
//!
//! The effect consumes a fixed 20-slot gain array. The UI can expose 10, 15 or
//! 20 sliders; each mode projects its bands onto a subset of those slots.

use serde::{Deserialize, Serialize};

use crate::error::EqError;

/// Number of slots in the canonical gain array consumed by the effect
pub const GAIN_SLOTS: usize = 20;

/// Lowest gain accepted by the effect (tenths of dB)
pub const MIN_GAIN: i32 = -150;

/// Highest gain accepted by the effect (tenths of dB)
pub const MAX_GAIN: i32 = 150;

/// Canonical gain array, the wire format of the `GEQ_BAND_GAINS` parameter
pub type CanonicalGains = [i32; GAIN_SLOTS];

/// Center frequencies of the 20 canonical slots (Hz)
pub const TWENTY_BAND_FREQUENCIES: [u32; 20] = [
    32, 47, 64, 94, 125, 187, 250, 375, 500, 750, // Low end
    1000, 1500, 2000, 3000, 4000, 6000, 8000, 12000, 16000, 19500, // High end
];

/// 10-band mode uses the even slots
pub const TEN_BAND_FREQUENCIES: [u32; 10] = [32, 64, 125, 250, 500, 1000, 2000, 4000, 8000, 16000];

/// 15-band mode is dense at both ends of the spectrum
pub const FIFTEEN_BAND_FREQUENCIES: [u32; 15] = [
    32, 47, 64, 94, 125, 250, 500, 1000, 2000, 4000, 6000, 8000, 12000, 16000, 19500,
];

const TEN_BAND_SLOTS: [usize; 10] = [0, 2, 4, 6, 8, 10, 12, 14, 16, 18];
const FIFTEEN_BAND_SLOTS: [usize; 15] = [0, 1, 2, 3, 4, 6, 8, 10, 12, 14, 15, 16, 17, 18, 19];
const TWENTY_BAND_SLOTS: [usize; 20] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19,
];

/// A single equalizer band: frequency in Hz, gain in tenths of dB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BandGain {
    pub frequency: u32,
    pub gain: i32,
}

impl BandGain {
    pub fn new(frequency: u32, gain: i32) -> Self {
        Self { frequency, gain }
    }

    /// Gain in dB (for display)
    pub fn gain_db(&self) -> f32 {
        self.gain as f32 / 10.0
    }
}

/// Resolution of the graphic equalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BandMode {
    #[default]
    Ten,
    Fifteen,
    Twenty,
}

impl BandMode {
    pub const ALL: [BandMode; 3] = [BandMode::Ten, BandMode::Fifteen, BandMode::Twenty];

    /// Ordered center frequencies of this mode's bands
    pub fn frequencies(self) -> &'static [u32] {
        match self {
            BandMode::Ten => &TEN_BAND_FREQUENCIES,
            BandMode::Fifteen => &FIFTEEN_BAND_FREQUENCIES,
            BandMode::Twenty => &TWENTY_BAND_FREQUENCIES,
        }
    }

    /// Canonical slot for each band index, same order as `frequencies()`
    pub fn slot_indices(self) -> &'static [usize] {
        match self {
            BandMode::Ten => &TEN_BAND_SLOTS,
            BandMode::Fifteen => &FIFTEEN_BAND_SLOTS,
            BandMode::Twenty => &TWENTY_BAND_SLOTS,
        }
    }

    pub fn band_count(self) -> usize {
        self.frequencies().len()
    }

    /// Code used in persisted gain strings (`"...|<code>"`)
    pub fn code(self) -> u8 {
        match self {
            BandMode::Ten => 0,
            BandMode::Fifteen => 1,
            BandMode::Twenty => 2,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, EqError> {
        match code {
            0 => Ok(BandMode::Ten),
            1 => Ok(BandMode::Fifteen),
            2 => Ok(BandMode::Twenty),
            other => Err(EqError::UnknownBandMode(other)),
        }
    }

    /// Mode whose band count equals `count`, if any
    pub fn from_band_count(count: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.band_count() == count)
    }

    /// Zero-gain band list for this mode
    pub fn flat(self) -> Vec<BandGain> {
        self.frequencies()
            .iter()
            .map(|&frequency| BandGain::new(frequency, 0))
            .collect()
    }
}

impl std::fmt::Display for BandMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-band", self.band_count())
    }
}

/// Clamp a gain to the range the effect accepts
#[inline]
pub fn clamp_gain(gain: i32) -> i32 {
    gain.clamp(MIN_GAIN, MAX_GAIN)
}
