//! Cross-Band-Mode Conversion
//!
//! Resamples a band list onto another mode's frequencies. Interpolation is
//! piecewise linear in Hz, not in slot index, so presets authored at one
//! resolution keep their shape at another.

use crate::band::{BandGain, BandMode};

/// Gain at `frequency` on the piecewise-linear curve through `bands`
///
/// `bands` must be sorted by frequency. Outside the covered range the nearest
/// endpoint's gain is used.
pub fn gain_at(bands: &[BandGain], frequency: u32) -> i32 {
    let Some(last) = bands.last() else {
        return 0;
    };

    match bands.iter().position(|b| b.frequency >= frequency) {
        None => last.gain,
        Some(0) => bands[0].gain,
        Some(i) => {
            let (lo, hi) = (bands[i - 1], bands[i]);
            if hi.frequency == frequency {
                return hi.gain;
            }
            let t = (frequency - lo.frequency) as f32 / (hi.frequency - lo.frequency) as f32;
            (lo.gain as f32 + (hi.gain as f32 - lo.gain as f32) * t).round() as i32
        }
    }
}

/// Resample `bands` onto the frequencies of `target`
pub fn convert(bands: &[BandGain], target: BandMode) -> Vec<BandGain> {
    let mut sorted = bands.to_vec();
    sorted.sort_by_key(|b| b.frequency);

    target
        .frequencies()
        .iter()
        .map(|&frequency| BandGain::new(frequency, gain_at(&sorted, frequency)))
        .collect()
}
