//! Band-Count Conversion
//!
//! Moves gains between a band mode's slider list and the canonical 20-slot
//! array. Both directions are total: short or corrupt input is zero-filled.

use crate::band::{clamp_gain, BandGain, BandMode, CanonicalGains, GAIN_SLOTS};

/// Read a mode's bands out of a canonical gain array
///
/// Slots missing from `gains` read as 0.
pub fn deserialize(gains: &[i32], mode: BandMode) -> Vec<BandGain> {
    mode.frequencies()
        .iter()
        .zip(mode.slot_indices())
        .map(|(&frequency, &slot)| BandGain::new(frequency, gains.get(slot).copied().unwrap_or(0)))
        .collect()
}

/// Scatter a mode's bands into a canonical gain array
///
/// Bands are taken by position; missing entries count as 0 and gains are
/// clamped before they are spread. Slots the mode does not cover are filled
/// from their mapped neighbours.
pub fn serialize(band_gains: &[BandGain], mode: BandMode) -> CanonicalGains {
    let slots = mode.slot_indices();
    let mut gains = [0; GAIN_SLOTS];

    for (band, &slot) in slots.iter().enumerate() {
        gains[slot] = band_gains.get(band).map_or(0, |b| clamp_gain(b.gain));
    }

    match mode {
        BandMode::Ten => {
            // Odd slots sit exactly between two even ones
            for slot in (1..GAIN_SLOTS - 1).step_by(2) {
                gains[slot] = (gains[slot - 1] + gains[slot + 1]) / 2;
            }
            gains[GAIN_SLOTS - 1] = gains[GAIN_SLOTS - 2];
        }
        BandMode::Fifteen | BandMode::Twenty => fill_unmapped(&mut gains, slots),
    }

    gains
}

/// Linear interpolation by slot index for every slot not in `mapped`
fn fill_unmapped(gains: &mut CanonicalGains, mapped: &[usize]) {
    for slot in 0..GAIN_SLOTS {
        if mapped.contains(&slot) {
            continue;
        }

        let below = mapped.iter().rev().find(|&&s| s < slot).copied();
        let above = mapped.iter().find(|&&s| s > slot).copied();

        gains[slot] = match (below, above) {
            (Some(lo), Some(hi)) => {
                let t = (slot - lo) as f32 / (hi - lo) as f32;
                let (a, b) = (gains[lo] as f32, gains[hi] as f32);
                (a + (b - a) * t).round() as i32
            }
            (Some(edge), None) | (None, Some(edge)) => gains[edge],
            (None, None) => 0,
        };
    }
}

/// Copy an arbitrary slice into a canonical array, zero-filling or truncating
///
/// Values outside the gain range are clamped.
pub fn canonical_from_slice(values: &[i32]) -> CanonicalGains {
    let mut gains = [0; GAIN_SLOTS];
    for (dst, &src) in gains.iter_mut().zip(values) {
        *dst = clamp_gain(src);
    }
    gains
}

/// Parse a comma-joined gain list; unparseable entries become 0
pub fn parse_gain_list(text: &str) -> Vec<i32> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.split(',')
        .map(|token| token.trim().parse::<i32>().unwrap_or(0))
        .collect()
}

/// Inverse of [`parse_gain_list`]
pub fn format_gain_list(gains: &[i32]) -> String {
    gains
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
