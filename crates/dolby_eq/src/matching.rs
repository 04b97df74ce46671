//! Preset Identification
//!
//! Names the preset a gain array came from. Comparison happens at 10-band
//! resolution with a tolerance of 1 to absorb interpolation rounding.

use serde::{Deserialize, Serialize};

use crate::band::CanonicalGains;
use crate::presets::{builtin_presets, EqualizerPreset};

/// Largest per-band difference still considered a match (tenths of dB)
pub const MATCH_TOLERANCE: i32 = 1;

/// Outcome of [`identify`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name")]
pub enum PresetMatch {
    BuiltIn(String),
    User(String),
    Custom,
}

impl PresetMatch {
    /// Label shown for the current preset
    pub fn label(&self) -> &str {
        match self {
            PresetMatch::BuiltIn(name) | PresetMatch::User(name) => name,
            PresetMatch::Custom => "Custom",
        }
    }
}

/// Even slots of the canonical array
pub fn downsample_ten(gains: &CanonicalGains) -> [i32; 10] {
    core::array::from_fn(|i| gains[i * 2])
}

/// Equal length and every pair within [`MATCH_TOLERANCE`]
pub fn matches(a: &[i32], b: &[i32]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(&x, &y)| (i64::from(x) - i64::from(y)).abs() <= i64::from(MATCH_TOLERANCE))
}

/// Find the first built-in, then user preset matching `gains`
pub fn identify(gains: &CanonicalGains, user_presets: &[EqualizerPreset]) -> PresetMatch {
    let current = downsample_ten(gains);
    let fits = |preset: &EqualizerPreset| matches(&current, &downsample_ten(&preset.to_canonical()));

    if let Some(preset) = builtin_presets().iter().find(|p| fits(p)) {
        return PresetMatch::BuiltIn(preset.name.clone());
    }
    if let Some(preset) = user_presets.iter().find(|p| fits(p)) {
        return PresetMatch::User(preset.name.clone());
    }
    PresetMatch::Custom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::{BandGain, BandMode};
    use crate::presets::find_builtin;

    #[test]
    fn test_builtin_expansion_matches() {
        for mode in BandMode::ALL {
            let jazz = find_builtin("Jazz").unwrap().expand(mode);
            let gains = jazz.to_canonical();
            assert_eq!(identify(&gains, &[]), PresetMatch::BuiltIn("Jazz".into()), "{mode}");
        }
    }

    #[test]
    fn test_off_by_one_still_matches() {
        let mut gains = find_builtin("Pop").unwrap().to_canonical();
        gains[4] += 1;
        gains[10] -= 1;
        assert_eq!(identify(&gains, &[]).label(), "Pop");
    }

    #[test]
    fn test_off_by_two_does_not_match() {
        let mut gains = find_builtin("Pop").unwrap().to_canonical();
        gains[6] += 2;
        assert_eq!(identify(&gains, &[]), PresetMatch::Custom);
    }

    #[test]
    fn test_odd_slots_ignored() {
        let mut gains = find_builtin("Rock").unwrap().to_canonical();
        gains[1] += 30;
        assert_eq!(identify(&gains, &[]).label(), "Rock");
    }

    #[test]
    fn test_builtins_checked_first() {
        // A user preset identical to Flat never shadows it
        let user = EqualizerPreset::user("My Flat", BandMode::Ten.flat(), BandMode::Ten);
        assert_eq!(identify(&[0; 20], &[user]), PresetMatch::BuiltIn("Flat".into()));
    }

    #[test]
    fn test_user_preset_match() {
        let bands: Vec<BandGain> = BandMode::Twenty
            .frequencies()
            .iter()
            .enumerate()
            .map(|(i, &f)| BandGain::new(f, 100 - i as i32 * 10))
            .collect();
        let first = EqualizerPreset::user("Slope", bands.clone(), BandMode::Twenty);
        let second = EqualizerPreset::user("Slope Copy", bands, BandMode::Twenty);

        let gains = first.to_canonical();
        assert_eq!(identify(&gains, &[first, second]), PresetMatch::User("Slope".into()));
    }

    #[test]
    fn test_matches_length_mismatch() {
        assert!(!matches(&[0, 0], &[0, 0, 0]));
        assert!(matches(&[], &[]));
    }

    #[test]
    fn test_matches_extreme_values() {
        assert!(!matches(&[i32::MAX], &[i32::MIN]));
        assert!(!matches(&[i32::MIN, 0], &[i32::MAX, 0]));
        assert!(matches(&[i32::MAX], &[i32::MAX - 1]));

        let mut gains = [0; 20];
        gains[0] = i32::MAX;
        gains[2] = i32::MIN;
        assert_eq!(identify(&gains, &[]), PresetMatch::Custom);
    }

    #[test]
    fn test_match_json_shape() {
        let json = serde_json::to_value(PresetMatch::BuiltIn("Rock".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "BuiltIn", "name": "Rock"}));
        assert_eq!(
            serde_json::to_value(PresetMatch::Custom).unwrap(),
            serde_json::json!({"kind": "Custom"})
        );

        let parsed: PresetMatch = serde_json::from_str(r#"{"kind":"User","name":"Mine"}"#).unwrap();
        assert_eq!(parsed, PresetMatch::User("Mine".into()));
    }

    #[test]
    fn test_custom_label() {
        assert_eq!(PresetMatch::Custom.label(), "Custom");
    }
}
