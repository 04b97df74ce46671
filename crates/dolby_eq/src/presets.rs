//! Equalizer Presets
//!
//! Built-in presets are authored in 10-band form and expanded to other modes
//! through the canonical array. User presets keep the mode they were saved in
//! and persist as `"g0,g1,...,gn|<mode code>"`.

use serde::{Deserialize, Serialize};

use crate::band::{clamp_gain, BandGain, BandMode, CanonicalGains};
use crate::resample::convert;
use crate::transcode::{deserialize, format_gain_list, parse_gain_list, serialize};

/// Named 10-band preset (tenths of dB)
pub type BuiltinPreset = (&'static str, [i32; 10]);

/// List of built-in presets
pub const BUILTIN_PRESETS: &[BuiltinPreset] = &[
    ("Flat", [0; 10]),
    ("Rock", [50, 40, 20, -10, -20, -10, 10, 30, 50, 60]),
    ("Pop", [30, 20, 0, -10, -20, 10, 30, 40, 40, 30]),
    ("Jazz", [30, 20, 0, 10, 20, 30, 30, 20, 10, 0]),
    ("Classical", [-20, -10, -10, 0, 10, 20, 30, 30, 20, 10]),
    ("Electronic", [70, 50, 20, 0, 0, 0, 20, 40, 50, 60]),
    ("Hip-Hop", [60, 50, 30, 10, 0, -10, 0, 10, 20, 20]),
    ("Vocal", [-20, -10, 0, 20, 40, 40, 30, 20, 10, 0]), // Speech and dialogue
    ("Bass Boost", [60, 50, 30, 10, 0, 0, 0, 0, 0, 0]),
    ("Treble Boost", [0, 0, 0, 0, 0, 10, 30, 50, 60, 60]),
    ("Loudness", [40, 30, 0, -10, -10, 0, 10, 20, 30, 40]),
];

/// A named set of band gains at a given resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualizerPreset {
    pub name: String,
    pub band_gains: Vec<BandGain>,
    pub is_user_defined: bool,
    pub band_mode: BandMode,
}

impl EqualizerPreset {
    /// User preset from a mode-sized band list
    pub fn user(name: impl Into<String>, band_gains: Vec<BandGain>, band_mode: BandMode) -> Self {
        Self {
            name: name.into(),
            band_gains,
            is_user_defined: true,
            band_mode,
        }
    }

    fn builtin(&(name, gains): &BuiltinPreset) -> Self {
        let band_gains = BandMode::Ten
            .frequencies()
            .iter()
            .zip(gains)
            .map(|(&frequency, gain)| BandGain::new(frequency, gain))
            .collect();

        Self {
            name: name.to_string(),
            band_gains,
            is_user_defined: false,
            band_mode: BandMode::Ten,
        }
    }

    /// The preset as the canonical 20-slot array
    pub fn to_canonical(&self) -> CanonicalGains {
        serialize(&self.band_gains, self.band_mode)
    }

    /// Re-express through the canonical array (slot interpolation)
    pub fn expand(&self, mode: BandMode) -> Self {
        if mode == self.band_mode {
            return self.clone();
        }
        Self {
            band_gains: deserialize(&self.to_canonical(), mode),
            band_mode: mode,
            ..self.clone()
        }
    }

    /// Resample onto another mode's frequencies (frequency interpolation)
    pub fn for_mode(&self, mode: BandMode) -> Self {
        if mode == self.band_mode {
            return self.clone();
        }
        Self {
            band_gains: convert(&self.band_gains, mode),
            band_mode: mode,
            ..self.clone()
        }
    }

    pub fn gains(&self) -> Vec<i32> {
        self.band_gains.iter().map(|b| b.gain).collect()
    }

    /// Persisted form: comma-joined gains, then `|` and the mode code
    pub fn encode(&self) -> String {
        format!("{}|{}", format_gain_list(&self.gains()), self.band_mode.code())
    }

    /// Parse a persisted user preset; never fails
    ///
    /// Without a valid mode suffix the mode is inferred from the value count,
    /// defaulting to 10-band. Missing values read as 0.
    pub fn decode(name: impl Into<String>, encoded: &str) -> Self {
        let (list, code) = match encoded.rsplit_once('|') {
            Some((list, code)) => (list, code.trim().parse::<u8>().ok()),
            None => (encoded, None),
        };
        let values = parse_gain_list(list);

        let band_mode = code
            .and_then(|c| BandMode::from_code(c).ok())
            .or_else(|| BandMode::from_band_count(values.len()))
            .unwrap_or_default();

        let band_gains = band_mode
            .frequencies()
            .iter()
            .enumerate()
            .map(|(i, &frequency)| {
                BandGain::new(frequency, clamp_gain(values.get(i).copied().unwrap_or(0)))
            })
            .collect();

        Self::user(name, band_gains, band_mode)
    }
}

/// All built-in presets in their authored 10-band form
pub fn builtin_presets() -> Vec<EqualizerPreset> {
    BUILTIN_PRESETS.iter().map(EqualizerPreset::builtin).collect()
}

/// Built-in presets expanded to `mode`
pub fn builtin_presets_for(mode: BandMode) -> Vec<EqualizerPreset> {
    BUILTIN_PRESETS
        .iter()
        .map(|preset| EqualizerPreset::builtin(preset).expand(mode))
        .collect()
}

/// Look up a built-in preset by name (case-insensitive)
pub fn find_builtin(name: &str) -> Option<EqualizerPreset> {
    BUILTIN_PRESETS
        .iter()
        .find(|(preset_name, _)| preset_name.eq_ignore_ascii_case(name))
        .map(EqualizerPreset::builtin)
}
