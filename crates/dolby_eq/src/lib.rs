//! Dolby EQ - Band-Gain Transcoder
//!
//! This crate holds the arithmetic behind the Dolby graphic equalizer:
//! - 10/15/20-band modes projected onto the effect's 20-slot gain array
//! - Weighted bass curves and a treble shelf superimposed on that array
//! - Built-in and user presets, and fuzzy identification of the active one
//! - Frequency-space resampling of presets between band modes
//!
//! # Architecture
//!
//! Every function here is pure: arrays in, arrays out. Persistence and the
//! effect handle live in `dolby_core` and `dolby_effect`.
//!
//! ```text
//!  UI sliders (10/15/20)      canonical array        effect
//!  ───────────────────── serialize ─▶ [i32; 20] ─▶ GEQ_BAND_GAINS
//!                       ◀ deserialize ─   │
//!                                   bass/treble curves
//! ```

mod band;
mod curve;
mod error;
mod matching;
mod presets;
mod resample;
mod transcode;

pub use band::{
    clamp_gain, BandGain, BandMode, CanonicalGains, FIFTEEN_BAND_FREQUENCIES, GAIN_SLOTS,
    MAX_GAIN, MIN_GAIN, TEN_BAND_FREQUENCIES, TWENTY_BAND_FREQUENCIES,
};
pub use curve::{
    apply_bass_curve, apply_treble, replace_bass_curve, replace_treble, validate_level, BassCurve,
    Direction, BASS_GAIN_MULTIPLIER, MAX_LEVEL, TREBLE_GAIN_MULTIPLIER, TREBLE_SLOTS,
};
pub use error::EqError;
pub use matching::{downsample_ten, identify, matches, PresetMatch, MATCH_TOLERANCE};
pub use presets::{
    builtin_presets, builtin_presets_for, find_builtin, BuiltinPreset, EqualizerPreset,
    BUILTIN_PRESETS,
};
pub use resample::{convert, gain_at};
pub use transcode::{canonical_from_slice, deserialize, format_gain_list, parse_gain_list, serialize};
