//! Dolby Core - Settings Repository
//!
//! This crate ties the EQ arithmetic to storage and the effect:
//! - Per-profile settings persisted in a namespaced preference store
//! - User presets, built-in presets and `.ldp` preset file import/export
//! - Pushing every change to the effect through an `EffectSlot`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Caller (CLI / UI)                      │
//! └──────────────────────────────────────────────────────────┘
//!                          │ get / set
//!                          ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                   DolbyRepository                        │
//! │   dolby_eq (transcode, curves, presets, matching)        │
//! │        │                               │                 │
//! │  PreferenceStore ──persist──▶    EffectSlot ──▶ effect   │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod preset_file;
mod profile;
mod repository;
mod store;

pub use config::DolbyConfig;
pub use error::{CoreError, CoreResult};
pub use preset_file::{
    decode as decode_preset_file, encode_batch, encode_preset, read_file as read_preset_file,
    write_file as write_preset_file, PresetBatch, PresetFile, PresetFileError,
    PRESET_FILE_EXTENSION, PRESET_FILE_VERSION,
};
pub use profile::{Amount, IeqPreset, ProfileSettings, Toggle};
pub use repository::DolbyRepository;
pub use store::{JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore};

// Re-export EQ and effect types for convenience
pub use dolby_eq::{BandGain, BandMode, BassCurve, CanonicalGains, EqualizerPreset, PresetMatch};
pub use dolby_effect::{software_slot, EffectParam, EffectSlot, Profile};
