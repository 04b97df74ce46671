//! Preset Files (`.ldp`)
//!
//! A preset file is gzip-compressed JSON holding either one preset or a batch:
//!
//! ```text
//! single: {version, name, timestamp, createdBy, bandGains: [{frequency, gain}, ...]}
//! batch:  {version, count, timestamp, presets: [single, ...]}
//! ```
//!
//! Files written by a newer version than [`PRESET_FILE_VERSION`] are rejected.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use chrono::Utc;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use dolby_eq::{clamp_gain, convert, BandGain, BandMode, EqualizerPreset};

/// Newest file version this reader understands
pub const PRESET_FILE_VERSION: u32 = 1;

/// File extension used for exported presets
pub const PRESET_FILE_EXTENSION: &str = "ldp";

/// Errors from reading or writing preset files
#[derive(Error, Debug)]
pub enum PresetFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed preset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Preset file version {found} is not supported (max {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Preset file contains no presets")]
    Empty,

    #[error("Preset {0:?} has no band gains")]
    NoBands(String),

    #[error("Preset name must not be empty")]
    InvalidName,
}

/// One preset as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetFile {
    pub version: u32,
    pub name: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default)]
    pub created_by: String,
    pub band_gains: Vec<BandGain>,
}

/// Several presets in one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetBatch {
    pub version: u32,
    pub count: usize,
    pub timestamp: i64,
    pub presets: Vec<PresetFile>,
}

/// Only the version, read before committing to a layout
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Either layout
#[derive(Deserialize)]
#[serde(untagged)]
enum PresetDocument {
    Batch(PresetBatch),
    Single(PresetFile),
}

impl PresetFile {
    pub fn from_preset(preset: &EqualizerPreset, created_by: &str) -> Self {
        Self {
            version: PRESET_FILE_VERSION,
            name: preset.name.clone(),
            timestamp: Utc::now().timestamp_millis(),
            created_by: created_by.to_string(),
            band_gains: preset.band_gains.clone(),
        }
    }

    /// Turn into a user preset
    ///
    /// The band mode follows the gain count; any other count is resampled
    /// onto `fallback`. Gains are clamped to the effect's range.
    pub fn into_preset(self, fallback: BandMode) -> Result<EqualizerPreset, PresetFileError> {
        check_version(self.version)?;

        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(PresetFileError::InvalidName);
        }
        if self.band_gains.is_empty() {
            return Err(PresetFileError::NoBands(name));
        }

        let band_gains: Vec<BandGain> = self
            .band_gains
            .iter()
            .map(|b| BandGain::new(b.frequency, clamp_gain(b.gain)))
            .collect();

        let preset = match BandMode::from_band_count(band_gains.len()) {
            Some(mode) => {
                // Frequencies come from the mode table, gains by position
                let bands = mode
                    .frequencies()
                    .iter()
                    .zip(&band_gains)
                    .map(|(&f, b)| BandGain::new(f, b.gain))
                    .collect();
                EqualizerPreset::user(name, bands, mode)
            }
            None => {
                warn!(
                    "Preset {:?} has {} bands, resampling to {}",
                    name,
                    band_gains.len(),
                    fallback
                );
                EqualizerPreset::user(name, convert(&band_gains, fallback), fallback)
            }
        };
        Ok(preset)
    }
}

fn check_version(version: u32) -> Result<(), PresetFileError> {
    if version > PRESET_FILE_VERSION {
        return Err(PresetFileError::UnsupportedVersion {
            found: version,
            supported: PRESET_FILE_VERSION,
        });
    }
    Ok(())
}

fn gzip_json<T: Serialize>(value: &T) -> Result<Vec<u8>, PresetFileError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    serde_json::to_writer(&mut encoder, value)?;
    Ok(encoder.finish()?)
}

/// Encode a single preset
pub fn encode_preset(preset: &EqualizerPreset, created_by: &str) -> Result<Vec<u8>, PresetFileError> {
    gzip_json(&PresetFile::from_preset(preset, created_by))
}

/// Encode several presets into one batch file
pub fn encode_batch(presets: &[EqualizerPreset], created_by: &str) -> Result<Vec<u8>, PresetFileError> {
    let batch = PresetBatch {
        version: PRESET_FILE_VERSION,
        count: presets.len(),
        timestamp: Utc::now().timestamp_millis(),
        presets: presets
            .iter()
            .map(|p| PresetFile::from_preset(p, created_by))
            .collect(),
    };
    gzip_json(&batch)
}

/// Decode a single or batch file into user presets
///
/// All-or-nothing: any bad entry fails the whole file.
pub fn decode(bytes: &[u8], fallback: BandMode) -> Result<Vec<EqualizerPreset>, PresetFileError> {
    let mut json = String::new();
    GzDecoder::new(bytes).read_to_string(&mut json)?;

    let probe: VersionProbe = serde_json::from_str(&json)?;
    check_version(probe.version)?;

    let files = match serde_json::from_str::<PresetDocument>(&json)? {
        PresetDocument::Single(file) => vec![file],
        PresetDocument::Batch(batch) => {
            if batch.count != batch.presets.len() {
                warn!(
                    "Batch header says {} presets, found {}",
                    batch.count,
                    batch.presets.len()
                );
            }
            batch.presets
        }
    };

    if files.is_empty() {
        return Err(PresetFileError::Empty);
    }

    let presets = files
        .into_iter()
        .map(|file| file.into_preset(fallback))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Decoded {} preset(s)", presets.len());
    Ok(presets)
}

/// Write encoded bytes to `path`
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), PresetFileError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    Ok(())
}

/// Read and decode a preset file
pub fn read_file(path: &Path, fallback: BandMode) -> Result<Vec<EqualizerPreset>, PresetFileError> {
    let bytes = fs::read(path)?;
    decode(&bytes, fallback)
}
