//! Core Error Types

use thiserror::Error;

use crate::preset_file::PresetFileError;

/// Errors surfaced by the repository
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("EQ error: {0}")]
    Eq(#[from] dolby_eq::EqError),

    #[error("Effect error: {0}")]
    Effect(#[from] dolby_effect::EffectError),

    #[error("Preset file error: {0}")]
    PresetFile(#[from] PresetFileError),

    #[error("{setting} must be between {min} and {max}, got {value}")]
    OutOfRange {
        setting: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },

    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("Invalid preset name: {0:?}")]
    InvalidPresetName(String),

    #[error("Preference store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for repository operations
pub type CoreResult<T> = Result<T, CoreError>;
