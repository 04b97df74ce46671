//! EQ Error Types

use thiserror::Error;

/// Errors that can occur while editing equalizer state
///
/// Transcoding itself never fails; only explicit user input is validated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EqError {
    #[error("Level {0} is out of range (must be 0-100)")]
    LevelOutOfRange(i32),

    #[error("Invalid band index: {index} (mode has {bands} bands)")]
    InvalidBandIndex { index: usize, bands: usize },

    #[error("Unknown band mode code: {0}")]
    UnknownBandMode(u8),
}
