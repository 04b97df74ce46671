//! Effect Error Types

use thiserror::Error;

use crate::traits::EffectParam;

/// Errors from the effect parameter sink
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error("Effect control lost to another session")]
    ControlLost,

    #[error("Effect handle already released")]
    Released,

    #[error("Invalid value for {param:?}: expected {expected} values, got {got}")]
    InvalidValue {
        param: EffectParam,
        expected: usize,
        got: usize,
    },

    #[error("Failed to acquire effect: {0}")]
    AcquireFailed(String),
}
