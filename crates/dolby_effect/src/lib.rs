//! Dolby Effect - Effect Parameter Sink
//!
//! This crate provides the boundary to the audio effect itself:
//! - `EffectHandle`: capability interface over a vendor effect instance
//! - `EffectParam` / `Profile`: parameter ids and listening profiles
//! - `EffectSlot`: owns the handle and re-acquires it when control is lost
//! - `SoftwareEffect`: in-process handle for tools and tests
//!
//! # Architecture
//!
//! The effect can be claimed by another audio session at any time. Instead of
//! a global handle, the calling layer owns an `EffectSlot` and checks liveness
//! on every access.

mod error;
mod slot;
mod software;
mod traits;

pub use error::EffectError;
pub use slot::EffectSlot;
pub use software::{ControlToken, SoftwareEffect};
pub use traits::{EffectHandle, EffectParam, Profile};

/// Slot backed by a fresh [`SoftwareEffect`] on every acquisition
pub fn software_slot() -> EffectSlot {
    EffectSlot::new(|| Ok(Box::new(SoftwareEffect::new()) as Box<dyn EffectHandle>))
}
