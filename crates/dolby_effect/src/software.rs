//! In-Process Effect
//!
//! Stores parameters in memory instead of driving hardware. Used by the CLI
//! and by tests; it enforces the same value shapes a vendor effect would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::EffectError;
use crate::traits::{EffectHandle, EffectParam, Profile};

/// Shared switch for revoking control from outside the handle
///
/// Mirrors another audio session taking over the effect.
#[derive(Debug, Clone)]
pub struct ControlToken(Arc<AtomicBool>);

impl ControlToken {
    pub fn revoke(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_held(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Memory-backed [`EffectHandle`]
#[derive(Debug)]
pub struct SoftwareEffect {
    params: HashMap<(Profile, EffectParam), Vec<i32>>,
    enabled: bool,
    control: Arc<AtomicBool>,
    released: bool,
}

impl Default for SoftwareEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareEffect {
    pub fn new() -> Self {
        Self {
            params: HashMap::new(),
            enabled: true,
            control: Arc::new(AtomicBool::new(true)),
            released: false,
        }
    }

    /// Token that can take control away from this handle
    pub fn control_token(&self) -> ControlToken {
        ControlToken(Arc::clone(&self.control))
    }

    fn key(param: EffectParam, profile: Profile) -> (Profile, EffectParam) {
        if param.is_global() {
            (Profile::default(), param)
        } else {
            (profile, param)
        }
    }

    fn check_live(&self) -> Result<(), EffectError> {
        if self.released {
            return Err(EffectError::Released);
        }
        if !self.control.load(Ordering::SeqCst) {
            return Err(EffectError::ControlLost);
        }
        Ok(())
    }
}

impl EffectHandle for SoftwareEffect {
    fn name(&self) -> &'static str {
        "Software"
    }

    fn has_control(&self) -> bool {
        !self.released && self.control.load(Ordering::SeqCst)
    }

    fn is_enabled(&self) -> Result<bool, EffectError> {
        self.check_live()?;
        Ok(self.enabled)
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), EffectError> {
        self.check_live()?;
        self.enabled = enabled;
        Ok(())
    }

    fn get(&self, param: EffectParam, profile: Profile) -> Result<Vec<i32>, EffectError> {
        self.check_live()?;
        Ok(self
            .params
            .get(&Self::key(param, profile))
            .cloned()
            .unwrap_or_else(|| vec![0; param.value_len()]))
    }

    fn set(&mut self, param: EffectParam, value: &[i32], profile: Profile) -> Result<(), EffectError> {
        self.check_live()?;
        if value.len() != param.value_len() {
            return Err(EffectError::InvalidValue {
                param,
                expected: param.value_len(),
                got: value.len(),
            });
        }
        debug!("{:?}[{}] = {:?}", param, profile.id(), value);
        self.params.insert(Self::key(param, profile), value.to_vec());
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
        self.params.clear();
    }
}
