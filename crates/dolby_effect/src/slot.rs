//! Effect Slot
//!
//! Owns the current effect handle and re-acquires it when control is lost.
//! Callers never hold a handle across calls; every access goes through
//! [`EffectSlot::with_handle`].
//!
//! A new handle starts from the effect's defaults. The slot only replays the
//! call that triggered the acquisition, so callers compare
//! [`EffectSlot::acquisitions`] before and after a call and restore the rest
//! of their state when it moved.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::EffectError;
use crate::traits::EffectHandle;

type Factory = Box<dyn Fn() -> Result<Box<dyn EffectHandle>, EffectError> + Send + Sync>;

pub struct EffectSlot {
    handle: Mutex<Option<Box<dyn EffectHandle>>>,
    factory: Factory,
    acquisitions: AtomicU64,
}

impl EffectSlot {
    /// Create a slot; the first handle is acquired lazily
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn EffectHandle>, EffectError> + Send + Sync + 'static,
    {
        Self {
            handle: Mutex::new(None),
            factory: Box::new(factory),
            acquisitions: AtomicU64::new(0),
        }
    }

    /// Run `op` against a live handle
    ///
    /// A missing or stale handle is replaced first. If `op` reports
    /// [`EffectError::ControlLost`] the handle is replaced and `op` runs once more.
    pub fn with_handle<T, F>(&self, mut op: F) -> Result<T, EffectError>
    where
        F: FnMut(&mut dyn EffectHandle) -> Result<T, EffectError>,
    {
        let mut guard = self.handle.lock();

        let handle = self.ensure_live(&mut guard)?;
        match op(handle) {
            Err(EffectError::ControlLost) => {
                warn!("Effect control lost mid-call, re-acquiring");
                Self::drop_handle(&mut guard);
                let handle = self.ensure_live(&mut guard)?;
                op(handle)
            }
            result => result,
        }
    }

    fn ensure_live<'a>(
        &self,
        slot: &'a mut Option<Box<dyn EffectHandle>>,
    ) -> Result<&'a mut (dyn EffectHandle + 'static), EffectError> {
        if slot.as_ref().is_some_and(|h| !h.has_control()) {
            warn!("Effect handle lost control, recreating");
            Self::drop_handle(slot);
        }

        if slot.is_none() {
            let handle = (self.factory)()?;
            let count = self.acquisitions.fetch_add(1, Ordering::SeqCst) + 1;
            info!("Acquired {} effect (#{})", handle.name(), count);
            *slot = Some(handle);
        }

        slot.as_deref_mut().ok_or(EffectError::Released)
    }

    fn drop_handle(slot: &mut Option<Box<dyn EffectHandle>>) {
        if let Some(mut old) = slot.take() {
            old.release();
        }
    }

    /// Number of handles created so far
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Whether a handle is currently held (it may still have lost control)
    pub fn is_acquired(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Release the current handle; the next access acquires a new one
    pub fn release(&self) {
        let mut guard = self.handle.lock();
        if guard.is_some() {
            info!("Releasing effect handle");
        }
        Self::drop_handle(&mut guard);
    }
}

impl Drop for EffectSlot {
    fn drop(&mut self) {
        Self::drop_handle(self.handle.get_mut());
    }
}

impl std::fmt::Debug for EffectSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectSlot")
            .field("acquired", &self.is_acquired())
            .finish()
    }
}
