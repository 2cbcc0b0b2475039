//! Scoped acquisition of stream handles.
//!
//! A [`HandleGuard`] owns one handle from acquisition until scope exit. The
//! happy path calls [`HandleGuard::release`] to observe the release result;
//! any other exit (early `?` return, panic unwinding) releases from `Drop`.

use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::spec::{CopyLinesError, EnumStreamRole};
use crate::stream::StreamHandle;

/// Owns a handle and releases it exactly once.
#[derive(Debug)]
pub struct HandleGuard<H: StreamHandle> {
    handle: H,
    role: EnumStreamRole,
    if_released: bool,
}

impl<H: StreamHandle> HandleGuard<H> {
    pub fn new(handle: H, role: EnumStreamRole) -> Self {
        debug!(%role, "handle acquired");
        Self {
            handle,
            role,
            if_released: false,
        }
    }

    /// Release now and report the outcome. The guard is consumed, so the
    /// handle cannot be used or released again.
    pub fn release(mut self) -> Result<(), CopyLinesError> {
        self.release_once()
    }

    fn release_once(&mut self) -> Result<(), CopyLinesError> {
        if self.if_released {
            return Ok(());
        }
        self.if_released = true;
        let role = self.role;
        self.handle.release().map_err(|source| {
            warn!(%role, error = %source, "handle release failed");
            CopyLinesError::Release { role, source }
        })?;
        debug!(%role, "handle released");
        Ok(())
    }
}

impl<H: StreamHandle> Deref for HandleGuard<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H: StreamHandle> DerefMut for HandleGuard<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.handle
    }
}

impl<H: StreamHandle> Drop for HandleGuard<H> {
    fn drop(&mut self) {
        if self.if_released {
            return;
        }
        debug!(role = %self.role, "releasing handle on scope exit");
        // Failure is already logged by `release_once`; nothing to return it to.
        let _ = self.release_once();
    }
}
