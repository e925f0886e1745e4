//! Reentrancy guard for the mutating entry points.
//!
//! Split and redeem call out to an untrusted collateral asset in the middle
//! of their procedure. If that asset calls back into the engine before the
//! first call finishes, the nested call would see stale aggregates. The guard
//! rejects any mutating call while another is in progress, whether it comes
//! from a callback on the same thread or from a concurrent caller.

use std::sync::atomic::{AtomicBool, Ordering};

use condex_types::{CondexError, Result};

/// Busy flag shared by every mutating entry point of one engine.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

impl ReentrancyGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entered: AtomicBool::new(false),
        }
    }

    /// Acquire the guard. Released when the returned token drops, on every
    /// exit path including `?` returns and unwinding.
    ///
    /// # Errors
    /// Returns [`CondexError::ReentrantCall`] if the guard is already held.
    pub fn enter(&self) -> Result<GuardToken<'_>> {
        self.entered
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| CondexError::ReentrantCall)?;
        Ok(GuardToken { guard: self })
    }

    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Proof that the guard is held.
#[must_use = "the guard is released as soon as the token is dropped"]
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}
