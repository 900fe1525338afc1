//! Cooperative cancellation shared by the read loops of a session.
//!
//! A [`CancellationController`] is created for each connect and hands out
//! [`CancellationToken`]s to every link reader. Once cancelled it stays
//! cancelled; reconnecting creates a new controller.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::debug;

use crate::error::LinkError;

/// Interval at which blocking reads look at the token while waiting for data.
pub const CANCEL_POLL_MS: u64 = 50;

/// The owning side of a session's cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationController {
    token: CancellationToken,
}
impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token observing this controller.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request cancellation of every read sharing this controller.
    ///
    /// Returns `true` only for the call that actually flipped the flag;
    /// cancelling again is a no-op.
    pub fn cancel(&self) -> bool {
        let first = !self.token.flag.swap(true, Ordering::AcqRel);
        if first {
            debug!("cancellation requested");
        }
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Read-only view of the cancellation flag, cheap to clone and `Send`.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}
impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// `Err(LinkError::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), LinkError> {
        if self.is_cancelled() {
            Err(LinkError::Cancelled)
        } else {
            Ok(())
        }
    }
}
