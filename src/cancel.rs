//! The caller-owned cancellation/deadline token a client handshake observes.
//!
//! Mirrors a Go `context.Context`: owned by the caller, observed but never
//! retained by the credential past the single handshake it guards (spec §3,
//! "Handshake context").

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A cancellation token with an optional deadline, passed by reference into
/// [`crate::client::ClientCredentials::client_handshake`].
#[derive(Clone)]
pub struct HandshakeContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl HandshakeContext {
    /// A context with no deadline, cancelable only via [`Self::cancel`] or a
    /// handle obtained from [`Self::cancel_handle`].
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A context that fires at the given instant if not cancelled first.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A context that fires after `timeout` elapses if not cancelled first.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A cloneable handle the caller can use to cancel this context from
    /// elsewhere (e.g. on request teardown).
    pub fn cancel_handle(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancels this context immediately.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Resolves when this context is cancelled or its deadline elapses,
    /// whichever comes first, and says which.
    pub(crate) async fn fired(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => CancelReason::Canceled,
                    _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CancelReason::Canceled
            }
        }
    }
}

impl Default for HandshakeContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CancelReason {
    DeadlineExceeded,
    Canceled,
}

impl From<CancelReason> for crate::error::CredsError {
    fn from(reason: CancelReason) -> Self {
        match reason {
            CancelReason::DeadlineExceeded => crate::error::CredsError::DeadlineExceeded,
            CancelReason::Canceled => crate::error::CredsError::Canceled,
        }
    }
}
