//! Error taxonomy for the credential layer.
//!
//! Every error terminates the handshake and closes the raw connection; the
//! credential performs no recovery (spec §7). The two cancellation variants
//! carry exact, stable `Display` text so callers can match on it without
//! type introspection.

/// Errors produced by credential construction or a handshake attempt.
#[derive(Debug, thiserror::Error)]
pub enum CredsError {
    /// Construction-time only: a [`crate::server::ServerTlsConfig`] was
    /// missing required TLS material (identity and/or client CA root).
    #[error("boulder/grpc/creds: nil server TLS config")]
    NilServerConfig,

    /// TLS succeeded but the peer presented no certificate. Unreachable with
    /// mandatory client-certificate verification; enforced defensively.
    #[error("boulder/grpc/creds: no peer certificate presented")]
    EmptyPeerCerts,

    /// The peer authenticated but none of its SANs are on the allow-list.
    #[error("boulder/grpc/creds: peer certificate SAN not accepted (common name: {0:?})")]
    SanNotAccepted(Option<String>),

    /// The caller's [`crate::cancel::HandshakeContext`] deadline elapsed
    /// before the handshake completed.
    #[error("boulder/grpc/creds: context deadline exceeded")]
    DeadlineExceeded,

    /// The caller explicitly cancelled the handshake's context.
    #[error("boulder/grpc/creds: context canceled")]
    Canceled,

    /// The TLS engine rejected the handshake (chain verification, hostname
    /// mismatch, protocol negotiation, ...). Surfaced verbatim — no prefix is
    /// added, so operators see exactly the TLS-layer detail (spec §4.2/§6).
    #[error("{0}")]
    Tls(String),

    /// I/O failure while driving the handshake. Surfaced verbatim.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<rustls::Error> for CredsError {
    fn from(e: rustls::Error) -> Self {
        CredsError::Tls(e.to_string())
    }
}
