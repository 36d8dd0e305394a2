//! Mutually-authenticated TLS transport credentials for an internal gRPC
//! control plane.
//!
//! This crate sits below the RPC framework: it terminates/initiates TLS,
//! enforces a peer SAN allow-list on the server side, and honors caller
//! deadlines during the client handshake. It does not implement RPC
//! dispatch, service schemas, certificate issuance, or connection pooling —
//! those belong to the RPC framework and its surrounding services.
//!
//! The two entry points are [`server::ServerCredentials::server_handshake`]
//! and [`client::ClientCredentials::client_handshake`]; both hand back an
//! already-secured stream plus an [`auth_info::AuthInfo`] once the framework
//! plugs a credential into its accept loop / dialer.

mod auth_info;
mod cancel;
mod client;
mod error;
mod identity;
mod peer_check;
mod server;

#[cfg(test)]
mod test_support;

pub use auth_info::{AuthInfo, ProtocolInfo};
pub use cancel::HandshakeContext;
pub use client::{ClientCredentials, ClientTlsConfig};
pub use error::CredsError;
pub use identity::{AllowedPeers, Certificate, Identity};
pub use server::{ServerCredentials, ServerTlsConfig};
