//! Server-side transport credentials (spec §4.2).
//!
//! Terminates TLS on an inbound connection with mandatory client-certificate
//! verification, then runs the peer-identity check (spec §4.1). Grounded in
//! `tonic::transport::server::tls::TlsAcceptor::new`'s use of
//! `rustls::server::WebPkiClientVerifier` for mandatory mTLS.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsAcceptor;

use crate::auth_info::{AuthInfo, ProtocolInfo};
use crate::error::CredsError;
use crate::identity::{self, Certificate, Identity};
use crate::peer_check::check_peer;

/// Builder for the TLS material a [`ServerCredentials`] requires.
///
/// Mirrors `tonic::transport::server::ServerTlsConfig`'s shape, except both
/// fields are mandatory at the point `ServerCredentials::new` is called:
/// client-certificate verification is not optional for this credential.
#[derive(Debug, Clone, Default)]
pub struct ServerTlsConfig {
    identity: Option<Identity>,
    client_ca_root: Option<Certificate>,
}

impl ServerTlsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server's own certificate chain and private key.
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Sets the CA certificate(s) trusted to sign client certificates.
    pub fn client_ca_root(mut self, cert: Certificate) -> Self {
        self.client_ca_root = Some(cert);
        self
    }
}

/// Server-side transport credentials: owns a TLS server configuration (with
/// mandatory client-certificate verification) and an allow-list of peer
/// identities.
pub struct ServerCredentials {
    identity: Identity,
    client_ca_root: Certificate,
    allowed_peers: crate::identity::AllowedPeers,
    config: Arc<rustls::ServerConfig>,
}

impl ServerCredentials {
    /// Builds server credentials from a TLS configuration and an allow-list.
    ///
    /// Fails with [`CredsError::NilServerConfig`] if `tls_config` is missing
    /// its identity or client CA root (spec §4.1, "NilServerConfig"), or with
    /// a TLS error if the PEM material itself doesn't parse.
    pub fn new(
        tls_config: ServerTlsConfig,
        allowed_peers: crate::identity::AllowedPeers,
    ) -> Result<Self, CredsError> {
        let identity = tls_config.identity.ok_or(CredsError::NilServerConfig)?;
        let client_ca_root = tls_config
            .client_ca_root
            .ok_or(CredsError::NilServerConfig)?;

        let config = build_server_config(&identity, &client_ca_root)?;

        Ok(Self {
            identity,
            client_ca_root,
            allowed_peers,
            config: Arc::new(config),
        })
    }

    /// Performs the TLS server handshake on `raw`, then enforces the peer
    /// SAN allow-list. On any failure the raw connection is dropped (closed)
    /// along with whatever partially-secured state exists.
    #[tracing::instrument(skip_all)]
    pub async fn server_handshake<IO>(
        &self,
        raw: IO,
    ) -> Result<(tokio_rustls::server::TlsStream<IO>, AuthInfo), CredsError>
    where
        IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let acceptor = TlsAcceptor::from(self.config.clone());
        let stream = acceptor.accept(raw).await.map_err(CredsError::from)?;

        let (_, connection) = stream.get_ref();
        if let Err(err) = check_peer(connection.peer_certificates(), &self.allowed_peers) {
            tracing::warn!(error = %err, "rejected peer during server handshake");
            return Err(err);
        }

        tracing::debug!("server handshake succeeded");
        Ok((stream, AuthInfo::tls()))
    }

    /// Not applicable server-side; always succeeds (spec §4.2).
    pub fn override_server_name(&self, _name: &str) -> Result<(), CredsError> {
        Ok(())
    }

    /// The stable protocol identifier reported to the RPC framework.
    pub fn info(&self) -> ProtocolInfo {
        ProtocolInfo::tls(None)
    }
}

impl Clone for ServerCredentials {
    /// Returns a value-equal copy with an independently-built `rustls`
    /// config, so session-resumption state never bleeds across clones
    /// (spec §4.2, "Cloning").
    fn clone(&self) -> Self {
        let config = build_server_config(&self.identity, &self.client_ca_root)
            .expect("credential was constructed with valid TLS material");
        Self {
            identity: self.identity.clone(),
            client_ca_root: self.client_ca_root.clone(),
            allowed_peers: self.allowed_peers.clone(),
            config: Arc::new(config),
        }
    }
}

impl std::fmt::Debug for ServerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerCredentials").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AllowedPeers;

    #[test]
    fn new_rejects_incomplete_tls_config() {
        let err = ServerCredentials::new(ServerTlsConfig::new(), AllowedPeers::accept_any())
            .expect_err("missing identity and client_ca_root");
        assert!(matches!(err, CredsError::NilServerConfig));
    }
}

fn build_server_config(
    identity: &Identity,
    client_ca_root: &Certificate,
) -> Result<rustls::ServerConfig, CredsError> {
    let certs = identity::parse_certs(identity.cert_pem())?;
    let key = identity::parse_key(identity.key_pem())?;
    let roots = identity::root_store(client_ca_root.pem())?;

    let verifier = rustls::server::WebPkiClientVerifier::builder(Arc::new(roots))
        .build()
        .map_err(|e| CredsError::Tls(e.to_string()))?;

    let builder = rustls::ServerConfig::builder_with_protocol_versions(&[
        &rustls::version::TLS13,
        &rustls::version::TLS12,
    ])
    .map_err(|e| CredsError::Tls(e.to_string()))?
    .with_client_cert_verifier(verifier);

    let config = builder
        .with_single_cert(certs, key)
        .map_err(|e| CredsError::Tls(e.to_string()))?;

    Ok(config)
}
