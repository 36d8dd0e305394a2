//! Client-side transport credentials (spec §4.3).
//!
//! Initiates TLS on an outbound connection, deriving the SNI/hostname-
//! verification name from the RPC framework's `authority` string, and races
//! the handshake against a caller-owned [`HandshakeContext`] so a hung or
//! slow peer cannot block past the caller's deadline.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;

use crate::auth_info::{AuthInfo, ProtocolInfo};
use crate::cancel::HandshakeContext;
use crate::error::CredsError;
use crate::identity::{self, Certificate, Identity};

/// Builder for the TLS material a [`ClientCredentials`] uses.
///
/// Mirrors `tonic::transport::channel::ClientTlsConfig`'s shape. Unlike the
/// server side, an absent `ca_certificate` is not a construction error — it
/// yields an empty trust store, which fails every handshake (spec §6,
/// "empty pool ⇒ trust nothing"), rather than refusing to build at all.
#[derive(Debug, Clone, Default)]
pub struct ClientTlsConfig {
    root_ca: Option<Certificate>,
    identity: Option<Identity>,
}

impl ClientTlsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the CA certificate(s) trusted to verify the server's chain.
    pub fn ca_certificate(mut self, cert: Certificate) -> Self {
        self.root_ca = Some(cert);
        self
    }

    /// Sets the client's own certificate chain and key, for mTLS. Omit for
    /// server-authenticated-only connections.
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }
}

/// Client-side transport credentials: a trusted server-CA pool and an
/// optional client identity for mutual authentication.
pub struct ClientCredentials {
    root_ca: Certificate,
    client_identity: Option<Identity>,
    config: Arc<rustls::ClientConfig>,
    default_server_name: Arc<ArcSwapOption<String>>,
}

impl ClientCredentials {
    /// Builds client credentials. An absent CA certificate yields an empty
    /// trust store rather than an error (see [`ClientTlsConfig`]).
    pub fn new(tls_config: ClientTlsConfig) -> Result<Self, CredsError> {
        let root_ca = tls_config
            .root_ca
            .unwrap_or_else(|| Certificate::from_pem(Vec::new()));
        let client_identity = tls_config.identity;
        let config = build_client_config(&root_ca, &client_identity)?;

        Ok(Self {
            root_ca,
            client_identity,
            config: Arc::new(config),
            default_server_name: Arc::new(ArcSwapOption::new(None)),
        })
    }

    /// Initiates TLS on `raw`, using `authority`'s host portion as SNI and
    /// the hostname to verify the peer certificate against.
    ///
    /// Races the handshake against `ctx`. If `ctx` fires first, `raw` (owned
    /// by the losing handshake future) is dropped — closing the connection —
    /// and this returns exactly one of the two stable cancellation errors
    /// (spec §4.3/§6). Exactly one outcome is ever returned.
    #[tracing::instrument(skip_all)]
    pub async fn client_handshake<IO>(
        &self,
        ctx: &HandshakeContext,
        authority: &str,
        raw: IO,
    ) -> Result<(tokio_rustls::client::TlsStream<IO>, AuthInfo), CredsError>
    where
        IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let host = self.resolve_server_name(authority);
        let server_name = rustls_pki_types::ServerName::try_from(strip_ipv6_brackets(&host))
            .map_err(|e| CredsError::Tls(format!("invalid server name {host:?}: {e}")))?
            .to_owned();

        let connector = TlsConnector::from(self.config.clone());

        tokio::select! {
            result = connector.connect(server_name, raw) => {
                let stream = result.map_err(CredsError::from)?;
                tracing::debug!(%host, "client handshake succeeded");
                Ok((stream, AuthInfo::tls()))
            }
            reason = ctx.fired() => {
                tracing::debug!(%host, "client handshake aborted by context");
                Err(CredsError::from(reason))
            }
        }
    }

    /// Updates the default ServerName used when `authority` is empty.
    /// Rarely used (spec §4.3).
    pub fn override_server_name(&self, name: &str) -> Result<(), CredsError> {
        self.default_server_name.store(Some(Arc::new(name.to_owned())));
        Ok(())
    }

    /// The stable protocol identifier reported to the RPC framework.
    pub fn info(&self) -> ProtocolInfo {
        let server_name = self
            .default_server_name
            .load_full()
            .map(|name| name.as_str().to_owned());
        ProtocolInfo::tls(server_name)
    }

    fn resolve_server_name(&self, authority: &str) -> String {
        if !authority.is_empty() {
            return host_from_authority(authority).to_owned();
        }
        self.default_server_name
            .load_full()
            .map(|name| name.as_str().to_owned())
            .unwrap_or_default()
    }
}

impl Clone for ClientCredentials {
    /// Returns a value-equal copy with an independently-cloned TLS template
    /// (spec §4.3, "Cloning"). The override server name snapshot carries
    /// over but is tracked independently afterwards.
    fn clone(&self) -> Self {
        let config = build_client_config(&self.root_ca, &self.client_identity)
            .expect("credential was constructed with valid TLS material");
        Self {
            root_ca: self.root_ca.clone(),
            client_identity: self.client_identity.clone(),
            config: Arc::new(config),
            default_server_name: Arc::new(ArcSwapOption::new(self.default_server_name.load_full())),
        }
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials").finish_non_exhaustive()
    }
}

/// Splits the `:port` suffix off an `authority` string (`"host:port"` or
/// `"host"`), per spec §4.3. Bracketed IPv6 literals (`"[::1]:443"`) are left
/// whole if no closing-bracket-then-colon suffix is found.
fn host_from_authority(authority: &str) -> &str {
    if authority.starts_with('[') {
        if let Some(bracket_end) = authority.find(']') {
            return &authority[..=bracket_end];
        }
        return authority;
    }
    match authority.rfind(':') {
        Some(idx) => &authority[..idx],
        None => authority,
    }
}

/// Strips the `[...]` bracket syntax `host_from_authority` preserves for
/// display around an IPv6 literal. `rustls_pki_types::ServerName::try_from`
/// parses IP literals via `str::parse::<IpAddr>()`, which rejects brackets,
/// so the brackets must come off before building a `ServerName`.
fn strip_ipv6_brackets(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(host)
}

fn build_client_config(
    root_ca: &Certificate,
    client_identity: &Option<Identity>,
) -> Result<rustls::ClientConfig, CredsError> {
    let roots = identity::root_store(root_ca.pem())?;

    let builder = rustls::ClientConfig::builder_with_protocol_versions(&[
        &rustls::version::TLS13,
        &rustls::version::TLS12,
    ])
    .map_err(|e| CredsError::Tls(e.to_string()))?
    .with_root_certificates(roots);

    let mut config = match client_identity {
        Some(identity) => {
            let certs = identity::parse_certs(identity.cert_pem())?;
            let key = identity::parse_key(identity.key_pem())?;
            builder
                .with_client_auth_cert(certs, key)
                .map_err(|e| CredsError::Tls(e.to_string()))?
        }
        None => builder.with_no_client_auth(),
    };

    config.resumption = rustls::client::Resumption::disabled();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{host_from_authority, strip_ipv6_brackets};

    #[test]
    fn strips_port_from_host_port() {
        assert_eq!(host_from_authority("sa.service.consul:8443"), "sa.service.consul");
    }

    #[test]
    fn bare_host_is_unchanged() {
        assert_eq!(host_from_authority("sa.service.consul"), "sa.service.consul");
    }

    #[test]
    fn bracketed_ipv6_literal_is_preserved() {
        assert_eq!(host_from_authority("[::1]:8443"), "[::1]");
    }

    #[test]
    fn strip_ipv6_brackets_unwraps_literal() {
        assert_eq!(strip_ipv6_brackets("[::1]"), "::1");
    }

    #[test]
    fn strip_ipv6_brackets_leaves_dns_name_unchanged() {
        assert_eq!(strip_ipv6_brackets("sa.service.consul"), "sa.service.consul");
    }
}
