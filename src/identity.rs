//! PEM-backed credential material and the peer allow-list.
//!
//! `Certificate`/`Identity` intentionally mirror
//! `tonic::transport::{Certificate, Identity}`: opaque PEM holders, parsed
//! lazily when a `rustls` config is actually built.

use std::collections::HashSet;
use std::io::BufReader;

use rustls_pki_types::{CertificateDer, PrivateKeyDer};

use crate::error::CredsError;

/// A PEM-encoded X.509 certificate (or chain).
#[derive(Clone)]
pub struct Certificate {
    pem: Vec<u8>,
}

impl Certificate {
    /// Builds a certificate from PEM bytes. Not parsed until used.
    pub fn from_pem(pem: impl Into<Vec<u8>>) -> Self {
        Self { pem: pem.into() }
    }

    pub(crate) fn pem(&self) -> &[u8] {
        &self.pem
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("pem_len", &self.pem.len())
            .finish()
    }
}

/// A PEM-encoded certificate chain plus its private key.
#[derive(Clone)]
pub struct Identity {
    cert: Certificate,
    key: Vec<u8>,
}

impl Identity {
    /// Builds an identity from a PEM certificate chain and a PEM private key.
    pub fn from_pem(cert_pem: impl Into<Vec<u8>>, key_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            cert: Certificate::from_pem(cert_pem),
            key: key_pem.into(),
        }
    }

    pub(crate) fn cert_pem(&self) -> &[u8] {
        self.cert.pem()
    }

    pub(crate) fn key_pem(&self) -> &[u8] {
        &self.key
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity").finish_non_exhaustive()
    }
}

/// The set of peer identities a server credential accepts.
///
/// Preserves the nil/empty distinction from spec as separate enum variants
/// (per the Design Notes' recommendation) rather than overloading an empty
/// collection: `AcceptAny` takes any authenticated peer, `Explicit(set)`
/// checks membership, and an empty `Explicit` set rejects everyone.
#[derive(Debug, Clone)]
pub enum AllowedPeers {
    /// Accept any peer whose certificate chain verified.
    AcceptAny,
    /// Accept only peers with at least one SAN (DNS name or IP literal, case
    /// insensitive / canonical form) in this set.
    Explicit(HashSet<String>),
}

impl AllowedPeers {
    /// The "accept any authenticated peer" sentinel.
    pub fn accept_any() -> Self {
        AllowedPeers::AcceptAny
    }

    /// An explicit allow-list. An empty iterator yields a set that rejects
    /// every peer.
    pub fn explicit<I, S>(sans: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AllowedPeers::Explicit(sans.into_iter().map(Into::into).collect())
    }
}

pub(crate) fn parse_certs(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, CredsError> {
    let mut reader = BufReader::new(pem);
    rustls_pemfile::certs(&mut reader)
        .map(|result| result.map_err(|e| CredsError::Tls(e.to_string())))
        .collect()
}

pub(crate) fn parse_key(pem: &[u8]) -> Result<PrivateKeyDer<'static>, CredsError> {
    let mut reader = BufReader::new(pem);
    loop {
        match rustls_pemfile::read_one(&mut reader).map_err(|e| CredsError::Tls(e.to_string()))? {
            Some(rustls_pemfile::Item::Pkcs1Key(key)) => return Ok(key.into()),
            Some(rustls_pemfile::Item::Pkcs8Key(key)) => return Ok(key.into()),
            Some(rustls_pemfile::Item::Sec1Key(key)) => return Ok(key.into()),
            None => return Err(CredsError::Tls("no private key found in PEM".into())),
            _ => continue,
        }
    }
}

pub(crate) fn root_store(ca_pem: &[u8]) -> Result<rustls::RootCertStore, CredsError> {
    let mut roots = rustls::RootCertStore::empty();
    for cert in parse_certs(ca_pem)? {
        roots
            .add(cert)
            .map_err(|e| CredsError::Tls(e.to_string()))?;
    }
    Ok(roots)
}
