//! The peer-identity check: a pure function from a completed handshake's
//! peer certificate chain and an allow-list to accept/reject (spec §4.1).
//!
//! Kept free of any TLS I/O so it is trivially unit-testable in isolation.

use std::net::IpAddr;

use rustls_pki_types::CertificateDer;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::X509Certificate;

use crate::error::CredsError;
use crate::identity::AllowedPeers;

/// Checks a server-side handshake's peer certificate chain against an
/// allow-list.
///
/// 1. `AllowedPeers::AcceptAny` always succeeds — the TLS layer already
///    verified the chain.
/// 2. An empty peer chain with an explicit allow-list is `EmptyPeerCerts`.
/// 3. Otherwise the leaf certificate's SANs (DNS names lower-cased, IPs in
///    canonical textual form) are membership-tested against the allow-list.
///
/// Only SANs are examined, never the Common Name — CN is deprecated for
/// identity. On rejection the Common Name is surfaced as diagnostic context,
/// falling back to the leaf's first SAN when it has no Common Name.
pub(crate) fn check_peer(
    peer_certs: Option<&[CertificateDer<'static>]>,
    allowed: &AllowedPeers,
) -> Result<(), CredsError> {
    let AllowedPeers::Explicit(allowed_sans) = allowed else {
        return Ok(());
    };

    let leaf = peer_certs
        .and_then(|certs| certs.first())
        .ok_or(CredsError::EmptyPeerCerts)?;

    let (_, cert) =
        X509Certificate::from_der(leaf.as_ref()).map_err(|e| CredsError::Tls(e.to_string()))?;

    let sans = leaf_sans(&cert);
    if sans.iter().any(|san| allowed_sans.contains(san)) {
        return Ok(());
    }

    let diagnostic = common_name(&cert).or_else(|| sans.into_iter().next());
    Err(CredsError::SanNotAccepted(diagnostic))
}

fn leaf_sans(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut sans = Vec::new();
    for ext in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for name in &san.general_names {
                match name {
                    GeneralName::DNSName(name) => sans.push(name.to_ascii_lowercase()),
                    GeneralName::IPAddress(bytes) => {
                        if let Some(ip) = ip_from_bytes(bytes) {
                            sans.push(ip.to_string());
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    sans
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => Some(IpAddr::from(<[u8; 4]>::try_from(bytes).ok()?)),
        16 => Some(IpAddr::from(<[u8; 16]>::try_from(bytes).ok()?)),
        _ => None,
    }
}

fn common_name(cert: &X509Certificate<'_>) -> Option<String> {
    cert.subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_owned)
}
