//! Test-only certificate generation shared by this crate's unit tests.
//!
//! Generates throw-away leaf certificates with specific SANs so
//! [`crate::peer_check`] can be exercised without checked-in PEM fixtures.

use std::net::IpAddr;

use rcgen::{CertificateParams, KeyPair, SanType};
use rustls_pki_types::CertificateDer;

pub(crate) fn leaf_der_with_sans(dns: &[&str], ips: &[IpAddr]) -> CertificateDer<'static> {
    let mut params = CertificateParams::new(Vec::new()).expect("empty SAN list is always valid");
    let mut sans = Vec::with_capacity(dns.len() + ips.len());
    for name in dns {
        sans.push(SanType::DnsName((*name).try_into().expect("valid DNS name")));
    }
    for ip in ips {
        sans.push(SanType::IpAddress(*ip));
    }
    params.subject_alt_names = sans;

    let key = KeyPair::generate().expect("key generation");
    let cert = params.self_signed(&key).expect("self-signed cert");
    cert.der().clone()
}
