//! Shared certificate-generation helpers for the integration tests.
//!
//! Generates a throw-away CA plus leaf certificates with chosen SANs, the
//! same way `grpc::credentials::tls::client::test` generates fixtures in the
//! teacher workspace, except in-process via `rcgen` instead of files under a
//! `testdata` directory (spec distillation carries no such fixtures).

use std::net::IpAddr;
use std::sync::Once;

use rcgen::{CertificateParams, DnType, Ia5String, IsCa, KeyPair, SanType};
use tokio::net::{TcpListener, TcpStream};

static INIT: Once = Once::new();

/// Installs the default `ring` crypto provider exactly once per process.
/// Required before building any `rustls::{Client,Server}Config`.
pub fn init_provider() {
    INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

pub struct Ca {
    cert: rcgen::Certificate,
    key: KeyPair,
    pub pem: String,
}

pub struct IssuedCert {
    pub cert_pem: String,
    pub key_pem: String,
}

pub fn make_ca() -> Ca {
    let mut params = CertificateParams::new(Vec::new()).expect("empty SAN list is valid");
    params.is_ca = IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    params
        .distinguished_name
        .push(DnType::CommonName, "grpc-creds test CA");

    let key = KeyPair::generate().expect("key generation");
    let cert = params.self_signed(&key).expect("self-signed CA cert");
    let pem = cert.pem();
    Ca { cert, key, pem }
}

pub fn issue_leaf(ca: &Ca, dns: &[&str], ips: &[IpAddr], common_name: &str) -> IssuedCert {
    let mut params = CertificateParams::new(Vec::new()).expect("empty SAN list is valid");
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);

    let mut sans = Vec::with_capacity(dns.len() + ips.len());
    for name in dns {
        sans.push(SanType::DnsName(
            Ia5String::try_from(*name).expect("ASCII DNS name"),
        ));
    }
    for ip in ips {
        sans.push(SanType::IpAddress(*ip));
    }
    params.subject_alt_names = sans;

    let key = KeyPair::generate().expect("key generation");
    let cert = params
        .signed_by(&key, &ca.cert, &ca.key)
        .expect("leaf signed by test CA");

    IssuedCert {
        cert_pem: cert.pem(),
        key_pem: key.serialize_pem(),
    }
}

/// A connected loopback TCP pair: `(server_side, client_side)`.
pub async fn raw_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    let accept = tokio::spawn(async move { listener.accept().await.expect("accept").0 });
    let client = TcpStream::connect(addr).await.expect("connect");
    let server = accept.await.expect("accept task");
    (server, client)
}
