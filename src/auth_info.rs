//! The value a credential returns to the RPC framework describing the
//! authenticated identity of the other side (spec §6, "AuthInfo").

/// Describes a successfully authenticated connection. Carries only the
/// stable authentication-type tag; callers that need the full TLS state
/// (negotiated protocol, peer chain) read it off the returned stream itself.
#[derive(Debug, Clone)]
pub struct AuthInfo {
    auth_type: &'static str,
}

impl AuthInfo {
    pub(crate) fn tls() -> Self {
        Self { auth_type: "tls" }
    }

    /// The stable authentication-mechanism identifier. Always `"tls"` for
    /// credentials from this crate.
    pub fn auth_type(&self) -> &'static str {
        self.auth_type
    }
}

/// Static shape reported by a credential's `Info()` (spec §6).
#[derive(Debug, Clone)]
pub struct ProtocolInfo {
    pub protocol: &'static str,
    pub server_name: Option<String>,
    pub security_version: &'static str,
}

impl ProtocolInfo {
    pub(crate) fn tls(server_name: Option<String>) -> Self {
        Self {
            protocol: "tls",
            server_name,
            security_version: "1.2+",
        }
    }
}
