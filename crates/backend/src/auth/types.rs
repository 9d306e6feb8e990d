//! Auth-related types and configuration.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Which identity provider vouched for a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IdentityProvider {
    PrimaryAuth,
    Google,
}

impl IdentityProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityProvider::PrimaryAuth => "primary_auth",
            IdentityProvider::Google => "google",
        }
    }
}

impl std::fmt::Display for IdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity established for a single request.
///
/// Built fresh by [`super::AuthGate::verify`] on every request and handed to
/// handlers through request extensions. Never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    pub subject: String,
    pub email: Option<String>,
    pub provider: IdentityProvider,
    /// Profile or token claims exactly as the provider returned them
    #[allow(dead_code)]
    pub raw_claims: Map<String, Value>,
}

/// Why a credential was not accepted.
///
/// Callers only ever see a generic 401 for the first three; the variant is
/// kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("credential is not a three-segment token")]
    Malformed,

    #[error("credential rejected")]
    Invalid,

    #[error("credential verification service unavailable")]
    VerificationUnavailable,
}

/// Auth configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Base URL of the primary auth backend, e.g. `https://xyz.supabase.co`
    pub primary_url: String,
    pub primary_api_key: String,
    /// OAuth client id that Google ID tokens must be issued for
    pub google_client_id: String,
    pub google_jwks_url: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("primary_url", &self.primary_url)
            .field("primary_api_key", &"<redacted>")
            .field("google_client_id", &self.google_client_id)
            .field("google_jwks_url", &self.google_jwks_url)
            .finish()
    }
}
