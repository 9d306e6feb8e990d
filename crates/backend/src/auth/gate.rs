//! Per-request credential verification.

use reqwest::Client;
use serde_json::Value;

use super::google::{GoogleFailure, GoogleTokenVerifier};
use super::primary::{PrimaryAuthClient, PrimaryFailure, PrimaryProfile};
use super::types::{AuthConfig, AuthFailure, IdentityProvider, VerifiedIdentity};

/// Verifies bearer credentials against the primary backend, falling back to
/// Google ID token verification when the backend says the token is not a JWT.
///
/// Holds no per-request state; every call verifies from scratch.
#[derive(Clone)]
pub struct AuthGate {
    primary: PrimaryAuthClient,
    google: GoogleTokenVerifier,
}

impl AuthGate {
    pub fn new(http: Client, config: &AuthConfig) -> Self {
        Self {
            primary: PrimaryAuthClient::new(
                http.clone(),
                &config.primary_url,
                &config.primary_api_key,
            ),
            google: GoogleTokenVerifier::new(
                http,
                &config.google_jwks_url,
                &config.google_client_id,
            ),
        }
    }

    /// Verify the raw value of an `Authorization` header.
    pub async fn verify(
        &self,
        authorization: Option<&str>,
    ) -> Result<VerifiedIdentity, AuthFailure> {
        let token = extract_bearer(authorization).ok_or(AuthFailure::MissingCredential)?;

        if !has_jwt_shape(token) {
            return Err(AuthFailure::Malformed);
        }

        let failure = match self.primary.fetch_user(token).await {
            Ok(profile) => return Ok(primary_identity(profile)),
            Err(failure) => failure,
        };

        if !failure.is_malformed_jwt() {
            return Err(match failure {
                PrimaryFailure::Unavailable(reason) => {
                    tracing::error!("Primary auth unavailable: {}", reason);
                    AuthFailure::VerificationUnavailable
                }
                rejected => {
                    tracing::debug!("{}", rejected);
                    AuthFailure::Invalid
                }
            });
        }

        tracing::debug!("Primary auth reported a non-JWT token, trying Google ID token");

        match self.google.verify(token).await {
            Ok(claims) => google_identity(claims).ok_or_else(|| {
                tracing::debug!("Google ID token is missing sub or email");
                AuthFailure::Invalid
            }),
            Err(GoogleFailure::Unavailable(reason)) => {
                tracing::error!("Google signing keys unavailable: {}", reason);
                Err(AuthFailure::VerificationUnavailable)
            }
            Err(GoogleFailure::Invalid(reason)) => {
                tracing::debug!("Google ID token rejected: {}", reason);
                Err(AuthFailure::Invalid)
            }
        }
    }
}

fn extract_bearer(authorization: Option<&str>) -> Option<&str> {
    let token = authorization?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Cheap structural check: three non-empty dot-separated segments.
///
/// Says nothing about signatures.
fn has_jwt_shape(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3 && segments.iter().all(|s| !s.is_empty())
}

fn primary_identity(profile: PrimaryProfile) -> VerifiedIdentity {
    VerifiedIdentity {
        subject: profile.id,
        email: profile.email,
        provider: IdentityProvider::PrimaryAuth,
        raw_claims: profile.raw,
    }
}

fn google_identity(claims: serde_json::Map<String, Value>) -> Option<VerifiedIdentity> {
    let subject = non_empty_claim(&claims, "sub")?;
    let email = non_empty_claim(&claims, "email")?;

    Some(VerifiedIdentity {
        subject,
        email: Some(email),
        provider: IdentityProvider::Google,
        raw_claims: claims,
    })
}

fn non_empty_claim(claims: &serde_json::Map<String, Value>, name: &str) -> Option<String> {
    claims
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
