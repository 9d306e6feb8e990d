//! Google ID token verification.
//!
//! Signing keys are fetched from Google's JWKS endpoint on every call; nothing
//! is cached between requests.

use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde_json::{Map, Value};
use thiserror::Error;

pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, Error)]
pub enum GoogleFailure {
    #[error("google id token rejected: {0}")]
    Invalid(String),

    #[error("google signing keys unavailable: {0}")]
    Unavailable(String),
}

#[derive(Clone)]
pub struct GoogleTokenVerifier {
    http: Client,
    jwks_url: String,
    client_id: String,
}

impl GoogleTokenVerifier {
    pub fn new(http: Client, jwks_url: &str, client_id: &str) -> Self {
        Self {
            http,
            jwks_url: jwks_url.to_string(),
            client_id: client_id.to_string(),
        }
    }

    /// Verify signature, expiry, audience and issuer of a Google ID token.
    ///
    /// Returns the full claim set on success.
    pub async fn verify(&self, token: &str) -> Result<Map<String, Value>, GoogleFailure> {
        let header =
            decode_header(token).map_err(|e| GoogleFailure::Invalid(format!("header: {}", e)))?;
        let kid = header
            .kid
            .ok_or_else(|| GoogleFailure::Invalid("token header has no kid".to_string()))?;

        let jwks = self.fetch_jwks().await?;
        let jwk = jwks
            .find(&kid)
            .ok_or_else(|| GoogleFailure::Invalid(format!("unknown signing key {}", kid)))?;
        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| GoogleFailure::Invalid(format!("unusable signing key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let data = decode::<Map<String, Value>>(token, &key, &validation)
            .map_err(|e| GoogleFailure::Invalid(e.to_string()))?;

        Ok(data.claims)
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, GoogleFailure> {
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| GoogleFailure::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GoogleFailure::Unavailable(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| GoogleFailure::Unavailable(format!("invalid JWKS body: {}", e)))
    }
}


#[cfg(test)]
mod tests {
    use super::test_tokens::*;
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn jwks_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/certs"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(TEST_JWKS, "application/json"))
            .mount(&server)
            .await;
        server
    }

    fn verifier(server: &MockServer) -> GoogleTokenVerifier {
        GoogleTokenVerifier::new(
            Client::new(),
            &format!("{}/certs", server.uri()),
            TEST_CLIENT_ID,
        )
    }

    #[tokio::test]
    async fn test_valid_token_returns_claims() {
        let server = jwks_server().await;
        let token = google_id_token("google-sub-1", "ana@example.com");

        let claims = verifier(&server).verify(&token).await.expect("should verify");

        assert_eq!(claims.get("sub"), Some(&json!("google-sub-1")));
        assert_eq!(claims.get("email"), Some(&json!("ana@example.com")));
        assert_eq!(claims.get("email_verified"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_wrong_audience_rejected() {
        let server = jwks_server().await;
        let now = now();
        let token = sign(
            &json!({
                "iss": "accounts.google.com",
                "aud": "someone-else",
                "sub": "x",
                "email": "x@example.com",
                "exp": now + 600,
            }),
            TEST_KID,
        );

        let result = verifier(&server).verify(&token).await;
        assert!(matches!(result, Err(GoogleFailure::Invalid(_))));
    }

    #[tokio::test]
    async fn test_wrong_issuer_rejected() {
        let server = jwks_server().await;
        let now = now();
        let token = sign(
            &json!({
                "iss": "https://evil.example.com",
                "aud": TEST_CLIENT_ID,
                "sub": "x",
                "email": "x@example.com",
                "exp": now + 600,
            }),
            TEST_KID,
        );

        let result = verifier(&server).verify(&token).await;
        assert!(matches!(result, Err(GoogleFailure::Invalid(_))));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let server = jwks_server().await;
        let now = now();
        let token = sign(
            &json!({
                "iss": "accounts.google.com",
                "aud": TEST_CLIENT_ID,
                "sub": "x",
                "email": "x@example.com",
                "iat": now - 7200,
                "exp": now - 3600,
            }),
            TEST_KID,
        );

        let result = verifier(&server).verify(&token).await;
        assert!(matches!(result, Err(GoogleFailure::Invalid(_))));
    }

    #[tokio::test]
    async fn test_unknown_kid_rejected() {
        let server = jwks_server().await;
        let now = now();
        let token = sign(
            &json!({
                "iss": "accounts.google.com",
                "aud": TEST_CLIENT_ID,
                "sub": "x",
                "exp": now + 600,
            }),
            "rotated-away",
        );

        let result = verifier(&server).verify(&token).await;
        assert!(matches!(result, Err(GoogleFailure::Invalid(_))));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected_without_fetching_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(TEST_JWKS, "application/json"))
            .expect(0)
            .mount(&server)
            .await;

        let result = verifier(&server).verify("not.a.jwt").await;
        assert!(matches!(result, Err(GoogleFailure::Invalid(_))));
    }

    #[tokio::test]
    async fn test_jwks_outage_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let token = google_id_token("x", "x@example.com");
        let result = verifier(&server).verify(&token).await;
        assert!(matches!(result, Err(GoogleFailure::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_keys_fetched_on_every_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/certs"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(TEST_JWKS, "application/json"))
            .expect(2)
            .mount(&server)
            .await;

        let verifier = verifier(&server);
        let token = google_id_token("x", "x@example.com");
        verifier.verify(&token).await.expect("first call");
        verifier.verify(&token).await.expect("second call");
    }
}
