//! Client for the hosted primary auth backend.
//!
//! A token is valid if `GET /auth/v1/user` echoes back the owner's profile.

use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

const USER_PATH: &str = "/auth/v1/user";
const MALFORMED_JWT_CODE: &str = "bad_jwt";
const MALFORMED_JWT_MESSAGE: &str = "invalid number of segments";

/// Profile returned for a valid token.
#[derive(Debug, Clone)]
pub struct PrimaryProfile {
    pub id: String,
    pub email: Option<String>,
    pub raw: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum PrimaryFailure {
    /// The backend answered and refused the token.
    #[error("primary auth rejected token with status {status}: {error_code:?} {msg:?}")]
    Rejected {
        status: StatusCode,
        error_code: Option<String>,
        msg: Option<String>,
    },

    /// The backend could not be reached or did not answer sensibly.
    #[error("primary auth unavailable: {0}")]
    Unavailable(String),
}

impl PrimaryFailure {
    /// True only for the backend's "token is not a JWT at all" answer.
    ///
    /// This is the signal that the caller probably sent a Google ID token.
    /// The match is exact on the code and substring on the message; anything
    /// looser would send ordinary bad tokens to the Google verifier.
    pub fn is_malformed_jwt(&self) -> bool {
        match self {
            PrimaryFailure::Rejected {
                error_code: Some(code),
                msg: Some(msg),
                ..
            } => code == MALFORMED_JWT_CODE && msg.contains(MALFORMED_JWT_MESSAGE),
            _ => false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_code: Option<String>,
    msg: Option<String>,
}

#[derive(Clone)]
pub struct PrimaryAuthClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl PrimaryAuthClient {
    pub fn new(http: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Ask the backend who owns `token`.
    pub async fn fetch_user(&self, token: &str) -> Result<PrimaryProfile, PrimaryFailure> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, USER_PATH))
            .bearer_auth(token)
            .header("apikey", &self.api_key)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PrimaryFailure::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PrimaryFailure::Unavailable(format!("failed to read body: {}", e)))?;

        if status.is_server_error() {
            return Err(PrimaryFailure::Unavailable(format!("status {}", status)));
        }

        if !status.is_success() {
            let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
            return Err(PrimaryFailure::Rejected {
                status,
                error_code: parsed.error_code,
                msg: parsed.msg,
            });
        }

        let raw: Map<String, Value> = serde_json::from_str(&body).map_err(|e| {
            PrimaryFailure::Unavailable(format!("unparsable profile body: {}", e))
        })?;

        let id = match raw.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                return Err(PrimaryFailure::Rejected {
                    status,
                    error_code: None,
                    msg: Some("profile has no id".to_string()),
                })
            }
        };
        let email = raw.get("email").and_then(Value::as_str).map(str::to_string);

        Ok(PrimaryProfile { id, email, raw })
    }
}
