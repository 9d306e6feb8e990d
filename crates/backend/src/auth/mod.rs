//! Bearer-token authentication.
//!
//! This module provides:
//! - `AuthGate`, which verifies a token against the primary auth backend and
//!   falls back to Google ID token verification
//! - `require_auth` middleware for protecting routes
//! - `VerifiedIdentity`, handed to protected handlers via request extensions

mod gate;
mod google;
mod middleware;
mod primary;
pub mod types;

pub use gate::AuthGate;
pub use google::GOOGLE_JWKS_URL;
pub use middleware::require_auth;
pub use types::{AuthConfig, AuthFailure, VerifiedIdentity};
