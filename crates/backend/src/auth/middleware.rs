//! Authentication middleware layer for protecting routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

use super::gate::AuthGate;
use super::types::AuthFailure;

/// Middleware function that requires a verified bearer credential.
///
/// Use with `axum::middleware::from_fn_with_state` on the protected routes.
/// On success the [`super::VerifiedIdentity`] is inserted into the request
/// extensions, where handlers pick it up with `Extension<VerifiedIdentity>`.
pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let authorization = match request.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(value) => Some(value.to_owned()),
            Err(_) => return ApiError::Auth(AuthFailure::Malformed).into_response(),
        },
    };

    match gate.verify(authorization.as_deref()).await {
        Ok(identity) => {
            tracing::debug!("Authenticated {} via {}", identity.subject, identity.provider);
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(failure) => ApiError::Auth(failure).into_response(),
    }
}
