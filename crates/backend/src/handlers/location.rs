use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use shared_types::{Coordinates, PlaceDescriptor};

use crate::auth::VerifiedIdentity;
use crate::error::ApiResult;
use crate::AppState;

use super::validated_coordinates;

/// `POST /location`: reverse-geocode a coordinate pair.
pub async fn reverse_geocode(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
    body: Result<Json<Coordinates>, JsonRejection>,
) -> ApiResult<Json<PlaceDescriptor>> {
    let coords = validated_coordinates(body)?;
    tracing::debug!(
        "Reverse geocoding {},{} for {} <{}>",
        coords.lat,
        coords.lng,
        identity.subject,
        identity.email.as_deref().unwrap_or("no email")
    );

    let place = state.geocode.reverse(coords.lat, coords.lng).await?;
    Ok(Json(place))
}
