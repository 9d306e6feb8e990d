use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use shared_types::{Coordinates, WeatherDescriptor};

use crate::auth::VerifiedIdentity;
use crate::error::ApiResult;
use crate::AppState;

use super::validated_coordinates;

/// `POST /weather`: current conditions at a coordinate pair.
pub async fn current_weather(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
    body: Result<Json<Coordinates>, JsonRejection>,
) -> ApiResult<Json<WeatherDescriptor>> {
    let coords = validated_coordinates(body)?;
    tracing::debug!(
        "Fetching weather at {},{} for {} <{}> ({})",
        coords.lat,
        coords.lng,
        identity.subject,
        identity.email.as_deref().unwrap_or("no email"),
        identity.provider
    );

    let weather = state.weather.current(coords.lat, coords.lng).await?;
    Ok(Json(weather))
}
