pub mod geo;
pub mod location;
pub mod weather;

use axum::{extract::rejection::JsonRejection, Json};
use shared_types::Coordinates;

use crate::error::{ApiError, ApiResult};

/// Unwrap a `{lat, lng}` body, rejecting anything that isn't a real
/// coordinate on Earth.
fn validated_coordinates(
    body: Result<Json<Coordinates>, JsonRejection>,
) -> ApiResult<Coordinates> {
    let Json(coords) = body?;

    if !coords.is_finite() {
        return Err(ApiError::bad_request("lat and lng must be finite numbers"));
    }
    if !(-90.0..=90.0).contains(&coords.lat) {
        return Err(ApiError::bad_request("lat must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&coords.lng) {
        return Err(ApiError::bad_request("lng must be between -180 and 180"));
    }

    Ok(coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_ranges() {
        let ok = validated_coordinates(Ok(Json(Coordinates { lat: 90.0, lng: -180.0 })));
        assert!(ok.is_ok());

        for (lat, lng) in [(90.5, 0.0), (0.0, 180.5), (f64::NAN, 0.0), (0.0, f64::INFINITY)] {
            let result = validated_coordinates(Ok(Json(Coordinates { lat, lng })));
            assert!(matches!(result, Err(ApiError::BadRequest(_))), "{} {}", lat, lng);
        }
    }
}
