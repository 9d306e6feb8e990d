//! Country/city reference data. Public, no auth.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared_types::{City, Country};

use crate::db::{validate_search, DEFAULT_SEARCH_LIMIT};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchCitiesParams {
    pub name: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeoTypeParams {
    pub country: Option<String>,
}

pub async fn list_countries(State(state): State<AppState>) -> ApiResult<Json<Vec<Country>>> {
    Ok(Json(state.geo.list_countries().await?))
}

pub async fn get_country(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Country>> {
    let country = state.geo.get_country(&normalize_code(&code)).await?;
    Ok(Json(country))
}

pub async fn list_country_cities(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Vec<City>>> {
    let cities = state.geo.list_cities_by_country(&normalize_code(&code)).await?;
    Ok(Json(cities))
}

pub async fn search_cities(
    State(state): State<AppState>,
    Query(params): Query<SearchCitiesParams>,
) -> ApiResult<Json<Vec<City>>> {
    let name = params.name.unwrap_or_default();
    let limit = parse_limit(params.limit.as_deref())?;
    // Reject before touching the database.
    validate_search(&name, limit)?;

    Ok(Json(state.geo.search_cities_by_name(&name, limit).await?))
}

/// `GET /geo/:type` where type is `countries` or `cities` (with `?country=`).
pub async fn geo_by_type(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<GeoTypeParams>,
) -> ApiResult<Response> {
    match kind.to_lowercase().as_str() {
        "countries" => Ok(Json(state.geo.list_countries().await?).into_response()),
        "cities" => {
            let code = params
                .country
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .ok_or_else(|| {
                    ApiError::bad_request("Country code is required for cities endpoint")
                })?;
            let cities = state.geo.list_cities_by_country(&normalize_code(code)).await?;
            Ok(Json(cities).into_response())
        }
        _ => Err(ApiError::bad_request("Invalid type. Use \"countries\" or \"cities\"")),
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn parse_limit(raw: Option<&str>) -> ApiResult<u32> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_SEARCH_LIMIT),
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| ApiError::bad_request("Limit must be a number between 1 and 1000")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("us"), "US");
        assert_eq!(normalize_code(" fr "), "FR");
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None).expect("default"), DEFAULT_SEARCH_LIMIT);
        assert_eq!(parse_limit(Some("")).expect("default"), DEFAULT_SEARCH_LIMIT);
        assert_eq!(parse_limit(Some("25")).expect("parsed"), 25);
        assert!(parse_limit(Some("ten")).is_err());
        assert!(parse_limit(Some("-1")).is_err());
        assert!(parse_limit(Some("2.5")).is_err());
    }
}
