use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::require_auth;
use crate::handlers::{geo, location, weather};
use crate::AppState;

/// All routes. `/location` and `/weather` sit behind the auth middleware;
/// everything else is public.
pub fn api_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/location", post(location::reverse_geocode))
        .route("/weather", post(weather::current_weather))
        .route_layer(middleware::from_fn_with_state(
            state.auth_gate.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health_check))
        // Geo reference data
        .route("/geo/countries", get(geo::list_countries))
        .route("/geo/countries/:code", get(geo::get_country))
        .route("/geo/countries/:code/cities", get(geo::list_country_cities))
        .route("/geo/search/cities", get(geo::search_cities))
        .route("/geo/:type", get(geo::geo_by_type))
        .merge(protected)
        .with_state(state)
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}
