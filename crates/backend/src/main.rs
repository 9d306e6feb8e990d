use anyhow::Context;
use axum::http::{header, Method};
use clap::Parser;
use std::net::SocketAddr;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod auth;
mod config;
mod db;
pub mod error;
mod handlers;
mod routes;
mod services;

use auth::AuthGate;
use config::AppConfig;
use db::GeoStore;
use services::{GeocodeClient, WeatherClient};

/// Shared handler state. Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub auth_gate: AuthGate,
    pub geo: GeoStore,
    pub geocode: GeocodeClient,
    pub weather: WeatherClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = AppConfig::parse();

    let geo = GeoStore::open(&config.geo_db_path).with_context(|| {
        format!(
            "failed to open geo database at {}",
            config.geo_db_path.display()
        )
    })?;

    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let state = AppState {
        auth_gate: AuthGate::new(http.clone(), &config.auth_config()),
        geo,
        geocode: GeocodeClient::new(http.clone(), &config.nominatim_url),
        weather: WeatherClient::new(http, &config.weather_api_url, &config.weather_api_key),
    };

    let app = routes::api_routes(state)
        .layer(build_cors_layer(config.cors_allowed_origins.as_deref()))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build CORS layer from the configured origin list.
///
/// With no origins configured, CORS is permissive (development only).
fn build_cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    match allowed_origins {
        Some(origins) => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                tracing::warn!(
                    "CORS_ALLOWED_ORIGINS is set but empty, using permissive CORS (not recommended for production)"
                );
                CorsLayer::permissive()
            } else {
                tracing::info!("CORS configured for origins: {:?}", origins);
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::warn!(
                "CORS_ALLOWED_ORIGINS not set, using permissive CORS (not recommended for production)"
            );
            CorsLayer::permissive()
        }
    }
}
