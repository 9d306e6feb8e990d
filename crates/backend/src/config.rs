use clap::Parser;
use std::path::PathBuf;

use crate::auth::{AuthConfig, GOOGLE_JWKS_URL};
use crate::services::{geocode::NOMINATIM_URL, weather::WEATHER_API_URL};

/// Server configuration. Every flag can also come from the environment
/// (or a `.env` file).
#[derive(Parser, Clone)]
#[command(name = "backend")]
#[command(about = "Geo gateway: reverse geocoding, weather and country/city reference data")]
pub struct AppConfig {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Path to the read-only SQLite geo dataset.
    #[arg(long, env = "GEO_DB_PATH", default_value = "data/world_geo.db")]
    pub geo_db_path: PathBuf,

    /// Base URL of the primary auth backend.
    #[arg(long, env = "AUTH_URL")]
    pub auth_url: String,

    /// API key sent to the primary auth backend as `apikey`.
    #[arg(long, env = "AUTH_API_KEY", hide_env_values = true)]
    pub auth_api_key: String,

    /// OAuth client id Google ID tokens must be issued for.
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: String,

    #[arg(long, env = "GOOGLE_JWKS_URL", default_value = GOOGLE_JWKS_URL)]
    pub google_jwks_url: String,

    #[arg(long, env = "WEATHER_API_KEY", hide_env_values = true)]
    pub weather_api_key: String,

    #[arg(long, env = "WEATHER_API_URL", default_value = WEATHER_API_URL)]
    pub weather_api_url: String,

    #[arg(long, env = "NOMINATIM_URL", default_value = NOMINATIM_URL)]
    pub nominatim_url: String,

    /// Comma-separated list of allowed CORS origins. Permissive when unset.
    #[arg(long, env = "CORS_ALLOWED_ORIGINS")]
    pub cors_allowed_origins: Option<String>,
}

impl AppConfig {
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            primary_url: self.auth_url.clone(),
            primary_api_key: self.auth_api_key.clone(),
            google_client_id: self.google_client_id.clone(),
            google_jwks_url: self.google_jwks_url.clone(),
        }
    }
}
