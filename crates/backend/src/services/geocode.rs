//! Reverse geocoding through Nominatim (OpenStreetMap).

use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::{Map, Value};
use shared_types::PlaceDescriptor;

use super::{truncate_body, UpstreamError};

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const SERVICE: &str = "Nominatim";
const USER_AGENT: &str = concat!("geo-gateway/", env!("CARGO_PKG_VERSION"));

// Most specific first.
const CITY_KEYS: [&str; 5] = ["city", "town", "village", "hamlet", "suburb"];
const REGION_KEYS: [&str; 2] = ["state", "county"];

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Map<String, Value>,
}

#[derive(Clone)]
pub struct GeocodeClient {
    http: Client,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Turn a coordinate pair into a place descriptor.
    pub async fn reverse(&self, lat: f64, lng: f64) -> Result<PlaceDescriptor, UpstreamError> {
        let response = self
            .http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("format", "json".to_string()),
            ])
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source: source.without_url(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source: source.without_url(),
            })?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                service: SERVICE,
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: NominatimResponse =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Decode {
                service: SERVICE,
                detail: format!("{}: {}", e, truncate_body(&body)),
            })?;

        Ok(describe(parsed.address))
    }
}

fn describe(address: Map<String, Value>) -> PlaceDescriptor {
    PlaceDescriptor {
        city: first_present(&address, &CITY_KEYS),
        region: first_present(&address, &REGION_KEYS),
        country: first_present(&address, &["country"]),
        country_code: first_present(&address, &["country_code"]),
        raw: address,
    }
}

fn first_present(address: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| address.get(*key).and_then(Value::as_str))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
