//! Current conditions from WeatherAPI.com.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use shared_types::{WeatherDescriptor, WeatherLocation};

use super::{truncate_body, UpstreamError};

pub const WEATHER_API_URL: &str = "http://api.weatherapi.com/v1";
const SERVICE: &str = "WeatherAPI";

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    region: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    condition: WaCondition,
    wind_kph: f64,
    humidity: f64,
    is_day: i64,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: String,
}

#[derive(Clone)]
pub struct WeatherClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(http: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub async fn current(&self, lat: f64, lng: f64) -> Result<WeatherDescriptor, UpstreamError> {
        let q = format!("{},{}", lat, lng);
        // Transport errors drop the URL: its query string carries the key.
        let response = self
            .http
            .get(format!("{}/current.json", self.base_url))
            .query(&[("key", self.api_key.as_str()), ("q", q.as_str()), ("aqi", "no")])
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

        let parsed: WaResponse = serde_json::from_str(&body).map_err(|e| decode_error(e, &body))?;
        let current: WaCurrent = serde_json::from_value(Value::Object(parsed.current.clone()))
            .map_err(|e| decode_error(e, &body))?;

        Ok(WeatherDescriptor {
            location: WeatherLocation {
                name: parsed.location.name,
                region: parsed.location.region,
                country: parsed.location.country,
            },
            temperature_c: current.temp_c,
            condition: current.condition.text,
            icon: current.condition.icon,
            wind_kph: current.wind_kph,
            humidity: current.humidity,
            is_day: current.is_day == 1,
            raw: parsed.current,
        })
    }
}

fn decode_error(err: serde_json::Error, body: &str) -> UpstreamError {
    UpstreamError::Decode {
        service: SERVICE,
        detail: format!("{}: {}", err, truncate_body(body)),
    }
}
