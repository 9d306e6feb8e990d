//! Clients for the third-party services behind `/location` and `/weather`.

pub mod geocode;
pub mod weather;

use reqwest::StatusCode;
use thiserror::Error;

pub use geocode::GeocodeClient;
pub use weather::WeatherClient;

/// Failure talking to a third-party service. Never the caller's fault.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{service} returned an unexpected body: {detail}")]
    Decode {
        service: &'static str,
        detail: String,
    },
}

/// Keep upstream error bodies short in logs.
fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX).collect();
        format!("{}…", head)
    }
}
