use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Country row from the geo dataset.
///
/// Columns beyond code and name are passed through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    #[serde(rename = "country_code")]
    pub code: String,
    #[serde(rename = "country_name")]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(rename = "city")]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub population: i64,
    pub country_code: String,
}

/// Body of `POST /location` and `POST /weather`.
///
/// Both fields accept either a JSON number or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub lat: f64,
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub lng: f64,
}

impl Coordinates {
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("'{}' is not a number", s))),
    }
}

/// Reverse-geocoded place returned by `POST /location`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDescriptor {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    /// Full upstream address object
    pub raw: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherLocation {
    pub name: String,
    pub region: String,
    pub country: String,
}

/// Current conditions returned by `POST /weather`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDescriptor {
    pub location: WeatherLocation,
    pub temperature_c: f64,
    pub condition: String,
    pub icon: String,
    pub wind_kph: f64,
    pub humidity: f64,
    pub is_day: bool,
    /// Full upstream `current` object
    pub raw: Map<String, Value>,
}
