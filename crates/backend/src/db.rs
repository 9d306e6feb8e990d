//! Read-only access to the country/city dataset.
//!
//! The dataset is a SQLite file produced by an external pipeline with two
//! tables: `countries(country_code, country_name, ...)` and
//! `cities(name, latitude, longitude, population, country_code)`.
//! Every query opens its own read-only connection on the blocking pool, so
//! any number of requests can read at once and nothing is shared between them.

use rusqlite::{
    functions::FunctionFlags, params, types::ValueRef, Connection, OpenFlags, OptionalExtension,
    Row,
};
use serde_json::{Map, Number, Value};
use shared_types::{City, Country};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const MIN_SEARCH_LIMIT: u32 = 1;
pub const MAX_SEARCH_LIMIT: u32 = 1000;
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

const CITY_COLUMNS: &str = "name, latitude, longitude, population, country_code";
// Population ties are broken by name and rowid so repeated calls agree.
const CITY_ORDER: &str = "ORDER BY population DESC, name ASC, rowid ASC";

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Geo database unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<rusqlite::Error> for GeoError {
    fn from(err: rusqlite::Error) -> Self {
        GeoError::StoreUnavailable(err.to_string())
    }
}

pub type GeoResult<T> = Result<T, GeoError>;

/// Handle to the geo dataset. Cheap to clone.
#[derive(Debug, Clone)]
pub struct GeoStore {
    path: Arc<PathBuf>,
}

impl GeoStore {
    /// Open the dataset at `path`, checking that both tables are present.
    pub fn open<P: AsRef<Path>>(path: P) -> GeoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = open_read_only(&path)?;

        for table in ["countries", "cities"] {
            let exists: bool = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get::<_, i64>(0).map(|n| n > 0),
            )?;
            if !exists {
                return Err(GeoError::StoreUnavailable(format!(
                    "table '{}' missing from {}",
                    table,
                    path.display()
                )));
            }
        }

        Ok(Self {
            path: Arc::new(path),
        })
    }

    /// All countries ordered by name.
    pub async fn list_countries(&self) -> GeoResult<Vec<Country>> {
        self.run(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM countries ORDER BY country_name ASC, country_code ASC")?;
            let rows = stmt.query_map([], row_to_country)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    /// Exact lookup by ISO code. The caller normalizes case.
    pub async fn get_country(&self, code: &str) -> GeoResult<Country> {
        let code = code.to_string();
        self.run(move |conn| {
            find_country(conn, &code)?.ok_or_else(|| {
                GeoError::NotFound(format!("Country with code '{}' not found", code))
            })
        })
        .await
    }

    /// Cities of a country, most populous first.
    ///
    /// An unknown country is `NotFound`; a known country without cities is
    /// an empty list.
    pub async fn list_cities_by_country(&self, code: &str) -> GeoResult<Vec<City>> {
        let code = code.to_string();
        self.run(move |conn| {
            let known: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM countries WHERE country_code = ?1 LIMIT 1",
                    params![code],
                    |row| row.get(0),
                )
                .optional()?;
            if known.is_none() {
                return Err(GeoError::NotFound(format!(
                    "Country with code '{}' not found",
                    code
                )));
            }

            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM cities WHERE country_code = ?1 {}",
                CITY_COLUMNS, CITY_ORDER
            ))?;
            let rows = stmt.query_map(params![code], row_to_city)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    /// Cities whose name contains the trimmed `fragment`, ignoring case
    /// (Unicode-aware), most populous first, at most `limit` of them.
    pub async fn search_cities_by_name(
        &self,
        fragment: &str,
        limit: u32,
    ) -> GeoResult<Vec<City>> {
        validate_search(fragment, limit)?;

        let pattern = format!("%{}%", escape_like(&fragment.trim().to_lowercase()));
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM cities WHERE unicode_lower(name) LIKE ?1 ESCAPE '\\' {} LIMIT ?2",
                CITY_COLUMNS, CITY_ORDER
            ))?;
            let rows = stmt.query_map(params![pattern, limit], row_to_city)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn run<T, F>(&self, query: F) -> GeoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> GeoResult<T> + Send + 'static,
    {
        let path = Arc::clone(&self.path);
        tokio::task::spawn_blocking(move || {
            let conn = open_read_only(&path)?;
            query(&conn)
        })
        .await
        .map_err(|e| GeoError::StoreUnavailable(format!("query task failed: {}", e)))?
    }
}

pub fn validate_search(fragment: &str, limit: u32) -> GeoResult<()> {
    if fragment.trim().is_empty() {
        return Err(GeoError::Validation("City name is required".to_string()));
    }
    if !(MIN_SEARCH_LIMIT..=MAX_SEARCH_LIMIT).contains(&limit) {
        return Err(GeoError::Validation(format!(
            "Limit must be a number between {} and {}",
            MIN_SEARCH_LIMIT, MAX_SEARCH_LIMIT
        )));
    }
    Ok(())
}

fn open_read_only(path: &Path) -> GeoResult<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| {
        GeoError::StoreUnavailable(format!("failed to open {}: {}", path.display(), e))
    })?;

    // SQLite's own lower() and LIKE only fold ASCII.
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )?;

    Ok(conn)
}

fn find_country(conn: &Connection, code: &str) -> GeoResult<Option<Country>> {
    let mut stmt = conn.prepare("SELECT * FROM countries WHERE country_code = ?1")?;
    Ok(stmt.query_row(params![code], row_to_country).optional()?)
}

/// `%`, `_` and `\` in user input match literally.
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn row_to_country(row: &Row) -> rusqlite::Result<Country> {
    let mut code = None;
    let mut name = None;
    let mut extra = Map::new();

    for (idx, column) in row.as_ref().column_names().into_iter().enumerate() {
        match column {
            "country_code" => code = Some(row.get::<_, String>(idx)?),
            "country_name" => name = Some(row.get::<_, String>(idx)?),
            other => {
                extra.insert(other.to_string(), sql_to_json(row.get_ref(idx)?));
            }
        }
    }

    match (code, name) {
        (Some(code), Some(name)) => Ok(Country { code, name, extra }),
        _ => Err(rusqlite::Error::InvalidColumnName(
            "country_code/country_name".to_string(),
        )),
    }
}

fn row_to_city(row: &Row) -> rusqlite::Result<City> {
    Ok(City {
        name: row.get(0)?,
        latitude: row.get(1)?,
        longitude: row.get(2)?,
        population: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
        country_code: row.get(4)?,
    })
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rusqlite::{params, Connection};
    use tempfile::NamedTempFile;

    use super::GeoStore;

    /// Builds a throwaway dataset file. Keep the returned file alive for as
    /// long as the store is used.
    pub fn geo_store(
        countries: &[(&str, &str)],
        cities: &[(&str, f64, f64, i64, &str)],
    ) -> (GeoStore, NamedTempFile) {
        let file = NamedTempFile::new().expect("should create temp file");
        let conn = Connection::open(file.path()).expect("should open fixture db");
        conn.execute_batch(
            "CREATE TABLE countries (
                country_code TEXT PRIMARY KEY,
                country_name TEXT NOT NULL,
                continent TEXT
            );
            CREATE TABLE cities (
                name TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                population INTEGER NOT NULL,
                country_code TEXT NOT NULL REFERENCES countries(country_code)
            );",
        )
        .expect("should create schema");

        for (code, name) in countries {
            conn.execute(
                "INSERT INTO countries (country_code, country_name, continent) VALUES (?1, ?2, NULL)",
                params![code, name],
            )
            .expect("should insert country");
        }
        for (name, lat, lng, population, code) in cities {
            conn.execute(
                "INSERT INTO cities (name, latitude, longitude, population, country_code)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![name, lat, lng, population, code],
            )
            .expect("should insert city");
        }
        drop(conn);

        let store = GeoStore::open(file.path()).expect("should open store");
        (store, file)
    }

    pub fn sample_store() -> (GeoStore, NamedTempFile) {
        geo_store(
            &[("US", "United States"), ("FR", "France"), ("AQ", "Antarctica")],
            &[
                ("Albany", 42.65, -73.75, 100_000, "US"),
                ("New York", 40.71, -74.00, 8_000_000, "US"),
                ("San Jose", 37.33, -121.88, 1_000_000, "US"),
                ("San Francisco", 37.77, -122.42, 870_000, "US"),
                ("San Diego", 32.71, -117.16, 1_380_000, "US"),
                ("Paris", 48.85, 2.35, 2_100_000, "FR"),
                ("Lyon", 45.76, 4.84, 513_000, "FR"),
            ],
        )
    }
}
