//! OSRM HTTP adapter for distance matrices.
//!
//! Uses the Table service with `annotations=distance`; OSRM reports meters as
//! floats, which are rounded to whole meters here.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ProviderError;
use crate::matrix::DistanceMatrix;
use crate::traits::DistanceMatrixProvider;

pub const ENV_BASE_URL: &str = "TRIP_PLANNER_OSRM_URL";
pub const ENV_PROFILE: &str = "TRIP_PLANNER_OSRM_PROFILE";
pub const ENV_TIMEOUT_SECS: &str = "TRIP_PLANNER_OSRM_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
        }
    }
}

impl OsrmConfig {
    /// Defaults overridden by `TRIP_PLANNER_OSRM_*` environment variables.
    ///
    /// A timeout that does not parse as whole seconds keeps the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(profile) = lookup(ENV_PROFILE) {
            config.profile = profile;
        }
        let timeout = lookup(ENV_TIMEOUT_SECS).and_then(|value| value.trim().parse().ok());
        if let Some(timeout) = timeout {
            config.timeout_secs = timeout;
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Use a preconfigured HTTP client; `config.timeout_secs` is then only
    /// reported in errors.
    pub fn with_client(config: OsrmConfig, client: reqwest::blocking::Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }

    fn table_url(&self, locations: &[(f64, f64)]) -> String {
        let coords = locations
            .iter()
            .map(|(lat, lng)| format!("{:.6},{:.6}", lng, lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}?annotations=distance",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }

    fn convert_error(&self, err: &reqwest::Error, url: &str) -> ProviderError {
        if err.is_timeout() {
            return ProviderError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout_secs,
            };
        }
        if let Some(status) = err.status() {
            return ProviderError::Status {
                status: status.as_u16(),
            };
        }
        ProviderError::Request {
            url: url.to_owned(),
            message: err.to_string(),
        }
    }
}

impl DistanceMatrixProvider for OsrmClient {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix, ProviderError> {
        if locations.is_empty() {
            return Err(ProviderError::Malformed {
                reason: "no coordinates requested".to_string(),
            });
        }

        let url = self.table_url(locations);
        tracing::debug!(locations = locations.len(), "requesting OSRM table");

        let body = self
            .client
            .get(&url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|err| self.convert_error(&err, &url))?;

        let response: TableResponse =
            serde_json::from_str(&body).map_err(|err| ProviderError::Malformed {
                reason: err.to_string(),
            })?;

        matrix_from_response(response, locations.len())
    }
}

/// OSRM Table service response (distance annotation only).
#[derive(Debug, Deserialize)]
struct TableResponse {
    code: String,
    message: Option<String>,
    /// `distances[i][j]` in meters; `null` when no route exists.
    distances: Option<Vec<Vec<Option<f64>>>>,
}

fn matrix_from_response(
    response: TableResponse,
    expected: usize,
) -> Result<DistanceMatrix, ProviderError> {
    if response.code != "Ok" {
        return Err(ProviderError::Oracle {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }

    let distances = response.distances.ok_or_else(|| ProviderError::Malformed {
        reason: "response has no distances".to_string(),
    })?;

    if distances.len() != expected {
        return Err(ProviderError::SizeMismatch {
            expected,
            actual: distances.len(),
        });
    }

    let mut rows = Vec::with_capacity(expected);
    for (i, row) in distances.into_iter().enumerate() {
        if row.len() != expected {
            return Err(ProviderError::SizeMismatch {
                expected,
                actual: row.len(),
            });
        }
        let row = row
            .into_iter()
            .enumerate()
            .map(|(j, value)| round_meters(value, i, j))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }

    Ok(DistanceMatrix::from_rows(rows)?)
}

/// Longest single leg accepted from the oracle, well past any road distance.
const MAX_LEG_METERS: f64 = u32::MAX as f64;

fn round_meters(value: Option<f64>, from: usize, to: usize) -> Result<u64, ProviderError> {
    match value {
        Some(meters) if (0.0..=MAX_LEG_METERS).contains(&meters) => Ok(meters.round() as u64),
        Some(meters) => Err(ProviderError::Malformed {
            reason: format!("invalid distance {meters} from {from} to {to}"),
        }),
        None => Err(ProviderError::Malformed {
            reason: format!("no route from {from} to {to}"),
        }),
    }
}
