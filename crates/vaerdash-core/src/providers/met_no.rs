use reqwest::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{ClientConfig, MET_NO_USER_AGENT};
use crate::error::QueryError;

use super::{FetchFailure, execute_request};

#[derive(Debug, Serialize)]
struct ForecastQuery {
    lat: f64,
    lon: f64,
    altitude: i32,
}

/// Fetch the raw locationforecast payload for a coordinate pair.
///
/// A canceled request resolves to `QueryError::Canceled` and never yields a
/// payload. A 2xx response with an empty timeseries is `EmptyForecast`.
pub async fn fetch_forecast(
    client: &Client,
    config: &ClientConfig,
    lat: f64,
    lon: f64,
    cancel: &CancellationToken,
) -> Result<ForecastResponse, QueryError> {
    let query = ForecastQuery {
        lat,
        lon,
        altitude: 0,
    };

    debug!(lat, lon, "fetching MET Norway forecast");

    let request = client
        .get(&config.forecast_url)
        .query(&query)
        .header(ACCEPT, "application/json")
        .header(USER_AGENT, MET_NO_USER_AGENT);

    let body = execute_request(request, cancel)
        .await
        .map_err(provider_error)?;

    parse_forecast_response(&body)
}

fn provider_error(failure: FetchFailure) -> QueryError {
    match failure {
        FetchFailure::Canceled => QueryError::Canceled,
        other => QueryError::Provider(other.to_string()),
    }
}

pub(crate) fn parse_forecast_response(body: &str) -> Result<ForecastResponse, QueryError> {
    let payload: ForecastResponse = serde_json::from_str(body).map_err(|error| {
        QueryError::Provider(format!("failed to decode MET Norway response: {error}"))
    })?;

    if payload.properties.timeseries.is_empty() {
        return Err(QueryError::EmptyForecast);
    }

    Ok(payload)
}

/// The compact locationforecast payload:
/// `{ properties: { meta?, timeseries: [...] } }`. Entries arrive ordered
/// ascending by `time`; that order is load-bearing downstream (entry 0 is
/// "now").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub properties: ForecastProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastProperties {
    #[serde(default)]
    pub meta: Option<ForecastMeta>,
    #[serde(default)]
    pub timeseries: Vec<TimeseriesEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMeta {
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesEntry {
    pub time: String,
    pub data: EntryData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryData {
    pub instant: InstantBlock,
    #[serde(default)]
    pub next_1_hours: Option<HorizonBlock>,
    #[serde(default)]
    pub next_6_hours: Option<HorizonBlock>,
}

impl EntryData {
    /// Symbol for this entry: `next_1_hours` wins over `next_6_hours`.
    /// Strict priority per window, so a 1-hour window without a symbol code
    /// still falls through to the 6-hour one.
    pub fn symbol_code(&self) -> Option<&str> {
        self.next_1_hours
            .as_ref()
            .and_then(HorizonBlock::symbol_code)
            .or_else(|| self.next_6_hours.as_ref().and_then(HorizonBlock::symbol_code))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantBlock {
    pub details: InstantDetails,
}

/// Only `air_temperature` is guaranteed by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantDetails {
    pub air_temperature: f64,
    #[serde(default)]
    pub relative_humidity: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub air_pressure_at_sea_level: Option<f64>,
    #[serde(default)]
    pub cloud_area_fraction: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonBlock {
    #[serde(default)]
    pub summary: Option<HorizonSummary>,
    #[serde(default)]
    pub details: Option<HorizonDetails>,
}

impl HorizonBlock {
    fn symbol_code(&self) -> Option<&str> {
        self.summary
            .as_ref()
            .and_then(|summary| summary.symbol_code.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonSummary {
    #[serde(default)]
    pub symbol_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonDetails {
    #[serde(default)]
    pub precipitation_amount: Option<f64>,
    #[serde(default)]
    pub air_temperature_min: Option<f64>,
    #[serde(default)]
    pub air_temperature_max: Option<f64>,
}
