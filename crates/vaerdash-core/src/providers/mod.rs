use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::QueryError;
use crate::geocoding::ResolvedPlace;

pub mod met_no;
pub mod open_meteo;

/// The network seam between the controller and the outside world. Every
/// operation takes the query pipeline's cancellation token; a canceled call
/// resolves to `QueryError::Canceled` and yields no observable result.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    async fn geocode_one(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedPlace>, QueryError>;

    async fn geocode_many(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedPlace>, QueryError>;

    async fn reverse_geocode(
        &self,
        lat: f64,
        lon: f64,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedPlace>, QueryError>;

    async fn fetch_forecast(
        &self,
        lat: f64,
        lon: f64,
        cancel: &CancellationToken,
    ) -> Result<met_no::ForecastResponse, QueryError>;
}

/// Production implementation over one shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpWeatherApi {
    client: Client,
    config: ClientConfig,
}

impl HttpWeatherApi {
    pub fn new(config: ClientConfig) -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| QueryError::Provider(format!("http client: {error}")))?;

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self, QueryError> {
        Self::new(ClientConfig::default())
    }
}

#[async_trait]
impl WeatherApi for HttpWeatherApi {
    async fn geocode_one(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedPlace>, QueryError> {
        open_meteo::search_one(&self.client, &self.config, query, cancel).await
    }

    async fn geocode_many(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolvedPlace>, QueryError> {
        open_meteo::search_many(&self.client, &self.config, query, cancel).await
    }

    async fn reverse_geocode(
        &self,
        lat: f64,
        lon: f64,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedPlace>, QueryError> {
        open_meteo::reverse(&self.client, &self.config, lat, lon, cancel).await
    }

    async fn fetch_forecast(
        &self,
        lat: f64,
        lon: f64,
        cancel: &CancellationToken,
    ) -> Result<met_no::ForecastResponse, QueryError> {
        met_no::fetch_forecast(&self.client, &self.config, lat, lon, cancel).await
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub(crate) enum FetchFailure {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http error ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("request canceled")]
    Canceled,
}

/// Run one HTTP round-trip, racing it against the operation's token. The
/// cancellation branch wins even when the response is already in flight.
pub(crate) async fn execute_request(
    request: RequestBuilder,
    cancel: &CancellationToken,
) -> Result<String, FetchFailure> {
    let roundtrip = async {
        let response = request
            .send()
            .await
            .map_err(|error| FetchFailure::Transport(error.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| FetchFailure::Transport(error.to_string()))?;

        if status.is_success() {
            return Ok(body);
        }

        let message = extract_error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

        Err(FetchFailure::Http {
            status: status.as_u16(),
            message,
        })
    };

    tokio::select! {
        () = cancel.cancelled() => Err(FetchFailure::Canceled),
        result = roundtrip => result,
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|json| {
            for key in ["reason", "message", "error", "detail", "description"] {
                if let Some(value) = json.get(key).and_then(Value::as_str) {
                    let message = value.trim();
                    if !message.is_empty() {
                        return Some(message.to_string());
                    }
                }
            }
            None
        })
}
