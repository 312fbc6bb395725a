use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{
    ClientConfig, GEOCODE_COUNTRY, GEOCODE_LANGUAGE, SEARCH_RESULT_COUNT, SUGGEST_RESULT_COUNT,
};
use crate::error::QueryError;
use crate::geocoding::ResolvedPlace;

use super::{FetchFailure, execute_request};

#[derive(Debug, Serialize)]
struct SearchQuery<'a> {
    name: &'a str,
    count: u8,
    country: &'a str,
    language: &'a str,
    format: &'a str,
}

#[derive(Debug, Serialize)]
struct ReverseQuery<'a> {
    latitude: f64,
    longitude: f64,
    count: u8,
    language: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    latitude: f64,
    longitude: f64,
    name: String,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    admin1: Option<String>,
    #[serde(default)]
    admin2: Option<String>,
}

impl SearchResult {
    fn into_place(self) -> ResolvedPlace {
        ResolvedPlace {
            lat: self.latitude,
            lon: self.longitude,
            name: self.name,
            country: self.country_code,
            timezone: self.timezone,
            admin1: self.admin1,
            admin2: self.admin2,
        }
    }
}

/// Best-ranked match for a free-text query, or `None` when the provider has
/// zero results. `None` is not an error: the caller maps it to "no match".
pub async fn search_one(
    client: &Client,
    config: &ClientConfig,
    query: &str,
    cancel: &CancellationToken,
) -> Result<Option<ResolvedPlace>, QueryError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let body = run_search(client, config, trimmed, SEARCH_RESULT_COUNT, cancel).await?;
    Ok(parse_search_response(&body)?.into_iter().next())
}

/// All matches for an autocomplete query, in provider rank order. An empty
/// trimmed query yields an empty list without a network call.
pub async fn search_many(
    client: &Client,
    config: &ClientConfig,
    query: &str,
    cancel: &CancellationToken,
) -> Result<Vec<ResolvedPlace>, QueryError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let body = run_search(client, config, trimmed, SUGGEST_RESULT_COUNT, cancel).await?;
    parse_search_response(&body)
}

/// Reverse lookup from coordinates to a named place. Used by the
/// device-position flow only; the caller treats failure as recoverable.
pub async fn reverse(
    client: &Client,
    config: &ClientConfig,
    lat: f64,
    lon: f64,
    cancel: &CancellationToken,
) -> Result<Option<ResolvedPlace>, QueryError> {
    let query = ReverseQuery {
        latitude: lat,
        longitude: lon,
        count: 1,
        language: GEOCODE_LANGUAGE,
        format: "json",
    };

    debug!(lat, lon, "reverse geocoding device position");

    let request = client
        .get(format!("{}/reverse", config.geocoding_base_url))
        .query(&query)
        .header(ACCEPT, "application/json");

    let body = execute_request(request, cancel)
        .await
        .map_err(lookup_error)?;

    Ok(parse_search_response(&body)?.into_iter().next())
}

async fn run_search(
    client: &Client,
    config: &ClientConfig,
    name: &str,
    count: u8,
    cancel: &CancellationToken,
) -> Result<String, QueryError> {
    let query = SearchQuery {
        name,
        count,
        country: GEOCODE_COUNTRY,
        language: GEOCODE_LANGUAGE,
        format: "json",
    };

    debug!(name, count, "searching places");

    let request = client
        .get(format!("{}/search", config.geocoding_base_url))
        .query(&query)
        .header(ACCEPT, "application/json");

    execute_request(request, cancel).await.map_err(lookup_error)
}

fn lookup_error(failure: FetchFailure) -> QueryError {
    match failure {
        FetchFailure::Canceled => QueryError::Canceled,
        other => QueryError::LookupFailed(other.to_string()),
    }
}

pub(crate) fn parse_search_response(body: &str) -> Result<Vec<ResolvedPlace>, QueryError> {
    let payload: SearchResponse = serde_json::from_str(body)
        .map_err(|error| QueryError::LookupFailed(format!("geocode payload: {error}")))?;

    Ok(payload
        .results
        .into_iter()
        .map(SearchResult::into_place)
        .collect())
}
