pub const GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com/v1";
pub const FORECAST_URL: &str = "https://api.met.no/weatherapi/locationforecast/2.0/compact";

pub const REQUEST_TIMEOUT_SECS: u64 = 10;
pub const MET_NO_USER_AGENT: &str = "vaerdash/0.1 (+https://github.com/sympoies/vaerdash)";

/// Result cap for a single-place lookup (`submit` resolves the first hit).
pub const SEARCH_RESULT_COUNT: u8 = 5;
/// Result cap for autocomplete lookups.
pub const SUGGEST_RESULT_COUNT: u8 = 10;

pub const GEOCODE_COUNTRY: &str = "NO";
pub const GEOCODE_LANGUAGE: &str = "nb";

/// Derived-view caps: the hourly slice and the day-bucketed rollup.
pub const HOURLY_VIEW_HOURS: usize = 12;
pub const DAILY_VIEW_DAYS: usize = 7;

pub const SUGGEST_DEBOUNCE_MS: u64 = 600;

/// Endpoint wiring for [`HttpWeatherApi`](crate::providers::HttpWeatherApi).
///
/// The production values are fixed; the struct exists so tests can point the
/// client at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub geocoding_base_url: String,
    pub forecast_url: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            geocoding_base_url: GEOCODING_BASE_URL.to_string(),
            forecast_url: FORECAST_URL.to_string(),
            timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}
