use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geocoding::ResolvedPlace;

/// All stored values are Celsius; conversion happens at display time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }
}

/// "12°C" / "54°F", rounded to whole degrees.
pub fn temp_label(celsius: f64, unit: TemperatureUnit) -> String {
    format!("{}°{}", unit.convert(celsius).round(), unit.suffix())
}

/// Conditions at the series' first sample. Optional fields reflect gaps in
/// the provider payload and are never defaulted to zero here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub time: String,
    pub temperature: f64,
    /// Mirrors `temperature`; no apparent-temperature model is applied.
    pub feels_like: f64,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    pub time: String,
    pub temperature: f64,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
}

/// One calendar day of the rollup. `date` is the provider's own date segment
/// ("2024-01-01"), not a re-derived local date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub symbol: String,
    pub precipitation: f64,
}

/// The aggregate result of one successful query. Replaces any previous
/// bundle atomically in the controller's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherBundle {
    pub location: ResolvedPlace,
    pub current: CurrentConditions,
    pub daily: Vec<DailyEntry>,
    pub hourly: Vec<HourlyEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The controller's published state record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub data: Option<WeatherBundle>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_query: String,
    pub unit: TemperatureUnit,
}

impl ViewState {
    pub fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_query: String::new(),
            unit: TemperatureUnit::default(),
        }
    }

    pub fn phase(&self) -> QueryPhase {
        if self.loading {
            QueryPhase::Loading
        } else if self.error.is_some() {
            QueryPhase::Failed
        } else if self.data.is_some() {
            QueryPhase::Ready
        } else {
            QueryPhase::Idle
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::idle()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}
