//! Pure transformation of the raw locationforecast timeseries into the
//! three derived dashboard views: current snapshot, capped hourly slice,
//! and day-bucketed rollup. No I/O and no cancellation at this layer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::{DAILY_VIEW_DAYS, HOURLY_VIEW_HOURS};
use crate::error::QueryError;
use crate::geocoding::ResolvedPlace;
use crate::model::{CurrentConditions, DailyEntry, HourlyEntry, WeatherBundle};
use crate::providers::met_no::{ForecastResponse, TimeseriesEntry};
use crate::symbol::DEFAULT_SYMBOL;

/// Derive a [`WeatherBundle`] from a raw payload. The series must be
/// non-empty; an empty one is `EmptyForecast` (the fetch layer has already
/// rejected it, this guard keeps the function total).
pub fn build_bundle(
    payload: ForecastResponse,
    location: ResolvedPlace,
) -> Result<WeatherBundle, QueryError> {
    let series = &payload.properties.timeseries;
    let Some(first) = series.first() else {
        return Err(QueryError::EmptyForecast);
    };

    let updated_at = payload
        .properties
        .meta
        .as_ref()
        .and_then(|meta| meta.updated_at.as_deref())
        .and_then(parse_rfc3339_utc);

    Ok(WeatherBundle {
        location,
        current: map_current(first),
        daily: map_daily(series),
        hourly: map_hourly(series),
        updated_at,
    })
}

fn pick_symbol(entry: &TimeseriesEntry) -> String {
    entry
        .data
        .symbol_code()
        .unwrap_or(DEFAULT_SYMBOL)
        .to_string()
}

/// Snapshot of the series' first entry. Missing optional fields stay absent
/// rather than defaulting to zero; `feels_like` mirrors the raw temperature.
fn map_current(entry: &TimeseriesEntry) -> CurrentConditions {
    let details = &entry.data.instant.details;
    let precipitation = entry
        .data
        .next_1_hours
        .as_ref()
        .and_then(|window| window.details.as_ref())
        .and_then(|details| details.precipitation_amount);

    CurrentConditions {
        time: entry.time.clone(),
        temperature: details.air_temperature,
        feels_like: details.air_temperature,
        symbol: pick_symbol(entry),
        wind_speed: details.wind_speed,
        humidity: details.relative_humidity,
        pressure: details.air_pressure_at_sea_level,
        precipitation,
    }
}

/// The first 12 entries, mapped one-to-one. No interpolation or gap-filling
/// for irregular intervals: output length is `min(12, input length)`.
fn map_hourly(series: &[TimeseriesEntry]) -> Vec<HourlyEntry> {
    series
        .iter()
        .take(HOURLY_VIEW_HOURS)
        .map(|entry| HourlyEntry {
            time: entry.time.clone(),
            temperature: entry.data.instant.details.air_temperature,
            symbol: pick_symbol(entry),
            precipitation: entry
                .data
                .next_1_hours
                .as_ref()
                .and_then(|window| window.details.as_ref())
                .and_then(|details| details.precipitation_amount),
            wind_speed: entry.data.instant.details.wind_speed,
        })
        .collect()
}

/// Group by the timestamp's date segment, in first-seen order, capped at 7
/// days. Fewer than 7 distinct dates yields fewer entries, no padding.
fn map_daily(series: &[TimeseriesEntry]) -> Vec<DailyEntry> {
    let mut days: Vec<DayAccumulator> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in series {
        let key = date_key(&entry.time);
        let slot = match index.get(key) {
            Some(slot) => *slot,
            None => {
                days.push(DayAccumulator::seed(key.to_string(), entry));
                index.insert(key.to_string(), days.len() - 1);
                days.len() - 1
            }
        };
        days[slot].observe(entry);
    }

    days.into_iter()
        .take(DAILY_VIEW_DAYS)
        .map(DayAccumulator::into_entry)
        .collect()
}

/// The date portion as given by the provider; no timezone re-derivation.
fn date_key(time: &str) -> &str {
    time.split('T').next().unwrap_or(time)
}

#[derive(Debug)]
struct DayAccumulator {
    date: String,
    min: f64,
    max: f64,
    symbol: String,
    precipitation: f64,
}

impl DayAccumulator {
    /// Seeded from the group's first entry: its instant temperature bounds
    /// both extremes and its symbol wins for the whole day.
    fn seed(date: String, entry: &TimeseriesEntry) -> Self {
        let temp = entry.data.instant.details.air_temperature;
        Self {
            date,
            min: temp,
            max: temp,
            symbol: pick_symbol(entry),
            precipitation: 0.0,
        }
    }

    fn observe(&mut self, entry: &TimeseriesEntry) {
        let temp = entry.data.instant.details.air_temperature;
        let window = entry
            .data
            .next_6_hours
            .as_ref()
            .and_then(|window| window.details.as_ref());

        let min_candidate = window
            .and_then(|details| details.air_temperature_min)
            .unwrap_or(temp);
        let max_candidate = window
            .and_then(|details| details.air_temperature_max)
            .unwrap_or(temp);

        self.min = self.min.min(min_candidate);
        self.max = self.max.max(max_candidate);
        // A straight sum across every entry on this date, absent windows
        // counting as zero.
        self.precipitation += window
            .and_then(|details| details.precipitation_amount)
            .unwrap_or(0.0);
    }

    fn into_entry(self) -> DailyEntry {
        DailyEntry {
            date: self.date,
            temp_min: self.min,
            temp_max: self.max,
            symbol: self.symbol,
            precipitation: self.precipitation,
        }
    }
}

fn parse_rfc3339_utc(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::providers::met_no::{
        EntryData, ForecastMeta, ForecastProperties, HorizonBlock, HorizonDetails, HorizonSummary,
        InstantBlock, InstantDetails,
    };

    fn instant(temperature: f64) -> InstantBlock {
        InstantBlock {
            details: InstantDetails {
                air_temperature: temperature,
                relative_humidity: None,
                wind_speed: None,
                air_pressure_at_sea_level: None,
                cloud_area_fraction: None,
            },
        }
    }

    fn window(symbol: Option<&str>, details: Option<HorizonDetails>) -> HorizonBlock {
        HorizonBlock {
            summary: symbol.map(|code| HorizonSummary {
                symbol_code: Some(code.to_string()),
            }),
            details,
        }
    }

    fn entry(time: &str, temperature: f64) -> TimeseriesEntry {
        TimeseriesEntry {
            time: time.to_string(),
            data: EntryData {
                instant: instant(temperature),
                next_1_hours: None,
                next_6_hours: None,
            },
        }
    }

    fn payload(timeseries: Vec<TimeseriesEntry>) -> ForecastResponse {
        ForecastResponse {
            properties: ForecastProperties {
                meta: Some(ForecastMeta {
                    updated_at: Some("2024-01-01T00:00:00Z".to_string()),
                }),
                timeseries,
            },
        }
    }

    fn oslo() -> ResolvedPlace {
        ResolvedPlace::from_coordinates(59.91, 10.75, "Oslo")
    }

    fn rich_first_entry() -> TimeseriesEntry {
        TimeseriesEntry {
            time: "2024-01-01T00:00:00Z".to_string(),
            data: EntryData {
                instant: InstantBlock {
                    details: InstantDetails {
                        air_temperature: 10.0,
                        relative_humidity: Some(80.0),
                        wind_speed: Some(3.0),
                        air_pressure_at_sea_level: None,
                        cloud_area_fraction: None,
                    },
                },
                next_1_hours: Some(window(
                    Some("cloudy"),
                    Some(HorizonDetails {
                        precipitation_amount: Some(0.2),
                        air_temperature_min: None,
                        air_temperature_max: None,
                    }),
                )),
                next_6_hours: Some(window(
                    Some("partly_cloudy"),
                    Some(HorizonDetails {
                        precipitation_amount: Some(0.5),
                        air_temperature_min: Some(8.0),
                        air_temperature_max: Some(12.0),
                    }),
                )),
            },
        }
    }

    #[test]
    fn normalize_current_snapshot_from_first_entry() {
        let bundle = build_bundle(payload(vec![rich_first_entry()]), oslo()).expect("bundle");

        let current = &bundle.current;
        assert_eq!(current.temperature, 10.0);
        assert_eq!(current.feels_like, 10.0);
        assert_eq!(current.symbol, "cloudy");
        assert_eq!(current.wind_speed, Some(3.0));
        assert_eq!(current.humidity, Some(80.0));
        assert_eq!(current.precipitation, Some(0.2));
        assert_eq!(current.pressure, None);
    }

    #[test]
    fn normalize_daily_rollup_uses_six_hour_extremes() {
        let bundle = build_bundle(payload(vec![rich_first_entry()]), oslo()).expect("bundle");

        assert_eq!(bundle.daily.len(), 1);
        let day = &bundle.daily[0];
        assert_eq!(day.date, "2024-01-01");
        assert_eq!(day.temp_min, 8.0);
        assert_eq!(day.temp_max, 12.0);
        assert_eq!(day.symbol, "cloudy");
        assert_eq!(day.precipitation, 0.5);
    }

    #[test]
    fn normalize_parses_updated_at() {
        let bundle = build_bundle(payload(vec![rich_first_entry()]), oslo()).expect("bundle");
        let expected = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("time");
        assert_eq!(bundle.updated_at, Some(expected));
    }

    #[test]
    fn normalize_empty_series_is_empty_forecast() {
        let error = build_bundle(payload(Vec::new()), oslo()).expect_err("must fail");
        assert_eq!(error, QueryError::EmptyForecast);
    }

    #[test]
    fn normalize_hourly_slice_is_capped_at_twelve() {
        let series: Vec<_> = (0..15)
            .map(|hour| entry(&format!("2024-01-01T{hour:02}:00:00Z"), hour as f64))
            .collect();

        let bundle = build_bundle(payload(series), oslo()).expect("bundle");
        assert_eq!(bundle.hourly.len(), 12);
        assert_eq!(bundle.hourly[0].time, "2024-01-01T00:00:00Z");
        assert_eq!(bundle.hourly[11].time, "2024-01-01T11:00:00Z");
    }

    #[test]
    fn normalize_hourly_shorter_series_keeps_length() {
        let series = vec![
            entry("2024-01-01T00:00:00Z", 1.0),
            entry("2024-01-01T01:00:00Z", 2.0),
        ];

        let bundle = build_bundle(payload(series), oslo()).expect("bundle");
        assert_eq!(bundle.hourly.len(), 2);
    }

    #[test]
    fn normalize_daily_caps_at_seven_distinct_dates() {
        let series: Vec<_> = (1..=9)
            .map(|day| entry(&format!("2024-01-{day:02}T12:00:00Z"), day as f64))
            .collect();

        let bundle = build_bundle(payload(series), oslo()).expect("bundle");
        assert_eq!(bundle.daily.len(), 7);
        assert_eq!(bundle.daily[0].date, "2024-01-01");
        assert_eq!(bundle.daily[6].date, "2024-01-07");
    }

    #[test]
    fn normalize_daily_keeps_first_seen_order_and_distinct_dates() {
        let series = vec![
            entry("2024-01-02T23:00:00Z", 5.0),
            entry("2024-01-03T01:00:00Z", 6.0),
            entry("2024-01-02T23:30:00Z", 7.0),
        ];

        let bundle = build_bundle(payload(series), oslo()).expect("bundle");
        let dates: Vec<_> = bundle.daily.iter().map(|day| day.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn normalize_daily_falls_back_to_instant_temperature() {
        // No next_6_hours anywhere: instant readings bound the day.
        let series = vec![
            entry("2024-01-01T00:00:00Z", 4.0),
            entry("2024-01-01T06:00:00Z", 9.0),
            entry("2024-01-01T12:00:00Z", 2.5),
        ];

        let bundle = build_bundle(payload(series), oslo()).expect("bundle");
        let day = &bundle.daily[0];
        assert_eq!(day.temp_min, 2.5);
        assert_eq!(day.temp_max, 9.0);
        assert_eq!(day.precipitation, 0.0);
        assert_eq!(day.symbol, "cloudy");
    }

    #[test]
    fn normalize_daily_sums_precipitation_across_entries() {
        let mut first = entry("2024-01-01T00:00:00Z", 5.0);
        first.data.next_6_hours = Some(window(
            Some("rain"),
            Some(HorizonDetails {
                precipitation_amount: Some(1.5),
                air_temperature_min: None,
                air_temperature_max: None,
            }),
        ));
        let mut second = entry("2024-01-01T06:00:00Z", 6.0);
        second.data.next_6_hours = Some(window(
            None,
            Some(HorizonDetails {
                precipitation_amount: Some(2.0),
                air_temperature_min: None,
                air_temperature_max: None,
            }),
        ));
        let third = entry("2024-01-01T12:00:00Z", 7.0);

        let bundle = build_bundle(payload(vec![first, second, third]), oslo()).expect("bundle");
        let day = &bundle.daily[0];
        assert_eq!(day.precipitation, 3.5);
        assert_eq!(day.symbol, "rain");
    }

    #[test]
    fn normalize_daily_symbol_is_first_wins() {
        let mut first = entry("2024-01-01T00:00:00Z", 5.0);
        first.data.next_1_hours = Some(window(Some("clearsky_day"), None));
        let mut second = entry("2024-01-01T06:00:00Z", 6.0);
        second.data.next_1_hours = Some(window(Some("heavyrain"), None));

        let bundle = build_bundle(payload(vec![first, second]), oslo()).expect("bundle");
        assert_eq!(bundle.daily[0].symbol, "clearsky_day");
    }

    #[test]
    fn normalize_daily_extremes_commute_within_a_date() {
        let mut a = entry("2024-01-01T00:00:00Z", 5.0);
        a.data.next_6_hours = Some(window(
            None,
            Some(HorizonDetails {
                precipitation_amount: Some(0.3),
                air_temperature_min: Some(-2.0),
                air_temperature_max: Some(6.0),
            }),
        ));
        let b = entry("2024-01-01T06:00:00Z", 8.0);
        let mut c = entry("2024-01-01T12:00:00Z", 3.0);
        c.data.next_6_hours = Some(window(
            None,
            Some(HorizonDetails {
                precipitation_amount: Some(0.7),
                air_temperature_min: Some(1.0),
                air_temperature_max: Some(11.0),
            }),
        ));

        let forward = build_bundle(payload(vec![a.clone(), b.clone(), c.clone()]), oslo())
            .expect("bundle");
        let shuffled = build_bundle(payload(vec![c, a, b]), oslo()).expect("bundle");

        // min/max/sum are visitation-order independent; only the first-wins
        // symbol and the seed entry depend on order.
        let day = &forward.daily[0];
        assert_eq!(day.temp_min, -2.0);
        assert_eq!(day.temp_max, 11.0);
        assert_eq!(day.precipitation, 1.0);

        let other = &shuffled.daily[0];
        assert_eq!(other.temp_min, day.temp_min);
        assert_eq!(other.temp_max, day.temp_max);
        assert_eq!(other.precipitation, day.precipitation);
    }

    #[test]
    fn normalize_symbol_priority_one_hour_then_six_then_default() {
        let mut both = entry("2024-01-01T00:00:00Z", 1.0);
        both.data.next_1_hours = Some(window(Some("rain"), None));
        both.data.next_6_hours = Some(window(Some("snow"), None));
        assert_eq!(pick_symbol(&both), "rain");

        let mut six_only = entry("2024-01-01T01:00:00Z", 1.0);
        six_only.data.next_6_hours = Some(window(Some("snow"), None));
        assert_eq!(pick_symbol(&six_only), "snow");

        let neither = entry("2024-01-01T02:00:00Z", 1.0);
        assert_eq!(pick_symbol(&neither), "cloudy");
    }

    #[test]
    fn normalize_missing_updated_at_stays_none() {
        let mut raw = payload(vec![rich_first_entry()]);
        raw.properties.meta = None;

        let bundle = build_bundle(raw, oslo()).expect("bundle");
        assert_eq!(bundle.updated_at, None);
    }
}
