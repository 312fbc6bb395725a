use serde::{Deserialize, Serialize};

/// A place resolved to coordinates, as returned by the geocoding endpoint.
///
/// `country` is the two-letter country code; the admin fields are the
/// provider's regional subdivisions and are frequently absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin2: Option<String>,
}

impl ResolvedPlace {
    /// A bare coordinate pair with a caller-chosen display name. Used by the
    /// device-position flows where no geocoding result is available.
    pub fn from_coordinates(lat: f64, lon: f64, name: impl Into<String>) -> Self {
        Self {
            lat,
            lon,
            name: name.into(),
            country: None,
            timezone: None,
            admin1: None,
            admin2: None,
        }
    }

    /// "Bergen, Vestland": the place name joined with its most specific
    /// region (admin1, else admin2, else country code).
    pub fn display_label(&self) -> String {
        let region = self
            .admin1
            .as_deref()
            .or(self.admin2.as_deref())
            .or(self.country.as_deref())
            .filter(|value| !value.is_empty());

        match region {
            Some(region) => format!("{}, {}", self.name, region),
            None => self.name.clone(),
        }
    }

    /// The suggestion sub-label: region plus country, country defaulting to
    /// "Norway" since searches are pinned to `country=NO`.
    pub fn region_label(&self) -> String {
        let admin = self
            .admin1
            .as_deref()
            .or(self.admin2.as_deref())
            .filter(|value| !value.is_empty());
        let country = self
            .country
            .as_deref()
            .filter(|value| !value.is_empty())
            .unwrap_or("Norway");

        match admin {
            Some(admin) => format!("{admin}, {country}"),
            None => country.to_string(),
        }
    }
}

pub fn coordinate_label(lat: f64, lon: f64) -> String {
    format!("{:.4},{:.4}", round4(lat), round4(lon))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
