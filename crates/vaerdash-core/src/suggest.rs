use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::SUGGEST_DEBOUNCE_MS;
use crate::geocoding::ResolvedPlace;
use crate::providers::WeatherApi;

/// One autocomplete row: place name plus a region sub-label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub label: String,
    pub sub_label: Option<String>,
}

/// Debounced, best-effort autocomplete over the multi-result geocoder.
///
/// Suggestions are never an error surface: canceled or failed lookups yield
/// an empty list. Each `refresh` supersedes the previous one the same way
/// controller submissions do.
pub struct SuggestionResolver<A> {
    inner: Arc<ResolverInner<A>>,
}

impl<A> Clone for SuggestionResolver<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ResolverInner<A> {
    api: A,
    active: Mutex<Option<CancellationToken>>,
    debounce: Duration,
}

impl<A: WeatherApi> SuggestionResolver<A> {
    pub fn new(api: A) -> Self {
        Self::with_debounce(api, Duration::from_millis(SUGGEST_DEBOUNCE_MS))
    }

    pub fn with_debounce(api: A, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                api,
                active: Mutex::new(None),
                debounce,
            }),
        }
    }

    /// Cancel any outstanding lookup without starting a new one.
    pub fn shutdown(&self) {
        if let Some(token) = self.inner.active.lock().take() {
            token.cancel();
        }
    }

    pub async fn refresh(&self, query: &str) -> Vec<Suggestion> {
        let token = CancellationToken::new();
        if let Some(previous) = self.inner.active.lock().replace(token.clone()) {
            previous.cancel();
        }

        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        if !self.inner.debounce.is_zero() {
            tokio::select! {
                () = token.cancelled() => return Vec::new(),
                () = tokio::time::sleep(self.inner.debounce) => {}
            }
        }

        match self.inner.api.geocode_many(trimmed, &token).await {
            Ok(places) if !token.is_cancelled() => {
                debug!(query = trimmed, count = places.len(), "suggestions resolved");
                dedupe(places)
            }
            _ => Vec::new(),
        }
    }
}

/// Collapse results sharing `(name, region)` into one row, keeping provider
/// rank order.
fn dedupe(places: Vec<ResolvedPlace>) -> Vec<Suggestion> {
    let mut seen = HashSet::new();
    let mut suggestions = Vec::with_capacity(places.len());

    for place in places {
        let region = place.region_label();
        if seen.insert(format!("{}-{}", place.name, region)) {
            suggestions.push(Suggestion {
                label: place.name,
                sub_label: Some(region),
            });
        }
    }

    suggestions
}
