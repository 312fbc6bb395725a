use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::QueryError;
use crate::geocoding::ResolvedPlace;
use crate::model::{TemperatureUnit, ViewState, WeatherBundle};
use crate::normalize;
use crate::providers::WeatherApi;

/// Placeholder name when the device-position flow cannot resolve one.
const UNKNOWN_POSITION: &str = "Ukjent posisjon";

/// Runs geocoding, forecast retrieval, and normalization as one cancelable
/// operation and publishes the result into a shared [`ViewState`].
///
/// Each submission installs a fresh [`CancellationToken`] and cancels the
/// previous one; a superseded pipeline re-checks its own token at every
/// resumption point and never touches state once canceled, so the newest
/// query always wins regardless of response timing.
pub struct WeatherController<A> {
    inner: Arc<ControllerInner<A>>,
}

impl<A> Clone for WeatherController<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<A> {
    api: A,
    state: Mutex<ViewState>,
    active: Mutex<Option<CancellationToken>>,
}

impl<A> Drop for ControllerInner<A> {
    fn drop(&mut self) {
        if let Some(token) = self.active.get_mut().take() {
            token.cancel();
        }
    }
}

impl<A: WeatherApi> WeatherController<A> {
    pub fn new(api: A) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                api,
                state: Mutex::new(ViewState::idle()),
                active: Mutex::new(None),
            }),
        }
    }

    /// Snapshot of the published view state.
    pub fn state(&self) -> ViewState {
        self.inner.state.lock().clone()
    }

    /// Display-unit preference only; stored data stays Celsius and no
    /// refetch happens.
    pub fn set_unit(&self, unit: TemperatureUnit) {
        self.inner.state.lock().unit = unit;
    }

    /// Cancel any outstanding operation without starting a new one.
    pub fn shutdown(&self) {
        if let Some(token) = self.inner.active.lock().take() {
            token.cancel();
        }
    }

    /// Resolve a free-text place query and load its forecast.
    ///
    /// An empty trimmed query is a deliberate clear: the in-flight operation
    /// is canceled and the state returns to Idle with no data and no error.
    pub async fn submit(&self, query: &str) {
        let trimmed = query.trim().to_string();
        if trimmed.is_empty() {
            self.shutdown();
            let mut state = self.inner.state.lock();
            state.data = None;
            state.loading = false;
            state.error = None;
            state.last_query = trimmed;
            return;
        }

        let token = self.begin(query);
        let outcome = self.run_text_query(&trimmed, &token).await;
        self.commit(&token, outcome);
    }

    /// Load a forecast for an already-resolved place, skipping geocoding.
    /// A zero lat/lon component means the caller never had a real fix and
    /// the call is a no-op.
    pub async fn submit_by_coordinates(&self, place: ResolvedPlace) {
        if place.lat == 0.0 || place.lon == 0.0 {
            debug!("ignoring unset coordinate pair");
            return;
        }

        let token = self.begin(&place.name);
        let outcome = self.fetch_bundle(place, &token).await;
        self.commit(&token, outcome);
    }

    /// Device-position flow: best-effort reverse geocode, falling back to an
    /// unnamed place when the lookup fails, then the usual fetch pipeline.
    /// Reverse-lookup failure never surfaces as a controller error.
    pub async fn submit_position(&self, lat: f64, lon: f64) {
        let token = self.begin("");

        let place = match self.inner.api.reverse_geocode(lat, lon, &token).await {
            Ok(Some(named)) => {
                let label = named.display_label();
                ResolvedPlace {
                    name: label,
                    ..named
                }
            }
            Err(QueryError::Canceled) => return,
            Ok(None) | Err(_) => {
                warn!(lat, lon, "reverse geocoding failed, using placeholder name");
                ResolvedPlace::from_coordinates(lat, lon, UNKNOWN_POSITION)
            }
        };

        if token.is_cancelled() {
            return;
        }
        self.inner.state.lock().last_query = place.name.clone();

        let outcome = self.fetch_bundle(place, &token).await;
        self.commit(&token, outcome);
    }

    async fn run_text_query(
        &self,
        query: &str,
        token: &CancellationToken,
    ) -> Result<WeatherBundle, QueryError> {
        let place = self
            .inner
            .api
            .geocode_one(query, token)
            .await?
            .ok_or_else(|| QueryError::NoMatch(query.to_string()))?;

        if token.is_cancelled() {
            return Err(QueryError::Canceled);
        }

        self.fetch_bundle(place, token).await
    }

    async fn fetch_bundle(
        &self,
        place: ResolvedPlace,
        token: &CancellationToken,
    ) -> Result<WeatherBundle, QueryError> {
        let payload = self
            .inner
            .api
            .fetch_forecast(place.lat, place.lon, token)
            .await?;

        if token.is_cancelled() {
            return Err(QueryError::Canceled);
        }

        normalize::build_bundle(payload, place)
    }

    /// Supersede: cancel the previous operation's token, install a fresh
    /// one, and publish the Loading state.
    fn begin(&self, query: &str) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.inner.active.lock().replace(token.clone()) {
            previous.cancel();
        }

        let mut state = self.inner.state.lock();
        state.loading = true;
        state.error = None;
        state.last_query = query.to_string();
        token
    }

    /// Publish an outcome unless this operation was superseded meanwhile.
    /// Canceled results are discarded unconditionally, even successful ones
    /// that raced past their own cancellation.
    fn commit(&self, token: &CancellationToken, outcome: Result<WeatherBundle, QueryError>) {
        if token.is_cancelled() {
            return;
        }

        match outcome {
            Ok(bundle) => {
                debug!(location = %bundle.location.name, "forecast ready");
                let mut state = self.inner.state.lock();
                state.data = Some(bundle);
                state.loading = false;
                state.error = None;
            }
            Err(error) if error.is_canceled() => {}
            Err(error) => {
                debug!(%error, "query failed");
                let mut state = self.inner.state.lock();
                state.data = None;
                state.loading = false;
                state.error = Some(error.user_message().to_string());
            }
        }
    }
}
