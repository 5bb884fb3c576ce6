//! Weather coordinator: sequences fetches, classifies their failures and
//! publishes the resulting state.
//!
//! Every published field is a [`tokio::sync::watch`] channel owned by the
//! coordinator. Consumers subscribe and read; only the coordinator writes.
//!
//! Requests are never cancelled or sequenced. Two overlapping fetches of the
//! same kind both complete and the later *completion* wins its slot; a city
//! search and a location fetch write different slots, and
//! [`WeatherCoordinator::displayed_snapshot`] picks between them.

use std::{fmt::Debug, sync::Arc};

use chrono::Utc;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    client::{RawWeatherResponse, WeatherApi},
    config::DEFAULT_FORECAST_DAYS,
    error::{ApiError, ErrorKind},
    forecast::{self, DailyWindow},
    mapper,
    model::{CityInfo, Coordinates, DailySummary, ForecastEntry, WeatherSnapshot},
};

/// Source of "now" for the rolling forecast window.
pub trait Clock: Send + Sync + Debug {
    fn now_epoch_seconds(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock frozen at a given epoch second.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Point-in-time copy of everything the coordinator publishes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinatorState {
    pub phase: Phase,
    pub current_snapshot: Option<WeatherSnapshot>,
    pub location_snapshot: Option<WeatherSnapshot>,
    pub city_info: Option<CityInfo>,
    pub forecast_entries: Vec<ForecastEntry>,
    pub forecast_window: Vec<ForecastEntry>,
    pub daily_summaries: Vec<DailySummary>,
    pub last_error: Option<ErrorKind>,
}

impl CoordinatorState {
    /// A searched city wins over the device location.
    pub fn displayed_snapshot(&self) -> Option<&WeatherSnapshot> {
        self.current_snapshot.as_ref().or(self.location_snapshot.as_ref())
    }
}

#[derive(Debug)]
struct Published {
    phase: watch::Sender<Phase>,
    current_snapshot: watch::Sender<Option<WeatherSnapshot>>,
    location_snapshot: watch::Sender<Option<WeatherSnapshot>>,
    city_info: watch::Sender<Option<CityInfo>>,
    forecast_entries: watch::Sender<Vec<ForecastEntry>>,
    forecast_window: watch::Sender<Vec<ForecastEntry>>,
    daily_summaries: watch::Sender<Vec<DailySummary>>,
    last_error: watch::Sender<Option<ErrorKind>>,
}

impl Default for Published {
    fn default() -> Self {
        Self {
            phase: watch::Sender::new(Phase::Idle),
            current_snapshot: watch::Sender::new(None),
            location_snapshot: watch::Sender::new(None),
            city_info: watch::Sender::new(None),
            forecast_entries: watch::Sender::new(Vec::new()),
            forecast_window: watch::Sender::new(Vec::new()),
            daily_summaries: watch::Sender::new(Vec::new()),
            last_error: watch::Sender::new(None),
        }
    }
}

#[derive(Debug)]
struct Inner {
    api: Arc<dyn WeatherApi>,
    clock: Arc<dyn Clock>,
    max_days: usize,
    published: Published,
}

/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone)]
pub struct WeatherCoordinator {
    inner: Arc<Inner>,
}

impl WeatherCoordinator {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self::with_options(api, DEFAULT_FORECAST_DAYS, Arc::new(SystemClock))
    }

    pub fn with_options(api: Arc<dyn WeatherApi>, max_days: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                clock,
                max_days,
                published: Published::default(),
            }),
        }
    }

    /// Search by city name. Blank input is ignored.
    ///
    /// On success the searched snapshot is replaced and a forecast is fetched for
    /// its coordinates. On failure the searched snapshot is cleared and the
    /// classified error recorded; the location snapshot is left alone.
    pub async fn fetch_by_city(&self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            tracing::debug!("ignoring blank city search");
            return;
        }

        let published = &self.inner.published;
        published.phase.send_replace(Phase::Loading);

        let result = self.inner.api.weather_by_city(name).await;
        match load_snapshot(result) {
            Ok(snapshot) => {
                tracing::info!(city = %snapshot.city, "weather loaded for city search");
                let coordinates = snapshot.coordinates;
                published.current_snapshot.send_replace(Some(snapshot));
                published.last_error.send_replace(None);
                published.phase.send_replace(Phase::Loaded);

                self.fetch_forecast(coordinates).await;
            }
            Err(err) => {
                let kind = ErrorKind::classify(&err);
                tracing::warn!(city = %name, error = %err, ?kind, "city search failed");
                published.current_snapshot.send_replace(None);
                published.last_error.send_replace(Some(kind));
                published.phase.send_replace(Phase::Failed);
            }
        }
    }

    /// Fetch weather for the device location.
    ///
    /// Failures are logged only: `last_error`, the phase and every displayed
    /// field keep their previous values.
    pub async fn fetch_by_location(&self, coordinates: Coordinates) {
        if !coordinates.is_valid() {
            tracing::warn!(
                lat = coordinates.lat,
                lon = coordinates.lon,
                "ignoring out-of-range coordinates"
            );
            return;
        }

        let published = &self.inner.published;
        let previous = published.phase.send_replace(Phase::Loading);

        let result = self.inner.api.weather_by_coordinates(coordinates).await;
        match load_snapshot(result) {
            Ok(snapshot) => {
                tracing::info!(city = %snapshot.city, "weather loaded for device location");
                published.location_snapshot.send_replace(Some(snapshot));
                published.phase.send_replace(Phase::Loaded);

                self.fetch_forecast(coordinates).await;
            }
            Err(err) => {
                tracing::warn!(
                    lat = coordinates.lat,
                    lon = coordinates.lon,
                    error = %err,
                    "error fetching weather by location"
                );
                // Undo our own `Loading` only; a city search may have moved the phase since.
                published.phase.send_if_modified(|phase| {
                    if *phase == Phase::Loading && previous != Phase::Loading {
                        *phase = previous;
                        true
                    } else {
                        false
                    }
                });
            }
        }
    }

    /// Replace the forecast for `coordinates` and re-derive both views.
    /// A failure leaves the previous forecast in place.
    pub async fn fetch_forecast(&self, coordinates: Coordinates) {
        let result = self
            .inner
            .api
            .forecast_by_coordinates(coordinates)
            .await
            .and_then(|raw| mapper::map_forecast(&raw).map_err(ApiError::from));

        match result {
            Ok(forecast) => {
                tracing::info!(
                    city = %forecast.city.name,
                    entries = forecast.entries.len(),
                    "forecast loaded"
                );
                let published = &self.inner.published;
                let now = self.inner.clock.now_epoch_seconds();
                let window = forecast::next_24_hours(&forecast.entries, now);
                let summaries = forecast::daily_summaries(
                    &forecast.entries,
                    self.inner.max_days,
                    DailyWindow::Upcoming,
                );

                // Entries go first so anything woken by the derived views sees them.
                published.forecast_entries.send_replace(forecast.entries);
                published.forecast_window.send_replace(window);
                published.daily_summaries.send_replace(summaries);
                published.city_info.send_replace(Some(forecast.city));
            }
            Err(err) => {
                tracing::warn!(
                    lat = coordinates.lat,
                    lon = coordinates.lon,
                    error = %err,
                    "error fetching forecast"
                );
            }
        }
    }

    /// Run [`Self::fetch_by_city`] as an independent task.
    pub fn spawn_fetch_by_city(&self, name: impl Into<String>) -> JoinHandle<()> {
        let this = self.clone();
        let name = name.into();
        tokio::spawn(async move { this.fetch_by_city(&name).await })
    }

    /// Run [`Self::fetch_by_location`] as an independent task.
    pub fn spawn_fetch_by_location(&self, coordinates: Coordinates) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.fetch_by_location(coordinates).await })
    }

    /// Recompute the 24-hour window from the stored forecast against the
    /// current clock. No network access.
    pub fn refresh_window(&self) {
        let now = self.inner.clock.now_epoch_seconds();
        let published = &self.inner.published;
        // Holding the entries borrow blocks a concurrent forecast replacement
        // until this window is sent, so a stale window never lands last.
        let entries = published.forecast_entries.borrow();
        published
            .forecast_window
            .send_replace(forecast::next_24_hours(&entries, now));
    }

    pub fn state(&self) -> CoordinatorState {
        let p = &self.inner.published;
        CoordinatorState {
            phase: *p.phase.borrow(),
            current_snapshot: p.current_snapshot.borrow().clone(),
            location_snapshot: p.location_snapshot.borrow().clone(),
            city_info: p.city_info.borrow().clone(),
            forecast_entries: p.forecast_entries.borrow().clone(),
            forecast_window: p.forecast_window.borrow().clone(),
            daily_summaries: p.daily_summaries.borrow().clone(),
            last_error: *p.last_error.borrow(),
        }
    }

    pub fn displayed_snapshot(&self) -> Option<WeatherSnapshot> {
        let p = &self.inner.published;
        p.current_snapshot
            .borrow()
            .clone()
            .or_else(|| p.location_snapshot.borrow().clone())
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.inner.published.phase.subscribe()
    }

    pub fn subscribe_current_snapshot(&self) -> watch::Receiver<Option<WeatherSnapshot>> {
        self.inner.published.current_snapshot.subscribe()
    }

    pub fn subscribe_location_snapshot(&self) -> watch::Receiver<Option<WeatherSnapshot>> {
        self.inner.published.location_snapshot.subscribe()
    }

    pub fn subscribe_city_info(&self) -> watch::Receiver<Option<CityInfo>> {
        self.inner.published.city_info.subscribe()
    }

    pub fn subscribe_forecast_window(&self) -> watch::Receiver<Vec<ForecastEntry>> {
        self.inner.published.forecast_window.subscribe()
    }

    pub fn subscribe_daily_summaries(&self) -> watch::Receiver<Vec<DailySummary>> {
        self.inner.published.daily_summaries.subscribe()
    }

    pub fn subscribe_last_error(&self) -> watch::Receiver<Option<ErrorKind>> {
        self.inner.published.last_error.subscribe()
    }
}

fn load_snapshot(
    result: Result<RawWeatherResponse, ApiError>,
) -> Result<WeatherSnapshot, ApiError> {
    let raw = result?;
    Ok(mapper::map_to_snapshot(&raw)?)
}
