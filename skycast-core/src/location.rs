//! Device location and the "wait until location is enabled" loop.

use std::{fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    config::DEFAULT_LOCATION_RETRY_SECS,
    coordinator::WeatherCoordinator,
    error::{ErrorKind, LocationError},
    model::Coordinates,
};

#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn current_location(&self) -> Result<Coordinates, LocationError>;

    async fn is_location_enabled(&self) -> bool;

    /// Ask the user to turn location on. The outcome is observed through
    /// later calls to [`LocationProvider::is_location_enabled`].
    async fn request_enable_location(&self);
}

/// Location supplied up front, e.g. from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    coordinates: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        self.coordinates.ok_or(LocationError::ServiceUnavailable)
    }

    async fn is_location_enabled(&self) -> bool {
        self.coordinates.is_some()
    }

    async fn request_enable_location(&self) {
        tracing::warn!("no location available; pass --lat and --lon");
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    Fetched(Coordinates),
    Unavailable,
    Cancelled,
}

/// Handle to a running poll loop. Dropping it does not stop the loop; call
/// [`LocationPollHandle::stop`].
#[derive(Debug)]
pub struct LocationPollHandle {
    task: JoinHandle<PollOutcome>,
    cancel: CancellationToken,
}

impl LocationPollHandle {
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> PollOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(error = %err, "location poll task failed");
                PollOutcome::Cancelled
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocationPoller {
    provider: Arc<dyn LocationProvider>,
    coordinator: WeatherCoordinator,
    retry_delay: Duration,
}

impl LocationPoller {
    pub fn new(provider: Arc<dyn LocationProvider>, coordinator: WeatherCoordinator) -> Self {
        Self {
            provider,
            coordinator,
            retry_delay: Duration::from_secs(DEFAULT_LOCATION_RETRY_SECS),
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn spawn(self) -> LocationPollHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move { self.run(token).await });
        LocationPollHandle { task, cancel }
    }

    /// Poll until location is enabled, then fetch weather for it once.
    ///
    /// While disabled, the user is prompted once, then the loop waits the fixed
    /// retry delay before it may prompt again. Cancellation interrupts any
    /// pending provider call, including a prompt that never resolves. Once
    /// started, the weather fetch runs to completion (bounded by the client
    /// timeout).
    pub async fn run(&self, cancel: CancellationToken) -> PollOutcome {
        let acquired = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            acquired = self.acquire() => acquired,
        };

        match acquired {
            Ok(coordinates) => {
                tracing::debug!(lat = coordinates.lat, lon = coordinates.lon, "location acquired");
                self.coordinator.fetch_by_location(coordinates).await;
                PollOutcome::Fetched(coordinates)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    kind = ?ErrorKind::from(&err),
                    "unable to fetch location"
                );
                PollOutcome::Unavailable
            }
        }
    }

    async fn acquire(&self) -> Result<Coordinates, LocationError> {
        let mut prompt_shown = false;

        loop {
            if self.provider.is_location_enabled().await {
                return self.provider.current_location().await;
            }

            if !prompt_shown {
                prompt_shown = true;
                tracing::debug!("location disabled, prompting");
                self.provider.request_enable_location().await;
            } else {
                tokio::time::sleep(self.retry_delay).await;
                prompt_shown = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{RawForecastResponse, RawWeatherResponse, WeatherApi};
    use crate::coordinator::{FixedClock, Phase};
    use crate::error::ApiError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Enabled after `enable_after` checks.
    #[derive(Debug, Default)]
    struct ScriptedLocation {
        enable_after: usize,
        fail: bool,
        checks: AtomicUsize,
        prompts: AtomicUsize,
    }

    #[async_trait]
    impl LocationProvider for ScriptedLocation {
        async fn current_location(&self) -> Result<Coordinates, LocationError> {
            if self.fail {
                Err(LocationError::Timeout)
            } else {
                Ok(Coordinates::new(28.61, 77.21))
            }
        }

        async fn is_location_enabled(&self) -> bool {
            self.checks.fetch_add(1, Ordering::SeqCst) >= self.enable_after
        }

        async fn request_enable_location(&self) {
            self.prompts.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Debug, Default)]
    struct CountingApi {
        location_calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherApi for CountingApi {
        async fn weather_by_city(&self, _city: &str) -> Result<RawWeatherResponse, ApiError> {
            Err(ApiError::from(crate::error::MapError::MalformedResponse { field: "unused" }))
        }

        async fn weather_by_coordinates(
            &self,
            _coordinates: Coordinates,
        ) -> Result<RawWeatherResponse, ApiError> {
            self.location_calls.fetch_add(1, Ordering::SeqCst);
            Ok(RawWeatherResponse::default())
        }

        async fn forecast_by_coordinates(
            &self,
            _coordinates: Coordinates,
        ) -> Result<RawForecastResponse, ApiError> {
            Ok(RawForecastResponse::default())
        }
    }

    fn poller(provider: Arc<ScriptedLocation>, api: Arc<CountingApi>) -> LocationPoller {
        let coordinator = WeatherCoordinator::with_options(api, 5, Arc::new(FixedClock(0)));
        LocationPoller::new(provider, coordinator)
    }

    #[tokio::test]
    async fn enabled_location_fetches_immediately() {
        let provider = Arc::new(ScriptedLocation::default());
        let api = Arc::new(CountingApi::default());

        let outcome = poller(provider.clone(), api.clone()).spawn().join().await;

        assert_eq!(outcome, PollOutcome::Fetched(Coordinates::new(28.61, 77.21)));
        assert_eq!(provider.prompts.load(Ordering::SeqCst), 0);
        assert_eq!(api.location_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn prompts_then_waits_fixed_delay_between_prompts() {
        // Disabled for the first four checks.
        let provider = Arc::new(ScriptedLocation { enable_after: 4, ..Default::default() });
        let api = Arc::new(CountingApi::default());

        let started = tokio::time::Instant::now();
        let outcome = poller(provider.clone(), api.clone()).spawn().join().await;

        // check 0: prompt, check 1: wait, check 2: prompt, check 3: wait, check 4: enabled
        assert!(matches!(outcome, PollOutcome::Fetched(_)));
        assert_eq!(provider.prompts.load(Ordering::SeqCst), 2);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(8) && elapsed < Duration::from_secs(9));
        assert_eq!(api.location_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_a_loop_that_never_succeeds() {
        let provider = Arc::new(ScriptedLocation { enable_after: usize::MAX, ..Default::default() });
        let api = Arc::new(CountingApi::default());

        let handle = poller(provider.clone(), api.clone())
            .with_retry_delay(Duration::from_secs(4))
            .spawn();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!handle.is_finished());

        handle.stop();
        assert_eq!(handle.join().await, PollOutcome::Cancelled);
        assert!(provider.prompts.load(Ordering::SeqCst) >= 2);
        assert_eq!(api.location_calls.load(Ordering::SeqCst), 0);
    }

    /// Location stays off and the enable prompt never gets an answer.
    #[derive(Debug)]
    struct UnansweredPrompt;

    #[async_trait]
    impl LocationProvider for UnansweredPrompt {
        async fn current_location(&self) -> Result<Coordinates, LocationError> {
            Err(LocationError::PermissionDenied)
        }

        async fn is_location_enabled(&self) -> bool {
            false
        }

        async fn request_enable_location(&self) {
            std::future::pending::<()>().await
        }
    }

    #[tokio::test]
    async fn stop_interrupts_a_pending_prompt() {
        let api = Arc::new(CountingApi::default());
        let coordinator = WeatherCoordinator::with_options(api.clone(), 5, Arc::new(FixedClock(0)));
        let handle = LocationPoller::new(Arc::new(UnansweredPrompt), coordinator).spawn();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        handle.stop();
        let outcome = tokio::time::timeout(Duration::from_secs(2), handle.join())
            .await
            .expect("poll loop should end after stop");
        assert_eq!(outcome, PollOutcome::Cancelled);
        assert_eq!(api.location_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn location_failure_is_unavailable_and_silent() {
        let provider = Arc::new(ScriptedLocation { fail: true, ..Default::default() });
        let api = Arc::new(CountingApi::default());
        let poller = poller(provider, api.clone());
        let coordinator = poller.coordinator.clone();

        let outcome = poller.spawn().join().await;

        assert_eq!(outcome, PollOutcome::Unavailable);
        assert_eq!(api.location_calls.load(Ordering::SeqCst), 0);
        let state = coordinator.state();
        assert_eq!(state.last_error, None);
        assert_eq!(state.phase, Phase::Idle);
    }

    #[tokio::test]
    async fn fixed_location_without_coordinates_is_disabled() {
        let provider = FixedLocation::default();
        assert!(!provider.is_location_enabled().await);
        assert!(matches!(
            provider.current_location().await,
            Err(LocationError::ServiceUnavailable)
        ));

        let provider = FixedLocation::new(Some(Coordinates::new(1.0, 2.0)));
        assert!(provider.is_location_enabled().await);
        assert_eq!(provider.current_location().await.unwrap(), Coordinates::new(1.0, 2.0));
    }
}
