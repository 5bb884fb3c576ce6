//! Core library for `skycast`.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client and its raw payload schema
//! - Mapping of raw payloads into display models
//! - Forecast windowing (rolling 24 hours, per-day summaries)
//! - The weather coordinator that sequences fetches and publishes state
//! - Location providers and the cancellable location poll loop
//!
//! It is used by `skycast-cli`, but any front end can drive the coordinator
//! and subscribe to its state.

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod forecast;
pub mod location;
pub mod mapper;
pub mod model;

pub use client::{OpenWeatherClient, WeatherApi};
pub use config::{Config, Units};
pub use coordinator::{Clock, CoordinatorState, FixedClock, Phase, SystemClock, WeatherCoordinator};
pub use error::{ApiError, ErrorKind, LocationError, MapError};
pub use forecast::DailyWindow;
pub use location::{FixedLocation, LocationPollHandle, LocationPoller, LocationProvider, PollOutcome};
pub use model::{CityInfo, Coordinates, DailySummary, Forecast, ForecastEntry, WeatherSnapshot};
