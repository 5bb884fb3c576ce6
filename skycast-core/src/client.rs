use async_trait::async_trait;
use std::fmt::Debug;

use crate::model::Coordinates;

pub mod openweather;
pub mod schema;

pub use openweather::OpenWeatherClient;
pub use schema::{RawForecastResponse, RawWeatherResponse};

use crate::error::ApiError;

/// The three remote calls the coordinator depends on.
///
/// Credentials and the unit system belong to the implementation, not to
/// each call.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn weather_by_city(&self, city: &str) -> Result<RawWeatherResponse, ApiError>;

    async fn weather_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<RawWeatherResponse, ApiError>;

    async fn forecast_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<RawForecastResponse, ApiError>;
}
