use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{
    config::{Config, Units},
    error::ApiError,
    model::Coordinates,
};

use super::{RawForecastResponse, RawWeatherResponse, WeatherApi};

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    units: Units,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, base_url: impl Into<String>, units: Units) -> Self {
        Self::with_http(Client::new(), api_key, base_url, units)
    }

    fn with_http(http: Client, api_key: String, base_url: impl Into<String>, units: Units) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { api_key, base_url, units, http }
    }

    /// Build a client from the on-disk configuration (and env override).
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.api_key()?;
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_http(http, api_key, config.api.base_url.clone(), config.api.units))
    }

    pub fn units(&self) -> Units {
        self.units
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}/{endpoint}", self.base_url);

        tracing::debug!(%url, "sending OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str()), ("units", self.units.as_str())])
            .send()
            .await
            .map_err(|source| ApiError::from_reqwest(endpoint, source))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ApiError::from_reqwest(endpoint, source))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { endpoint, source })
    }
}

fn coordinate_query(coordinates: Coordinates) -> [(&'static str, String); 2] {
    [
        ("lat", coordinates.lat.to_string()),
        ("lon", coordinates.lon.to_string()),
    ]
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn weather_by_city(&self, city: &str) -> Result<RawWeatherResponse, ApiError> {
        self.fetch("weather", &[("q", city.to_string())]).await
    }

    async fn weather_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<RawWeatherResponse, ApiError> {
        self.fetch("weather", &coordinate_query(coordinates)).await
    }

    async fn forecast_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<RawForecastResponse, ApiError> {
        self.fetch("forecast", &coordinate_query(coordinates)).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
