//! Wire shapes of the OpenWeather `weather` and `forecast` endpoints.
//!
//! Numeric fields are optional here so that a payload missing one of them
//! decodes, and the mapper can report which field was absent.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCoord {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCondition {
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMain {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<u8>,
    pub sea_level: Option<f64>,
    pub grnd_level: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawWind {
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSys {
    pub country: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// `GET /weather`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawWeatherResponse {
    pub coord: Option<RawCoord>,
    pub weather: Vec<RawCondition>,
    pub main: Option<RawMain>,
    pub visibility: Option<u32>,
    pub wind: Option<RawWind>,
    pub dt: Option<i64>,
    pub sys: Option<RawSys>,
    pub timezone: Option<i32>,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawForecastItem {
    pub dt: Option<i64>,
    pub dt_txt: Option<String>,
    pub main: Option<RawMain>,
    pub weather: Vec<RawCondition>,
    pub pop: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCity {
    pub name: String,
    pub country: Option<String>,
    pub timezone: Option<i32>,
}

/// `GET /forecast`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawForecastResponse {
    pub city: Option<RawCity>,
    pub list: Vec<RawForecastItem>,
}
