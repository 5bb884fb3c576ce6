use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Substituted when the API omits a condition description or icon.
pub const NOT_AVAILABLE: &str = "N/A";

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Immutable "current weather" reading, replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub country: Option<String>,
    pub coordinates: Coordinates,
    pub temperature: f64,
    pub feels_like: Option<f64>,
    pub temp_min: f64,
    pub temp_max: f64,
    pub description: String,
    pub icon: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub pressure: f64,
    pub sea_level: Option<f64>,
    pub ground_level: Option<f64>,
    pub visibility: Option<u32>,
    pub sunrise: i64,
    pub sunset: i64,
    /// Observation time, epoch seconds.
    pub observed_at: i64,
    /// Seconds east of UTC for the reporting city.
    pub timezone_offset: i32,
}

impl WeatherSnapshot {
    pub fn is_night(&self) -> bool {
        self.icon.ends_with('n')
    }

    pub fn sunrise_label(&self) -> Option<String> {
        local_clock_label(self.sunrise, self.timezone_offset)
    }

    pub fn sunset_label(&self) -> Option<String> {
        local_clock_label(self.sunset, self.timezone_offset)
    }

    pub fn icon_url(&self) -> String {
        icon_url(&self.icon)
    }
}

/// One 3-hour forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp_utc: i64,
    /// `YYYY-MM-DD HH:MM:SS` as supplied by the API.
    pub timestamp_text: String,
    pub temp_current: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub condition_main: String,
    pub condition_icon: String,
    pub precipitation_probability: f64,
}

impl ForecastEntry {
    /// Text before the first space of the timestamp, i.e. the `YYYY-MM-DD` part.
    pub fn date_key(&self) -> &str {
        self.timestamp_text
            .split_once(' ')
            .map_or(self.timestamp_text.as_str(), |(date, _)| date)
    }

    pub fn is_night(&self) -> bool {
        self.condition_icon.ends_with('n')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityInfo {
    pub name: String,
    pub country: Option<String>,
    pub timezone_offset: i32,
}

/// A mapped forecast payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city: CityInfo,
    pub entries: Vec<ForecastEntry>,
}

/// Aggregated view of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: String,
    pub day_of_week: String,
    pub min_temp: f64,
    pub max_temp: f64,
    pub icon: String,
}

pub fn icon_url(code: &str) -> String {
    format!("{ICON_BASE_URL}/{code}@2x.png")
}

/// `HH:MM` of an epoch timestamp shifted by a UTC offset.
pub fn local_clock_label(epoch_seconds: i64, offset_seconds: i32) -> Option<String> {
    let local = epoch_seconds.checked_add(i64::from(offset_seconds))?;
    DateTime::from_timestamp(local, 0).map(|dt| dt.format("%H:%M").to_string())
}
