//! Raw API payloads to display models.

use crate::{
    client::schema::{RawCondition, RawForecastItem, RawForecastResponse, RawWeatherResponse},
    error::MapError,
    model::{CityInfo, Coordinates, Forecast, ForecastEntry, NOT_AVAILABLE, WeatherSnapshot},
};

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, MapError> {
    value.ok_or(MapError::MalformedResponse { field })
}

fn condition_field(
    conditions: &[RawCondition],
    pick: impl Fn(&RawCondition) -> Option<&String>,
) -> String {
    conditions
        .first()
        .and_then(pick)
        .cloned()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn map_to_snapshot(raw: &RawWeatherResponse) -> Result<WeatherSnapshot, MapError> {
    let coord = required(raw.coord.as_ref(), "coord")?;
    let main = required(raw.main.as_ref(), "main")?;
    let wind = required(raw.wind.as_ref(), "wind")?;
    let sys = required(raw.sys.as_ref(), "sys")?;

    Ok(WeatherSnapshot {
        city: raw.name.clone(),
        country: sys.country.clone(),
        coordinates: Coordinates {
            lat: required(coord.lat, "coord.lat")?,
            lon: required(coord.lon, "coord.lon")?,
        },
        temperature: required(main.temp, "main.temp")?,
        feels_like: main.feels_like,
        temp_min: required(main.temp_min, "main.temp_min")?,
        temp_max: required(main.temp_max, "main.temp_max")?,
        description: condition_field(&raw.weather, |c| c.description.as_ref()),
        icon: condition_field(&raw.weather, |c| c.icon.as_ref()),
        humidity: required(main.humidity, "main.humidity")?,
        wind_speed: required(wind.speed, "wind.speed")?,
        pressure: required(main.pressure, "main.pressure")?,
        sea_level: main.sea_level,
        ground_level: main.grnd_level,
        visibility: raw.visibility,
        sunrise: required(sys.sunrise, "sys.sunrise")?,
        sunset: required(sys.sunset, "sys.sunset")?,
        observed_at: required(raw.dt, "dt")?,
        timezone_offset: raw.timezone.unwrap_or(0),
    })
}

pub fn map_forecast_entry(item: &RawForecastItem) -> Result<ForecastEntry, MapError> {
    let main = required(item.main.as_ref(), "list.main")?;

    Ok(ForecastEntry {
        timestamp_utc: required(item.dt, "list.dt")?,
        timestamp_text: required(item.dt_txt.clone(), "list.dt_txt")?,
        temp_current: required(main.temp, "list.main.temp")?,
        temp_min: required(main.temp_min, "list.main.temp_min")?,
        temp_max: required(main.temp_max, "list.main.temp_max")?,
        condition_main: condition_field(&item.weather, |c| c.main.as_ref()),
        condition_icon: condition_field(&item.weather, |c| c.icon.as_ref()),
        precipitation_probability: item.pop.unwrap_or(0.0),
    })
}

pub fn map_forecast(raw: &RawForecastResponse) -> Result<Forecast, MapError> {
    let city = required(raw.city.as_ref(), "city")?;
    let entries = raw
        .list
        .iter()
        .map(map_forecast_entry)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Forecast {
        city: CityInfo {
            name: city.name.clone(),
            country: city.country.clone(),
            timezone_offset: city.timezone.unwrap_or(0),
        },
        entries,
    })
}
