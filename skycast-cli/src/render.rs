//! Terminal output for coordinator state.

use chrono::{Duration, Utc};
use serde_json::json;
use skycast_core::{
    CoordinatorState, ForecastEntry, Units, WeatherSnapshot,
    forecast::{self, MIDDAY_SAMPLE_LIMIT},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyView {
    Summary,
    Midday,
}

pub fn print(
    state: &CoordinatorState,
    units: Units,
    view: DailyView,
    as_json: bool,
) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&to_json(state, view))?);
        return Ok(());
    }

    let offset = state
        .city_info
        .as_ref()
        .map(|c| c.timezone_offset)
        .or_else(|| state.displayed_snapshot().map(|s| s.timezone_offset))
        .unwrap_or(0);

    if let Some(snapshot) = state.displayed_snapshot() {
        print_current(snapshot, units);
    }

    println!();
    println!("Next 24 hours");
    if state.forecast_window.is_empty() {
        println!("  (no forecast loaded)");
    }
    for entry in &state.forecast_window {
        println!(
            "  {:>5}  {:>6}  {:<12} {:>3.0}% rain",
            forecast::slot_label(entry, offset).unwrap_or_default(),
            temperature(entry.temp_current, units),
            entry.condition_main,
            entry.precipitation_probability * 100.0,
        );
    }

    println!();
    match view {
        DailyView::Summary => {
            println!("Next {} days", state.daily_summaries.len());
            for day in &state.daily_summaries {
                println!(
                    "  {:<10} {}  {} / {}  [{}]",
                    day.day_of_week,
                    day.date,
                    temperature(day.min_temp, units),
                    temperature(day.max_temp, units),
                    day.icon,
                );
            }
        }
        DailyView::Midday => {
            let samples = forecast::midday_samples(&state.forecast_entries, MIDDAY_SAMPLE_LIMIT);
            println!("Midday forecast");
            if samples.is_empty() {
                println!("  (no midday samples in this forecast)");
            }
            for entry in &samples {
                print_midday(entry, units);
            }
        }
    }

    Ok(())
}

fn print_current(snapshot: &WeatherSnapshot, units: Units) {
    let local_today = Utc::now() + Duration::seconds(i64::from(snapshot.timezone_offset));
    let place = match &snapshot.country {
        Some(country) => format!("{}, {country}", snapshot.city),
        None => snapshot.city.clone(),
    };

    println!("{place}  {}", local_today.format("%d %B %Y"));
    println!(
        "  {}  {}{}",
        temperature(snapshot.temperature, units),
        snapshot.description,
        if snapshot.is_night() { " (night)" } else { "" },
    );
    println!(
        "  min {} / max {}",
        temperature(snapshot.temp_min, units),
        temperature(snapshot.temp_max, units),
    );
    println!(
        "  humidity {}%  wind {:.1} {}  pressure {:.0} hPa",
        snapshot.humidity,
        snapshot.wind_speed,
        units.speed_suffix(),
        snapshot.pressure,
    );
    if let Some(visibility) = snapshot.visibility {
        println!("  visibility {:.1} km", f64::from(visibility) / 1000.0);
    }
    if let (Some(sunrise), Some(sunset)) = (snapshot.sunrise_label(), snapshot.sunset_label()) {
        println!("  sunrise {sunrise}  sunset {sunset}");
    }
}

fn print_midday(entry: &ForecastEntry, units: Units) {
    println!(
        "  {:<10} {}  {} / {}  [{}]",
        forecast::weekday_label(entry.date_key()),
        entry.date_key(),
        temperature(entry.temp_min, units),
        temperature(entry.temp_max, units),
        entry.condition_icon,
    );
}

fn temperature(value: f64, units: Units) -> String {
    format!("{value:.0}{}", units.temperature_suffix())
}

fn to_json(state: &CoordinatorState, view: DailyView) -> serde_json::Value {
    let daily = match view {
        DailyView::Summary => json!(state.daily_summaries),
        DailyView::Midday => json!(forecast::midday_samples(
            &state.forecast_entries,
            MIDDAY_SAMPLE_LIMIT
        )),
    };

    json!({
        "current": state.displayed_snapshot(),
        "icon_url": state.displayed_snapshot().map(WeatherSnapshot::icon_url),
        "city": state.city_info,
        "next_24_hours": state.forecast_window,
        "daily": daily,
        "error": state.last_error.map(|e| e.user_message()),
    })
}
