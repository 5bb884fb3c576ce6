//! Forecast windowing: the rolling 24-hour view and per-day views derived
//! from a list of 3-hour forecast entries.
//!
//! Everything here is pure. Input order is trusted only as far as stated:
//! out-of-order or irregularly spaced entries never cause a failure.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Timelike};

use crate::model::{DailySummary, ForecastEntry};

pub const WINDOW_SECONDS: i64 = 24 * 60 * 60;

/// Local time-of-day marker used by [`midday_samples`].
pub const MIDDAY_MARKER: &str = "12:00:00";
pub const MIDDAY_SAMPLE_LIMIT: usize = 7;

const SLOT_HOURS: u32 = 3;

/// Which day groups [`daily_summaries`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DailyWindow {
    /// Skip the first day present (today, partially elapsed).
    #[default]
    Upcoming,
    IncludingToday,
}

/// Entries with `now <= timestamp_utc <= now + 24h`, in input order.
///
/// An empty result means the forecast is not loaded yet or has gone stale.
pub fn next_24_hours(entries: &[ForecastEntry], now_epoch_seconds: i64) -> Vec<ForecastEntry> {
    let end = now_epoch_seconds.saturating_add(WINDOW_SECONDS);
    entries
        .iter()
        .filter(|entry| (now_epoch_seconds..=end).contains(&entry.timestamp_utc))
        .cloned()
        .collect()
}

/// One min/max summary per day, grouped on the textual date of each entry.
///
/// Groups keep the order of their first entry. With [`DailyWindow::Upcoming`]
/// the first group is dropped before at most `max_days` groups are taken.
pub fn daily_summaries(
    entries: &[ForecastEntry],
    max_days: usize,
    window: DailyWindow,
) -> Vec<DailySummary> {
    let skip = match window {
        DailyWindow::Upcoming => 1,
        DailyWindow::IncludingToday => 0,
    };

    group_by_date(entries)
        .into_iter()
        .skip(skip)
        .take(max_days)
        .map(|(date, group)| summarize(date, &group))
        .collect()
}

/// One sample per day: the entries whose timestamp text carries the midday
/// marker, capped at `limit`.
///
/// Unlike [`daily_summaries`] this does not aggregate, and it yields nothing at
/// all when no entry falls exactly on the marker.
pub fn midday_samples(entries: &[ForecastEntry], limit: usize) -> Vec<ForecastEntry> {
    entries
        .iter()
        .filter(|entry| entry.timestamp_text.contains(MIDDAY_MARKER))
        .take(limit)
        .cloned()
        .collect()
}

/// The entry's local hour, floored to its 3-hour slot, as `HH:00`.
pub fn slot_label(entry: &ForecastEntry, timezone_offset: i32) -> Option<String> {
    let local_seconds = entry.timestamp_utc.checked_add(i64::from(timezone_offset))?;
    let local = DateTime::from_timestamp(local_seconds, 0)?;
    let slot = local.hour() / SLOT_HOURS * SLOT_HOURS;
    Some(format!("{slot:02}:00"))
}

/// Full weekday name for a `YYYY-MM-DD` key, empty when the key isn't a date.
pub fn weekday_label(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|day| day.format("%A").to_string())
        .unwrap_or_default()
}

fn group_by_date(entries: &[ForecastEntry]) -> Vec<(&str, Vec<&ForecastEntry>)> {
    let mut groups: Vec<(&str, Vec<&ForecastEntry>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        let key = entry.date_key();
        match index.get(key) {
            Some(&slot) => groups[slot].1.push(entry),
            None => {
                index.insert(key, groups.len());
                groups.push((key, vec![entry]));
            }
        }
    }

    groups
}

fn summarize(date: &str, group: &[&ForecastEntry]) -> DailySummary {
    let min_temp = group.iter().map(|e| e.temp_min).fold(f64::INFINITY, f64::min);
    let max_temp = group.iter().map(|e| e.temp_max).fold(f64::NEG_INFINITY, f64::max);
    // Groups are never empty: each is created with its first entry.
    let icon = group
        .first()
        .map(|e| e.condition_icon.clone())
        .unwrap_or_default();

    DailySummary {
        date: date.to_string(),
        day_of_week: weekday_label(date),
        min_temp,
        max_temp,
        icon,
    }
}
