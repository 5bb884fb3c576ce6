//! City search through the real client, mapper, windowing and coordinator,
//! against a mocked OpenWeather server.

use std::sync::Arc;

use serde_json::{Value, json};
use skycast_core::{
    Coordinates, ErrorKind, FixedClock, OpenWeatherClient, Phase, Units, WeatherCoordinator,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOW: i64 = 1_761_652_800; // 2025-10-28 12:00:00 UTC
const THREE_HOURS: i64 = 3 * 3600;

fn weather(name: &str, lat: f64, lon: f64) -> Value {
    json!({
        "coord": { "lon": lon, "lat": lat },
        "weather": [{ "id": 721, "main": "Haze", "description": "haze", "icon": "50d" }],
        "main": {
            "temp": 29.1, "feels_like": 29.6, "temp_min": 29.1, "temp_max": 29.1,
            "pressure": 1011, "humidity": 45, "sea_level": 1011, "grnd_level": 990
        },
        "visibility": 3000,
        "wind": { "speed": 1.5, "deg": 300 },
        "dt": NOW,
        "sys": { "country": "IN", "sunrise": NOW - 21_600, "sunset": NOW + 7_200 },
        "timezone": 19800,
        "name": name,
        "cod": 200
    })
}

/// Forty 3-hourly entries from `start` (a UTC midnight), temperatures offset by `bias`.
fn forecast(city: &str, start: i64, bias: f64) -> Value {
    let list: Vec<Value> = (0..40)
        .map(|i| {
            let dt = start + i * THREE_HOURS;
            let text = chrono::DateTime::from_timestamp(dt, 0)
                .unwrap()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string();
            let t = bias + (i % 8) as f64;
            let icon = if i % 8 < 2 { "01n" } else { "01d" };
            json!({
                "dt": dt,
                "main": { "temp": t, "temp_min": t - 1.0, "temp_max": t + 1.0 },
                "weather": [{ "main": "Clear", "icon": icon }],
                "pop": 0.1,
                "dt_txt": text
            })
        })
        .collect();

    json!({
        "cod": "200",
        "cnt": 40,
        "list": list,
        "city": { "name": city, "country": "IN", "timezone": 19800 }
    })
}

async fn mount_city(server: &MockServer, name: &str, lat: &str, lon: &str, bias: f64) {
    let (lat_f, lon_f): (f64, f64) = (lat.parse().unwrap(), lon.parse().unwrap());

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", name))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather(name, lat_f, lon_f)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("lat", lat))
        .and(query_param("lon", lon))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(forecast(name, NOW - 12 * 3600, bias)),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn coordinator(server: &MockServer) -> WeatherCoordinator {
    let client = OpenWeatherClient::new("TEST_KEY".to_string(), server.uri(), Units::Metric);
    WeatherCoordinator::with_options(Arc::new(client), 7, Arc::new(FixedClock(NOW)))
}

#[tokio::test]
async fn city_search_triggers_forecast_for_its_coordinates() {
    let server = MockServer::start().await;
    mount_city(&server, "Aligarh", "27.88", "78.08", 20.0).await;

    let coordinator = coordinator(&server);
    coordinator.fetch_by_city("Aligarh").await;

    let state = coordinator.state();
    assert_eq!(state.phase, Phase::Loaded);
    let snapshot = state.current_snapshot.as_ref().unwrap();
    assert_eq!(snapshot.coordinates, Coordinates::new(27.88, 78.08));
    assert_eq!(snapshot.description, "haze");
    assert_eq!(snapshot.sunrise_label().as_deref(), Some("11:30"));

    assert_eq!(state.city_info.as_ref().map(|c| c.name.as_str()), Some("Aligarh"));
    assert_eq!(state.forecast_entries.len(), 40);

    // Forecast starts at 2025-10-28 00:00; now is 12:00, so 12:00 .. 12:00 next day.
    assert_eq!(state.forecast_window.len(), 9);
    assert!(
        state
            .forecast_window
            .iter()
            .all(|e| (NOW..=NOW + 86_400).contains(&e.timestamp_utc))
    );

    // 40 entries cover 2025-10-28 .. 2025-11-01 (five days); today is dropped.
    let dates: Vec<&str> = state.daily_summaries.iter().map(|d| d.date.as_str()).collect();
    assert_eq!(dates, vec!["2025-10-29", "2025-10-30", "2025-10-31", "2025-11-01"]);
    assert_eq!(state.daily_summaries[0].day_of_week, "Wednesday");
    assert_eq!(state.daily_summaries[0].min_temp, 19.0);
    assert_eq!(state.daily_summaries[0].max_temp, 28.0);
    assert_eq!(state.daily_summaries[0].icon, "01n");
}

#[tokio::test]
async fn new_city_replaces_previous_forecast() {
    let server = MockServer::start().await;
    mount_city(&server, "Delhi", "28.61", "77.21", 0.0).await;
    mount_city(&server, "Aligarh", "27.88", "78.08", 100.0).await;

    let coordinator = coordinator(&server);
    coordinator.fetch_by_city("Delhi").await;
    assert_eq!(coordinator.state().daily_summaries[0].min_temp, -1.0);

    coordinator.fetch_by_city("Aligarh").await;

    let state = coordinator.state();
    assert_eq!(state.city_info.map(|c| c.name).as_deref(), Some("Aligarh"));
    assert_eq!(state.daily_summaries[0].min_temp, 99.0);
    assert_eq!(state.daily_summaries[0].max_temp, 108.0);
}

#[tokio::test]
async fn unknown_city_surfaces_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "cod": "404", "message": "city not found" })),
        )
        .mount(&server)
        .await;

    let coordinator = coordinator(&server);
    coordinator.fetch_by_city("Atlantis").await;

    let state = coordinator.state();
    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(state.last_error, Some(ErrorKind::NotFound));
    assert_eq!(
        state.last_error.map(|e| e.user_message()).as_deref(),
        Some("City not found. Please check the name.")
    );
    assert!(state.current_snapshot.is_none());
}
