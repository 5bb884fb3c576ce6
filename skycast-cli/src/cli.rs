use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, Select};
use skycast_core::{
    Config, Coordinates, ErrorKind, FixedLocation, LocationPoller, OpenWeatherClient, PollOutcome,
    SystemClock, Units, WeatherCoordinator,
};

use crate::render::{self, DailyView};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Current weather and forecasts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and preferred units.
    Configure,

    /// Show weather for a city.
    Show {
        /// City name, e.g. "Aligarh" or "Paris,FR".
        city: String,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Show weather for the current location.
    Here {
        /// Latitude in degrees.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in degrees.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        #[command(flatten)]
        display: DisplayArgs,
    },
}

#[derive(Debug, Args)]
pub struct DisplayArgs {
    /// Number of upcoming days to summarise (defaults to the configured value).
    #[arg(long)]
    days: Option<usize>,

    /// One midday sample per day instead of the daily min/max summary.
    #[arg(long)]
    midday: bool,

    /// Print the coordinator state as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, display } => {
                let config = Config::load()?;
                let (coordinator, units) = build_coordinator(&config, &display)?;

                coordinator.fetch_by_city(&city).await;

                let state = coordinator.state();
                if let Some(kind) = state.last_error {
                    bail!(kind.user_message());
                }
                render::print(&state, units, view(&display), display.json)
            }
            Command::Here { lat, lon, display } => {
                let config = Config::load()?;
                let (coordinator, units) = build_coordinator(&config, &display)?;

                let coordinates = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                let provider = FixedLocation::new(coordinates);
                let handle = LocationPoller::new(Arc::new(provider), coordinator.clone())
                    .with_retry_delay(config.location_retry_delay())
                    .spawn();

                let token = handle.cancellation_token();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        token.cancel();
                    }
                });

                match handle.join().await {
                    PollOutcome::Fetched(_) => {}
                    PollOutcome::Unavailable => bail!(ErrorKind::LocationUnavailable),
                    PollOutcome::Cancelled => return Ok(()),
                }

                let state = coordinator.state();
                if state.displayed_snapshot().is_none() {
                    bail!("Could not load weather for this location. Try `skycast show <CITY>`.");
                }
                render::print(&state, units, view(&display), display.json)
            }
        }
    }
}

fn build_coordinator(
    config: &Config,
    display: &DisplayArgs,
) -> anyhow::Result<(WeatherCoordinator, Units)> {
    let client = OpenWeatherClient::from_config(config)?;
    let units = client.units();
    let days = display.days.unwrap_or(config.forecast.days);
    let coordinator = WeatherCoordinator::with_options(Arc::new(client), days, Arc::new(SystemClock));
    Ok((coordinator, units))
}

fn view(display: &DisplayArgs) -> DailyView {
    if display.midday {
        DailyView::Midday
    } else {
        DailyView::Summary
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let units = Select::new("Units:", Units::all().to_vec())
        .with_starting_cursor(
            Units::all()
                .iter()
                .position(|u| *u == config.api.units)
                .unwrap_or(0),
        )
        .prompt()
        .context("Failed to read units")?;

    config.set_api_key(api_key.trim().to_string());
    config.api.units = units;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
