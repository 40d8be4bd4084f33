//! Current-weather card. A single fetch per screen visit, no submission
//! state machine.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capabilities::http::{HttpMethod, HttpRequest, HttpResult, ValidatedUrl};
use crate::config::ServerUrl;

pub const WEATHER_FAILED_TEXT: &str =
    "Failed to fetch weather data. Check network or CORS settings.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub timestamp: String,
    pub fetch_time: f64,
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub weather_main: String,
    pub weather_description: String,
    pub clouds: f64,
    pub city: String,
    pub rain_chance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum WeatherState {
    #[default]
    NotLoaded,
    Loading,
    Loaded(WeatherReport),
    Failed(String),
}

pub fn fetch_request(server: &ServerUrl) -> Option<HttpRequest> {
    let url = server.endpoint_url(&["fetch-current-weather-data"]);
    match ValidatedUrl::from_url(&url) {
        Ok(url) => Some(HttpRequest::new(HttpMethod::Get, url)),
        Err(e) => {
            warn!(error = %e, "cannot build weather request");
            None
        }
    }
}

/// Maps the shell's answer to the next state. Every failure collapses into
/// the same user-facing text; the cause is only logged.
pub fn apply_response(result: HttpResult) -> WeatherState {
    let response = match result {
        Ok(response) if response.is_success() => response,
        Ok(response) => {
            warn!(status = response.status(), "weather request failed");
            return WeatherState::Failed(WEATHER_FAILED_TEXT.to_string());
        }
        Err(e) => {
            warn!(error = %e, "weather request failed");
            return WeatherState::Failed(WEATHER_FAILED_TEXT.to_string());
        }
    };

    match serde_json::from_slice::<WeatherReport>(response.body()) {
        Ok(report) => {
            debug!(city = %report.city, "weather loaded");
            WeatherState::Loaded(report)
        }
        Err(e) => {
            warn!(error = %e, "weather payload did not parse");
            WeatherState::Failed(WEATHER_FAILED_TEXT.to_string())
        }
    }
}
