/// Weather provider requests and the startup weather pipeline
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::time::Duration;
use url::Url;

use crate::config::DashboardConfig;
use crate::models::{Coordinates, CurrentConditions, WeatherReport, WeatherState};

const REQUEST_TIMEOUT_SECS: u64 = 15;

// The forecast feed has 3-hour granularity, so entry 8 is roughly 24 hours
// ahead. This is a fixed index, not a computed offset: a feed with another
// resolution would select a different horizon.
const FORECAST_SAMPLE_INDEX: usize = 8;

/// Failures that stop the weather pipeline. `Display` is the user-facing text.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("No OpenWeather API key set.")]
    MissingApiKey,

    #[error("Location permission denied.")]
    PermissionDenied,

    #[error("OpenWeather error: {status} {body}")]
    Status { status: u16, body: String },

    #[error("Failed to get weather: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to get weather: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Failed to get weather: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    main: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SunBlock {
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: Option<MainBlock>,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
    sys: Option<SunBlock>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    main: Option<MainBlock>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

impl From<CurrentResponse> for CurrentConditions {
    fn from(response: CurrentResponse) -> Self {
        let condition = response.weather.into_iter().next();
        let (category, description) = match condition {
            Some(c) => (c.main, c.description),
            None => (None, None),
        };
        CurrentConditions {
            temperature: response.main.and_then(|m| m.temp),
            description: description.unwrap_or_default(),
            category: category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "Clear".to_string()),
            sunrise: response.sys.as_ref().and_then(|s| s.sunrise),
            sunset: response.sys.as_ref().and_then(|s| s.sunset),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base: Url,
    api_key: String,
}

impl WeatherClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, WeatherError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(WeatherClient {
            client: Client::new(),
            base,
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, name: &str, at: Coordinates) -> Result<Url, WeatherError> {
        let mut url = self.base.join(name)?;
        url.query_pairs_mut()
            .append_pair("lat", &at.latitude.to_string())
            .append_pair("lon", &at.longitude.to_string())
            .append_pair("units", "metric")
            .append_pair("appid", &self.api_key);
        Ok(url)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T, WeatherError> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Current conditions at `at`.
    pub async fn current(&self, at: Coordinates) -> Result<CurrentConditions, WeatherError> {
        let response: CurrentResponse = self.get_json(self.endpoint("weather", at)?).await?;
        Ok(response.into())
    }

    /// Forecast temperature about a day ahead, `None` if the feed is too short.
    pub async fn forecast(&self, at: Coordinates) -> Result<Option<f64>, WeatherError> {
        let response: ForecastResponse = self.get_json(self.endpoint("forecast", at)?).await?;
        Ok(response
            .list
            .into_iter()
            .nth(FORECAST_SAMPLE_INDEX)
            .and_then(|entry| entry.main)
            .and_then(|main| main.temp))
    }
}

/// Run the startup steps in order, stopping at the first failure
///
/// API key → location → current conditions → forecast. A failed forecast
/// only leaves the forecast empty.
pub async fn fetch_report(
    api_key: Option<&str>,
    base_url: &str,
    location: Option<Coordinates>,
) -> Result<WeatherReport, WeatherError> {
    let api_key = api_key.ok_or(WeatherError::MissingApiKey)?;
    let location = location.ok_or(WeatherError::PermissionDenied)?;
    let client = WeatherClient::new(base_url, api_key)?;

    let current = client.current(location).await?;
    let forecast_temperature = match client.forecast(location).await {
        Ok(temperature) => temperature,
        Err(e) => {
            warn!("Forecast unavailable: {}", e);
            None
        }
    };

    Ok(WeatherReport {
        current,
        forecast_temperature,
    })
}

/// Weather panel state after the startup pipeline.
pub async fn load_weather(config: &DashboardConfig) -> WeatherState {
    match fetch_report(
        config.weather_api_key.as_deref(),
        &config.weather_base_url,
        config.location,
    )
    .await
    {
        Ok(report) => {
            info!(
                "Weather loaded: {} ({:?} °C)",
                report.current.description, report.current.temperature
            );
            WeatherState::Ready(report)
        }
        Err(e) => {
            warn!("Weather pipeline stopped: {}", e);
            WeatherState::Failed(e.to_string())
        }
    }
}
