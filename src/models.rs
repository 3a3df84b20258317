use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Locally persisted registration profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "userName", default)]
    pub name: String,
    #[serde(rename = "userEmail", default)]
    pub email: String,
    #[serde(rename = "deviceSerial", default)]
    pub serial: String,
}

impl Profile {
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.email.is_empty() && !self.serial.is_empty()
    }
}

/// Record written under `devices/<serial>` at registration.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRegistration {
    pub name: String,
    pub email: String,
    #[serde(rename = "registeredAt")]
    pub registered_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature: Option<f64>,
    pub description: String,
    pub category: String,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub forecast_temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherState {
    Loading,
    Ready(WeatherReport),
    Failed(String),
}

/// Everything the dashboard task reacts to.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    Temperature(serde_json::Value),
    TemperatureLog(serde_json::Value),
    SignalLog(serde_json::Value),
    Connectivity(bool),
    Weather(WeatherState),
    Tick(OffsetDateTime),
}
