/// Dashboard state: the single owner of everything the screen shows
use log::debug;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

use crate::connectivity::connectivity_icon;
use crate::models::{DashboardEvent, Profile, WeatherState};
use crate::telemetry::signal::{latest_reading, scale_segments};
use crate::telemetry::{SignalQuality, TelemetryEngine, SIGNAL_FIELD, TEMPERATURE_FIELD};
use crate::utils::{
    format_date, format_device_temperature, format_series, format_time, format_whole_degrees,
};
use crate::weather::{weather_icon, Daypart};

/// Background tasks feeding the dashboard. Aborted when dropped.
#[derive(Debug, Default)]
pub struct Teardown {
    tasks: Vec<JoinHandle<()>>,
}

impl Teardown {
    pub fn push(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[derive(Debug)]
pub struct Dashboard {
    temperature: Option<f64>,
    history: TelemetryEngine,
    rssi: Option<f64>,
    weather: WeatherState,
    connected: Option<bool>,
    now: OffsetDateTime,
}

impl Dashboard {
    pub fn new(now: OffsetDateTime) -> Self {
        Dashboard {
            temperature: None,
            history: TelemetryEngine::new(TEMPERATURE_FIELD),
            rssi: None,
            weather: WeatherState::Loading,
            connected: None,
            now,
        }
    }

    /// Apply one event. Returns whether the screen content changed beyond the clock.
    pub fn apply(&mut self, event: DashboardEvent) -> bool {
        match event {
            DashboardEvent::Temperature(value) => {
                let temperature = value.as_f64();
                if temperature.is_none() && !value.is_null() {
                    debug!("Ignoring non-numeric temperature {}", value);
                }
                self.temperature = temperature;
            }
            DashboardEvent::TemperatureLog(snapshot) => {
                self.history.ingest(&snapshot);
            }
            DashboardEvent::SignalLog(snapshot) => match latest_reading(&snapshot, SIGNAL_FIELD) {
                Some(rssi) => self.rssi = Some(rssi),
                None => {
                    debug!("Latest signal record has no numeric {}", SIGNAL_FIELD);
                    return false;
                }
            },
            DashboardEvent::Connectivity(connected) => {
                if self.connected == Some(connected) {
                    return false;
                }
                self.connected = Some(connected);
            }
            DashboardEvent::Weather(state) => self.weather = state,
            DashboardEvent::Tick(now) => {
                self.now = now;
                return false;
            }
        }
        true
    }

    #[cfg(test)]
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    #[cfg(test)]
    pub fn history(&self) -> &TelemetryEngine {
        &self.history
    }

    #[cfg(test)]
    pub fn signal_quality(&self) -> Option<SignalQuality> {
        self.rssi.map(SignalQuality::classify)
    }

    pub fn clock_line(&self) -> String {
        format!("{} {}", format_date(&self.now), format_time(&self.now))
    }

    fn weather_line(&self) -> String {
        match &self.weather {
            WeatherState::Loading => "Weather: loading...".to_string(),
            WeatherState::Failed(message) if message.is_empty() => {
                "Weather: Weather unavailable".to_string()
            }
            WeatherState::Failed(message) => format!("Weather: {}", message),
            WeatherState::Ready(report) => {
                let current = &report.current;
                let daypart =
                    Daypart::classify(current.sunrise, current.sunset, self.now.unix_timestamp());
                format!(
                    "Weather: {} {} {} ({}) | Forecast: {}",
                    weather_icon(&current.category, daypart.is_daylight()),
                    format_whole_degrees(current.temperature),
                    current.description,
                    daypart,
                    format_whole_degrees(report.forecast_temperature),
                )
            }
        }
    }

    fn signal_line(&self, rssi: f64) -> String {
        let quality = SignalQuality::classify(rssi);
        let scale = scale_segments(rssi)
            .iter()
            .map(|segment| {
                if segment.active {
                    format!("[{}]", segment.level)
                } else {
                    format!("{}", segment.level)
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "WiFi Integrity RSSI: {} dBm | {} | {} ({})",
            rssi,
            scale,
            quality,
            quality.color()
        )
    }

    /// Text snapshot of the dashboard screen.
    pub fn render(&self) -> Vec<String> {
        let (icon, color) = connectivity_icon(self.connected);
        let mut lines = vec![format!(
            "Device Temp: {} | {} ({}) | {}",
            format_device_temperature(self.temperature),
            icon,
            color,
            self.clock_line()
        )];

        let smoothed = self.history.smoothed();
        if !smoothed.is_empty() {
            lines.push(format!("Temperature °C: {}", format_series(smoothed)));
        }

        lines.push(self.weather_line());

        if let Some(rssi) = self.rssi {
            lines.push(self.signal_line(rssi));
        }
        lines
    }
}

/// Profile screen lines. Missing fields read `Not set`.
pub fn render_profile(profile: &Profile) -> Vec<String> {
    let field = |value: &str| {
        if value.is_empty() {
            "Not set".to_string()
        } else {
            value.to_string()
        }
    };
    vec![
        format!("Name: {}", field(&profile.name)),
        format!("Email: {}", field(&profile.email)),
        format!("Device Serial: {}", field(&profile.serial)),
    ]
}
