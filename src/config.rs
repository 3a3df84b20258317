use log::{debug, info};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::Coordinates;

const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const DEFAULT_PROFILE_PATH: &str = "profile.json";
const DEFAULT_PROBE_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub database_url: String,
    pub database_auth: Option<String>,
    pub weather_api_key: Option<String>,
    pub weather_base_url: String,
    pub location: Option<Coordinates>,
    pub profile_path: PathBuf,
    pub probe_interval: Duration,
}

impl DashboardConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = get("FIREBASE_DATABASE_URL")
            .ok_or("FIREBASE_DATABASE_URL environment variable not set")?;
        url::Url::parse(&database_url)
            .map_err(|e| format!("FIREBASE_DATABASE_URL is not a valid URL: {}", e))?;

        let location = match (get("LOCATION_LAT"), get("LOCATION_LON")) {
            (Some(lat), Some(lon)) => {
                let latitude: f64 = lat
                    .parse()
                    .map_err(|_| format!("LOCATION_LAT is not a number: '{}'", lat))?;
                let longitude: f64 = lon
                    .parse()
                    .map_err(|_| format!("LOCATION_LON is not a number: '{}'", lon))?;
                if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                    return Err(format!(
                        "Location out of range: lat={}, lon={}",
                        latitude, longitude
                    )
                    .into());
                }
                Some(Coordinates {
                    latitude,
                    longitude,
                })
            }
            (None, None) => None,
            _ => return Err("LOCATION_LAT and LOCATION_LON must be set together".into()),
        };

        let probe_interval = match get("CONNECTIVITY_PROBE_SECS") {
            Some(secs) => {
                let secs: u64 = secs
                    .parse()
                    .map_err(|_| format!("CONNECTIVITY_PROBE_SECS is not a number: '{}'", secs))?;
                Duration::from_secs(secs.max(1))
            }
            None => Duration::from_secs(DEFAULT_PROBE_SECS),
        };

        let config = DashboardConfig {
            database_url,
            database_auth: get("FIREBASE_AUTH"),
            weather_api_key: get("OPENWEATHER_API_KEY"),
            weather_base_url: get("WEATHER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_WEATHER_BASE_URL.to_string()),
            location,
            profile_path: get("PROFILE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROFILE_PATH)),
            probe_interval,
        };

        info!("Telemetry store: {}", config.database_url);
        debug!(
            "Weather endpoint: {}, location: {:?}, profile file: {}",
            config.weather_base_url,
            config.location,
            config.profile_path.display()
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn requires_database_url() {
        let err = DashboardConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("FIREBASE_DATABASE_URL"));
    }

    #[test]
    fn applies_defaults() {
        let config =
            DashboardConfig::from_lookup(lookup(&[("FIREBASE_DATABASE_URL", "https://db.example")]))
                .unwrap();
        assert_eq!(config.weather_base_url, DEFAULT_WEATHER_BASE_URL);
        assert_eq!(config.profile_path, PathBuf::from("profile.json"));
        assert_eq!(config.probe_interval, Duration::from_secs(15));
        assert!(config.location.is_none());
        assert!(config.weather_api_key.is_none());
    }

    #[test]
    fn blank_api_key_counts_as_unset() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("FIREBASE_DATABASE_URL", "https://db.example"),
            ("OPENWEATHER_API_KEY", "  "),
        ]))
        .unwrap();
        assert!(config.weather_api_key.is_none());
    }

    #[test]
    fn parses_location() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("FIREBASE_DATABASE_URL", "https://db.example"),
            ("LOCATION_LAT", "60.17"),
            ("LOCATION_LON", "24.94"),
        ]))
        .unwrap();
        let location = config.location.unwrap();
        assert_eq!(location.latitude, 60.17);
        assert_eq!(location.longitude, 24.94);
    }

    #[test]
    fn rejects_half_a_location() {
        let result = DashboardConfig::from_lookup(lookup(&[
            ("FIREBASE_DATABASE_URL", "https://db.example"),
            ("LOCATION_LAT", "60.17"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_out_of_range_location() {
        let result = DashboardConfig::from_lookup(lookup(&[
            ("FIREBASE_DATABASE_URL", "https://db.example"),
            ("LOCATION_LAT", "95"),
            ("LOCATION_LON", "24.94"),
        ]));
        assert!(result.is_err());
    }
}
