pub mod engine;
pub mod signal;

pub use engine::TelemetryEngine;
pub use signal::SignalQuality;

/// Scalar device temperature in Celsius.
pub const TEMPERATURE_PATH: &str = "Temperature_C";
/// Keyed log of temperature records.
pub const TEMPERATURE_LOG_PATH: &str = "Tlogs";
/// Keyed log of signal strength records.
pub const SIGNAL_LOG_PATH: &str = "rssi_logs";

pub const TEMPERATURE_FIELD: &str = "Temperature_C";
pub const SIGNAL_FIELD: &str = "WiFi_RSSI";
