pub mod client;
pub mod daypart;

pub use client::load_weather;
pub use daypart::{weather_icon, Daypart};
