/// Display formatting helpers for the dashboard
use time::{format_description, OffsetDateTime};

fn format_with(dt: &OffsetDateTime, description: &str) -> String {
    match format_description::parse(description) {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

/// Current instant in the local offset, UTC when the offset is unknown.
pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Date line of the clock, e.g. `Fri, Oct 16, 2026`.
pub fn format_date(dt: &OffsetDateTime) -> String {
    format_with(
        dt,
        "[weekday repr:short], [month repr:short] [day padding:none], [year]",
    )
}

/// Time line of the clock, `HH:MM:SS`.
pub fn format_time(dt: &OffsetDateTime) -> String {
    format_with(dt, "[hour]:[minute]:[second]")
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Device temperature badge in both units, one decimal each.
pub fn format_device_temperature(celsius: Option<f64>) -> String {
    match celsius {
        Some(c) => format!("{:.1} °C / {:.1} °F", c, celsius_to_fahrenheit(c)),
        None => "Loading...".to_string(),
    }
}

/// Weather temperatures are shown as whole degrees.
pub fn format_whole_degrees(celsius: Option<f64>) -> String {
    match celsius {
        Some(c) => format!("{}°C", c.round() as i64),
        None => "--".to_string(),
    }
}

/// Chart series as `label=value` pairs, labels counting from 1.
pub fn format_series(values: &[f64]) -> String {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{}={:.1}", i + 1, v))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn clock_lines() {
        let dt = datetime!(2026-10-16 09:05:03 UTC);
        assert_eq!(format_date(&dt), "Fri, Oct 16, 2026");
        assert_eq!(format_time(&dt), "09:05:03");
    }

    #[test]
    fn device_temperature_badge() {
        assert_eq!(format_device_temperature(Some(21.0)), "21.0 °C / 69.8 °F");
        assert_eq!(format_device_temperature(Some(-40.0)), "-40.0 °C / -40.0 °F");
        assert_eq!(format_device_temperature(None), "Loading...");
    }

    #[test]
    fn whole_degrees() {
        assert_eq!(format_whole_degrees(Some(7.5)), "8°C");
        assert_eq!(format_whole_degrees(Some(-0.4)), "0°C");
        assert_eq!(format_whole_degrees(None), "--");
    }

    #[test]
    fn series_labels_start_at_one() {
        assert_eq!(format_series(&[12.04, 13.46]), "1=12.0 2=13.5");
        assert_eq!(format_series(&[]), "");
    }
}
