use std::fmt;

/// Length of dawn before sunrise and of dusk after sunset.
const TWILIGHT_SECS: i64 = 30 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Daypart {
    Dawn,
    Daytime,
    Dusk,
    Night,
    /// Sun times unknown.
    Day,
}

impl Daypart {
    /// Place `now` relative to sunrise and sunset, all in epoch seconds.
    pub fn classify(sunrise: Option<i64>, sunset: Option<i64>, now: i64) -> Self {
        let (sunrise, sunset) = match (sunrise, sunset) {
            (Some(sunrise), Some(sunset)) => (sunrise, sunset),
            _ => return Daypart::Day,
        };

        if now >= sunrise - TWILIGHT_SECS && now < sunrise {
            Daypart::Dawn
        } else if now >= sunrise && now < sunset {
            Daypart::Daytime
        } else if now >= sunset && now < sunset + TWILIGHT_SECS {
            Daypart::Dusk
        } else {
            Daypart::Night
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Daypart::Dawn => "Dawn",
            Daypart::Daytime => "Daytime",
            Daypart::Dusk => "Dusk",
            Daypart::Night => "Night",
            Daypart::Day => "Day",
        }
    }

    pub fn is_daylight(self) -> bool {
        !matches!(self, Daypart::Night)
    }
}

impl fmt::Display for Daypart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Icon name for a provider weather category such as `Clouds` or `Rain`.
pub fn weather_icon(category: &str, daylight: bool) -> &'static str {
    let category = category.to_lowercase();
    if category.contains("clear") {
        if daylight {
            "weather-sunny"
        } else {
            "weather-night"
        }
    } else if category.contains("cloud") {
        "weather-cloudy"
    } else if category.contains("rain") {
        "weather-rainy"
    } else if category.contains("drizzle") {
        "weather-partly-rainy"
    } else if category.contains("thunder") {
        "weather-lightning"
    } else if category.contains("snow") {
        "weather-snowy"
    } else {
        "weather-partly-cloudy"
    }
}
