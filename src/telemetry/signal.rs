/// WiFi signal strength (RSSI) quality bands and the six-segment scale
use serde_json::Value;
use std::fmt;

use crate::telemetry::engine::log_records;

/// Reference levels of the visual scale, in dBm.
pub const SCALE_LEVELS: [f64; 6] = [-90.0, -80.0, -70.0, -60.0, -50.0, -40.0];

/// Quality bands, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignalQuality {
    Excellent,
    Good,
    Fair,
    Sufficient,
    Poor,
}

impl SignalQuality {
    /// Classify a reading. Each band includes its lower bound.
    pub fn classify(rssi: f64) -> Self {
        if rssi >= -50.0 {
            SignalQuality::Excellent
        } else if rssi >= -60.0 {
            SignalQuality::Good
        } else if rssi >= -70.0 {
            SignalQuality::Fair
        } else if rssi >= -80.0 {
            SignalQuality::Sufficient
        } else {
            SignalQuality::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SignalQuality::Excellent => "Excellent",
            SignalQuality::Good => "Good",
            SignalQuality::Fair => "Fair",
            SignalQuality::Sufficient => "Sufficient",
            SignalQuality::Poor => "Poor",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            SignalQuality::Excellent => "#4caf50",
            SignalQuality::Good => "#8bc34a",
            SignalQuality::Fair => "#ffc107",
            SignalQuality::Sufficient => "#ff5722",
            SignalQuality::Poor => "#f44336",
        }
    }
}

impl fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSegment {
    pub level: f64,
    pub color: &'static str,
    pub active: bool,
}

/// Index of the scale segment whose `[level, next_level)` range holds `rssi`.
///
/// The last level has no successor and reuses itself as the upper bound, so
/// its range is empty and readings at or above -40 dBm light no segment.
pub fn active_segment(rssi: f64) -> Option<usize> {
    SCALE_LEVELS.iter().enumerate().position(|(i, &level)| {
        let next = SCALE_LEVELS.get(i + 1).copied().unwrap_or(level);
        rssi >= level && rssi < next
    })
}

/// The six colored segments with the active one flagged.
pub fn scale_segments(rssi: f64) -> [ScaleSegment; 6] {
    let active = active_segment(rssi);
    let mut segments = [ScaleSegment {
        level: 0.0,
        color: "",
        active: false,
    }; 6];
    for (i, level) in SCALE_LEVELS.iter().enumerate() {
        segments[i] = ScaleSegment {
            level: *level,
            color: SignalQuality::classify(*level).color(),
            active: active == Some(i),
        };
    }
    segments
}

/// Signal strength of the newest record in an RSSI log snapshot
///
/// Only the record under the last key is considered. `None` when the log is
/// empty or that record has no numeric `field`.
pub fn latest_reading(snapshot: &Value, field: &str) -> Option<f64> {
    let (_, record) = log_records(snapshot).pop()?;
    record.get(field).and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_band_boundaries() {
        assert_eq!(SignalQuality::classify(-50.0), SignalQuality::Excellent);
        assert_eq!(SignalQuality::classify(-50.001), SignalQuality::Good);
        assert_eq!(SignalQuality::classify(-60.0), SignalQuality::Good);
        assert_eq!(SignalQuality::classify(-60.5), SignalQuality::Fair);
        assert_eq!(SignalQuality::classify(-70.0), SignalQuality::Fair);
        assert_eq!(SignalQuality::classify(-80.0), SignalQuality::Sufficient);
        assert_eq!(SignalQuality::classify(-81.0), SignalQuality::Poor);
        assert_eq!(SignalQuality::classify(0.0), SignalQuality::Excellent);
        assert_eq!(SignalQuality::classify(-120.0), SignalQuality::Poor);
    }

    #[test]
    fn quality_colors_and_labels() {
        assert_eq!(SignalQuality::Excellent.color(), "#4caf50");
        assert_eq!(SignalQuality::Poor.color(), "#f44336");
        assert_eq!(SignalQuality::Poor.to_string(), "Poor");
        assert!(SignalQuality::Excellent < SignalQuality::Poor);
    }

    #[test]
    fn active_segment_ranges() {
        assert_eq!(active_segment(-95.0), None);
        assert_eq!(active_segment(-90.0), Some(0));
        assert_eq!(active_segment(-80.5), Some(0));
        assert_eq!(active_segment(-80.0), Some(1));
        assert_eq!(active_segment(-65.0), Some(2));
        assert_eq!(active_segment(-41.0), Some(4));
        assert_eq!(active_segment(-40.0), None);
        assert_eq!(active_segment(-30.0), None);
    }

    #[test]
    fn segments_are_colored_by_their_level() {
        let segments = scale_segments(-72.0);
        assert_eq!(segments[0].color, SignalQuality::Poor.color());
        assert_eq!(segments[1].color, SignalQuality::Sufficient.color());
        assert_eq!(segments[5].color, SignalQuality::Excellent.color());
        let active: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(active, vec![1]);
    }

    #[test]
    fn latest_reading_uses_last_key_only() {
        let snapshot = json!({
            "-a": { "WiFi_RSSI": -40 },
            "-b": { "WiFi_RSSI": -67 }
        });
        assert_eq!(latest_reading(&snapshot, "WiFi_RSSI"), Some(-67.0));

        let broken_tail = json!({
            "-a": { "WiFi_RSSI": -40 },
            "-b": { "WiFi_RSSI": "weak" }
        });
        assert_eq!(latest_reading(&broken_tail, "WiFi_RSSI"), None);
        assert_eq!(latest_reading(&Value::Null, "WiFi_RSSI"), None);
        assert_eq!(latest_reading(&json!({}), "WiFi_RSSI"), None);
    }

    #[test]
    fn latest_reading_of_integer_keyed_log() {
        let snapshot = json!([{ "WiFi_RSSI": -55 }, { "WiFi_RSSI": -67 }, null]);
        assert_eq!(latest_reading(&snapshot, "WiFi_RSSI"), Some(-67.0));
        assert_eq!(latest_reading(&json!([]), "WiFi_RSSI"), None);
    }
}
