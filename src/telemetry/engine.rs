/// Rolling window and exponential smoothing of keyed telemetry logs
use log::debug;
use serde_json::Value;

/// Number of most recent readings kept for the chart.
pub const WINDOW_CAPACITY: usize = 10;

/// Blend factor applied on every new snapshot.
pub const SMOOTHING_FACTOR: f64 = 0.2;

/// Records of a keyed log in arrival order, paired with their keys
///
/// The store hands back a log whose keys are all small integers as an array,
/// with `null` in the slots of missing keys. Those holes are not records.
/// Anything other than an object or an array holds no records.
pub fn log_records(snapshot: &Value) -> Vec<(String, &Value)> {
    match snapshot {
        Value::Object(records) => records
            .iter()
            .map(|(key, record)| (key.clone(), record))
            .collect(),
        Value::Array(records) => records
            .iter()
            .enumerate()
            .filter(|(_, record)| !record.is_null())
            .map(|(index, record)| (index.to_string(), record))
            .collect(),
        _ => Vec::new(),
    }
}

/// Extract the most recent readings from a keyed log snapshot
///
/// The snapshot is the full value at a keyed-log path: an object mapping
/// record ids to records, or an array for integer ids. Records are taken in
/// key order (arrival order for push-generated ids), records whose `field` is
/// missing or not a number are dropped, and only the last `capacity` values
/// survive, oldest first.
pub fn recent_window(snapshot: &Value, field: &str, capacity: usize) -> Vec<f64> {
    let values: Vec<f64> = log_records(snapshot)
        .into_iter()
        .filter_map(|(key, record)| {
            let value = record.get(field).and_then(Value::as_f64);
            if value.is_none() {
                debug!("Skipping record {} without numeric {}", key, field);
            }
            value
        })
        .collect();

    let skip = values.len().saturating_sub(capacity);
    values.into_iter().skip(skip).collect()
}

/// Blend a new raw window into the previous smoothed window
///
/// With no previous state the raw window is returned as is. Otherwise every
/// index moves `SMOOTHING_FACTOR` of the way from its previous smoothed value
/// towards the new raw value. Indices the previous window never had start
/// from the raw value. The result always has the new window's length.
pub fn smooth(previous: &[f64], window: &[f64]) -> Vec<f64> {
    if previous.is_empty() {
        return window.to_vec();
    }

    window
        .iter()
        .enumerate()
        .map(|(i, &target)| match previous.get(i) {
            Some(&prev) => prev + (target - prev) * SMOOTHING_FACTOR,
            None => target,
        })
        .collect()
}

/// Owner of the temperature window and its smoothed counterpart.
#[derive(Debug, Clone)]
pub struct TelemetryEngine {
    field: String,
    capacity: usize,
    window: Vec<f64>,
    smoothed: Vec<f64>,
}

impl TelemetryEngine {
    pub fn new(field: &str) -> Self {
        Self::with_capacity(field, WINDOW_CAPACITY)
    }

    pub fn with_capacity(field: &str, capacity: usize) -> Self {
        TelemetryEngine {
            field: field.to_string(),
            capacity,
            window: Vec::with_capacity(capacity),
            smoothed: Vec::with_capacity(capacity),
        }
    }

    /// Recompute both windows from a full log snapshot.
    pub fn ingest(&mut self, snapshot: &Value) -> (&[f64], &[f64]) {
        let window = recent_window(snapshot, &self.field, self.capacity);
        self.smoothed = smooth(&self.smoothed, &window);
        self.window = window;
        (&self.window, &self.smoothed)
    }

    #[cfg(test)]
    pub fn window(&self) -> &[f64] {
        &self.window
    }

    pub fn smoothed(&self) -> &[f64] {
        &self.smoothed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn log_of(values: &[f64]) -> Value {
        let mut records = Map::new();
        for (i, v) in values.iter().enumerate() {
            records.insert(format!("-N{:04}", i), json!({ "Temperature_C": v }));
        }
        Value::Object(records)
    }

    #[test]
    fn window_keeps_last_ten_in_arrival_order() {
        let values: Vec<f64> = (0..25).map(|v| v as f64).collect();
        let window = recent_window(&log_of(&values), "Temperature_C", WINDOW_CAPACITY);
        assert_eq!(window.len(), 10);
        assert_eq!(window, (15..25).map(|v| v as f64).collect::<Vec<_>>());
    }

    #[test]
    fn window_filters_non_numeric_records() {
        let snapshot = json!({
            "a": { "Temperature_C": 20.5 },
            "b": { "Temperature_C": "21.0" },
            "c": { "Humidity": 40 },
            "d": { "Temperature_C": null },
            "e": 17,
            "f": { "Temperature_C": 22 }
        });
        let window = recent_window(&snapshot, "Temperature_C", WINDOW_CAPACITY);
        assert_eq!(window, vec![20.5, 22.0]);
    }

    #[test]
    fn window_counts_only_valid_records_toward_capacity() {
        let mut records = Map::new();
        for i in 0..12 {
            records.insert(format!("v{:02}", i), json!({ "Temperature_C": i }));
            records.insert(format!("w{:02}", i), json!({ "Temperature_C": "bad" }));
        }
        let window = recent_window(&Value::Object(records), "Temperature_C", WINDOW_CAPACITY);
        assert_eq!(window, (2..12).map(|v| v as f64).collect::<Vec<_>>());
    }

    #[test]
    fn window_of_empty_or_null_snapshot_is_empty() {
        assert!(recent_window(&Value::Null, "Temperature_C", 10).is_empty());
        assert!(recent_window(&json!({}), "Temperature_C", 10).is_empty());
        assert!(recent_window(&json!(21.5), "Temperature_C", 10).is_empty());
        assert!(recent_window(&json!([null, null]), "Temperature_C", 10).is_empty());
    }

    #[test]
    fn window_reads_integer_keyed_logs() {
        let snapshot = json!([
            null,
            { "Temperature_C": 20.0 },
            null,
            { "Temperature_C": 21.0 },
            { "Temperature_C": "n/a" }
        ]);
        assert_eq!(
            recent_window(&snapshot, "Temperature_C", WINDOW_CAPACITY),
            vec![20.0, 21.0]
        );

        let records: Vec<String> = log_records(&snapshot)
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(records, vec!["1", "3", "4"]);
    }

    #[test]
    fn smooth_is_identity_without_history() {
        let data = vec![12.0, 13.5, 11.25];
        assert_eq!(smooth(&[], &data), data);
    }

    #[test]
    fn smooth_blends_by_factor() {
        let result = smooth(&[10.0, 20.0], &[20.0, 10.0]);
        assert!((result[0] - 12.0).abs() < 1e-9);
        assert!((result[1] - 18.0).abs() < 1e-9);
    }

    #[test]
    fn smooth_follows_new_window_length() {
        let grown = smooth(&[10.0], &[20.0, 30.0]);
        assert_eq!(grown.len(), 2);
        assert!((grown[0] - 12.0).abs() < 1e-9);
        assert_eq!(grown[1], 30.0);

        let shrunk = smooth(&[10.0, 20.0, 30.0], &[20.0]);
        assert_eq!(shrunk.len(), 1);
        assert!(smooth(&[10.0], &[]).is_empty());
    }

    #[test]
    fn smooth_converges_without_overshoot() {
        let target = 25.0;
        let mut smoothed = vec![5.0];
        let mut distance = target - smoothed[0];
        for _ in 0..30 {
            smoothed = smooth(&smoothed, &[target]);
            let next = target - smoothed[0];
            assert!(next > 0.0, "overshot target");
            assert!((next - distance * 0.8).abs() < 1e-9);
            distance = next;
        }
    }

    #[test]
    fn engine_ingest_replaces_window_and_keeps_lengths_equal() {
        let mut engine = TelemetryEngine::new("Temperature_C");

        let (window, smoothed) = engine.ingest(&log_of(&[10.0, 11.0]));
        assert_eq!(window, &[10.0, 11.0]);
        assert_eq!(smoothed, &[10.0, 11.0]);

        let (window, smoothed) = engine.ingest(&log_of(&[10.0, 11.0, 20.0]));
        assert_eq!(window, &[10.0, 11.0, 20.0]);
        assert_eq!(smoothed.len(), window.len());
        assert_eq!(smoothed[2], 20.0);

        let (window, smoothed) = engine.ingest(&Value::Null);
        assert!(window.is_empty());
        assert!(smoothed.is_empty());
    }

    #[test]
    fn engine_restarts_from_raw_after_empty_snapshot() {
        let mut engine = TelemetryEngine::new("Temperature_C");
        engine.ingest(&log_of(&[10.0]));
        engine.ingest(&json!({}));
        engine.ingest(&log_of(&[30.0]));
        assert_eq!(engine.smoothed(), &[30.0]);
        assert_eq!(engine.window(), &[30.0]);
    }
}
