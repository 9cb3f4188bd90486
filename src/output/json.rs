//! JSON lines output formatter.

use crate::output::{OutputFormatter, unix_millis};
use crate::reading::DecodedEvent;
use serde::Serialize;
use std::io;
use std::time::SystemTime;

#[derive(Serialize)]
struct JsonLine<'a> {
    name: &'a str,
    timestamp: u64,
    #[serde(flatten)]
    event: &'a DecodedEvent,
}

/// Formats each event as a single JSON object using the wire field names
/// (`deviceId`, `messageType`, `temperatureF`, ...), plus `name` and a
/// millisecond `timestamp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format(&self, event: &DecodedEvent, name: &str, timestamp: SystemTime) -> io::Result<String> {
        let line = JsonLine {
            name,
            timestamp: unix_millis(timestamp),
            event,
        };
        Ok(serde_json::to_string(&line)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TEST_DEVICE, calculation_event, sensor_event};
    use std::time::Duration;

    #[test]
    fn test_json_sensor_line() {
        let timestamp = SystemTime::UNIX_EPOCH + Duration::from_millis(1_500);
        let line = JsonFormatter
            .format(&sensor_event(TEST_DEVICE, 4), "Office", timestamp)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["name"], "Office");
        assert_eq!(value["timestamp"], 1500);
        assert_eq!(value["deviceId"], TEST_DEVICE);
        assert_eq!(value["messageType"], "sensor");
        assert_eq!(value["barometricPressure"], 1016.485);
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_json_calculation_line() {
        let line = JsonFormatter
            .format(&calculation_event(TEST_DEVICE, 4), TEST_DEVICE, SystemTime::UNIX_EPOCH)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["messageType"], "calculation");
        assert_eq!(value["seismicIntensity"], 4.6);
        assert_eq!(value["accXAxis"], 6515.6);
        assert!(value.get("temperature").is_none());
    }
}
