//! InfluxDB line protocol output formatter.

use crate::output::OutputFormatter;
use crate::reading::{DecodedEvent, Reading};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::time::SystemTime;

/// Field values for InfluxDB line protocol
#[derive(Debug, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Float(num) => write!(f, "{num}"),
            FieldValue::Integer(num) => write!(f, "{num}i"),
        }
    }
}

/// Data point in InfluxDB line protocol
#[derive(Debug)]
pub struct DataPoint {
    pub measurement: String,
    pub tag_set: BTreeMap<String, String>,
    pub field_set: BTreeMap<String, FieldValue>,
    pub timestamp: Option<SystemTime>,
}

/// Escape commas, equals signs and spaces in tag keys and values.
fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '=' | ' ') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn fmt_tags(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    for (key, value) in data_point.tag_set.iter() {
        write!(fmt, ",{}={}", escape_tag(key), escape_tag(value))?;
    }
    Ok(())
}

fn fmt_fields(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    let mut first = true;
    for (key, value) in data_point.field_set.iter() {
        if first {
            first = false;
        } else {
            write!(fmt, ",")?;
        }
        write!(fmt, "{}={}", key, value)?;
    }
    Ok(())
}

fn fmt_timestamp(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    if let Some(since_epoch) = data_point
        .timestamp
        .and_then(|time| time.duration_since(SystemTime::UNIX_EPOCH).ok())
    {
        write!(fmt, " {}", since_epoch.as_nanos())?;
    }
    Ok(())
}

impl fmt::Display for DataPoint {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.measurement)?;
        fmt_tags(self, fmt)?;
        write!(fmt, " ")?;
        fmt_fields(self, fmt)?;
        fmt_timestamp(self, fmt)
    }
}

/// InfluxDB line protocol formatter.
///
/// Tags are the device id (`mac`), the human-readable `name` and the
/// `message_type`; every reading value becomes a field. Raw counters are
/// written as integers, scaled values as floats.
pub struct InfluxDbFormatter {
    /// The measurement name in InfluxDB
    measurement_name: String,
}

impl InfluxDbFormatter {
    /// Create a new InfluxDB formatter.
    ///
    /// # Arguments
    /// * `measurement_name` - The measurement name to use in the line protocol
    pub fn new(measurement_name: String) -> Self {
        Self { measurement_name }
    }

    fn tag_set(&self, event: &DecodedEvent, name: &str) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        tags.insert("mac".to_string(), event.device_id.clone());
        tags.insert("name".to_string(), name.to_string());
        tags.insert("message_type".to_string(), event.message_type.to_string());
        tags
    }

    fn field_set(&self, event: &DecodedEvent) -> BTreeMap<String, FieldValue> {
        let mut fields = BTreeMap::new();

        macro_rules! float {
            ($name:literal, $val:expr) => {
                fields.insert($name.into(), FieldValue::Float($val));
            };
        }
        macro_rules! int {
            ($name:literal, $val:expr) => {
                fields.insert($name.into(), FieldValue::Integer(i64::from($val)));
            };
        }

        match &event.reading {
            Reading::Sensor(r) => {
                int!("sequence_number", r.sequence_number);
                float!("temperature", r.temperature);
                float!("temperature_f", r.temperature_f);
                float!("relative_humidity", r.relative_humidity);
                int!("ambient_light", r.ambient_light);
                float!("barometric_pressure", r.barometric_pressure);
                float!("sound_level", r.sound_level);
                int!("etvoc", r.etvoc);
                int!("eco2", r.eco2);
            }
            Reading::Calculation(r) => {
                int!("sequence_number", r.sequence_number);
                float!("discomfort_index", r.discomfort_index);
                float!("heat_stroke_risk", r.heat_stroke_risk);
                int!("vibration", r.vibration);
                float!("si_value", r.si_value);
                float!("peak_ground_acceleration", r.peak_ground_acceleration);
                float!("seismic_intensity", r.seismic_intensity);
                float!("acceleration_x", r.acc_x_axis);
                float!("acceleration_y", r.acc_y_axis);
                float!("acceleration_z", r.acc_z_axis);
            }
        }

        fields
    }

    fn to_data_point(&self, event: &DecodedEvent, name: &str, timestamp: SystemTime) -> DataPoint {
        DataPoint {
            measurement: self.measurement_name.clone(),
            tag_set: self.tag_set(event, name),
            field_set: self.field_set(event),
            timestamp: Some(timestamp),
        }
    }
}

impl OutputFormatter for InfluxDbFormatter {
    fn format(&self, event: &DecodedEvent, name: &str, timestamp: SystemTime) -> io::Result<String> {
        Ok(format!("{}", self.to_data_point(event, name, timestamp)))
    }
}
