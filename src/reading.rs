//! Decoded OMRON environment sensor readings.
//!
//! The 2JCIE-BU01 broadcasts two kinds of frames: live sensor values and
//! values the device calculates from them (comfort indexes and seismic data).
//! All scaled values are already converted to engineering units.

use serde::Serialize;
use std::fmt;

/// The kind of frame a reading was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Sensor,
    Calculation,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Sensor => "sensor",
            MessageType::Calculation => "calculation",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live sensor values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub data_type: u8,
    pub sequence_number: u8,
    /// Degrees Celsius
    pub temperature: f64,
    /// Degrees Fahrenheit, rounded to two decimals
    pub temperature_f: f64,
    /// Percent relative humidity
    pub relative_humidity: f64,
    /// Lux, as reported
    pub ambient_light: u16,
    /// Hectopascals
    pub barometric_pressure: f64,
    /// Decibels
    pub sound_level: f64,
    /// ppb, as reported
    #[serde(rename = "eTVOC")]
    pub etvoc: u16,
    /// ppm, as reported
    #[serde(rename = "eCO2")]
    pub eco2: u16,
}

impl SensorReading {
    /// True for the frames a device sends while its sensors are still warming up.
    pub fn is_all_zero(&self) -> bool {
        self.temperature == 0.0
            && self.relative_humidity == 0.0
            && self.ambient_light == 0
            && self.barometric_pressure == 0.0
    }
}

/// Values calculated on the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationReading {
    pub data_type: u8,
    pub sequence_number: u8,
    /// Scale of 0 to 100
    pub discomfort_index: f64,
    /// Scale of -40 to 125
    pub heat_stroke_risk: f64,
    pub vibration: u8,
    /// Kine
    pub si_value: f64,
    /// Gal
    pub peak_ground_acceleration: f64,
    /// Scale of 0.000 to 65.535
    pub seismic_intensity: f64,
    /// Gal
    pub acc_x_axis: f64,
    /// Gal
    pub acc_y_axis: f64,
    /// Gal
    pub acc_z_axis: f64,
}

impl CalculationReading {
    pub fn is_all_zero(&self) -> bool {
        self.acc_x_axis == 0.0
            && self.acc_y_axis == 0.0
            && self.acc_z_axis == 0.0
            && self.discomfort_index == 0.0
            && self.heat_stroke_risk == 0.0
    }
}

/// A reading decoded from either frame layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reading {
    Sensor(SensorReading),
    Calculation(CalculationReading),
}

impl Reading {
    pub fn message_type(&self) -> MessageType {
        match self {
            Reading::Sensor(_) => MessageType::Sensor,
            Reading::Calculation(_) => MessageType::Calculation,
        }
    }

    pub fn sequence_number(&self) -> u8 {
        match self {
            Reading::Sensor(r) => r.sequence_number,
            Reading::Calculation(r) => r.sequence_number,
        }
    }
}

/// A reading attributed to the device that sent it.
///
/// Serializes to a single flat object, e.g.
/// `{"deviceId":"..","messageType":"sensor","dataType":3,"temperature":27.45,..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedEvent {
    pub device_id: String,
    pub message_type: MessageType,
    #[serde(flatten)]
    pub reading: Reading,
}

impl DecodedEvent {
    pub fn new(device_id: impl Into<String>, reading: Reading) -> Self {
        Self {
            device_id: device_id.into(),
            message_type: reading.message_type(),
            reading,
        }
    }

    pub fn sequence_number(&self) -> u8 {
        self.reading.sequence_number()
    }
}
