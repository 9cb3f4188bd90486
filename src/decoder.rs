//! Frame decoder for OMRON 2JCIE-BU01 manufacturer data.
//!
//! Both frame layouts carry the same data type byte, so the layout is chosen
//! by the length of the hex payload alone:
//!
//! | Hex digits | Bytes | Layout                 |
//! |-----------:|------:|------------------------|
//! | 38         | 19    | [`SensorReading`]      |
//! | 54         | 27    | [`CalculationReading`] |
//!
//! All multi-byte fields are little-endian. Bytes past the last field are
//! reserved and ignored. Scale factors follow the 2JCIE-BU01 user manual.

use crate::reading::{CalculationReading, Reading, SensorReading};
use thiserror::Error;

/// Length in hex digits of a sensor frame payload.
pub const SENSOR_FRAME_LEN: usize = 38;

/// Length in hex digits of a calculation frame payload.
pub const CALCULATION_FRAME_LEN: usize = 54;

/// Error types for decoding OMRON frames.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The payload is not a valid hex string
    #[error("Invalid hex encoding: {0}")]
    InvalidEncoding(#[from] hex::FromHexError),
    /// The payload length matches neither frame layout
    #[error("Unrecognized data frame with length {0}")]
    UnrecognizedLength(usize),
}

/// Sequential little-endian reader over a frame whose length was already checked.
struct FrameReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn u8(&mut self) -> u8 {
        let v = self.buf[self.pos];
        self.pos += 1;
        v
    }

    fn u16(&mut self) -> u16 {
        let v = u16::from_le_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        v
    }

    fn u32(&mut self) -> u32 {
        let v = u32::from_le_bytes([
            self.buf[self.pos],
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
        ]);
        self.pos += 4;
        v
    }
}

/// Decode a hex-encoded OMRON manufacturer data payload.
///
/// # Errors
/// Returns [`DecodeError::InvalidEncoding`] for odd-length or non-hex input and
/// [`DecodeError::UnrecognizedLength`] when the payload is neither frame size.
/// No partial reading is ever returned.
///
/// # Example
/// ```
/// use omron_sensor_listener::decoder::decode;
/// use omron_sensor_listener::reading::MessageType;
///
/// let reading = decode("0343b90a32100000a5820f00fc1b75009304ff").unwrap();
/// assert_eq!(reading.message_type(), MessageType::Sensor);
/// ```
pub fn decode(raw_hex: &str) -> Result<Reading, DecodeError> {
    let buf = hex::decode(raw_hex)?;

    match raw_hex.len() {
        SENSOR_FRAME_LEN => Ok(Reading::Sensor(decode_sensor(&buf))),
        CALCULATION_FRAME_LEN => Ok(Reading::Calculation(decode_calculation(&buf))),
        len => Err(DecodeError::UnrecognizedLength(len)),
    }
}

/// Convert Celsius to Fahrenheit, rounded to two decimals.
fn fahrenheit(celsius: f64) -> f64 {
    ((f64::EPSILON + celsius * 9.0 / 5.0 + 32.0) * 100.0).round() / 100.0
}

fn decode_sensor(buf: &[u8]) -> SensorReading {
    let mut r = FrameReader::new(buf);

    let data_type = r.u8();
    let sequence_number = r.u8();
    let temperature = f64::from(r.u16()) / 100.0;
    let relative_humidity = f64::from(r.u16()) / 100.0;
    let ambient_light = r.u16();
    let barometric_pressure = f64::from(r.u32()) / 1000.0;
    let sound_level = f64::from(r.u16()) / 100.0;
    let etvoc = r.u16();
    let eco2 = r.u16();

    SensorReading {
        data_type,
        sequence_number,
        temperature,
        temperature_f: fahrenheit(temperature),
        relative_humidity,
        ambient_light,
        barometric_pressure,
        sound_level,
        etvoc,
        eco2,
    }
}

fn decode_calculation(buf: &[u8]) -> CalculationReading {
    let mut r = FrameReader::new(buf);

    CalculationReading {
        data_type: r.u8(),
        sequence_number: r.u8(),
        discomfort_index: f64::from(r.u16()) / 100.0,
        heat_stroke_risk: f64::from(r.u16()) / 100.0,
        vibration: r.u8(),
        si_value: f64::from(r.u16()) / 10.0,
        peak_ground_acceleration: f64::from(r.u16()) / 10.0,
        seismic_intensity: f64::from(r.u16()) / 1000.0,
        acc_x_axis: f64::from(r.u16()) / 10.0,
        acc_y_axis: f64::from(r.u16()) / 10.0,
        acc_z_axis: f64::from(r.u16()) / 10.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::MessageType;
    use crate::test_utils::{CALCULATION_FRAME_HEX, SENSOR_FRAME_HEX};

    fn sensor(hex: &str) -> SensorReading {
        match decode(hex).unwrap() {
            Reading::Sensor(r) => r,
            other => panic!("expected sensor reading, got {other:?}"),
        }
    }

    fn calculation(hex: &str) -> CalculationReading {
        match decode(hex).unwrap() {
            Reading::Calculation(r) => r,
            other => panic!("expected calculation reading, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_sensor_frame() {
        let r = sensor(SENSOR_FRAME_HEX);
        assert_eq!(r.data_type, 3);
        assert_eq!(r.sequence_number, 0x43);
        assert_eq!(r.temperature, 27.45);
        assert_eq!(r.temperature_f, 81.41);
        assert_eq!(r.relative_humidity, 41.46);
        assert_eq!(r.ambient_light, 0);
        assert_eq!(r.barometric_pressure, 1016.485);
        assert_eq!(r.sound_level, 71.64);
        assert_eq!(r.etvoc, 117);
        assert_eq!(r.eco2, 1171);
    }

    #[test]
    fn test_decode_calculation_frame() {
        let r = calculation(CALCULATION_FRAME_HEX);
        assert_eq!(r.data_type, 3);
        assert_eq!(r.sequence_number, 0x43);
        assert_eq!(r.discomfort_index, 73.87);
        assert_eq!(r.heat_stroke_risk, 22.18);
        assert_eq!(r.vibration, 1);
        assert_eq!(r.si_value, 12.8);
        assert_eq!(r.peak_ground_acceleration, 139.0);
        assert_eq!(r.seismic_intensity, 4.6);
        assert_eq!(r.acc_x_axis, 6515.6);
        assert_eq!(r.acc_y_axis, 3.9);
        assert_eq!(r.acc_z_axis, 5587.4);
    }

    #[test]
    fn test_sensor_prefix_of_calculation_frame_decodes_as_sensor() {
        // Same leading bytes, but the shorter length selects the sensor layout
        let hex = &CALCULATION_FRAME_HEX[..SENSOR_FRAME_LEN];
        let r = sensor(hex);
        assert_eq!(r.temperature, 73.87);
        assert_eq!(r.temperature_f, 164.97);
        assert_eq!(r.relative_humidity, 22.18);
        assert_eq!(r.ambient_light, 0x8001);
    }

    #[test]
    fn test_length_not_type_byte_selects_layout() {
        // Both frames carry data type 3
        assert_eq!(decode(SENSOR_FRAME_HEX).unwrap().message_type(), MessageType::Sensor);
        assert_eq!(
            decode(CALCULATION_FRAME_HEX).unwrap().message_type(),
            MessageType::Calculation
        );

        let retagged = format!("05{}", &SENSOR_FRAME_HEX[2..]);
        let r = sensor(&retagged);
        assert_eq!(r.data_type, 5);
    }

    #[test]
    fn test_fahrenheit_rounding() {
        assert_eq!(fahrenheit(0.0), 32.0);
        assert_eq!(fahrenheit(100.0), 212.0);
        assert_eq!(fahrenheit(21.83), 71.29);
        assert_eq!(fahrenheit(655.35), 1211.63);
    }

    #[test]
    fn test_uppercase_hex_is_accepted() {
        let r = sensor(&SENSOR_FRAME_HEX.to_uppercase());
        assert_eq!(r.temperature, 27.45);
    }

    #[test]
    fn test_unrecognized_lengths() {
        for len in [0, 2, 36, 40, 52, 56, 108] {
            let hex = "00".repeat(len / 2);
            assert_eq!(decode(&hex), Err(DecodeError::UnrecognizedLength(len)));
        }
    }

    #[test]
    fn test_invalid_encoding() {
        assert!(matches!(decode("0"), Err(DecodeError::InvalidEncoding(_))));
        assert!(matches!(
            decode(&"zz".repeat(19)),
            Err(DecodeError::InvalidEncoding(_))
        ));
        // Odd length is an encoding error even when close to a frame size
        assert!(matches!(
            decode(&SENSOR_FRAME_HEX[..37]),
            Err(DecodeError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_max_raw_values() {
        let r = sensor(&"ff".repeat(19));
        assert_eq!(r.temperature, 655.35);
        assert_eq!(r.barometric_pressure, 4_294_967.295);
        assert_eq!(r.ambient_light, u16::MAX);

        let c = calculation(&"ff".repeat(27));
        assert_eq!(c.seismic_intensity, 65.535);
        assert_eq!(c.vibration, u8::MAX);
        assert_eq!(c.acc_z_axis, 6553.5);
    }

    #[test]
    fn test_decode_error_display() {
        assert_eq!(
            DecodeError::UnrecognizedLength(12).to_string(),
            "Unrecognized data frame with length 12"
        );
        assert!(
            DecodeError::InvalidEncoding(hex::FromHexError::OddLength)
                .to_string()
                .starts_with("Invalid hex encoding")
        );
    }
}
