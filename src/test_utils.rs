use crate::advertisement::{AdvertisementRecord, OMRON_COMPANY_NAME};
use crate::reading::{CalculationReading, DecodedEvent, Reading, SensorReading};

pub use crate::source::fixture::{CALCULATION_FRAME_HEX, SENSOR_FRAME_HEX};

/// A stable device id for unit tests.
pub const TEST_DEVICE: &str = "AA:BB:CC:DD:EE:FF";

/// An OMRON advertisement carrying `data`.
pub fn omron_record(device_id: &str, data: &str) -> AdvertisementRecord {
    AdvertisementRecord::new(device_id, OMRON_COMPANY_NAME, data)
}

/// The reading encoded in [`SENSOR_FRAME_HEX`], with a custom sequence number.
pub fn sensor_reading(sequence_number: u8) -> SensorReading {
    SensorReading {
        data_type: 3,
        sequence_number,
        temperature: 27.45,
        temperature_f: 81.41,
        relative_humidity: 41.46,
        ambient_light: 0,
        barometric_pressure: 1016.485,
        sound_level: 71.64,
        etvoc: 117,
        eco2: 1171,
    }
}

/// The reading encoded in [`CALCULATION_FRAME_HEX`], with a custom sequence number.
pub fn calculation_reading(sequence_number: u8) -> CalculationReading {
    CalculationReading {
        data_type: 3,
        sequence_number,
        discomfort_index: 73.87,
        heat_stroke_risk: 22.18,
        vibration: 1,
        si_value: 12.8,
        peak_ground_acceleration: 139.0,
        seismic_intensity: 4.6,
        acc_x_axis: 6515.6,
        acc_y_axis: 3.9,
        acc_z_axis: 5587.4,
    }
}

pub fn sensor_event(device_id: &str, sequence_number: u8) -> DecodedEvent {
    DecodedEvent::new(device_id, Reading::Sensor(sensor_reading(sequence_number)))
}

pub fn calculation_event(device_id: &str, sequence_number: u8) -> DecodedEvent {
    DecodedEvent::new(
        device_id,
        Reading::Calculation(calculation_reading(sequence_number)),
    )
}
