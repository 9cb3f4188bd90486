//! Canned OMRON advertisements for running without a radio.
//!
//! The two payloads were captured from a 2JCIE-BU01. The source alternates
//! them, sensor frame first, on a fixed tick.

use super::{AdvertisementSource, RECORD_CHANNEL_BUFFER_SIZE, RecordReceiver, StartFuture};
use crate::advertisement::{AdvertisementRecord, ManufacturerData, OMRON_COMPANY_ID};
use std::time::Duration;
use tokio::sync::mpsc;

/// Sensor frame: 27.45 °C, 41.46 %RH, 1016.485 hPa, 71.64 dB.
pub const SENSOR_FRAME_HEX: &str = "0343b90a32100000a5820f00fc1b75009304ff";

/// Calculation frame: discomfort index 73.87, heat stroke risk 22.18.
pub const CALCULATION_FRAME_HEX: &str = "0343db1caa080180006e05f81184fe270042daffffffffffffffff";

/// Device id the fixture records are attributed to.
pub const FIXTURE_DEVICE: &str = "00:00:00:00:00:00";

/// Default time between two fixture records.
pub const FIXTURE_INTERVAL: Duration = Duration::from_secs(1);

fn record(company_name: &str, data: &str) -> AdvertisementRecord {
    AdvertisementRecord {
        transmitter_id: FIXTURE_DEVICE.to_string(),
        manufacturer_data: Some(ManufacturerData {
            company_name: Some(company_name.to_string()),
            company_identifier: Some(OMRON_COMPANY_ID),
            data: Some(data.to_string()),
        }),
    }
}

/// The canned records, in replay order.
///
/// Each payload keeps the company name it was captured with: the sensor
/// frame arrived in an `ADV_IND` whose name starts with a ZERO WIDTH SPACE,
/// the calculation frame in a scan response with the plain name.
pub fn fixture_records() -> [AdvertisementRecord; 2] {
    [
        record("\u{200b}OMRON Corporation", SENSOR_FRAME_HEX),
        record("OMRON Corporation", CALCULATION_FRAME_HEX),
    ]
}

/// Replays [`fixture_records`] forever, or up to a limit.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    interval: Duration,
    limit: Option<usize>,
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new(FIXTURE_INTERVAL)
    }
}

impl FixtureSource {
    /// Create a source emitting one record per `interval`. Zero means no pause.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            limit: None,
        }
    }

    /// Stop after `limit` records.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Spawn the replay task. Must be called from within a Tokio runtime.
    pub fn spawn(&self) -> RecordReceiver {
        let (tx, rx) = mpsc::channel(RECORD_CHANNEL_BUFFER_SIZE);
        let interval = self.interval;
        let limit = self.limit;

        tokio::spawn(async move {
            let mut records = fixture_records().into_iter().cycle();
            let mut sent = 0usize;

            while limit.is_none_or(|limit| sent < limit) {
                let Some(record) = records.next() else {
                    break;
                };
                if tx.send(record).await.is_err() {
                    // Receiver dropped
                    break;
                }
                sent += 1;
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }
        });

        rx
    }
}

impl AdvertisementSource for FixtureSource {
    fn start(&self) -> StartFuture<'_> {
        Box::pin(async move { Ok(self.spawn()) })
    }
}
