//! BlueZ D-Bus backend for OMRON sensor scanning.
//!
//! This backend uses the `bluer` crate to communicate with the BlueZ daemon
//! via D-Bus. It requires the `bluetoothd` daemon to be running.

use super::{RECORD_CHANNEL_BUFFER_SIZE, RecordReceiver, SourceError};
use crate::advertisement::{AdvertisementRecord, ManufacturerData, OMRON_COMPANY_ID, company_name};
use bluer::monitor::{Monitor, MonitorEvent, Pattern};
use bluer::{Adapter, Address, Session};
use futures::StreamExt;
use log::warn;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// OMRON manufacturer ID as it appears on air (little-endian).
pub const OMRON_MANUFACTURER_ID_BYTES: [u8; 2] = OMRON_COMPANY_ID.to_le_bytes();

/// Bluetooth manufacturer-specific data type (AD type 0xFF)
pub const MANUFACTURER_DATA_TYPE: u8 = 0xff;

impl From<bluer::Error> for SourceError {
    fn from(err: bluer::Error) -> Self {
        SourceError::Bluetooth(err.to_string())
    }
}

/// Start a passive scan for OMRON advertisements.
///
/// Every advertisement matching the OMRON manufacturer ID is turned into an
/// [`AdvertisementRecord`] and sent through the returned channel. Runs until
/// the receiver is dropped.
pub async fn start_scan() -> Result<RecordReceiver, SourceError> {
    let session = Session::new().await?;
    let adapter = session.default_adapter().await?;
    adapter.set_powered(true).await?;

    let (tx, rx) = mpsc::channel(RECORD_CHANNEL_BUFFER_SIZE);

    let pattern = Pattern {
        data_type: MANUFACTURER_DATA_TYPE,
        start_position: 0,
        content: OMRON_MANUFACTURER_ID_BYTES.to_vec(),
    };

    let monitor_manager = adapter.monitor().await?;
    let mut monitor_handle = monitor_manager
        .register(Monitor {
            patterns: Some(vec![pattern]),
            ..Default::default()
        })
        .await?;

    // Spawn a task that owns all Bluetooth state and runs the event loop
    tokio::spawn(async move {
        // Keep all Bluetooth state alive by moving it into this task
        let _session = session;
        let _monitor_manager = monitor_manager;

        while let Some(event) = monitor_handle.next().await {
            if let MonitorEvent::DeviceFound(device_id) = event {
                match read_record(&adapter, device_id.device).await {
                    Ok(Some(record)) => {
                        if tx.send(record).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("{}: {e}", device_id.device),
                }
            }
        }
    });

    Ok(rx)
}

/// Read the manufacturer data of a discovered device as an advertisement record.
async fn read_record(
    adapter: &Adapter,
    address: Address,
) -> Result<Option<AdvertisementRecord>, SourceError> {
    let device = adapter.device(address)?;
    Ok(device
        .manufacturer_data()
        .await?
        .and_then(|data| to_record(address, &data)))
}

/// Convert BlueZ manufacturer data into a record, if it carries an OMRON block.
fn to_record(address: Address, data: &HashMap<u16, Vec<u8>>) -> Option<AdvertisementRecord> {
    let payload = data.get(&OMRON_COMPANY_ID)?;

    Some(AdvertisementRecord {
        transmitter_id: address.to_string(),
        manufacturer_data: Some(ManufacturerData {
            company_name: company_name(OMRON_COMPANY_ID).map(str::to_string),
            company_identifier: Some(OMRON_COMPANY_ID),
            data: Some(hex::encode(payload)),
        }),
    })
}
