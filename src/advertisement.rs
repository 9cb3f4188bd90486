//! Advertisement records handed over by a scanning backend.
//!
//! A record is the decoded form of a single BLE broadcast: who sent it and,
//! when the broadcast carried one, the manufacturer-specific data block.

use serde::Serialize;

/// Bluetooth SIG company identifier assigned to OMRON Corporation.
pub const OMRON_COMPANY_ID: u16 = 0x02D5;

/// Company name OMRON devices advertise under.
pub const OMRON_COMPANY_NAME: &str = "OMRON Corporation";

/// Manufacturer-specific data carried in an advertisement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerData {
    /// Registered company name, possibly prefixed with invisible characters
    pub company_name: Option<String>,
    pub company_identifier: Option<u16>,
    /// Hex-encoded payload without the company identifier
    pub data: Option<String>,
}

/// A single advertisement observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertisementRecord {
    pub transmitter_id: String,
    pub manufacturer_data: Option<ManufacturerData>,
}

impl AdvertisementRecord {
    /// Build a record carrying manufacturer data.
    pub fn new(
        transmitter_id: impl Into<String>,
        company_name: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            transmitter_id: transmitter_id.into(),
            manufacturer_data: Some(ManufacturerData {
                company_name: Some(company_name.into()),
                company_identifier: None,
                data: Some(data.into()),
            }),
        }
    }

    /// The hex payload, if the record carries a non-empty one.
    pub fn payload(&self) -> Option<&str> {
        self.manufacturer_data
            .as_ref()
            .and_then(|m| m.data.as_deref())
            .filter(|data| !data.is_empty())
    }
}

/// Resolve a Bluetooth SIG company identifier to its registered name.
///
/// Only identifiers this listener cares about are known.
pub fn company_name(id: u16) -> Option<&'static str> {
    match id {
        OMRON_COMPANY_ID => Some(OMRON_COMPANY_NAME),
        _ => None,
    }
}

/// Check whether an advertisement was sent by an OMRON device.
///
/// Some firmware prefixes the company name with a ZERO WIDTH SPACE (U+200B),
/// so the name is matched as a substring rather than for equality.
pub fn is_omron_source(record: &AdvertisementRecord) -> bool {
    record
        .manufacturer_data
        .as_ref()
        .and_then(|m| m.company_name.as_deref())
        .is_some_and(|name| name.contains(OMRON_COMPANY_NAME))
}
