//! `omron-sensor-listener` library.
//!
//! Decodes OMRON 2JCIE-BU01 environment sensor advertisements and filters them
//! before they reach subscribers.
//!
//! The binary (`src/main.rs`) is responsible for CLI parsing and process exit codes.
//! The core logic lives in [`crate::decoder`], [`crate::filter`] and
//! [`crate::pipeline`], which can be driven deterministically from any
//! [`crate::source::AdvertisementSource`].

pub mod advertisement;
pub mod alias;
pub mod app;
pub mod bus;
pub mod decoder;
pub mod duration;
pub mod filter;
pub mod output;
pub mod pipeline;
pub mod reading;
pub mod source;
pub mod state;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at the crate root
pub use advertisement::{AdvertisementRecord, ManufacturerData, is_omron_source};
pub use alias::{Alias, AliasMap, parse_alias, resolve_name, to_map};
pub use bus::{Channel, EventBus};
pub use decoder::{DecodeError, decode};
pub use filter::{AdmitDecision, FilterConfig, RejectReason, admit};
pub use output::OutputFormatter;
pub use output::influxdb::InfluxDbFormatter;
pub use output::json::JsonFormatter;
pub use pipeline::{DropReason, ErrorReport, Outcome, Pipeline, PipelineError};
pub use reading::{CalculationReading, DecodedEvent, MessageType, Reading, SensorReading};
pub use source::{AdvertisementSource, Backend, SourceError};
pub use state::{DeviceState, DeviceStateStore};
