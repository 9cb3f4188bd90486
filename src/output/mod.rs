//! Output formatters for admitted OMRON readings.
//!
//! This module provides a trait for formatting events and implementations
//! for InfluxDB line protocol and JSON lines.

pub mod influxdb;
pub mod json;

use crate::reading::DecodedEvent;
use std::io;
use std::time::SystemTime;

/// Trait for formatting events into output lines.
pub trait OutputFormatter: Send + Sync {
    /// Format an event.
    ///
    /// # Arguments
    /// * `event` - The admitted event
    /// * `name` - Human-readable device name (alias or device id)
    /// * `timestamp` - When the event was received
    fn format(&self, event: &DecodedEvent, name: &str, timestamp: SystemTime)
        -> io::Result<String>;
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// InfluxDB line protocol (Telegraf compatible)
    #[default]
    Influxdb,
    /// One JSON object per line
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Influxdb => write!(f, "influxdb"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl OutputFormat {
    /// Build the formatter for this format.
    pub fn formatter(self, measurement_name: String) -> Box<dyn OutputFormatter> {
        match self {
            OutputFormat::Influxdb => Box::new(influxdb::InfluxDbFormatter::new(measurement_name)),
            OutputFormat::Json => Box::new(json::JsonFormatter),
        }
    }
}

/// Milliseconds since the Unix epoch, or zero for times before it.
pub(crate) fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
