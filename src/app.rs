//! Core application runner for `omron-sensor-listener`.
//!
//! This module is intentionally decoupled from CLI parsing and process exit codes
//! so it can be tested deterministically.

use crate::alias::{Alias, AliasMap};
use crate::bus::Channel;
use crate::filter::FilterConfig;
use crate::output::{OutputFormat, OutputFormatter};
use crate::pipeline::Pipeline;
use crate::reading::DecodedEvent;
use crate::source::{AdvertisementSource, Backend, SourceError};
use crate::state::DeviceStateStore;
use clap::Parser;
use std::io;
use std::io::Write;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Configuration for the core run loop.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Only accept advertisements from these device ids.
    /// Repeat the flag or separate ids with commas.
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    pub whitelist: Vec<String>,

    /// Minimum time between two events of the same type from one device.
    /// Accepts duration with suffix: 3s, 1m, 500ms, 2h.
    /// Without suffix, value is interpreted as seconds. 0 disables the cooldown.
    #[arg(long, value_parser = crate::duration::parse_duration, default_value = "0")]
    pub cooldown: Duration,

    /// Replay canned OMRON advertisements instead of scanning,
    /// and accept repeated sequence numbers
    #[arg(long)]
    pub test_mode: bool,

    /// Forget the least recently seen device once this many
    /// (device, message type) pairs are tracked. Unlimited by default.
    #[arg(long, value_name = "N")]
    pub max_tracked_devices: Option<NonZeroUsize>,

    /// Output format
    #[arg(long, default_value_t, value_enum)]
    pub format: OutputFormat,

    /// The name of the measurement in InfluxDB line protocol.
    #[arg(long, default_value = "omron_measurement")]
    pub influxdb_measurement: String,

    /// Specify human-readable alias for a device id.
    /// Format: --alias DE:AD:BE:EF:00:00=Office
    #[arg(long = "alias", value_parser = crate::alias::parse_alias, value_name = "ALIAS")]
    pub aliases: Vec<Alias>,

    /// Verbose output, print errors for undecodable OMRON advertisements
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Bluetooth scanner backend to use
    #[arg(long, default_value_t, value_enum)]
    pub backend: Backend,
}

impl Options {
    /// Filter settings derived from the command line.
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig::new()
            .with_whitelist(self.whitelist.iter().cloned())
            .with_cooldown(self.cooldown)
            .with_test_mode(self.test_mode)
    }

    /// The backend to read from; test mode always replays fixtures.
    pub fn source_backend(&self) -> Backend {
        if self.test_mode {
            Backend::Fixture
        } else {
            self.backend
        }
    }

    fn state_store(&self) -> DeviceStateStore {
        match self.max_tracked_devices {
            Some(limit) => DeviceStateStore::with_capacity_limit(limit),
            None => DeviceStateStore::new(),
        }
    }
}

/// Errors returned by the core run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn write_event(
    formatter: &dyn OutputFormatter,
    event: &DecodedEvent,
    aliases: &AliasMap,
    out: &mut dyn Write,
) -> io::Result<()> {
    let name = crate::alias::resolve_name(&event.device_id, aliases);
    let line = formatter.format(event, name, SystemTime::now())?;
    writeln!(out, "{line}")
}

/// Run the core processing loop, writing formatted output to `out` and verbose errors to `err`.
///
/// - Every record from `source` goes through the [`Pipeline`]; admitted events are
///   formatted and written as one line each to `out`.
/// - Reported errors are written to `err` only when `options.verbose` is true.
/// - Returns when the source closes its channel.
pub async fn run_with_io(
    options: Options,
    source: &dyn AdvertisementSource,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), RunError> {
    let aliases: AliasMap = crate::alias::to_map(&options.aliases);
    let formatter = options.format.formatter(options.influxdb_measurement.clone());
    let pipeline = Pipeline::with_state(options.filter_config(), Arc::new(options.state_store()));

    let mut events = pipeline.bus().subscribe(Channel::Event);
    let mut errors = pipeline.bus().subscribe_errors();

    let mut records = source.start().await?;

    while let Some(record) = records.recv().await {
        pipeline.handle(&record);

        while let Ok(event) = events.try_recv() {
            write_event(formatter.as_ref(), &event, &aliases, out)?;
        }
        while let Ok(report) = errors.try_recv() {
            if options.verbose {
                writeln!(err, "{report}")?;
            }
        }
    }

    Ok(())
}
