//! Event pipeline: advertisement in, admitted reading or error report out.
//!
//! Each advertisement is handled to completion on its own:
//!
//! ```text
//! whitelist -> identity -> payload -> decode -> filter -> publish
//! ```
//!
//! Whitelist, identity and filter rejections are silent drops. Missing
//! payloads, decode failures and internal inconsistencies are reported on the
//! error channel together with the offending record. Nothing is retried.

use crate::advertisement::{AdvertisementRecord, is_omron_source};
use crate::bus::EventBus;
use crate::decoder::{self, DecodeError};
use crate::filter::{self, AdmitDecision, FilterConfig, RejectReason};
use crate::reading::{DecodedEvent, MessageType};
use crate::state::DeviceStateStore;
use log::{debug, trace};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Errors reported on the error channel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("No data found in OMRON packet")]
    MissingPayload,
    #[error("Invalid hex encoding: {0}")]
    InvalidHexEncoding(hex::FromHexError),
    #[error("Unrecognized data frame with length {0}")]
    UnrecognizedFrameLength(usize),
    #[error("Could not check validity of message type {0}")]
    InternalInconsistency(MessageType),
}

impl From<DecodeError> for PipelineError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::InvalidEncoding(e) => PipelineError::InvalidHexEncoding(e),
            DecodeError::UnrecognizedLength(len) => PipelineError::UnrecognizedFrameLength(len),
        }
    }
}

/// An error together with the advertisement that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub error: PipelineError,
    pub record: Option<AdvertisementRecord>,
}

impl ErrorReport {
    pub fn new(error: PipelineError, record: Option<AdvertisementRecord>) -> Self {
        Self { error, record }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(record) = &self.record {
            match serde_json::to_string(record) {
                Ok(json) => write!(f, ": {json}")?,
                Err(_) => write!(f, ": {record:?}")?,
            }
        }
        Ok(())
    }
}

/// Why an advertisement produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotWhitelisted,
    NotOmron,
    Rejected(RejectReason),
}

/// Terminal state of one advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Dropped(DropReason),
    ErrorReported,
    Published,
}

/// Decodes, filters and publishes advertisements.
///
/// The pipeline owns its [`EventBus`]; subscribe through [`Pipeline::bus`]
/// before feeding records. Device state is held behind an `Arc` so separate
/// pipelines can share one store or keep independent ones.
#[derive(Debug)]
pub struct Pipeline {
    config: FilterConfig,
    state: Arc<DeviceStateStore>,
    bus: EventBus,
}

impl Pipeline {
    /// Create a pipeline with its own unbounded state store.
    pub fn new(config: FilterConfig) -> Self {
        Self::with_state(config, Arc::new(DeviceStateStore::new()))
    }

    pub fn with_state(config: FilterConfig, state: Arc<DeviceStateStore>) -> Self {
        Self {
            config,
            state,
            bus: EventBus::default(),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn state(&self) -> &DeviceStateStore {
        &self.state
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Handle an advertisement received now.
    pub fn handle(&self, record: &AdvertisementRecord) -> Outcome {
        self.handle_at(record, Instant::now())
    }

    /// Handle an advertisement received at `now`.
    pub fn handle_at(&self, record: &AdvertisementRecord, now: Instant) -> Outcome {
        let device_id = &record.transmitter_id;

        if !self.config.permits(device_id) {
            trace!("{device_id}: not whitelisted");
            return Outcome::Dropped(DropReason::NotWhitelisted);
        }

        if !is_omron_source(record) {
            trace!("{device_id}: not an OMRON advertisement");
            return Outcome::Dropped(DropReason::NotOmron);
        }

        let Some(payload) = record.payload() else {
            return self.fail(PipelineError::MissingPayload, record);
        };

        let reading = match decoder::decode(payload) {
            Ok(reading) => reading,
            Err(e) => return self.fail(e.into(), record),
        };

        let event = DecodedEvent::new(device_id.clone(), reading);

        match filter::admit(&event, &self.state, &self.config, now) {
            Ok(AdmitDecision::Accept) => {
                debug!(
                    "{device_id}: publishing {} #{}",
                    event.message_type,
                    event.sequence_number()
                );
                self.bus.publish(&event);
                Outcome::Published
            }
            Ok(AdmitDecision::Reject(reason)) => {
                debug!("{device_id}: dropped {} ({reason})", event.message_type);
                Outcome::Dropped(DropReason::Rejected(reason))
            }
            Err(e) => self.fail(e, record),
        }
    }

    fn fail(&self, error: PipelineError, record: &AdvertisementRecord) -> Outcome {
        debug!("{}: {error}", record.transmitter_id);
        self.bus.report(ErrorReport::new(error, Some(record.clone())));
        Outcome::ErrorReported
    }
}
