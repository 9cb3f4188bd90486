//! Admission filter chain for decoded events.
//!
//! Checks run in a fixed order and stop at the first rejection:
//!
//! 1. whitelist: only listed devices pass (when a whitelist is set)
//! 2. cooldown: at most one event per device and message type per interval
//! 3. all-zero: frames sent while the device is booting are dropped
//! 4. duplicate: an event repeating the last admitted sequence number is dropped
//!    (skipped in test mode)
//!
//! Duplicate detection compares sequence numbers for equality only. A device
//! whose 8-bit counter wraps around to exactly the last admitted value loses
//! that reading.

use crate::pipeline::PipelineError;
use crate::reading::{DecodedEvent, MessageType, Reading};
use crate::state::{DeviceState, DeviceStateStore};
use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

/// Why an event was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotWhitelisted,
    CoolingDown,
    AllZero,
    Duplicate,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            RejectReason::NotWhitelisted => "device not whitelisted",
            RejectReason::CoolingDown => "cooldown not elapsed",
            RejectReason::AllZero => "all-zero frame",
            RejectReason::Duplicate => "duplicate sequence number",
        };
        f.write_str(reason)
    }
}

/// Outcome of the filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitDecision {
    Accept,
    Reject(RejectReason),
}

/// Static filter settings. Build once, then share.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use omron_sensor_listener::filter::FilterConfig;
///
/// let config = FilterConfig::new()
///     .with_whitelist(["AA:BB:CC:DD:EE:FF"])
///     .with_cooldown(Duration::from_secs(60));
/// assert!(config.permits("AA:BB:CC:DD:EE:FF"));
/// assert!(!config.permits("11:22:33:44:55:66"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    whitelist: Option<HashSet<String>>,
    cooldown: Duration,
    test_mode: bool,
}

impl FilterConfig {
    /// No whitelist, no cooldown, duplicate suppression on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only admit the given devices. An empty list disables the whitelist.
    pub fn with_whitelist<I, S>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let devices: HashSet<String> = devices.into_iter().map(Into::into).collect();
        self.whitelist = (!devices.is_empty()).then_some(devices);
        self
    }

    /// Minimum time between admitted events per device and message type.
    /// Zero disables the cooldown.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Test mode disables duplicate sequence suppression.
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    /// Whether a device passes the whitelist.
    pub fn permits(&self, device_id: &str) -> bool {
        self.whitelist
            .as_ref()
            .is_none_or(|devices| devices.contains(device_id))
    }

    fn is_cooling_down(&self, prev: &DeviceState, now: Instant) -> bool {
        !self.cooldown.is_zero() && now.saturating_duration_since(prev.last_emitted_at) < self.cooldown
    }
}

/// Whether every physically meaningful field of the event is zero.
///
/// # Errors
/// [`PipelineError::InternalInconsistency`] if the event's message type does
/// not match its reading.
pub fn is_all_zero(event: &DecodedEvent) -> Result<bool, PipelineError> {
    match (event.message_type, &event.reading) {
        (MessageType::Sensor, Reading::Sensor(r)) => Ok(r.is_all_zero()),
        (MessageType::Calculation, Reading::Calculation(r)) => Ok(r.is_all_zero()),
        (message_type, _) => Err(PipelineError::InternalInconsistency(message_type)),
    }
}

/// Run the filter chain for one event and record it in `state` when admitted.
///
/// `now` is the time the event is considered to have arrived; it becomes the
/// new cooldown reference on acceptance.
pub fn admit(
    event: &DecodedEvent,
    state: &DeviceStateStore,
    config: &FilterConfig,
    now: Instant,
) -> Result<AdmitDecision, PipelineError> {
    if !config.permits(&event.device_id) {
        return Ok(AdmitDecision::Reject(RejectReason::NotWhitelisted));
    }

    let sequence_number = event.sequence_number();

    state.admit_with(
        &event.device_id,
        event.message_type,
        sequence_number,
        now,
        |prev| {
            if let Some(prev) = prev
                && config.is_cooling_down(prev, now)
            {
                return Ok(AdmitDecision::Reject(RejectReason::CoolingDown));
            }

            if is_all_zero(event)? {
                return Ok(AdmitDecision::Reject(RejectReason::AllZero));
            }

            if !config.test_mode
                && prev.is_some_and(|prev| prev.last_sequence_number == sequence_number)
            {
                return Ok(AdmitDecision::Reject(RejectReason::Duplicate));
            }

            Ok(AdmitDecision::Accept)
        },
    )
}
