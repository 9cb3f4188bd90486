//! Publish/subscribe channels for admitted events and reported errors.
//!
//! Every subscriber gets its own `broadcast` receiver. Publishing never
//! blocks; with no subscribers the message is simply discarded, and a
//! subscriber that falls more than the channel capacity behind skips ahead
//! (it receives `RecvError::Lagged`).

use crate::pipeline::ErrorReport;
use crate::reading::{DecodedEvent, MessageType};
use tokio::sync::broadcast;

/// Default number of messages buffered per channel.
pub const CHANNEL_CAPACITY: usize = 100;

/// The logical channels a subscriber can listen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Every admitted event
    Event,
    /// Admitted sensor events
    Sensor,
    /// Admitted calculation events
    Calculation,
}

impl From<MessageType> for Channel {
    fn from(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Sensor => Channel::Sensor,
            MessageType::Calculation => Channel::Calculation,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    events: broadcast::Sender<DecodedEvent>,
    sensor: broadcast::Sender<DecodedEvent>,
    calculation: broadcast::Sender<DecodedEvent>,
    errors: broadcast::Sender<ErrorReport>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(CHANNEL_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: broadcast::channel(capacity).0,
            sensor: broadcast::channel(capacity).0,
            calculation: broadcast::channel(capacity).0,
            errors: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, channel: Channel) -> &broadcast::Sender<DecodedEvent> {
        match channel {
            Channel::Event => &self.events,
            Channel::Sensor => &self.sensor,
            Channel::Calculation => &self.calculation,
        }
    }

    pub fn subscribe(&self, channel: Channel) -> broadcast::Receiver<DecodedEvent> {
        self.sender(channel).subscribe()
    }

    pub fn subscribe_errors(&self) -> broadcast::Receiver<ErrorReport> {
        self.errors.subscribe()
    }

    /// Publish on the generic channel and on the channel of the event's message type.
    pub fn publish(&self, event: &DecodedEvent) {
        // Send only fails when nobody is subscribed
        let _ = self.events.send(event.clone());
        let _ = self.sender(event.message_type.into()).send(event.clone());
    }

    pub fn report(&self, report: ErrorReport) {
        let _ = self.errors.send(report);
    }
}
