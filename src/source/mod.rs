//! Advertisement sources.
//!
//! A source produces [`AdvertisementRecord`]s on a channel. The live source
//! scans the radio; the fixture source replays canned OMRON advertisements
//! and is used in test mode. Both sit behind [`AdvertisementSource`] so the
//! run loop does not know which one it is fed by.

#[cfg(feature = "bluer")]
pub mod bluer;

pub mod fixture;

use crate::advertisement::AdvertisementRecord;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::mpsc;

/// Channel buffer size for advertisement records.
pub const RECORD_CHANNEL_BUFFER_SIZE: usize = 100;

/// Error type for starting a source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Bluetooth/adapter related error
    #[error("Bluetooth error: {0}")]
    Bluetooth(String),
}

/// Receiving end of a running source.
pub type RecordReceiver = mpsc::Receiver<AdvertisementRecord>;

/// Future returned by [`AdvertisementSource::start`].
pub type StartFuture<'a> =
    Pin<Box<dyn Future<Output = Result<RecordReceiver, SourceError>> + Send + 'a>>;

/// Anything that can deliver advertisement records.
pub trait AdvertisementSource: Send + Sync {
    /// Start producing records. The channel closes when the source stops.
    fn start(&self) -> StartFuture<'_>;
}

/// Available source backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// BlueZ D-Bus backend (requires bluetoothd daemon)
    #[cfg(feature = "bluer")]
    #[value(alias = "bluez")]
    Bluer,
    /// Canned OMRON advertisements, no radio needed
    #[value(alias = "mock")]
    Fixture,
}

impl Default for Backend {
    fn default() -> Self {
        #[cfg(feature = "bluer")]
        return Backend::Bluer;
        #[cfg(not(feature = "bluer"))]
        return Backend::Fixture;
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "bluer")]
            Backend::Bluer => write!(f, "bluer"),
            Backend::Fixture => write!(f, "fixture"),
        }
    }
}

/// Source selected by a [`Backend`] value.
#[derive(Debug, Clone, Copy)]
pub struct BackendSource(pub Backend);

impl AdvertisementSource for BackendSource {
    fn start(&self) -> StartFuture<'_> {
        match self.0 {
            #[cfg(feature = "bluer")]
            Backend::Bluer => Box::pin(bluer::start_scan()),
            Backend::Fixture => {
                Box::pin(async { Ok(fixture::FixtureSource::default().spawn()) })
            }
        }
    }
}
