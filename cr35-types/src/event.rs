//! Driver event notifications

use std::fmt;

use crate::image::ScanImage;

/// Notifications emitted by the driver while a session runs.
///
/// Delivered over an event channel in the order they occur; all events for
/// a session originate from the single driver task.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// TCP connection established, bootstrap is underway.
    Connected,

    /// Connection closed (gracefully or otherwise).
    Disconnected,

    /// A transport failure; the connection is considered broken.
    Error(String),

    /// The device confirmed acquisition start.
    Started,

    /// The device confirmed acquisition stop.
    Stopped,

    /// A substantial image-data payload arrived.
    NewData,

    /// A full scan has been assembled into a raster.
    ImageReady(ScanImage),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Error(msg) => write!(f, "error: {}", msg),
            Self::Started => write!(f, "started"),
            Self::Stopped => write!(f, "stopped"),
            Self::NewData => write!(f, "new-data"),
            Self::ImageReady(img) => write!(f, "image-ready: {}", img),
        }
    }
}
