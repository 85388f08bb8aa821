//! Type definitions shared across the CR35 driver crates

pub mod event;
pub mod image;
pub mod state;

pub use event::Event;
pub use image::ScanImage;
pub use state::DeviceState;
