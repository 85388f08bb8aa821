//! # cr35
//!
//! Network driver for the CR35 computed-radiography scanner.
//!
//! The device speaks a proprietary length-prefixed binary protocol over
//! TCP. This crate drives a full session: token bootstrap, login
//! handshake, the acquisition lifecycle with periodic polling, and the
//! reassembly of the sparse segmented pixel stream into a dense 16-bit
//! raster.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cr35::{Device, Event};
//!
//! #[tokio::main]
//! async fn main() -> cr35::Result<()> {
//!     let mut device = Device::new("192.168.1.40", 2006);
//!     device.connect().await?;
//!
//!     // Start acquiring with a mode from `device.mode_list()`.
//!     device.start(5);
//!
//!     while let Some(event) = device.next_event().await {
//!         match event {
//!             Event::ImageReady(image) => {
//!                 println!("received {}x{} scan", image.width, image.height);
//!                 break;
//!             }
//!             other => println!("{}", other),
//!         }
//!     }
//!
//!     device.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;

mod driver;
mod session;

// Re-exports
pub use device::Device;
pub use error::{Error, Result};

// Re-export types
pub use cr35_types::{DeviceState, Event, ScanImage};
