//! # cr35-core
//!
//! Core protocol implementation for the CR35 computed-radiography scanner.
//!
//! This crate provides the low-level protocol primitives:
//! - Wire-level endian helpers
//! - Server header codec
//! - Outgoing packet construction
//! - Frame reassembly (single-packet and fragmented streams)
//! - Mode-list and scan-config payload parsers
//! - Line/segment image assembly
//! - The single-in-flight command queue

pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod framing;
pub mod header;
pub mod image;
pub mod modelist;
pub mod packet;
pub mod queue;
pub mod wire;

pub use command::{Command, CommandKind, Value};
pub use error::{Error, Result};
pub use header::ServerHeader;
pub use queue::CommandQueue;
