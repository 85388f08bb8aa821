//! Server header codec
//!
//! Every message from the device starts with a 14-byte header; the same
//! layout reappears as the injected intra-stream headers of fragmented
//! payloads and as the trailing footer of each logical message.

use std::fmt;

use bytes::BufMut;

use crate::constants::{HEADER_SIZE, MODE_FRAGMENTED};
use crate::error::{Error, Result};
use crate::wire;

/// Parsed server packet header.
///
/// # Wire layout
///
/// ```text
/// ┌─────────┬────────────┬─────────┬─────────┬─────────┬─────────┐
/// │  Flags  │ PacketType │  Block  │  Token  │  Size   │  Mode   │
/// │ 1 byte  │  1 byte    │ BE u16  │ BE u32  │ BE u32  │ BE u16  │
/// └─────────┴────────────┴─────────┴─────────┴─────────┴─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerHeader {
    /// `0x01` = more fragments follow, `0x00` = last fragment or footer.
    pub flags: u8,

    /// `0x11` = data payload, `0x00` = footer/control packet.
    pub packet_type: u8,

    /// Sequence counter, starts at 0.
    pub block: u16,

    /// Session/stream identifier the response correlates to.
    pub token: u32,

    /// Logical payload size in bytes.
    pub size: u32,

    /// `0x0008` = fragmented stream, `0x0007` = single packet.
    pub mode: u16,
}

impl ServerHeader {
    /// Parse a header from the front of `data`.
    ///
    /// Returns a zeroed header when fewer than [`HEADER_SIZE`] bytes are
    /// available; the reassembler uses that sentinel to wait for more
    /// input.
    pub fn parse(data: &[u8]) -> Self {
        Self::try_parse(data).unwrap_or_default()
    }

    fn try_parse(data: &[u8]) -> Result<Self> {
        let flags = *data.first().ok_or(Error::ShortBuffer {
            expected: HEADER_SIZE,
            actual: data.len(),
        })?;
        let packet_type = *data.get(1).ok_or(Error::ShortBuffer {
            expected: HEADER_SIZE,
            actual: data.len(),
        })?;

        Ok(Self {
            flags,
            packet_type,
            block: wire::read_u16_be(data, 2)?,
            token: wire::read_u32_be(data, 4)?,
            size: wire::read_u32_be(data, 8)?,
            mode: wire::read_u16_be(data, 12)?,
        })
    }

    /// Serialize to the 14-byte wire layout.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        {
            let mut cursor = &mut buf[..];
            cursor.put_u8(self.flags);
            cursor.put_u8(self.packet_type);
            cursor.put_u16(self.block);
            cursor.put_u32(self.token);
            cursor.put_u32(self.size);
            cursor.put_u16(self.mode);
        }
        buf
    }

    /// Whether the payload for this header arrives as a fragmented stream.
    pub fn is_fragmented(&self) -> bool {
        self.mode == MODE_FRAGMENTED
    }
}

impl fmt::Display for ServerHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Header[flags={} type=0x{:02X} block={} token=0x{:08X} size={} mode=0x{:04X}]",
            self.flags, self.packet_type, self.block, self.token, self.size, self.mode
        )
    }
}
