//! Endian read helpers over byte slices
//!
//! Incoming data mixes endianness: header fields and command payloads are
//! big-endian, image pixel words are little-endian. All reads are bounds
//! checked; writes go through `bytes::BufMut` in the packet builder.

use crate::error::{Error, Result};

fn check(buf: &[u8], offset: usize, len: usize) -> Result<()> {
    let end = offset.checked_add(len).unwrap_or(usize::MAX);
    if buf.len() < end {
        return Err(Error::ShortBuffer {
            expected: end,
            actual: buf.len(),
        });
    }
    Ok(())
}

/// Read a big-endian u16 at `offset`.
pub fn read_u16_be(buf: &[u8], offset: usize) -> Result<u16> {
    check(buf, offset, 2)?;
    Ok(u16::from_be_bytes([buf[offset], buf[offset + 1]]))
}

/// Read a big-endian u32 at `offset`.
pub fn read_u32_be(buf: &[u8], offset: usize) -> Result<u32> {
    check(buf, offset, 4)?;
    Ok(u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}

/// Read a little-endian u16 at `offset`.
pub fn read_u16_le(buf: &[u8], offset: usize) -> Result<u16> {
    check(buf, offset, 2)?;
    Ok(u16::from_le_bytes([buf[offset], buf[offset + 1]]))
}
