//! Frame reassembly
//!
//! A logical message on the wire is `header | payload | footer`, where the
//! footer repeats the 14-byte header layout with flags, packet type and
//! block all zero. Fragmented payloads additionally carry an injected
//! header every 64 KiB that must be stripped.

use tracing::warn;

use crate::constants::{HEADER_SIZE, MAX_CHUNK_SIZE};
use crate::header::ServerHeader;

/// Extract the logical payload for `header` from `data`.
///
/// Returns `None` while the message is incomplete: not enough bytes for
/// the declared size, or the trailing footer does not validate yet. The
/// caller keeps accumulating and retries on the next read.
pub fn extract_payload(data: &[u8], header: &ServerHeader) -> Option<Vec<u8>> {
    if data.len() < HEADER_SIZE + header.size as usize {
        return None;
    }

    let footer = ServerHeader::parse(&data[data.len() - HEADER_SIZE..]);
    if footer.flags != 0
        || footer.packet_type != 0
        || footer.block != 0
        || footer.token != header.token
    {
        return None;
    }

    let payload = if header.is_fragmented() {
        let mut payload = Vec::with_capacity(header.size as usize);

        let mut offset = HEADER_SIZE;
        let end_of_data = data.len() - HEADER_SIZE; // stop before the footer

        while offset < end_of_data {
            let chunk_size = (end_of_data - offset).min(MAX_CHUNK_SIZE);
            payload.extend_from_slice(&data[offset..offset + chunk_size]);
            offset += chunk_size;

            // A full chunk is followed by an injected header.
            if chunk_size == MAX_CHUNK_SIZE && offset < end_of_data {
                offset += HEADER_SIZE;
            }
        }

        if payload.len() != header.size as usize {
            warn!(
                reconstructed = payload.len(),
                declared = header.size,
                "fragmented payload size mismatch"
            );
        }

        payload
    } else {
        let payload = if data.len() > HEADER_SIZE * 2 {
            data[HEADER_SIZE..data.len() - HEADER_SIZE].to_vec()
        } else {
            Vec::new()
        };

        if payload.len() != header.size as usize {
            warn!(
                received = payload.len(),
                declared = header.size,
                "single packet size mismatch"
            );
        }

        payload
    };

    Some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MODE_FRAGMENTED, MODE_SINGLE};
    use pretty_assertions::assert_eq;

    fn data_header(token: u32, size: u32, mode: u16) -> ServerHeader {
        ServerHeader {
            flags: 0x01,
            packet_type: 0x11,
            block: 0,
            token,
            size,
            mode,
        }
    }

    fn footer(token: u32) -> [u8; HEADER_SIZE] {
        ServerHeader {
            token,
            ..Default::default()
        }
        .encode()
    }

    fn single_packet_message(token: u32, payload: &[u8]) -> Vec<u8> {
        let header = data_header(token, payload.len() as u32, MODE_SINGLE);
        let mut buf = header.encode().to_vec();
        buf.extend_from_slice(payload);
        buf.extend_from_slice(&footer(token));
        buf
    }

    #[test]
    fn test_single_packet_extraction() {
        let buf = single_packet_message(0x55, b"hello device");
        let header = ServerHeader::parse(&buf);

        assert_eq!(
            extract_payload(&buf, &header).as_deref(),
            Some(&b"hello device"[..])
        );
    }

    #[test]
    fn test_empty_single_packet() {
        let buf = single_packet_message(0x55, b"");
        let header = ServerHeader::parse(&buf);

        assert_eq!(extract_payload(&buf, &header).as_deref(), Some(&[][..]));
    }

    #[test]
    fn test_incomplete_when_short_of_declared_size() {
        let mut buf = data_header(0x55, 100, MODE_SINGLE).encode().to_vec();
        buf.extend_from_slice(&[0u8; 40]);

        let header = ServerHeader::parse(&buf);
        assert_eq!(extract_payload(&buf, &header), None);
    }

    #[test]
    fn test_incomplete_when_footer_token_mismatches() {
        let payload = [7u8; 16];
        let header = data_header(0x55, payload.len() as u32, MODE_SINGLE);
        let mut buf = header.encode().to_vec();
        buf.extend_from_slice(&payload);
        buf.extend_from_slice(&footer(0x56)); // wrong token

        assert_eq!(extract_payload(&buf, &header), None);
    }

    #[test]
    fn test_incomplete_when_footer_fields_nonzero() {
        let payload = [7u8; 16];
        let header = data_header(0x55, payload.len() as u32, MODE_SINGLE);
        let mut buf = header.encode().to_vec();
        buf.extend_from_slice(&payload);
        buf.extend_from_slice(
            &ServerHeader {
                flags: 0x01, // data header where the footer should be
                packet_type: 0x11,
                token: 0x55,
                ..Default::default()
            }
            .encode(),
        );

        assert_eq!(extract_payload(&buf, &header), None);
    }

    #[test]
    fn test_fragmented_two_full_chunks() {
        // Two full 65,522-byte runs separated by one injected header.
        let size = (2 * MAX_CHUNK_SIZE) as u32;
        let header = data_header(0x77, size, MODE_FRAGMENTED);

        let chunk_a = vec![0xAAu8; MAX_CHUNK_SIZE];
        let chunk_b = vec![0xBBu8; MAX_CHUNK_SIZE];

        let mut buf = header.encode().to_vec();
        buf.extend_from_slice(&chunk_a);
        buf.extend_from_slice(&data_header(0x77, size, MODE_FRAGMENTED).encode()); // injected
        buf.extend_from_slice(&chunk_b);
        buf.extend_from_slice(&footer(0x77));

        let payload = extract_payload(&buf, &header).unwrap();
        assert_eq!(payload.len(), 131_044);
        assert_eq!(&payload[..MAX_CHUNK_SIZE], chunk_a.as_slice());
        assert_eq!(&payload[MAX_CHUNK_SIZE..], chunk_b.as_slice());
    }

    #[test]
    fn test_fragmented_short_last_chunk() {
        let last_len = 1000;
        let size = (MAX_CHUNK_SIZE + last_len) as u32;
        let header = data_header(0x78, size, MODE_FRAGMENTED);

        let mut buf = header.encode().to_vec();
        buf.extend_from_slice(&vec![0x11u8; MAX_CHUNK_SIZE]);
        buf.extend_from_slice(&data_header(0x78, size, MODE_FRAGMENTED).encode());
        buf.extend_from_slice(&vec![0x22u8; last_len]);
        buf.extend_from_slice(&footer(0x78));

        let payload = extract_payload(&buf, &header).unwrap();
        assert_eq!(payload.len(), MAX_CHUNK_SIZE + last_len);
        assert!(payload[..MAX_CHUNK_SIZE].iter().all(|&b| b == 0x11));
        assert!(payload[MAX_CHUNK_SIZE..].iter().all(|&b| b == 0x22));
    }

    #[test]
    fn test_fragmented_single_short_chunk_has_no_injected_header() {
        let header = data_header(0x79, 20, MODE_FRAGMENTED);

        let mut buf = header.encode().to_vec();
        buf.extend_from_slice(&[0x33u8; 20]);
        buf.extend_from_slice(&footer(0x79));

        assert_eq!(extract_payload(&buf, &header), Some(vec![0x33u8; 20]));
    }

    #[test]
    fn test_fragmented_size_mismatch_is_not_fatal() {
        // Declared size disagrees with what the buffer reconstructs to;
        // the payload is still returned.
        let header = data_header(0x80, 64, MODE_FRAGMENTED);

        let mut buf = header.encode().to_vec();
        buf.extend_from_slice(&[0x44u8; 64]);
        buf.extend_from_slice(&[0x55u8; 8]); // trailing garbage before footer
        buf.extend_from_slice(&footer(0x80));

        let payload = extract_payload(&buf, &header).unwrap();
        assert_eq!(payload.len(), 72);
    }
}
