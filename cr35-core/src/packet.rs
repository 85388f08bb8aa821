//! Outgoing packet construction
//!
//! Three packet shapes leave the host: token requests, read-data requests
//! and typed commands. All multi-byte header fields are big-endian.

use bytes::{BufMut, Bytes, BytesMut};

use crate::command::{Command, Value};
use crate::constants::{packet_kind, CLIENT_ID_LEN};

/// Build a token-request packet.
///
/// ```text
/// BE16 0x0003 | BE16 0 | BE16 len | BE16 0 | client_id(6) | utf8(name) | NUL
/// ```
///
/// `len` counts the name bytes plus the terminating NUL.
pub fn token_request(client_id: &[u8; CLIENT_ID_LEN], name: &str) -> Bytes {
    let name_len = name.len() + 1;
    let mut buf = BytesMut::with_capacity(8 + CLIENT_ID_LEN + name_len);

    buf.put_u16(packet_kind::READ_TOKEN);
    buf.put_u16(0); // reserved
    buf.put_u16(name_len as u16);
    buf.put_u16(0);
    buf.put_slice(client_id);
    buf.put_slice(name.as_bytes());
    buf.put_u8(0);

    buf.freeze()
}

/// Build a read-data packet for a resolved token.
///
/// ```text
/// BE16 0x0010 | BE16 0 | BE32 token | client_id(6)
/// ```
pub fn read_data(token_id: u32, client_id: &[u8; CLIENT_ID_LEN]) -> Bytes {
    let mut buf = BytesMut::with_capacity(8 + CLIENT_ID_LEN);

    buf.put_u16(packet_kind::READ_DATA);
    buf.put_u16(0); // reserved
    buf.put_u32(token_id);
    buf.put_slice(client_id);

    buf.freeze()
}

/// Build a command packet carrying a typed value.
///
/// ```text
/// BE16 0x0011 | BE16 0 | BE32 token | BE32 payload_len | BE16 type_id | payload
/// ```
pub fn command(token_id: u32, command: &Command) -> Bytes {
    let payload = encode_value(&command.value);

    let mut buf = BytesMut::with_capacity(14 + payload.len());
    buf.put_u16(packet_kind::COMMAND);
    buf.put_u16(0); // reserved
    buf.put_u32(token_id);
    buf.put_u32(payload.len() as u32);
    buf.put_u16(command.value.type_id());
    buf.put_slice(&payload);

    buf.freeze()
}

fn encode_value(value: &Value) -> Vec<u8> {
    match value {
        Value::None => Vec::new(),
        Value::U32(v) => v.to_be_bytes().to_vec(),
        Value::U16(v) => v.to_be_bytes().to_vec(),
        Value::Text(s) => {
            let mut bytes = s.as_bytes().to_vec();
            bytes.push(0);
            bytes
        }
        Value::Blob(b) => b.clone(),
    }
}
