//! Protocol constants

use std::time::Duration;

/// Server header size in bytes (also used for the injected intra-stream
/// headers and the trailing footer).
pub const HEADER_SIZE: usize = 14;

/// Sentinel token id for names the device has not resolved yet.
pub const TOKEN_UNKNOWN: u32 = 0xFFFF_FFFF;

/// Length of the random per-connection client identifier.
pub const CLIENT_ID_LEN: usize = 6;

/// Header `mode` value for fragmented streams.
pub const MODE_FRAGMENTED: u16 = 0x0008;

/// Header `mode` value for single-packet payloads.
pub const MODE_SINGLE: u16 = 0x0007;

/// Largest payload run between injected headers in a fragmented stream.
/// A block is 64 KiB total, 14 bytes of which are the injected header.
pub const MAX_CHUNK_SIZE: usize = 0x1_0000 - HEADER_SIZE;

/// Outgoing packet kind identifiers.
pub mod packet_kind {
    /// Requests a numeric token for a command name.
    pub const READ_TOKEN: u16 = 0x0003;

    /// Requests data for a resolved token.
    pub const READ_DATA: u16 = 0x0010;

    /// Sends a typed command value.
    pub const COMMAND: u16 = 0x0011;
}

/// Payload type identifiers for command packets.
pub mod value_type {
    pub const UNKNOWN: u16 = 0x0000;
    pub const U32: u16 = 0x0002;
    pub const STRING: u16 = 0x0007;
    pub const BLOB: u16 = 0x0008;
    pub const U16: u16 = 0x000B;
}

/// Control markers in the image word stream. Words at or above
/// [`marker::CONTROL_MIN`] are reserved.
pub mod marker {
    /// Smallest word value with a reserved meaning.
    pub const CONTROL_MIN: u16 = 0xFFF9;

    /// End of image data block.
    pub const IMAGE_END: u16 = 0xFFFB;

    /// Next word is the size of an embedded JSON config blob.
    pub const CONFIG: u16 = 0xFFFC;

    /// Padding word, ignored.
    pub const NOP: u16 = 0xFFFD;

    /// Start of line; next word is the initial x position.
    pub const LINE_START: u16 = 0xFFFE;

    /// Data gap; next word is the number of missing pixels.
    pub const GAP: u16 = 0xFFFF;
}

/// Command names resolved into tokens during bootstrap.
pub mod token {
    pub const CONNECT: &str = "Connect";
    pub const DISCONNECT: &str = "Disconnect";
    pub const USER_ID: &str = "UserId";
    pub const SYSTEM_DATE: &str = "SystemDate";
    pub const IMAGE_DATA: &str = "ImageData";
    pub const START: &str = "Start";
    pub const STOP: &str = "Stop";
    pub const MODE: &str = "Mode";
    pub const POLLING_ONLY: &str = "PollingOnly";
    pub const STOP_REQUEST: &str = "StopRequest";
    pub const SYSTEM_STATE: &str = "SystemState";
    pub const DEVICE_ID: &str = "DeviceId";
    pub const ERASOR: &str = "Erasor";
    pub const VERSION: &str = "Version";
    pub const MODE_LIST: &str = "ModeList";

    /// Every name requested from the device during bootstrap.
    pub const ALL: [&str; 15] = [
        CONNECT,
        DISCONNECT,
        USER_ID,
        SYSTEM_DATE,
        IMAGE_DATA,
        START,
        STOP,
        MODE,
        POLLING_ONLY,
        STOP_REQUEST,
        SYSTEM_STATE,
        DEVICE_ID,
        ERASOR,
        VERSION,
        MODE_LIST,
    ];
}

/// Time allowed for a command to receive its response before the queue
/// abandons it. Also bounds the disconnect choreography waits.
pub const COMMAND_TIMEOUT: Duration = Duration::from_millis(2000);

/// Command queue drain interval.
pub const COMMAND_QUEUE_INTERVAL: Duration = Duration::from_millis(10);

/// Delay before the next SystemState/ImageData poll pair while acquiring.
pub const IMAGE_DATA_REQUEST_INTERVAL: Duration = Duration::from_millis(300);
