//! Embedded scan-config parser
//!
//! Mid-stream the device emits a JSON blob describing the scan. The only
//! field the assembler acts on is `AdditionalScanInfo.PixLine` (pixels per
//! line); the rest is surfaced in the log for diagnostics.

use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScanConfig {
    #[serde(rename = "ManufacturerModelName")]
    model: String,

    #[serde(rename = "BitsStored")]
    bits_stored: i32,

    #[serde(rename = "AdditionalScanInfo")]
    scan_info: Option<ScanInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ScanInfo {
    #[serde(rename = "PixLine")]
    pix_line: i32,

    #[serde(rename = "SlotCount")]
    slot_count: i32,
}

impl Default for ScanInfo {
    fn default() -> Self {
        Self {
            pix_line: -1,
            slot_count: -1,
        }
    }
}

/// Parse the embedded JSON config and return the pixels-per-line value,
/// or `-1` when the field is absent or the document does not parse.
pub fn parse_scan_config(data: &[u8]) -> i32 {
    // Device JSON strings may contain 8-bit characters, which is invalid
    // UTF-8. Treat the bytes as Latin-1 and re-encode.
    let text: String = data.iter().map(|&b| b as char).collect();
    debug!(json = %text, "scan config received");

    let config: ScanConfig = match serde_json::from_str(&text) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "scan config JSON parse failed");
            return -1;
        }
    };

    let scan_info = config.scan_info.unwrap_or_default();
    info!(
        model = %config.model,
        bits_stored = config.bits_stored,
        pix_line = scan_info.pix_line,
        slot_count = scan_info.slot_count,
        "scan config parsed"
    );

    scan_info.pix_line
}
