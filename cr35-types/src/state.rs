//! Device operational states

use std::fmt;

/// Operational state reported by the scanner in SystemState responses.
///
/// The device sends the state as a big-endian u32; values outside the
/// documented set map to [`DeviceState::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum DeviceState {
    #[default]
    Unknown = 0,
    Ready = 2,
    Scanning = 4,
    Stopping = 5,
    Waiting = 6,
}

impl DeviceState {
    /// Map a raw state word onto the known states.
    pub fn from_raw(value: u32) -> Self {
        match value {
            2 => Self::Ready,
            4 => Self::Scanning,
            5 => Self::Stopping,
            6 => Self::Waiting,
            _ => Self::Unknown,
        }
    }

    /// Raw wire value of this state.
    pub fn raw(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::Ready => "READY",
            Self::Scanning => "SCANNING",
            Self::Stopping => "STOPPING",
            Self::Waiting => "WAITING",
        };
        write!(f, "{}({})", name, self.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_known_states() {
        assert_eq!(DeviceState::from_raw(2), DeviceState::Ready);
        assert_eq!(DeviceState::from_raw(4), DeviceState::Scanning);
        assert_eq!(DeviceState::from_raw(5), DeviceState::Stopping);
        assert_eq!(DeviceState::from_raw(6), DeviceState::Waiting);
    }

    #[test]
    fn test_from_raw_unknown_values() {
        assert_eq!(DeviceState::from_raw(0), DeviceState::Unknown);
        assert_eq!(DeviceState::from_raw(1), DeviceState::Unknown);
        assert_eq!(DeviceState::from_raw(99), DeviceState::Unknown);
    }

    #[test]
    fn test_raw_round_trip() {
        for state in [
            DeviceState::Ready,
            DeviceState::Scanning,
            DeviceState::Stopping,
            DeviceState::Waiting,
        ] {
            assert_eq!(DeviceState::from_raw(state.raw()), state);
        }
    }
}
