//! Shared session snapshot
//!
//! The driver task owns all protocol state; this snapshot mirrors the
//! parts the [`crate::Device`] handle exposes synchronously. Cheap to
//! clone (Arc internally).

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use cr35_types::DeviceState;

#[derive(Debug, Clone)]
pub(crate) struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Raw device state word from the last SystemState response.
    device_state: AtomicU32,

    /// Whether acquisition has been confirmed started.
    started: AtomicBool,

    /// Whether the driver task is up with a live connection.
    connected: AtomicBool,

    /// Cached parsed mode list.
    mode_list: parking_lot::RwLock<Vec<String>>,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                device_state: AtomicU32::new(DeviceState::Unknown.raw()),
                started: AtomicBool::new(false),
                connected: AtomicBool::new(false),
                mode_list: parking_lot::RwLock::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn state(&self) -> DeviceState {
        DeviceState::from_raw(self.inner.device_state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, raw: u32) {
        self.inner.device_state.store(raw, Ordering::Release);
    }

    pub(crate) fn started(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    pub(crate) fn set_started(&self, started: bool) {
        self.inner.started.store(started, Ordering::Release);
    }

    pub(crate) fn connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.inner.connected.store(connected, Ordering::Release);
    }

    pub(crate) fn mode_list(&self) -> Vec<String> {
        self.inner.mode_list.read().clone()
    }

    pub(crate) fn set_mode_list(&self, modes: Vec<String>) {
        *self.inner.mode_list.write() = modes;
    }

    /// Reset everything for a fresh connection.
    pub(crate) fn reset(&self) {
        self.set_state(DeviceState::Unknown.raw());
        self.set_started(false);
        self.set_connected(false);
        self.inner.mode_list.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_session_defaults() {
        let session = Session::new();
        assert_eq!(session.state(), DeviceState::Unknown);
        assert!(!session.started());
        assert!(!session.connected());
        assert!(session.mode_list().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let a = Session::new();
        let b = a.clone();

        a.set_state(DeviceState::Scanning.raw());
        a.set_started(true);
        a.set_mode_list(vec!["01 - Fast".to_string()]);

        assert_eq!(b.state(), DeviceState::Scanning);
        assert!(b.started());
        assert_eq!(b.mode_list(), vec!["01 - Fast".to_string()]);
    }

    #[test]
    fn test_reset() {
        let session = Session::new();
        session.set_state(DeviceState::Ready.raw());
        session.set_started(true);
        session.set_connected(true);
        session.set_mode_list(vec!["01 - Fast".to_string()]);

        session.reset();

        assert_eq!(session.state(), DeviceState::Unknown);
        assert!(!session.started());
        assert!(!session.connected());
        assert!(session.mode_list().is_empty());
    }
}
