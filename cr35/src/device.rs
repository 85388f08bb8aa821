//! High-level device interface

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use cr35_core::constants::CLIENT_ID_LEN;
use cr35_transport::{TcpTransport, Transport};
use cr35_types::{DeviceState, Event};

use crate::driver::{Driver, Request};
use crate::error::{Error, Result};
use crate::session::Session;

/// CR35 scanner handle.
///
/// Owns one TCP session at a time. The protocol itself runs on a driver
/// task; this handle enqueues work and reads back state snapshots and
/// [`Event`]s.
///
/// # Examples
///
/// ```no_run
/// use cr35::{Device, Event};
///
/// #[tokio::main]
/// async fn main() -> cr35::Result<()> {
///     let mut device = Device::new("192.168.1.40", 2006);
///     device.connect().await?;
///
///     device.start(5);
///     while let Some(event) = device.next_event().await {
///         if let Event::ImageReady(image) = event {
///             println!("scan complete: {}", image);
///             break;
///         }
///     }
///
///     device.disconnect().await;
///     Ok(())
/// }
/// ```
pub struct Device {
    addr: String,
    port: u16,
    transport: Option<Box<dyn Transport>>,
    session: Session,
    requests: Option<mpsc::UnboundedSender<Request>>,
    events: Option<mpsc::UnboundedReceiver<Event>>,
    task: Option<JoinHandle<()>>,
}

impl Device {
    /// Create a new device handle (TCP transport).
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            transport: None,
            session: Session::new(),
            requests: None,
            events: None,
            task: None,
        }
    }

    /// Create a device handle over a caller-supplied transport.
    ///
    /// Used by tests to drive the session through a scripted link.
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport: Some(transport),
            ..Self::new(String::new(), 0)
        }
    }

    /// Whether a session is currently up.
    pub fn is_connected(&self) -> bool {
        self.session.connected()
    }

    /// Last known device state.
    pub fn state(&self) -> DeviceState {
        self.session.state()
    }

    /// Cached acquisition mode list from the ModeList bootstrap read.
    pub fn mode_list(&self) -> Vec<String> {
        self.session.mode_list()
    }

    /// Connect and run the bootstrap sequence.
    ///
    /// On success the driver task is live: token resolution, the login
    /// handshake and the initial ModeList/SystemState reads are queued in
    /// order behind this call.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let mut transport = self
            .transport
            .take()
            .unwrap_or_else(|| Box::new(TcpTransport::new(self.addr.clone(), self.port)));

        info!("Connecting to device at {}", transport.remote_addr());
        transport.connect().await?;

        self.session.reset();
        self.session.set_connected(true);

        // Fresh identity per connection.
        let client_id: [u8; CLIENT_ID_LEN] = rand::random();

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let _ = event_tx.send(Event::Connected);

        let driver = Driver::new(
            transport,
            self.session.clone(),
            event_tx,
            request_rx,
            client_id,
        );

        self.task = Some(tokio::spawn(driver.run()));
        self.requests = Some(request_tx);
        self.events = Some(event_rx);

        Ok(())
    }

    /// Disconnect with the full choreography: a running acquisition is
    /// stopped first (waiting up to the command timeout for the device to
    /// confirm), then the socket is closed.
    ///
    /// Safe to call when not connected.
    pub async fn disconnect(&mut self) {
        if let Some(requests) = self.requests.take() {
            info!("Disconnecting from device");
            let _ = requests.send(Request::Disconnect);
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Request acquisition start with the given mode identifier.
    ///
    /// Ignored when not connected or already started.
    pub fn start(&self, mode: u32) {
        match &self.requests {
            Some(requests) => {
                let _ = requests.send(Request::Start(mode));
            }
            None => debug!("start ignored: not connected"),
        }
    }

    /// Request acquisition stop.
    ///
    /// Ignored when not connected or not started.
    pub fn stop(&self) {
        match &self.requests {
            Some(requests) => {
                let _ = requests.send(Request::Stop);
            }
            None => debug!("stop ignored: not connected"),
        }
    }

    /// Await the next driver event.
    ///
    /// Returns `None` once the session has ended and all buffered events
    /// were consumed, or when never connected.
    pub async fn next_event(&mut self) -> Option<Event> {
        match &mut self.events {
            Some(events) => events.recv().await,
            None => None,
        }
    }

    /// Take ownership of the event receiver, e.g. to consume events from
    /// a separate task. Subsequent calls (and [`Device::next_event`])
    /// yield nothing until the next connect.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<Event>> {
        self.events.take()
    }
}
