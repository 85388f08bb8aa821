//! Session driver task
//!
//! One task per connection owns the transport and every piece of mutable
//! protocol state: the token table, the command queue, the receive and
//! image buffers and the acquisition flags. The `Device` handle talks to
//! it through a request channel; results come back as [`Event`]s and
//! through the shared [`Session`] snapshot.

use std::collections::HashMap;

use bytes::BytesMut;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant};
use tracing::{debug, info, trace, warn};

use cr35_core::constants::{
    marker, token, CLIENT_ID_LEN, COMMAND_QUEUE_INTERVAL, COMMAND_TIMEOUT, HEADER_SIZE,
    IMAGE_DATA_REQUEST_INTERVAL, TOKEN_UNKNOWN,
};
use cr35_core::{framing, image, modelist, packet, wire};
use cr35_core::{Command, CommandKind, CommandQueue, ServerHeader};
use cr35_transport::Transport;
use cr35_types::{DeviceState, Event};

use crate::session::Session;

/// API calls forwarded from the `Device` handle.
#[derive(Debug)]
pub(crate) enum Request {
    Start(u32),
    Stop,
    Disconnect,
}

pub(crate) struct Driver {
    transport: Box<dyn Transport>,
    session: Session,
    events: mpsc::UnboundedSender<Event>,
    requests: mpsc::UnboundedReceiver<Request>,

    client_id: [u8; CLIENT_ID_LEN],
    tokens: HashMap<&'static str, u32>,
    queue: CommandQueue,

    rx_buffer: BytesMut,
    image_buffer: BytesMut,
    was_scanning: bool,

    /// When the next SystemState/ImageData poll pair goes out.
    poll_at: Option<Instant>,

    /// Deadline for the stop confirmation during disconnect.
    stop_wait: Option<Instant>,
}

impl Driver {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        session: Session,
        events: mpsc::UnboundedSender<Event>,
        requests: mpsc::UnboundedReceiver<Request>,
        client_id: [u8; CLIENT_ID_LEN],
    ) -> Self {
        Self {
            transport,
            session,
            events,
            requests,
            client_id,
            tokens: HashMap::new(),
            queue: CommandQueue::new(),
            rx_buffer: BytesMut::new(),
            image_buffer: BytesMut::new(),
            was_scanning: false,
            poll_at: None,
            stop_wait: None,
        }
    }

    /// Run the session until disconnect or transport failure.
    pub(crate) async fn run(mut self) {
        self.bootstrap();

        let mut tick = interval(COMMAND_QUEUE_INTERVAL);

        loop {
            let poll_at = self.poll_at.unwrap_or_else(Instant::now);
            let stop_wait = self.stop_wait.unwrap_or_else(Instant::now);

            tokio::select! {
                biased;

                request = self.requests.recv() => {
                    match request {
                        Some(request) => {
                            if self.handle_request(request) {
                                break;
                            }
                        }
                        // Handle dropped without an explicit disconnect.
                        None => break,
                    }
                }

                received = self.transport.recv() => {
                    match received {
                        Ok(bytes) => {
                            if self.handle_bytes(&bytes) {
                                break;
                            }
                        }
                        Err(cr35_transport::Error::ConnectionClosed) => {
                            info!("connection closed by device");
                            break;
                        }
                        Err(e) => {
                            let _ = self.events.send(Event::Error(e.to_string()));
                            break;
                        }
                    }
                }

                _ = sleep_until(stop_wait), if self.stop_wait.is_some() => {
                    warn!("no stop confirmation from device, closing anyway");
                    break;
                }

                _ = sleep_until(poll_at), if self.poll_at.is_some() => {
                    self.poll_at = None;
                    self.request_image_data();
                }

                _ = tick.tick() => {
                    if let Err(e) = self.flush_queue().await {
                        let _ = self.events.send(Event::Error(e.to_string()));
                        break;
                    }
                }
            }
        }

        self.teardown().await;
    }

    /// Queue the per-connection initialization sequence: token resolution
    /// for every known name, then the login handshake, then the first
    /// ModeList and SystemState reads.
    fn bootstrap(&mut self) {
        for name in token::ALL {
            if !self.tokens.contains_key(name) {
                self.queue.enqueue(Command::read_token(name));
            }
        }

        let system_date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        self.queue.enqueue(Command::u16(token::CONNECT, 1));
        self.queue.enqueue(Command::text(token::USER_ID, "user@BACKUP"));
        self.queue.enqueue(Command::text(token::SYSTEM_DATE, system_date));
        self.queue.enqueue(Command::read_data(token::MODE_LIST));
        self.queue.enqueue(Command::read_data(token::SYSTEM_STATE));
    }

    /// Returns `true` when the session should shut down.
    fn handle_request(&mut self, request: Request) -> bool {
        match request {
            Request::Start(mode) => {
                self.start(mode);
                false
            }
            Request::Stop => {
                self.stop();
                false
            }
            Request::Disconnect => {
                self.poll_at = None;
                if self.session.started() {
                    // Ask the device to stop and give it a grace period to
                    // confirm before tearing the socket down.
                    self.stop();
                    self.stop_wait = Some(Instant::now() + COMMAND_TIMEOUT);
                    false
                } else {
                    true
                }
            }
        }
    }

    fn start(&mut self, mode: u32) {
        if self.session.started() {
            debug!("start ignored: acquisition already running");
            return;
        }

        info!(mode, "starting acquisition");

        self.queue.enqueue(Command::u32(token::MODE, mode));
        self.queue.enqueue(Command::u32(token::POLLING_ONLY, 1));
        self.queue.enqueue(Command::u16(token::START, 1));

        self.image_buffer.clear();
    }

    fn stop(&mut self) {
        if !self.session.started() {
            debug!("stop ignored: not acquiring");
            return;
        }

        info!("stopping acquisition");
        self.poll_at = None;

        self.queue.enqueue(Command::u16(token::STOP_REQUEST, 1));
        self.queue.enqueue(Command::u16(token::STOP, 1));
    }

    /// Poll tick: ask for the device state, then for more image data.
    fn request_image_data(&mut self) {
        if !self.session.started() {
            return;
        }

        self.queue.enqueue(Command::read_data(token::SYSTEM_STATE));
        self.queue.enqueue(Command::read_data(token::IMAGE_DATA));
    }

    /// Drain tick: transmit the next eligible command.
    async fn flush_queue(&mut self) -> cr35_transport::Result<()> {
        let Some(command) = self.queue.next(Instant::now().into_std()) else {
            return Ok(());
        };

        let packet = match command.kind {
            CommandKind::ReadToken => packet::token_request(&self.client_id, command.name),
            CommandKind::ReadData => packet::read_data(self.token_id(command.name), &self.client_id),
            CommandKind::Command => packet::command(self.token_id(command.name), &command),
        };

        debug!(command = %command, len = packet.len(), "sending packet");
        self.transport.send(&packet).await
    }

    fn token_id(&self, name: &str) -> u32 {
        self.tokens.get(name).copied().unwrap_or(TOKEN_UNKNOWN)
    }

    /// Consume incoming bytes. Returns `true` when the session should
    /// shut down (stop confirmed during disconnect).
    fn handle_bytes(&mut self, bytes: &[u8]) -> bool {
        self.rx_buffer.extend_from_slice(bytes);
        if self.rx_buffer.len() < HEADER_SIZE {
            return false;
        }

        let header = ServerHeader::parse(&self.rx_buffer);

        let current = self.queue.current().map(|c| (c.kind, c.name));
        let mut shutdown = false;

        if let Some((CommandKind::ReadToken, name)) = current {
            // For a token request the response header itself carries the
            // assigned token id.
            debug!(name, token = header.token, "token resolved");
            self.tokens.insert(name, header.token);
        } else {
            let Some(payload) = framing::extract_payload(&self.rx_buffer, &header) else {
                return false; // wait for more data
            };
            shutdown = self.dispatch(&header, &payload);
        }

        trace!(%header, "message consumed");

        self.queue.complete();
        self.rx_buffer.clear();
        shutdown
    }

    /// Route a complete payload by its stream token.
    fn dispatch(&mut self, header: &ServerHeader, payload: &[u8]) -> bool {
        if header.token == self.token_id(token::MODE_LIST) {
            let modes = modelist::parse_mode_list(payload);
            info!(count = modes.len(), "received ModeList");
            info!("modes: {}", modes.join(", "));
            self.session.set_mode_list(modes);
        } else if header.token == self.token_id(token::IMAGE_DATA) {
            self.handle_image_data(payload);
        } else if header.token == self.token_id(token::SYSTEM_STATE) {
            self.handle_system_state(payload);
        } else if header.token == self.token_id(token::START) {
            info!("acquisition started");
            self.session.set_started(true);
            let _ = self.events.send(Event::Started);
            self.poll_at = Some(Instant::now() + IMAGE_DATA_REQUEST_INTERVAL);
        } else if header.token == self.token_id(token::STOP) {
            info!("acquisition stopped");
            self.session.set_started(false);
            let _ = self.events.send(Event::Stopped);
            self.queue.enqueue(Command::read_data(token::SYSTEM_STATE));

            if self.stop_wait.is_some() {
                return true; // disconnect choreography may proceed
            }
        }

        false
    }

    fn handle_image_data(&mut self, payload: &[u8]) {
        info!(size = payload.len(), "received ImageData");

        self.image_buffer.extend_from_slice(payload);
        if payload.len() > 32 {
            let _ = self.events.send(Event::NewData);
        }

        // A scan is complete once the device idles in WAITING and the
        // stream ends on the image-end marker.
        if self.session.state() == DeviceState::Waiting
            && self.was_scanning
            && self.image_buffer.len() >= 2
        {
            if let Ok(last) = wire::read_u16_le(&self.image_buffer, self.image_buffer.len() - 2) {
                if last == marker::IMAGE_END {
                    self.finish_scan();
                }
            }
        }

        if self.session.started() {
            self.poll_at = Some(Instant::now() + IMAGE_DATA_REQUEST_INTERVAL);
        }
    }

    fn handle_system_state(&mut self, payload: &[u8]) {
        if payload.len() != 4 {
            return;
        }
        let Ok(raw) = wire::read_u32_be(payload, 0) else {
            return;
        };

        let state = DeviceState::from_raw(raw);
        info!(%state, "SystemState");
        self.session.set_state(raw);

        if state == DeviceState::Scanning {
            self.was_scanning = true;
        } else if state == DeviceState::Stopping && self.was_scanning {
            // The device aborted into STOPPING; whatever arrived so far is
            // the complete scan.
            self.finish_scan();
        }
    }

    fn finish_scan(&mut self) {
        self.process_image();
        self.was_scanning = false;
        self.image_buffer.clear();
    }

    fn process_image(&mut self) {
        if self.image_buffer.is_empty() {
            return;
        }

        info!(size = self.image_buffer.len(), "processing received image data");

        if let Some(scan) = image::assemble(&self.image_buffer) {
            let _ = self.events.send(Event::ImageReady(scan));
        }
    }

    async fn teardown(mut self) {
        info!(queued = self.queue.len(), "closing session");

        if let Err(e) = self.transport.disconnect().await {
            debug!("disconnect error (ignored): {}", e);
        }

        self.session.set_started(false);
        self.session.set_connected(false);
        let _ = self.events.send(Event::Disconnected);
    }
}
