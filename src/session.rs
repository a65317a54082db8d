use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, warn};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::command::Command;
use crate::config::{DeviceId, DeviceMode, OperationalState, SessionConfig};
use crate::constants::MEASUREMENT_FRAME_LEN;
use crate::error::Error;
use crate::frame::MeasurementFrame;
use crate::framer::ProtocolFramer;
use crate::measurement::{decode, MeasurementValues};
use crate::transport::{DataListener, Transport};

/// Notifications published to [`SensorSession::subscribe`] receivers.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    /// The port opened (`true`) or closed (`false`). Only sent on a transition.
    PortOpenChanged(bool),
    /// A checksum-valid data report was decoded.
    NewMeasurement(MeasurementValues),
    /// Reading from the transport failed. The session stays open.
    ErrorMessage(String),
}

/// Lifecycle of a [`SensorSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Opening,
    Open,
    Closing,
}

// Work handed from ingestion to the dispatcher, in arrival order.
#[derive(Debug)]
enum Inbound {
    Frame(MeasurementFrame),
    ReadFault(String),
}

struct Port<T> {
    transport: T,
    framer: ProtocolFramer,
    rx_buffer: Option<[u8; MEASUREMENT_FRAME_LEN]>,
    inbound: Option<mpsc::Sender<Inbound>>,
    state: SessionState,
    is_open: bool,
    target: DeviceId,
}

impl<T: Transport> Port<T> {
    // Returns true only when the flag actually changed.
    fn set_open(&mut self, is_open: bool) -> bool {
        if self.is_open == is_open {
            return false;
        }
        self.is_open = is_open;
        true
    }

    // Stops ingestion. Dropping the sender lets the dispatcher drain and exit.
    fn release(&mut self) {
        self.transport.detach();
        self.inbound = None;
        self.rx_buffer = None;
    }

    fn ingest(&mut self) {
        let (Some(inbound), Some(buffer)) = (self.inbound.as_ref(), self.rx_buffer.as_mut())
        else {
            return;
        };

        loop {
            let available = match self.transport.bytes_to_read() {
                Ok(0) => break,
                Ok(n) => n.min(buffer.len()),
                Err(e) => {
                    enqueue(inbound, Inbound::ReadFault(format!("read failed: {:?}", e)));
                    break;
                }
            };
            let read = match self.transport.read(&mut buffer[..available]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    enqueue(inbound, Inbound::ReadFault(format!("read failed: {:?}", e)));
                    break;
                }
            };
            for &byte in &buffer[..read] {
                if let Some(frame) = self.framer.parse(byte) {
                    enqueue(inbound, Inbound::Frame(frame));
                }
            }
        }
    }
}

fn enqueue(inbound: &mpsc::Sender<Inbound>, item: Inbound) {
    match inbound.try_send(item) {
        Ok(()) => {}
        Err(TrySendError::Full(item)) => {
            warn!("Dispatch queue full, dropping {:?}", item);
        }
        Err(TrySendError::Closed(_)) => {
            debug!("Dispatch queue closed");
        }
    }
}

struct Shared<T> {
    port: Mutex<Port<T>>,
    events: broadcast::Sender<SensorEvent>,
}

impl<T> Shared<T> {
    fn port(&self) -> MutexGuard<'_, Port<T>> {
        self.port.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: SensorEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

/// Decodes queued frames and publishes events until ingestion stops.
async fn dispatch(mut inbound: mpsc::Receiver<Inbound>, events: broadcast::Sender<SensorEvent>) {
    while let Some(item) = inbound.recv().await {
        let event = match item {
            Inbound::Frame(frame) => {
                let values = decode(&frame);
                debug!("Processed frame - PM2.5: {}, PM10: {}", values.pm2_5, values.pm10);
                SensorEvent::NewMeasurement(values)
            }
            Inbound::ReadFault(message) => {
                warn!("{}", message);
                SensorEvent::ErrorMessage(message)
            }
        };
        let _ = events.send(event);
    }
    debug!("Dispatcher stopped");
}

/// Event-driven connection to an SDS011 sensor.
///
/// The session owns the transport, the framer and the receive buffer. Bytes
/// are ingested on the transport's notification context; decoded values are
/// published from a single dispatcher task so subscribers never slow down
/// ingestion and always see events in arrival order.
///
/// `open` and `close` spawn and await tokio tasks and must be called from
/// within a tokio runtime. Command methods are synchronous and share the port
/// lock with ingestion: a notification drains every byte the transport has
/// buffered before releasing it, so a command may wait behind a long burst.
///
/// # Type Parameters
///
/// * `T`: The transport used to talk to the sensor.
pub struct SensorSession<T: Transport> {
    shared: Arc<Shared<T>>,
    // Held for the whole of open and close, settle delay included.
    lifecycle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    config: SessionConfig,
}

impl<T: Transport> SensorSession<T> {
    /// Creates a closed session around `transport`.
    ///
    /// # Arguments
    ///
    /// * `transport` - The connection to the sensor, owned by the session.
    /// * `config` - Addressing, settle delay and queue sizes.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let port = Port {
            transport,
            framer: ProtocolFramer::new(),
            rx_buffer: None,
            inbound: None,
            state: SessionState::Closed,
            is_open: false,
            target: config.device_id,
        };
        Self {
            shared: Arc::new(Shared {
                port: Mutex::new(port),
                events,
            }),
            lifecycle: tokio::sync::Mutex::new(None),
            config,
        }
    }

    /// The configuration this session was created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns a receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SensorEvent> {
        self.shared.events.subscribe()
    }

    /// Whether the port is open and commands will be written.
    pub fn is_open(&self) -> bool {
        self.shared.port().is_open
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.shared.port().state
    }

    /// Device id commands are currently addressed to.
    pub fn target(&self) -> DeviceId {
        self.shared.port().target
    }

    /// Opens the transport and starts ingestion. Does nothing if already open.
    ///
    /// Blocks for the configured settle delay before reporting the new state.
    pub async fn open(&self) -> Result<(), Error<T::Error>> {
        let mut dispatcher = self.lifecycle.lock().await;

        let opened = {
            let mut port = self.shared.port();
            if port.state != SessionState::Closed {
                return Ok(());
            }
            debug!("Opening sensor session");
            port.state = SessionState::Opening;
            port.framer.reset();
            port.rx_buffer = Some([0; MEASUREMENT_FRAME_LEN]);

            let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
            port.inbound = Some(tx);
            *dispatcher = Some(tokio::spawn(dispatch(rx, self.shared.events.clone())));

            port.transport.attach(self.listener());
            let opened = port.transport.open();
            if opened.is_err() {
                port.release();
                port.state = SessionState::Closed;
            }
            opened
        };

        if let Err(e) = opened {
            error!("Failed to open transport: {:?}", e);
            stop_dispatcher(dispatcher.take()).await;
            return Err(Error::Io(e));
        }

        tokio::time::sleep(self.config.settle_delay).await;

        let (changed, is_open) = {
            let mut port = self.shared.port();
            let is_open = port.transport.is_open();
            if is_open {
                port.state = SessionState::Open;
            } else {
                warn!("Transport reports closed after open");
                port.release();
                port.state = SessionState::Closed;
            }
            (port.set_open(is_open), is_open)
        };

        if !is_open {
            stop_dispatcher(dispatcher.take()).await;
        }
        if changed {
            debug!("Port open changed: {}", is_open);
            self.shared.publish(SensorEvent::PortOpenChanged(is_open));
        }
        Ok(())
    }

    /// Stops ingestion and closes the transport. Does nothing if already closed.
    ///
    /// The session is torn down even if the transport fails to close; that
    /// failure is still returned.
    pub async fn close(&self) -> Result<(), Error<T::Error>> {
        let mut dispatcher = self.lifecycle.lock().await;

        let closed = {
            let mut port = self.shared.port();
            if port.state == SessionState::Closed {
                return Ok(());
            }
            debug!("Closing sensor session");
            port.state = SessionState::Closing;
            port.transport.detach();
            port.transport.close()
        };

        if let Err(e) = &closed {
            error!("Failed to close transport: {:?}", e);
        }

        tokio::time::sleep(self.config.settle_delay).await;

        let changed = {
            let mut port = self.shared.port();
            port.release();
            port.state = SessionState::Closed;
            port.set_open(false)
        };

        // Measurements already queued are published before the close event.
        stop_dispatcher(dispatcher.take()).await;
        if changed {
            debug!("Port open changed: false");
            self.shared.publish(SensorEvent::PortOpenChanged(false));
        }
        closed.map_err(Error::Io)
    }

    /// Switches the sensor to active reporting (`true`) or query mode.
    pub fn set_mode(&self, active: bool) -> Result<bool, Error<T::Error>> {
        self.send(Command::SetMode(DeviceMode::from(active)))
    }

    /// Puts the sensor to sleep (`true`) or wakes it.
    pub fn set_sleep(&self, sleeping: bool) -> Result<bool, Error<T::Error>> {
        self.send(Command::SetSleep(OperationalState::from_sleeping(sleeping)))
    }

    /// Requests the reporting mode; the sensor's reply carries its device id.
    pub fn get_device_id(&self) -> Result<bool, Error<T::Error>> {
        self.send(Command::QueryDeviceId)
    }

    /// Requests the firmware date.
    pub fn get_firmware(&self) -> Result<bool, Error<T::Error>> {
        self.send(Command::QueryFirmware)
    }

    /// Requests a data report; the reply arrives as a `NewMeasurement` event.
    pub fn get_measurement(&self) -> Result<bool, Error<T::Error>> {
        self.send(Command::QueryMeasurement)
    }

    /// Sets the working period in minutes.
    ///
    /// - `0` makes the sensor report continuously.
    /// - `1..=30` makes it work for 30 seconds and report once per period.
    ///
    /// Values above 30 return `Error::InvalidArgument` without writing.
    pub fn set_working_period(&self, minutes: u8) -> Result<bool, Error<T::Error>> {
        self.send(Command::SetWorkingPeriod(minutes))
    }

    /// Assigns a new id to the sensor and addresses later commands to it.
    pub fn set_device_id(&self, new_id: DeviceId) -> Result<bool, Error<T::Error>> {
        let sent = self.send(Command::SetDeviceId(new_id))?;
        if sent {
            self.shared.port().target = new_id;
            debug!("Device ID updated locally to {:02X}{:02X}", new_id.id1, new_id.id2);
        }
        Ok(sent)
    }

    /// Writes `command` on the caller's thread.
    ///
    /// Returns `Ok(false)` without writing while the port is not open.
    pub fn send(&self, command: Command) -> Result<bool, Error<T::Error>> {
        command.validate().map_err(Error::InvalidArgument)?;

        let mut port = self.shared.port();
        if !port.is_open {
            debug!("Port not open, skipping {:?}", command);
            return Ok(false);
        }
        let frame = command.encode(port.target);
        debug!("Executing command: {:02X?}", frame.as_bytes());
        port.transport.write_all(frame.as_ref())?;
        port.transport.flush()?;
        Ok(true)
    }

    fn listener(&self) -> DataListener {
        let shared = Arc::downgrade(&self.shared);
        DataListener::new(move || {
            if let Some(shared) = shared.upgrade() {
                shared.port().ingest();
            }
        })
    }
}

async fn stop_dispatcher(handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle {
        if let Err(e) = handle.await {
            error!("Dispatcher task failed: {}", e);
        }
    }
}

impl<T: Transport> Drop for SensorSession<T> {
    fn drop(&mut self) {
        let mut port = self.shared.port();
        if port.state == SessionState::Closed {
            return;
        }
        port.release();
        if let Err(e) = port.transport.close() {
            error!("Failed to close transport on drop: {:?}", e);
        }
        port.state = SessionState::Closed;
    }
}
