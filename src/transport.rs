use std::fmt;
use std::sync::Arc;

use embedded_io::{Read, Write};

/// Callback handle a [`Transport`] invokes when bytes are waiting to be read.
///
/// Cloning is cheap; all clones refer to the same callback.
#[derive(Clone)]
pub struct DataListener(Arc<dyn Fn() + Send + Sync>);

impl DataListener {
    /// Wraps `callback` so it can be attached to a transport.
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Self {
        DataListener(Arc::new(callback))
    }

    /// Signals that data is available.
    pub fn notify(&self) {
        (self.0)()
    }
}

impl fmt::Debug for DataListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataListener")
    }
}

/// Duplex byte connection to the sensor, typically a 9600 8N1 serial port.
///
/// Reading and writing go through the [`embedded_io`] traits. On top of
/// those a transport has an explicit lifecycle and a single listener slot.
///
/// Implementations must not invoke the listener from inside a call made by
/// the session (`open`, `close`, `read`, `write`, `bytes_to_read`, `attach`,
/// `detach`); notifications come from the transport's own context and never
/// overlap each other.
pub trait Transport: Read + Write + Send + 'static {
    /// Opens the underlying connection.
    fn open(&mut self) -> Result<(), Self::Error>;

    /// Closes the underlying connection.
    fn close(&mut self) -> Result<(), Self::Error>;

    /// Whether the connection is currently open.
    fn is_open(&self) -> bool;

    /// Number of received bytes that can be read without blocking.
    fn bytes_to_read(&mut self) -> Result<usize, Self::Error>;

    /// Registers `listener`, replacing any listener already attached.
    fn attach(&mut self, listener: DataListener);

    /// Removes the attached listener, if any.
    fn detach(&mut self);
}
