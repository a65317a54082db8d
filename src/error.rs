use core::fmt::Debug;

/// Errors returned by [`SensorSession`](crate::SensorSession) operations.
///
/// `E` is the error type of the underlying transport.
#[derive(Debug, thiserror::Error)]
pub enum Error<E: Debug> {
    /// The transport failed to open, close or write.
    #[error("transport I/O error: {0:?}")]
    Io(E),

    /// A command parameter is outside the range accepted by the sensor.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

impl<E: Debug> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Io(e)
    }
}
