//! Event-driven driver for the Nova SDS011 particulate matter sensor.
//!
//! A [`SensorSession`] owns a byte [`Transport`], feeds every received byte
//! through a [`ProtocolFramer`] and publishes decoded PM2.5 / PM10 values as
//! [`SensorEvent`]s. Control commands are encoded by [`Command`] and written
//! through the session while the port is open.

mod constants;
pub use constants::*;

mod error;
pub use error::*;

mod config;
pub use config::*;

mod frame;
pub use frame::*;

mod framer;
pub use framer::*;

mod measurement;
pub use measurement::*;

mod command;
pub use command::*;

mod transport;
pub use transport::*;

mod session;
pub use session::*;
