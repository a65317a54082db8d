use core::time::Duration;

/// Represents the reporting mode of the SDS011 sensor.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum DeviceMode {
    /// In Active mode, the sensor automatically reports data.
    Active,
    /// In Passive mode, the sensor only reports data when queried.
    Passive,
}

impl From<bool> for DeviceMode {
    fn from(active: bool) -> Self {
        if active {
            DeviceMode::Active
        } else {
            DeviceMode::Passive
        }
    }
}

/// Represents the operational state of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationalState {
    /// Sensor is in low-power sleep mode.
    Sleeping,
    /// Sensor is actively taking measurements.
    Working,
}

impl OperationalState {
    /// Maps the `sleeping` flag used by the session API.
    pub fn from_sleeping(sleeping: bool) -> Self {
        if sleeping {
            OperationalState::Sleeping
        } else {
            OperationalState::Working
        }
    }
}

/// Represents the unique identifier of the SDS011 sensor.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct DeviceId {
    /// The first byte of the device ID.
    pub id1: u8,
    /// The second byte of the device ID.
    pub id2: u8,
}

impl DeviceId {
    /// `FF FF`, accepted by every sensor regardless of its own id.
    pub const WILDCARD: DeviceId = DeviceId {
        id1: 0xff,
        id2: 0xff,
    };

    /// Creates a device id from its two bytes.
    ///
    /// # Arguments
    ///
    /// * `id1` - The first byte, written at offset 15 of a command frame.
    /// * `id2` - The second byte, written at offset 16 of a command frame.
    pub fn new(id1: u8, id2: u8) -> Self {
        DeviceId { id1, id2 }
    }
}

impl Default for DeviceId {
    /// Returns the wildcard device id.
    fn default() -> DeviceId {
        DeviceId::WILDCARD
    }
}

/// Configuration settings for a [`SensorSession`](crate::SensorSession).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SessionConfig {
    /// Device id written into every outbound command.
    pub device_id: DeviceId,
    /// Wait after opening or closing the transport before trusting its state.
    pub settle_delay: Duration,
    /// Capacity of the queue between byte ingestion and event dispatch.
    pub queue_capacity: usize,
    /// Capacity of the broadcast channel feeding subscribers.
    pub event_capacity: usize,
}

impl SessionConfig {
    /// Default settle delay applied around open and close.
    pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

    /// Creates a new `SessionConfig` addressing `device_id` with default timings.
    pub fn new(device_id: DeviceId) -> SessionConfig {
        SessionConfig {
            device_id,
            ..SessionConfig::default()
        }
    }

    /// Sets the device ID for the configuration.
    pub fn device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = device_id;
        self
    }

    /// Sets the settle delay.
    pub fn settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Sets the ingestion queue capacity. Zero is raised to one.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Sets the subscriber channel capacity. Zero is raised to one.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

/// Provides default configuration values.
impl Default for SessionConfig {
    /// The default configuration addresses the wildcard device id and waits
    /// 100 ms after each open or close.
    fn default() -> SessionConfig {
        SessionConfig {
            device_id: DeviceId::default(),
            settle_delay: SessionConfig::SETTLE_DELAY,
            queue_capacity: 64,
            event_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_addresses_wildcard() {
        let config = SessionConfig::default();
        assert_eq!(config.device_id, DeviceId::new(0xFF, 0xFF));
        assert_eq!(config.settle_delay, Duration::from_millis(100));
    }

    #[test]
    fn builder_clamps_capacities() {
        let config = SessionConfig::new(DeviceId::new(0x12, 0x34))
            .queue_capacity(0)
            .event_capacity(0)
            .settle_delay(Duration::ZERO);
        assert_eq!(config.device_id, DeviceId::new(0x12, 0x34));
        assert_eq!(config.queue_capacity, 1);
        assert_eq!(config.event_capacity, 1);
        assert_eq!(config.settle_delay, Duration::ZERO);
    }

    #[test]
    fn bool_flags_map_to_modes() {
        assert_eq!(DeviceMode::from(true), DeviceMode::Active);
        assert_eq!(DeviceMode::from(false), DeviceMode::Passive);
        assert_eq!(
            OperationalState::from_sleeping(true),
            OperationalState::Sleeping
        );
        assert_eq!(
            OperationalState::from_sleeping(false),
            OperationalState::Working
        );
    }
}
