use crate::config::{DeviceId, DeviceMode, OperationalState};
use crate::constants::*;
use crate::frame::{checksum, CommandFrame};

/// Outbound requests understood by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch between active reporting and query mode.
    SetMode(DeviceMode),
    /// Put the sensor to sleep or wake it up.
    SetSleep(OperationalState),
    /// Ask for the reporting mode; the reply carries the device id.
    QueryDeviceId,
    /// Ask for the firmware date.
    QueryFirmware,
    /// Ask for a data report.
    QueryMeasurement,
    /// Report every `n` minutes, 0 for continuous.
    SetWorkingPeriod(u8),
    /// Assign a new device id to the addressed sensor.
    SetDeviceId(DeviceId),
}

impl Command {
    /// Checks parameters against the ranges the sensor accepts.
    pub fn validate(&self) -> Result<(), &'static str> {
        match self {
            Command::SetWorkingPeriod(minutes) if *minutes > MAX_WORKING_PERIOD => {
                Err("working period must be between 0 and 30 minutes")
            }
            _ => Ok(()),
        }
    }

    /// Builds the 19-byte frame addressed to `target`.
    ///
    /// The checksum is computed here rather than stored with each template.
    pub fn encode(&self, target: DeviceId) -> CommandFrame {
        let mut command = base_command(target);
        match *self {
            Command::SetMode(mode) => {
                command[2] = CMD_REPORTING_MODE;
                command[3] = SET;
                command[4] = match mode {
                    DeviceMode::Active => 0x00,
                    DeviceMode::Passive => 0x01,
                };
            }
            Command::SetSleep(state) => {
                command[2] = CMD_SLEEP_WORK;
                command[3] = SET;
                command[4] = match state {
                    OperationalState::Sleeping => 0x00,
                    OperationalState::Working => 0x01,
                };
            }
            Command::QueryDeviceId => {
                command[2] = CMD_REPORTING_MODE;
                command[3] = QUERY;
            }
            Command::QueryFirmware => command[2] = CMD_FIRMWARE,
            Command::QueryMeasurement => command[2] = CMD_QUERY_DATA,
            Command::SetWorkingPeriod(minutes) => {
                command[2] = CMD_WORKING_PERIOD;
                command[3] = SET;
                command[4] = minutes;
            }
            Command::SetDeviceId(new_id) => {
                command[2] = CMD_SET_DEVICE_ID;
                command[13] = new_id.id1;
                command[14] = new_id.id2;
            }
        }
        command[17] = checksum(&command[2..=16]);
        CommandFrame(command)
    }
}

// Constructs a base 19-byte command frame.
fn base_command(target: DeviceId) -> [u8; COMMAND_FRAME_LEN] {
    [
        HEAD,
        COMMAND_ID,
        0x00, // Placeholder for specific command type
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,       // Data bytes
        target.id1, // Device ID LSB for addressing
        target.id2, // Device ID MSB for addressing
        0x00,       // Placeholder for checksum
        TAIL,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Command; 9] = [
        Command::SetMode(DeviceMode::Active),
        Command::SetMode(DeviceMode::Passive),
        Command::SetSleep(OperationalState::Sleeping),
        Command::SetSleep(OperationalState::Working),
        Command::QueryDeviceId,
        Command::QueryFirmware,
        Command::QueryMeasurement,
        Command::SetWorkingPeriod(5),
        Command::SetDeviceId(DeviceId { id1: 0xA1, id2: 0x60 }),
    ];

    #[test]
    fn set_active_mode_matches_datasheet() {
        let frame = Command::SetMode(DeviceMode::Active).encode(DeviceId::WILDCARD);
        assert_eq!(
            frame.as_bytes(),
            &[
                0xAA, 0xB4, 0x02, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0xFF, 0xFF, 0x01, 0xAB
            ]
        );
    }

    #[test]
    fn sleep_and_query_frames_match_datasheet() {
        let sleep = Command::SetSleep(OperationalState::Sleeping).encode(DeviceId::WILDCARD);
        assert_eq!(&sleep.as_bytes()[2..5], &[0x06, 0x01, 0x00]);
        assert_eq!(sleep.as_bytes()[17], 0x05);

        let work = Command::SetSleep(OperationalState::Working).encode(DeviceId::WILDCARD);
        assert_eq!(work.as_bytes()[17], 0x06);

        let query = Command::QueryMeasurement.encode(DeviceId::WILDCARD);
        assert_eq!(query.as_bytes()[2], 0x04);
        assert_eq!(query.as_bytes()[17], 0x02);

        let firmware = Command::QueryFirmware.encode(DeviceId::WILDCARD);
        assert_eq!(firmware.as_bytes()[2], 0x07);
        assert_eq!(firmware.as_bytes()[17], 0x05);
    }

    #[test]
    fn every_template_is_well_formed() {
        for target in [DeviceId::WILDCARD, DeviceId::new(0xA1, 0x60)] {
            for command in ALL {
                let bytes = *command.encode(target).as_bytes();
                assert_eq!(bytes[0], 0xAA, "{:?}", command);
                assert_eq!(bytes[1], 0xB4, "{:?}", command);
                assert_eq!(bytes[18], 0xAB, "{:?}", command);
                assert_eq!(bytes[15], target.id1, "{:?}", command);
                assert_eq!(bytes[16], target.id2, "{:?}", command);
                let sum = bytes[2..=16].iter().map(|&b| b as u32).sum::<u32>() % 256;
                assert_eq!(bytes[17] as u32, sum, "{:?}", command);
            }
        }
    }

    #[test]
    fn set_device_id_writes_new_id() {
        let frame = Command::SetDeviceId(DeviceId::new(0xA0, 0x01)).encode(DeviceId::new(0xA1, 0x60));
        let bytes = frame.as_bytes();
        assert_eq!(bytes[2], 0x05);
        assert_eq!((bytes[13], bytes[14]), (0xA0, 0x01));
        assert_eq!((bytes[15], bytes[16]), (0xA1, 0x60));
        assert_eq!(bytes[17], 0xA7);
    }

    #[test]
    fn working_period_range_is_checked() {
        assert!(Command::SetWorkingPeriod(0).validate().is_ok());
        assert!(Command::SetWorkingPeriod(30).validate().is_ok());
        assert!(Command::SetWorkingPeriod(31).validate().is_err());
        assert!(Command::QueryFirmware.validate().is_ok());
    }
}
