use crate::config::DeviceId;
use crate::constants::{COMMAND_FRAME_LEN, DATA_REPORT_ID, HEAD, MEASUREMENT_FRAME_LEN, TAIL};

/// Sums `payload` modulo 256, the integrity check used in both directions.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Returns `true` if `expected` is the checksum of `payload`.
pub fn verify(payload: &[u8], expected: u8) -> bool {
    checksum(payload) == expected
}

/// A validated 10-byte data report: `AA C0 p0 p1 p2 p3 id1 id2 cs AB`.
///
/// Only [`ProtocolFramer`](crate::ProtocolFramer) and
/// [`MeasurementFrame::from_bytes`] construct it, so every instance has a
/// correct header, command, tail and checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementFrame([u8; MEASUREMENT_FRAME_LEN]);

impl MeasurementFrame {
    /// Validates a complete frame.
    pub fn from_bytes(bytes: [u8; MEASUREMENT_FRAME_LEN]) -> Option<Self> {
        if bytes[0] != HEAD || bytes[1] != DATA_REPORT_ID || bytes[9] != TAIL {
            return None;
        }
        verify(&bytes[2..8], bytes[8]).then_some(MeasurementFrame(bytes))
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8; MEASUREMENT_FRAME_LEN] {
        &self.0
    }

    /// Id of the sensor that produced the report.
    pub fn device_id(&self) -> DeviceId {
        DeviceId::new(self.0[6], self.0[7])
    }
}

/// A 19-byte command frame ready to be written to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame(pub(crate) [u8; COMMAND_FRAME_LEN]);

impl CommandFrame {
    /// The raw bytes, checksum included.
    pub fn as_bytes(&self) -> &[u8; COMMAND_FRAME_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_wraps_modulo_256() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
        assert_eq!(checksum(&[0x2C, 0x00, 0x0A, 0x00, 0x00, 0x00]), 0x36);
    }

    #[test]
    fn verify_accepts_only_the_sum() {
        let payloads: [[u8; 6]; 4] = [
            [0, 0, 0, 0, 0, 0],
            [0xFF; 6],
            [0x2C, 0x00, 0x0A, 0x00, 0x12, 0x34],
            [0x80, 0x80, 0x01, 0x02, 0x03, 0x04],
        ];
        for payload in payloads {
            let sum = (payload.iter().map(|&b| b as u32).sum::<u32>() % 256) as u8;
            for candidate in 0..=255u8 {
                assert_eq!(verify(&payload, candidate), candidate == sum);
            }
        }
    }

    #[test]
    fn from_bytes_rejects_bad_frames() {
        let good = [0xAA, 0xC0, 0x2C, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x36, 0xAB];
        assert!(MeasurementFrame::from_bytes(good).is_some());

        let mut bad_checksum = good;
        bad_checksum[8] = 0x00;
        assert!(MeasurementFrame::from_bytes(bad_checksum).is_none());

        let mut reply = good;
        reply[1] = crate::constants::REPLY_ID;
        assert!(MeasurementFrame::from_bytes(reply).is_none());

        let mut bad_tail = good;
        bad_tail[9] = 0x00;
        assert!(MeasurementFrame::from_bytes(bad_tail).is_none());
    }

    #[test]
    fn device_id_comes_from_trailing_payload() {
        let frame = MeasurementFrame::from_bytes([
            0xAA, 0xC0, 0x00, 0x00, 0x00, 0x00, 0xA1, 0x60, 0x01, 0xAB,
        ])
        .unwrap();
        assert_eq!(frame.device_id(), DeviceId::new(0xA1, 0x60));
    }
}
