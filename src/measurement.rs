use crate::frame::MeasurementFrame;

/// A single data sample read from the SDS011 sensor.
///
/// Contains PM2.5 and PM10 particulate matter concentration values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementValues {
    /// PM2.5 concentration in µg/m³.
    pub pm2_5: f32,
    /// PM10 concentration in µg/m³.
    pub pm10: f32,
}

/// Converts a validated data report into concentrations.
///
/// Both values are little-endian 16-bit counts of tenths of a µg/m³.
pub fn decode(frame: &MeasurementFrame) -> MeasurementValues {
    let data = frame.as_bytes();
    let pm2_5 = (u16::from(data[2]) | (u16::from(data[3]) << 8)) as f32 / 10.0;
    let pm10 = (u16::from(data[4]) | (u16::from(data[5]) << 8)) as f32 / 10.0;
    MeasurementValues { pm2_5, pm10 }
}
