// HEAD is the byte that marks the beginning of any frame (command or data).
pub const HEAD: u8 = 0xAA;

// TAIL is the byte that marks the end of any frame (command or data).
pub const TAIL: u8 = 0xAB;

// COMMAND_ID is the byte that identifies a command frame sent to the sensor.
pub const COMMAND_ID: u8 = 0xB4;

// DATA_REPORT_ID is the byte that identifies a data report frame received from the sensor.
// This is used in active reporting mode or as a reply to a measurement query.
pub const DATA_REPORT_ID: u8 = 0xC0;

// REPLY_ID is the byte that identifies a reply frame received from the sensor
// in response to a command. Such frames are not decoded by the framer.
pub const REPLY_ID: u8 = 0xC5;

// Length of an inbound data report frame.
pub const MEASUREMENT_FRAME_LEN: usize = 10;

// Length of an outbound command frame.
pub const COMMAND_FRAME_LEN: usize = 19;

// Sub-command bytes, written at offset 2 of a command frame.
pub const CMD_REPORTING_MODE: u8 = 0x02;
pub const CMD_QUERY_DATA: u8 = 0x04;
pub const CMD_SET_DEVICE_ID: u8 = 0x05;
pub const CMD_SLEEP_WORK: u8 = 0x06;
pub const CMD_FIRMWARE: u8 = 0x07;
pub const CMD_WORKING_PERIOD: u8 = 0x08;

// Written at offset 3 to distinguish a query from a set request.
pub const QUERY: u8 = 0x00;
pub const SET: u8 = 0x01;

// Longest working period accepted by the sensor, in minutes.
pub const MAX_WORKING_PERIOD: u8 = 30;
