use crate::{
    commands::QueryRangeCommand,
    fields::{Address, Page},
};

pub const CORE_PAGE: Page = 0x00;
pub const CONTROL_PAGE: Page = 0x0B;

// Page 0x00 - Core
pub const DEVICE_TYPE: Address = 0x0A;
pub const DEVICE_TYPE_REGISTERS: u16 = 6;
pub const SERIAL_NUMBER: Address = 0x11;
pub const ARM_VERSION: Address = 0x17;
pub const DSP_VERSION: Address = 0x19;
pub const DC_INPUT_POWER: Address = 0x24;
pub const AC_INPUT_POWER: Address = 0x25;
pub const AC_OUTPUT_POWER: Address = 0x26;
pub const DC_OUTPUT_POWER: Address = 0x27;
pub const TOTAL_BATTERY_PERCENT: Address = 0x2B;
pub const AC_OUTPUT_ON_STATUS: Address = 0x30;
pub const DC_OUTPUT_ON_STATUS: Address = 0x31;

// Page 0x00 - Details
pub const AC_INPUT_VOLTAGE: Address = 0x4D;
pub const INTERNAL_DC_INPUT_VOLTAGE: Address = 0x56;

// Page 0x00 - Battery data
pub const PACK_NUM_MAX: Address = 0x5B;

// Page 0x0B - Controls
pub const AC_OUTPUT_ON: Address = 0xBF;
pub const DC_OUTPUT_ON: Address = 0xC0;
pub const LED_MODE: Address = 0xDA;
pub const POWER_OFF: Address = 0xF4;
pub const ECO_ON: Address = 0xF7;
pub const ECO_SHUTDOWN: Address = 0xF8;
pub const CHARGING_MODE: Address = 0xF9;
pub const POWER_LIFTING_ON: Address = 0xFA;

pub const POLLING_COMMANDS: [QueryRangeCommand; 4] = [
    QueryRangeCommand::new(CORE_PAGE, 0x0A, 0x28),
    QueryRangeCommand::new(CORE_PAGE, 0x46, 0x15),
    QueryRangeCommand::new(CONTROL_PAGE, 0xDA, 0x01),
    QueryRangeCommand::new(CONTROL_PAGE, 0xF4, 0x07),
];

pub const LOGGING_COMMANDS: [QueryRangeCommand; 4] = [
    QueryRangeCommand::new(CORE_PAGE, 0x0A, 0x35),
    QueryRangeCommand::new(CORE_PAGE, 0x46, 0x42),
    QueryRangeCommand::new(CORE_PAGE, 0x88, 0x4A),
    QueryRangeCommand::new(CONTROL_PAGE, 0xB8, 0x43),
];
