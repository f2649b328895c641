mod registers;

pub use registers::{CONTROL_PAGE, CORE_PAGE};

use super::{BluettiDevice, DeviceIdentity};
use crate::{commands::QueryRangeCommand, config::DeviceConfig, device_struct::DeviceStruct, protocol_enum};
use registers::*;

protocol_enum! {
    pub enum LedMode: "led_mode" {
        Low = 1 => "LOW",
        High = 2 => "HIGH",
        Sos = 3 => "SOS",
        Off = 4 => "OFF",
    }
}

protocol_enum! {
    pub enum EcoShutdown: "eco_shutdown" {
        OneHour = 1 => "ONE_HOUR",
        TwoHours = 2 => "TWO_HOURS",
        ThreeHours = 3 => "THREE_HOURS",
        FourHours = 4 => "FOUR_HOURS",
    }
}

protocol_enum! {
    pub enum ChargingMode: "charging_mode" {
        Standard = 0 => "STANDARD",
        Silent = 1 => "SILENT",
        Turbo = 2 => "TURBO",
    }
}

/// Bluetti EB3A portable power station.
#[derive(Debug, Clone)]
pub struct Eb3a {
    identity: DeviceIdentity,
    structure: DeviceStruct,
}

impl Eb3a {
    pub const MODEL: &'static str = "EB3A";

    pub fn new<A: Into<String>, S: Into<String>>(address: A, serial_number: S) -> Self {
        let mut structure = DeviceStruct::new();

        structure
            .add_string_field("device_type", CORE_PAGE, DEVICE_TYPE, DEVICE_TYPE_REGISTERS)
            .add_sn_field("serial_number", CORE_PAGE, SERIAL_NUMBER)
            .add_version_field("arm_version", CORE_PAGE, ARM_VERSION)
            .add_version_field("dsp_version", CORE_PAGE, DSP_VERSION)
            .add_uint_field("dc_input_power", CORE_PAGE, DC_INPUT_POWER)
            .add_uint_field("ac_input_power", CORE_PAGE, AC_INPUT_POWER)
            .add_uint_field("ac_output_power", CORE_PAGE, AC_OUTPUT_POWER)
            .add_uint_field("dc_output_power", CORE_PAGE, DC_OUTPUT_POWER)
            .add_uint_field("total_battery_percent", CORE_PAGE, TOTAL_BATTERY_PERCENT)
            .add_bool_field("ac_output_on", CORE_PAGE, AC_OUTPUT_ON_STATUS)
            .add_bool_field("dc_output_on", CORE_PAGE, DC_OUTPUT_ON_STATUS);

        structure
            .add_decimal_field("ac_input_voltage", CORE_PAGE, AC_INPUT_VOLTAGE, 1)
            .add_decimal_field("internal_dc_input_voltage", CORE_PAGE, INTERNAL_DC_INPUT_VOLTAGE, 2);

        structure.add_uint_field("pack_num_max", CORE_PAGE, PACK_NUM_MAX);

        // Control page locations replace the status mirrors declared above.
        structure
            .add_bool_field("ac_output_on", CONTROL_PAGE, AC_OUTPUT_ON)
            .add_bool_field("dc_output_on", CONTROL_PAGE, DC_OUTPUT_ON)
            .add_enum_field::<LedMode, _>("led_mode", CONTROL_PAGE, LED_MODE)
            .add_bool_field("power_off", CONTROL_PAGE, POWER_OFF)
            .add_bool_field("eco_on", CONTROL_PAGE, ECO_ON)
            .add_enum_field::<EcoShutdown, _>("eco_shutdown", CONTROL_PAGE, ECO_SHUTDOWN)
            .add_enum_field::<ChargingMode, _>("charging_mode", CONTROL_PAGE, CHARGING_MODE)
            .add_bool_field("power_lifting_on", CONTROL_PAGE, POWER_LIFTING_ON);

        Self {
            identity: DeviceIdentity {
                address: address.into(),
                model: Self::MODEL,
                serial_number: serial_number.into(),
            },
            structure,
        }
    }

    pub fn from_config(conf: &DeviceConfig) -> Self {
        Self::new(conf.address.0.clone(), conf.serial_number.clone())
    }
}

impl BluettiDevice for Eb3a {
    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    fn device_struct(&self) -> &DeviceStruct {
        &self.structure
    }

    fn polling_commands(&self) -> Vec<QueryRangeCommand> {
        POLLING_COMMANDS.to_vec()
    }

    fn logging_commands(&self) -> Vec<QueryRangeCommand> {
        LOGGING_COMMANDS.to_vec()
    }
}
