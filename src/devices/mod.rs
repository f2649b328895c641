pub mod eb3a;

use crate::{
    commands::QueryRangeCommand,
    device_struct::{DecodeOutcome, DeviceStruct},
    fields::{Address, Page},
};
use serde::Serialize;

/// Who a physical unit is: where to reach it and what it reports itself as.
#[derive(Serialize, Debug, PartialEq, Eq, Clone)]
pub struct DeviceIdentity {
    pub address: String,
    pub model: &'static str,
    pub serial_number: String,
}

/// A device model: one register map plus the reads that refresh it.
///
/// Command lists are built on every call and stay the same for the lifetime
/// of the model.
pub trait BluettiDevice {
    fn identity(&self) -> &DeviceIdentity;

    fn device_struct(&self) -> &DeviceStruct;

    /// Small, frequent reads.
    fn polling_commands(&self) -> Vec<QueryRangeCommand>;

    /// Broad, infrequent reads.
    fn logging_commands(&self) -> Vec<QueryRangeCommand>;

    fn decode(&self, page: Page, start: Address, raw: &[u8]) -> DecodeOutcome {
        self.device_struct().decode(page, start, raw)
    }

    fn decode_response(&self, command: &QueryRangeCommand, raw: &[u8]) -> DecodeOutcome {
        self.device_struct().decode_response(command, raw)
    }

    /// Names of the fields `commands` read completely, in declaration order.
    fn covered_fields(&self, commands: &[QueryRangeCommand]) -> Vec<&str> {
        self.device_struct()
            .fields()
            .filter(|f| commands.iter().any(|c| c.covers(f.page, f.address, f.registers())))
            .map(|f| f.name.as_str())
            .collect()
    }
}
