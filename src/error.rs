use crate::fields::{Address, Page};
use thiserror::Error;

/// Per-field conditions collected while decoding a register buffer.
///
/// None of these abort a decode pass; they are reported next to the values
/// that did decode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("field {field:?} is truncated: needs {needed} bytes, {available} available")]
    TruncatedField {
        field: String,
        needed: usize,
        available: usize,
    },

    #[error("field {field:?} has no symbol for raw value {raw}")]
    UnknownEnumValue { field: String, raw: u16 },

    /// No declared field touches any register of the range.
    #[error("no fields declared in page {page:#04x} for {count} registers from {start:#04x}")]
    UnmappedRange { page: Page, start: Address, count: u16 },
}

impl DecodeError {
    /// Name of the field the condition belongs to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            DecodeError::TruncatedField { field, .. } | DecodeError::UnknownEnumValue { field, .. } => Some(field),
            DecodeError::UnmappedRange { .. } => None,
        }
    }
}

/// Invalid field declarations. These are programmer errors in a device model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("zero-length string")]
    EmptyString,

    #[error("serial number of {0} registers, expected 1..={max}", max = crate::fields::SERIAL_NUMBER_REGISTERS)]
    SerialNumberSpan(u8),

    #[error("decimal scale {0}, expected at most {max}", max = crate::fields::MAX_DECIMAL_SCALE)]
    DecimalScale(u8),

    #[error("enum {0:?} has no symbols")]
    EmptySymbolSet(&'static str),

    #[error("field {field:?} at {address:#04x} runs past the end of the register space")]
    AddressOverflow { field: String, address: Address },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("address must be a bluetooth MAC address (AA:BB:CC:DD:EE:FF)")]
    InvalidAddress,

    #[error("serial number must not be empty")]
    EmptySerialNumber,
}
