//! Register map decoding for Bluetti power stations.
//!
//! A device model declares typed fields at page/register locations in a
//! [`DeviceStruct`] and names the [`QueryRangeCommand`]s that refresh them.
//! Whatever owns the link issues those commands and hands the raw responses
//! back to [`DeviceStruct::decode`].

pub mod commands;
pub mod config;
pub mod device_struct;
pub mod devices;
pub mod error;
pub mod fields;
pub mod transport;

pub use commands::QueryRangeCommand;
pub use device_struct::{DecodeOutcome, DeviceStruct, FieldSpec};
pub use devices::{BluettiDevice, DeviceIdentity};
pub use error::{DecodeError, DeclarationError};
pub use fields::{FieldKind, FieldValue};

#[doc(hidden)]
pub use serde as __serde;
