//! Boundary to the link that actually reads registers.
//!
//! The core never talks to hardware: a [`RegisterReader`] answers range
//! commands and [`collect`] turns the answers into named telemetry. Timeouts,
//! retries and scheduling belong to the reader and its caller.

use crate::{
    commands::QueryRangeCommand,
    device_struct::DecodeOutcome,
    devices::{BluettiDevice, DeviceIdentity},
    error::DecodeError,
    fields::FieldValue,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;

#[async_trait]
pub trait RegisterReader: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads `command.count()` registers, returning `command.byte_len()` bytes
    /// in protocol byte order.
    async fn read_range(&mut self, command: &QueryRangeCommand) -> Result<Vec<u8>, Self::Error>;
}

/// Decoded state of one device, merged from every response of a collection pass.
#[derive(Serialize, Debug, Clone)]
pub struct Telemetry {
    #[serde(flatten)]
    pub device: DeviceIdentity,
    pub collected_at: DateTime<Utc>,
    pub values: IndexMap<String, FieldValue>,

    #[serde(skip)]
    pub errors: Vec<DecodeError>,
}

impl Telemetry {
    /// JSON payload for publishing, decode errors left out.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Issues `commands` in order and merges the decoded responses.
///
/// The first transport failure aborts the pass and is returned unchanged.
pub async fn collect<D, R>(device: &D, reader: &mut R, commands: &[QueryRangeCommand]) -> Result<Telemetry, R::Error>
where
    D: BluettiDevice + ?Sized,
    R: RegisterReader + ?Sized,
{
    let mut outcome = DecodeOutcome::default();

    for command in commands {
        let raw = reader.read_range(command).await?;

        if raw.len() != command.byte_len() {
            warn!(
                "{}: response for {command} has {} bytes, expected {}",
                device.identity().address,
                raw.len(),
                command.byte_len()
            );
        }

        outcome.merge(device.decode_response(command, &raw));
    }

    debug!(
        "{}: decoded {} fields from {} ranges, {} errors",
        device.identity().address,
        outcome.values.len(),
        commands.len(),
        outcome.errors.len()
    );

    Ok(Telemetry {
        device: device.identity().clone(),
        collected_at: Utc::now(),
        values: outcome.values,
        errors: outcome.errors,
    })
}

pub async fn poll<D, R>(device: &D, reader: &mut R) -> Result<Telemetry, R::Error>
where
    D: BluettiDevice + ?Sized,
    R: RegisterReader + ?Sized,
{
    collect(device, reader, &device.polling_commands()).await
}

pub async fn snapshot<D, R>(device: &D, reader: &mut R) -> Result<Telemetry, R::Error>
where
    D: BluettiDevice + ?Sized,
    R: RegisterReader + ?Sized,
{
    collect(device, reader, &device.logging_commands()).await
}
