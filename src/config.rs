use crate::error::ConfigError;
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use serde::{de::Error, Deserialize, Deserializer, Serialize};
use std::{fs::File, path::Path};

lazy_static! {
    static ref MAC_ADDRESS_REGEX: regex::Regex =
        regex::Regex::new("^[0-9A-Fa-f]{2}(:[0-9A-Fa-f]{2}){5}$").unwrap();
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// Bluetooth address, normalized to upper case.
#[derive(Serialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct MacAddress(pub String);

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D>(de: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let addr = String::deserialize(de)?;

        if MAC_ADDRESS_REGEX.is_match(&addr) {
            Ok(MacAddress(addr.to_ascii_uppercase()))
        } else {
            Err(Error::custom(ConfigError::InvalidAddress))
        }
    }
}

fn non_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let sn = String::deserialize(de)?;

    if sn.trim().is_empty() {
        Err(Error::custom(ConfigError::EmptySerialNumber))
    } else {
        Ok(sn)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct DeviceConfig {
    pub name: Option<String>,
    pub address: MacAddress,

    #[serde(deserialize_with = "non_empty")]
    pub serial_number: String,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).with_context(|| format!("Failed to open config file {path:?}"))?;

        serde_yaml::from_reader(file).with_context(|| format!("Failed to parse config file {path:?}"))
    }

    pub fn from_yaml(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).context("Failed to parse config")
    }
}
