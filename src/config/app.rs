//! Application configuration loading from config.toml
//!
//! This module loads billing defaults and the initial room list from a TOML
//! configuration file. The rooms defined in config.toml are used to seed the
//! database on first run or when rooms are missing.

use crate::{
    core::{bill::ensure_amount, derivation::ensure_money},
    entities::RoomStatus,
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::{collections::HashSet, path::Path};
use tracing::{info, warn};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Billing defaults
    #[serde(default)]
    pub billing: BillingConfig,
    /// Rooms to seed
    #[serde(default)]
    pub rooms: Vec<RoomConfig>,
}

/// The `[billing]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Electricity rate used when neither a stored setting nor an earlier bill
    /// provides one
    pub default_rate_per_unit: Decimal,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_rate_per_unit: Decimal::from(5),
        }
    }
}

/// One `[[rooms]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomConfig {
    /// Room number
    pub number: i32,
    /// Tenant living there, if any
    #[serde(default)]
    pub tenant_name: Option<String>,
    /// Monthly rent
    pub rent: Decimal,
    /// `"Occupied"` or `"Vacant"`
    pub status: RoomStatus,
    /// Meter reading for the opening bill of an occupied room
    #[serde(default)]
    pub opening_units: i32,
}

impl Config {
    /// Checks values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        ensure_amount("default_rate_per_unit", self.billing.default_rate_per_unit).map_err(
            |e| Error::Config {
                message: format!("[billing] {e}"),
            },
        )?;

        let mut seen = HashSet::new();
        for room in &self.rooms {
            if !seen.insert(room.number) {
                return Err(Error::Config {
                    message: format!("Room {} is listed more than once", room.number),
                });
            }
            if room.rent <= Decimal::ZERO {
                return Err(Error::Config {
                    message: format!("Room {} must have a positive rent", room.number),
                });
            }
            ensure_money("rent", room.rent).map_err(|e| Error::Config {
                message: format!("Room {}: {e}", room.number),
            })?;
            if room.opening_units < 0 {
                return Err(Error::Config {
                    message: format!("Room {} has a negative opening reading", room.number),
                });
            }
        }

        Ok(())
    }
}

/// Loads and validates configuration from a TOML file
///
/// # Errors
/// Returns [`Error::Config`] if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing or values are out of range
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;

    info!(rooms = config.rooms.len(), "Loaded configuration");
    Ok(config)
}

/// Loads configuration from the default location (./config.toml).
///
/// A missing file is not an error: built-in defaults are used and no rooms
/// are seeded.
pub fn load_default_config() -> Result<Config> {
    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        load_config(DEFAULT_CONFIG_PATH)
    } else {
        warn!("{DEFAULT_CONFIG_PATH} not found, using built-in defaults");
        Ok(Config::default())
    }
}
