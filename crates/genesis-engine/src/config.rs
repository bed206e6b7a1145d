//! Board wiring configuration (`genesis.toml`)
//!
//! Pin numbers are BCM GPIO numbers. Every field is optional in the file;
//! missing ones take the values of the reference board.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// SN76489 write strobe (WR_P).
    #[serde(default = "default_wr_psg")]
    pub wr_psg: u8,
    /// YM2612 write strobe (WR_Y).
    #[serde(default = "default_wr_fm")]
    pub wr_fm: u8,
    /// YM2612 reset (IC_Y).
    #[serde(default = "default_ic_fm")]
    pub ic_fm: u8,
    /// YM2612 address/data select (A0_Y).
    #[serde(default = "default_a0_fm")]
    pub a0_fm: u8,
    /// YM2612 port select (A1_Y).
    #[serde(default = "default_a1_fm")]
    pub a1_fm: u8,
    #[serde(default)]
    pub spi_bus: u8,
    #[serde(default)]
    pub spi_slave: u8,
    #[serde(default = "default_spi_clock_hz")]
    pub spi_clock_hz: u32,
    /// Identifier reported to bridge peers during the handshake.
    #[serde(default = "default_board_id")]
    pub board_id: u8,
}

fn default_wr_psg() -> u8 {
    17
}
fn default_wr_fm() -> u8 {
    27
}
fn default_ic_fm() -> u8 {
    22
}
fn default_a0_fm() -> u8 {
    23
}
fn default_a1_fm() -> u8 {
    24
}
fn default_spi_clock_hz() -> u32 {
    8_000_000
}
fn default_board_id() -> u8 {
    6
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            wr_psg: default_wr_psg(),
            wr_fm: default_wr_fm(),
            ic_fm: default_ic_fm(),
            a0_fm: default_a0_fm(),
            a1_fm: default_a1_fm(),
            spi_bus: 0,
            spi_slave: 0,
            spi_clock_hz: default_spi_clock_hz(),
            board_id: default_board_id(),
        }
    }
}

impl BoardConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
