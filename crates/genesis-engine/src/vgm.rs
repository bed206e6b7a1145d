//! VGM stream handling used by the player.
//!
//! This module exposes the header type, the command model produced by the
//! streaming parser, and the PCM data bank that feeds YM2612 DAC writes.
pub mod command;
mod header;
pub mod parser;
pub mod pcm;

pub use command::{Command, FmPort, remap_psg_attenuation};
pub(crate) use header::samples_to_duration;
pub use header::{VgmHeader, VgmHeaderField};
pub use parser::VgmParser;
pub use pcm::{LoadMode, PcmDataBank};

/// `"Vgm "` read as a little-endian `u32`.
pub const VGM_MAGIC: u32 = 0x206D_6756;

/// Size of the classic fixed header; the command stream never starts earlier.
pub const VGM_HEADER_SIZE: u64 = 0x40;

/// All VGM timing is expressed in samples at this rate.
pub const VGM_SAMPLE_RATE: u32 = 44_100;
