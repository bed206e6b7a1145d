//! VGM header
//!
//! `VgmHeader` keeps the raw values of the classic 0x40-byte header exactly
//! as stored on disk. Several fields are offsets relative to their own
//! position in the header; the helper methods resolve those into absolute
//! stream positions so callers never have to remember the bases.
//!
//! Fields introduced by later format versions are kept as read, but only
//! honoured when the version says they exist: the YM2612 clock from 1.10,
//! the data offset from 1.50. Re-serializing a parsed header reproduces its
//! bytes.
use std::time::Duration;

use crate::error::ParseError;
use crate::vgm::{VGM_HEADER_SIZE, VGM_MAGIC, VGM_SAMPLE_RATE};

/// First version that carries the YM2612 clock at 0x2C.
const VERSION_FM_CLOCK: u32 = 0x0110;
/// First version that carries a relative data offset at 0x34.
const VERSION_DATA_OFFSET: u32 = 0x0150;
/// Stored `data_offset` used by files that do not declare one (data at 0x40).
const DEFAULT_DATA_OFFSET: u32 = 0x0C;

/// Header fields this crate reads, with their on-disk offsets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VgmHeaderField {
    Ident,
    EofOffset,
    Version,
    Sn76489Clock,
    Gd3Offset,
    TotalSamples,
    LoopOffset,
    LoopSamples,
    Rate,
    Ym2612Clock,
    DataOffset,
}

impl VgmHeaderField {
    pub fn offset(self) -> usize {
        match self {
            VgmHeaderField::Ident => 0x00,
            VgmHeaderField::EofOffset => 0x04,
            VgmHeaderField::Version => 0x08,
            VgmHeaderField::Sn76489Clock => 0x0C,
            VgmHeaderField::Gd3Offset => 0x14,
            VgmHeaderField::TotalSamples => 0x18,
            VgmHeaderField::LoopOffset => 0x1C,
            VgmHeaderField::LoopSamples => 0x20,
            VgmHeaderField::Rate => 0x24,
            VgmHeaderField::Ym2612Clock => 0x2C,
            VgmHeaderField::DataOffset => 0x34,
        }
    }

    /// Absolute position that a relative offset stored in this field is
    /// measured from.
    fn base(self) -> u64 {
        self.offset() as u64
    }

    /// Value of this field in a buffer of at least 0x40 bytes.
    fn read(self, header: &[u8]) -> u32 {
        let at = self.offset();
        u32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]])
    }

    fn write(self, header: &mut [u8], value: u32) {
        let at = self.offset();
        header[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
}

/// Raw header values of a VGM file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VgmHeader {
    /// Relative to 0x04. 0 means unknown: read until the source ends.
    pub eof_offset: u32,
    /// Packed BCD, e.g. `0x0150` for 1.50.
    pub version: u32,
    /// SN76489 clock in Hz; 0 means no PSG.
    pub psg_clock: u32,
    /// Relative to 0x14. 0 means no GD3 tag.
    pub gd3_offset: u32,
    pub total_samples: u32,
    /// Relative to 0x1C. 0 means the track does not loop.
    pub loop_offset: u32,
    pub loop_samples: u32,
    /// Recording rate (informational).
    pub rate: u32,
    /// YM2612 clock in Hz; 0 means no FM. Ignored before 1.10.
    pub fm_clock: u32,
    /// Relative to 0x34. Ignored before 1.50; 0 means data at 0x40.
    pub data_offset: u32,
}

impl Default for VgmHeader {
    fn default() -> Self {
        VgmHeader {
            eof_offset: 0,
            version: VERSION_DATA_OFFSET,
            psg_clock: 0,
            gd3_offset: 0,
            total_samples: 0,
            loop_offset: 0,
            loop_samples: 0,
            rate: 0,
            fm_clock: 0,
            data_offset: DEFAULT_DATA_OFFSET,
        }
    }
}

impl VgmHeader {
    /// Decode the classic header from the first 0x40 bytes of a file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() < VGM_HEADER_SIZE as usize {
            return Err(ParseError::HeaderTooShort {
                available: bytes.len(),
            });
        }

        let field = |f: VgmHeaderField| f.read(bytes);

        if field(VgmHeaderField::Ident) != VGM_MAGIC {
            let mut ident = [0u8; 4];
            ident.copy_from_slice(&bytes[0..4]);
            return Err(ParseError::InvalidIdent(ident));
        }

        Ok(VgmHeader {
            eof_offset: field(VgmHeaderField::EofOffset),
            version: field(VgmHeaderField::Version),
            psg_clock: field(VgmHeaderField::Sn76489Clock),
            gd3_offset: field(VgmHeaderField::Gd3Offset),
            total_samples: field(VgmHeaderField::TotalSamples),
            loop_offset: field(VgmHeaderField::LoopOffset),
            loop_samples: field(VgmHeaderField::LoopSamples),
            rate: field(VgmHeaderField::Rate),
            fm_clock: field(VgmHeaderField::Ym2612Clock),
            data_offset: field(VgmHeaderField::DataOffset),
        })
    }

    /// Serialize the fixed 0x40-byte header, every field as stored.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; VGM_HEADER_SIZE as usize];
        let fields = [
            (VgmHeaderField::Ident, VGM_MAGIC),
            (VgmHeaderField::EofOffset, self.eof_offset),
            (VgmHeaderField::Version, self.version),
            (VgmHeaderField::Sn76489Clock, self.psg_clock),
            (VgmHeaderField::Gd3Offset, self.gd3_offset),
            (VgmHeaderField::TotalSamples, self.total_samples),
            (VgmHeaderField::LoopOffset, self.loop_offset),
            (VgmHeaderField::LoopSamples, self.loop_samples),
            (VgmHeaderField::Rate, self.rate),
            (VgmHeaderField::Ym2612Clock, self.fm_clock),
            (VgmHeaderField::DataOffset, self.data_offset),
        ];
        for (field, value) in fields {
            field.write(&mut buf, value);
        }
        buf
    }

    pub fn has_psg(&self) -> bool {
        self.psg_clock != 0
    }

    pub fn has_fm(&self) -> bool {
        self.version >= VERSION_FM_CLOCK && self.fm_clock != 0
    }

    pub fn has_loop(&self) -> bool {
        self.loop_offset != 0
    }

    /// Absolute position of the first command byte.
    pub fn data_start(&self) -> u64 {
        if self.version >= VERSION_DATA_OFFSET && self.data_offset != 0 {
            VgmHeaderField::DataOffset.base() + self.data_offset as u64
        } else {
            VGM_HEADER_SIZE
        }
    }

    /// Absolute loop position, `None` when the track does not loop.
    pub fn loop_start(&self) -> Option<u64> {
        self.has_loop()
            .then(|| VgmHeaderField::LoopOffset.base() + self.loop_offset as u64)
    }

    /// Absolute end-of-file position, `None` when the header leaves it unknown.
    pub fn eof_position(&self) -> Option<u64> {
        (self.eof_offset != 0)
            .then(|| VgmHeaderField::EofOffset.base() + self.eof_offset as u64)
    }

    /// Absolute position of the GD3 tag, if any.
    pub fn gd3_position(&self) -> Option<u64> {
        (self.gd3_offset != 0)
            .then(|| VgmHeaderField::Gd3Offset.base() + self.gd3_offset as u64)
    }

    /// Version in dotted form, e.g. `"1.71"`.
    pub fn version_string(&self) -> String {
        format!("{:x}.{:02x}", self.version >> 8, self.version & 0xFF)
    }

    /// Length of one pass through the track.
    pub fn duration(&self) -> Duration {
        samples_to_duration(self.total_samples as u64)
    }

    /// Length of the looped section.
    pub fn loop_duration(&self) -> Duration {
        samples_to_duration(self.loop_samples as u64)
    }
}

pub(crate) fn samples_to_duration(samples: u64) -> Duration {
    Duration::from_nanos(samples * 1_000_000_000 / VGM_SAMPLE_RATE as u64)
}
