//! Commands decoded from the VGM stream.
//!
//! The parser turns each opcode into one `Command`. Register writes carry
//! everything the hardware driver needs; waits and the wait attached to a
//! DAC write are exposed uniformly through [`Command::wait_samples`].

/// YM2612 register bank selected by the A1 line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmPort {
    /// Channels 1-3 and the global registers.
    Port0,
    /// Channels 4-6.
    Port1,
}

impl FmPort {
    pub fn index(self) -> u8 {
        match self {
            FmPort::Port0 => 0,
            FmPort::Port1 => 1,
        }
    }
}

impl From<FmPort> for u8 {
    fn from(port: FmPort) -> Self {
        port.index()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// SN76489 write (0x50).
    PsgWrite(u8),
    /// YM2612 register write (0x52 port 0, 0x53 port 1).
    FmWrite {
        port: FmPort,
        register: u8,
        value: u8,
    },
    /// Wait for the given number of 44.1 kHz samples.
    Wait(u32),
    /// Data block (0x67). Type 0x00 payloads have already been loaded into
    /// the parser's PCM bank; other types were skipped.
    DataBlock { data_type: u8, size: u32 },
    /// PCM bank cursor moved (0xE0).
    PcmSeek(u32),
    /// One PCM bank byte for the YM2612 DAC followed by a short wait (0x8n).
    DacWrite { sample: u8, wait: u8 },
    /// A write for a chip this board does not have; operands were consumed.
    Skipped { opcode: u8 },
    EndOfStream,
}

impl Command {
    /// Samples to wait after executing this command.
    pub fn wait_samples(&self) -> u32 {
        match self {
            Command::Wait(n) => *n,
            Command::DacWrite { wait, .. } => *wait as u32,
            _ => 0,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Command::EndOfStream)
    }
}

/// Attenuation fix-up applied to PSG writes when a YM2612 shares the mix.
///
/// Only latch/attenuation bytes (`value & 0x90 == 0x90`) are touched; levels
/// 0 through 13 are lowered by two steps, 14 and 15 (near silent and off)
/// are left alone.
pub fn remap_psg_attenuation(value: u8) -> u8 {
    if value & 0x90 != 0x90 {
        return value;
    }
    let attenuation = value & 0x0F;
    if attenuation <= 13 {
        (value & 0xF0) | (attenuation + 2)
    } else {
        value
    }
}
