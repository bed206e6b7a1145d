#![allow(dead_code)]

use std::cell::Cell;
use std::time::Duration;

use genesis_engine::board::SoundChips;
use genesis_engine::player::Clock;
use genesis_engine::vgm::{FmPort, VgmHeader};

pub const NTSC_PSG_CLOCK: u32 = 3_579_545;
pub const NTSC_FM_CLOCK: u32 = 7_670_453;

/// Builds a VGM byte image: a 0x40-byte header followed by commands.
pub struct VgmImage {
    header: VgmHeader,
    body: Vec<u8>,
    loop_at: Option<usize>,
    declare_eof: bool,
}

impl VgmImage {
    /// Both chips present.
    pub fn new() -> Self {
        VgmImage {
            header: VgmHeader {
                psg_clock: NTSC_PSG_CLOCK,
                fm_clock: NTSC_FM_CLOCK,
                ..Default::default()
            },
            body: Vec::new(),
            loop_at: None,
            declare_eof: true,
        }
    }

    pub fn psg_only() -> Self {
        let mut image = Self::new();
        image.header.fm_clock = 0;
        image
    }

    pub fn fm_only() -> Self {
        let mut image = Self::new();
        image.header.psg_clock = 0;
        image
    }

    pub fn total_samples(mut self, samples: u32) -> Self {
        self.header.total_samples = samples;
        self
    }

    /// Leave the EOF offset at 0 (unknown).
    pub fn without_eof(mut self) -> Self {
        self.declare_eof = false;
        self
    }

    pub fn psg(mut self, value: u8) -> Self {
        self.body.extend_from_slice(&[0x50, value]);
        self
    }

    pub fn fm(mut self, port: FmPort, register: u8, value: u8) -> Self {
        let op = match port {
            FmPort::Port0 => 0x52,
            FmPort::Port1 => 0x53,
        };
        self.body.extend_from_slice(&[op, register, value]);
        self
    }

    pub fn wait(mut self, samples: u16) -> Self {
        self.body.push(0x61);
        self.body.extend_from_slice(&samples.to_le_bytes());
        self
    }

    pub fn pcm_block(mut self, data: &[u8]) -> Self {
        self.body.extend_from_slice(&[0x67, 0x66, 0x00]);
        self.body
            .extend_from_slice(&(data.len() as u32).to_le_bytes());
        self.body.extend_from_slice(data);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    /// The loop point is the next command appended.
    pub fn mark_loop(mut self) -> Self {
        self.loop_at = Some(self.body.len());
        self
    }

    pub fn end(mut self) -> Self {
        self.body.push(0x66);
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        if let Some(at) = self.loop_at {
            self.header.loop_offset = (0x40 + at - 0x1C) as u32;
        }
        if self.declare_eof {
            self.header.eof_offset = (0x40 + self.body.len() - 0x04) as u32;
        }
        let mut bytes = self.header.to_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// A chip write observed by [`Recorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
    Reset,
    Fm(FmPort, u8, u8),
    Psg(u8),
    BeginDac,
    Dac(u8),
    EndDac,
    SilencePsg,
    MuteAll,
}

/// `SoundChips` double that records every call.
#[derive(Debug, Default)]
pub struct Recorder {
    pub writes: Vec<Write>,
}

impl Recorder {
    pub fn take(&mut self) -> Vec<Write> {
        std::mem::take(&mut self.writes)
    }

    /// Register writes only (FM, PSG, DAC samples).
    pub fn register_writes(&self) -> Vec<Write> {
        self.writes
            .iter()
            .copied()
            .filter(|w| matches!(w, Write::Fm(..) | Write::Psg(_) | Write::Dac(_)))
            .collect()
    }
}

impl SoundChips for Recorder {
    fn reset(&mut self) {
        self.writes.push(Write::Reset);
    }

    fn write_fm(&mut self, port: FmPort, register: u8, value: u8) {
        self.writes.push(Write::Fm(port, register, value));
    }

    fn write_psg(&mut self, byte: u8) {
        self.writes.push(Write::Psg(byte));
    }

    fn begin_dac_stream(&mut self) {
        self.writes.push(Write::BeginDac);
    }

    fn write_dac(&mut self, sample: u8) {
        self.writes.push(Write::Dac(sample));
    }

    fn end_dac_stream(&mut self) {
        self.writes.push(Write::EndDac);
    }

    fn silence_psg(&mut self) {
        self.writes.push(Write::SilencePsg);
    }

    fn mute_all(&mut self) {
        self.writes.push(Write::MuteAll);
    }
}

/// Clock advanced by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Advance by a whole number of 44.1 kHz samples (rounded up to the
    /// next nanosecond so the scheduler sees them all).
    pub fn advance_samples(&self, samples: u64) {
        let nanos = (samples * 1_000_000_000).div_ceil(44_100);
        self.advance(Duration::from_nanos(nanos));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
