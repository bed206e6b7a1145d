//! YM2612 / SN76489 hardware driver.
//!
//! Both chips share one 8-bit data bus fed by a serial shift register. The
//! remaining signals are discrete lines:
//!
//! - `PsgWrite` (WR_P): SN76489 write strobe, active low.
//! - `FmWrite` (WR_Y): YM2612 write strobe, active low.
//! - `FmReset` (IC_Y): YM2612 reset, active low.
//! - `FmAddress` (A0_Y): low selects the address register, high the data register.
//! - `FmPort` (A1_Y): YM2612 register bank.
//!
//! [`GenesisBoard`] turns chip-level writes into the exact line, shift and
//! delay sequence the chips need, on top of any [`BoardIo`] back end.
//! The PSG's data pins are wired to the shift register in reverse order, so
//! every PSG byte is bit-reversed before it is shifted out.
mod trace;

#[cfg(feature = "rpi")]
mod rpi;

#[cfg(feature = "rpi")]
pub use rpi::RppalIo;
pub use trace::{TraceIo, TraceStats};

use thiserror::Error;
use tracing::debug;

use crate::vgm::FmPort;

/// Settle time after a YM2612 address write.
pub const FM_BUSY_US: u32 = 5;
/// SN76489 write strobe width.
pub const PSG_BUSY_US: u32 = 9;
/// YM2612 reset pulse width.
pub const RESET_PULSE_US: u32 = 500;
/// Wait after releasing reset before the first write.
pub const RESET_SETTLE_US: u32 = 1000;

/// YM2612 DAC data register (port 0).
pub const REG_DAC_DATA: u8 = 0x2A;
/// YM2612 DAC enable register (port 0).
pub const REG_DAC_ENABLE: u8 = 0x2B;
/// YM2612 key on/off register (port 0).
pub const REG_KEY_ON_OFF: u8 = 0x28;

/// Attenuation-off latch bytes for the four PSG channels.
const PSG_SILENCE: [u8; 4] = [0x9F, 0xBF, 0xDF, 0xFF];
/// Channel selectors for the key on/off register (3 is unused).
const FM_CHANNELS: [u8; 6] = [0, 1, 2, 4, 5, 6];

#[derive(Debug, Error)]
pub enum HardwareError {
    #[cfg(feature = "rpi")]
    #[error("gpio: {0}")]
    Gpio(#[from] rppal::gpio::Error),
    #[cfg(feature = "rpi")]
    #[error("spi: {0}")]
    Spi(#[from] rppal::spi::Error),
    #[error("unsupported hardware configuration: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlLine {
    PsgWrite,
    FmWrite,
    FmReset,
    FmAddress,
    FmPort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// Physical access to the board: control lines, the shift register and a
/// microsecond delay. Implementations must not fail once constructed.
pub trait BoardIo {
    fn set_line(&mut self, line: ControlLine, level: Level);
    fn shift_out(&mut self, byte: u8);
    fn delay_us(&mut self, us: u32);
}

impl<T: BoardIo + ?Sized> BoardIo for &mut T {
    fn set_line(&mut self, line: ControlLine, level: Level) {
        (**self).set_line(line, level)
    }

    fn shift_out(&mut self, byte: u8) {
        (**self).shift_out(byte)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// Chip-level operations used by the player and the bridge.
pub trait SoundChips {
    /// Hardware reset of the YM2612, then PSG silence.
    fn reset(&mut self);
    fn write_fm(&mut self, port: FmPort, register: u8, value: u8);
    fn write_psg(&mut self, byte: u8);
    /// Select the DAC data register and keep it latched for sample writes.
    fn begin_dac_stream(&mut self);
    fn write_dac(&mut self, sample: u8);
    /// Release the DAC latch and hand channel 6 back to FM.
    fn end_dac_stream(&mut self);
    fn silence_psg(&mut self);
    /// Key off every FM channel, disable the DAC and silence the PSG.
    fn mute_all(&mut self);

    /// FM write that routes port 0 register 0x2A through the DAC path.
    fn write_fm_or_dac(&mut self, port: FmPort, register: u8, value: u8) {
        if port == FmPort::Port0 && register == REG_DAC_DATA {
            self.write_dac(value);
        } else {
            self.write_fm(port, register, value);
        }
    }
}

impl<T: SoundChips + ?Sized> SoundChips for &mut T {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn write_fm(&mut self, port: FmPort, register: u8, value: u8) {
        (**self).write_fm(port, register, value)
    }

    fn write_psg(&mut self, byte: u8) {
        (**self).write_psg(byte)
    }

    fn begin_dac_stream(&mut self) {
        (**self).begin_dac_stream()
    }

    fn write_dac(&mut self, sample: u8) {
        (**self).write_dac(sample)
    }

    fn end_dac_stream(&mut self) {
        (**self).end_dac_stream()
    }

    fn silence_psg(&mut self) {
        (**self).silence_psg()
    }

    fn mute_all(&mut self) {
        (**self).mute_all()
    }
}

/// Reverse the bit order of a byte (MSB becomes LSB).
pub const fn reverse_bits(b: u8) -> u8 {
    let b = ((b & 0xF0) >> 4) | ((b & 0x0F) << 4);
    let b = ((b & 0xCC) >> 2) | ((b & 0x33) << 2);
    ((b & 0xAA) >> 1) | ((b & 0x55) << 1)
}

/// A YM2612 + SN76489 board.
///
/// Only constructed through [`GenesisBoard::begin`], which drives the idle
/// line levels and resets the chips.
#[derive(Debug)]
pub struct GenesisBoard<I> {
    io: I,
    dac_latched: bool,
}

impl<I: BoardIo> GenesisBoard<I> {
    pub fn begin(io: I) -> Self {
        let mut board = GenesisBoard {
            io,
            dac_latched: false,
        };
        board.io.set_line(ControlLine::PsgWrite, Level::High);
        board.io.set_line(ControlLine::FmWrite, Level::High);
        board.io.set_line(ControlLine::FmReset, Level::High);
        board.io.set_line(ControlLine::FmAddress, Level::Low);
        board.io.set_line(ControlLine::FmPort, Level::Low);
        board.reset();
        debug!("board initialised");
        board
    }

    pub fn io(&self) -> &I {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut I {
        &mut self.io
    }

    pub fn into_io(self) -> I {
        self.io
    }

    pub fn is_dac_latched(&self) -> bool {
        self.dac_latched
    }

    fn strobe_fm(&mut self) {
        self.io.set_line(ControlLine::FmWrite, Level::Low);
        self.io.set_line(ControlLine::FmWrite, Level::High);
    }
}

impl<I: BoardIo> SoundChips for GenesisBoard<I> {
    fn reset(&mut self) {
        self.io.set_line(ControlLine::FmReset, Level::Low);
        self.io.delay_us(RESET_PULSE_US);
        self.io.set_line(ControlLine::FmReset, Level::High);
        self.io.delay_us(RESET_SETTLE_US);
        self.silence_psg();
        self.dac_latched = false;
    }

    fn write_fm(&mut self, port: FmPort, register: u8, value: u8) {
        self.dac_latched = false;
        self.io
            .set_line(ControlLine::FmPort, Level::from(port == FmPort::Port1));
        self.io.set_line(ControlLine::FmAddress, Level::Low);
        self.io.shift_out(register);
        self.strobe_fm();
        self.io.delay_us(FM_BUSY_US);
        self.io.set_line(ControlLine::FmAddress, Level::High);
        self.io.shift_out(value);
        self.strobe_fm();
    }

    fn write_psg(&mut self, byte: u8) {
        self.io.shift_out(reverse_bits(byte));
        self.io.set_line(ControlLine::PsgWrite, Level::Low);
        self.io.delay_us(PSG_BUSY_US);
        self.io.set_line(ControlLine::PsgWrite, Level::High);
    }

    fn begin_dac_stream(&mut self) {
        self.io.set_line(ControlLine::FmPort, Level::Low);
        self.io.set_line(ControlLine::FmAddress, Level::Low);
        self.io.shift_out(REG_DAC_DATA);
        self.strobe_fm();
        self.io.delay_us(FM_BUSY_US);
        self.io.set_line(ControlLine::FmAddress, Level::High);
        self.dac_latched = true;
    }

    fn write_dac(&mut self, sample: u8) {
        if !self.dac_latched {
            self.begin_dac_stream();
        }
        self.io.shift_out(sample);
        self.strobe_fm();
    }

    fn end_dac_stream(&mut self) {
        if self.dac_latched {
            self.dac_latched = false;
            self.write_fm(FmPort::Port0, REG_DAC_ENABLE, 0x00);
        }
    }

    fn silence_psg(&mut self) {
        for byte in PSG_SILENCE {
            self.write_psg(byte);
        }
    }

    fn mute_all(&mut self) {
        self.dac_latched = false;
        for ch in FM_CHANNELS {
            self.write_fm(FmPort::Port0, REG_KEY_ON_OFF, ch);
        }
        self.write_fm(FmPort::Port0, REG_DAC_DATA, 0x80);
        self.write_fm(FmPort::Port0, REG_DAC_ENABLE, 0x00);
        self.silence_psg();
    }
}
