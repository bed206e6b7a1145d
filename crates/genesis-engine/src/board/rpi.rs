use std::time::Duration;

use rppal::gpio::{Gpio, OutputPin};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::{debug, warn};

use super::{BoardIo, ControlLine, HardwareError, Level};
use crate::config::BoardConfig;

/// Raspberry Pi back end: control lines on GPIO, the shift register on SPI.
pub struct RppalIo {
    wr_psg: OutputPin,
    wr_fm: OutputPin,
    ic_fm: OutputPin,
    a0_fm: OutputPin,
    a1_fm: OutputPin,
    spi: Spi,
}

impl RppalIo {
    pub fn open(config: &BoardConfig) -> Result<Self, HardwareError> {
        let gpio = Gpio::new()?;
        let output = |pin: u8| -> Result<OutputPin, HardwareError> {
            Ok(gpio.get(pin)?.into_output())
        };

        let bus = match config.spi_bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            2 => Bus::Spi2,
            n => return Err(HardwareError::Unsupported(format!("spi bus {n}"))),
        };
        let slave = match config.spi_slave {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            n => return Err(HardwareError::Unsupported(format!("spi slave {n}"))),
        };

        let io = RppalIo {
            wr_psg: output(config.wr_psg)?,
            wr_fm: output(config.wr_fm)?,
            ic_fm: output(config.ic_fm)?,
            a0_fm: output(config.a0_fm)?,
            a1_fm: output(config.a1_fm)?,
            spi: Spi::new(bus, slave, config.spi_clock_hz, Mode::Mode0)?,
        };
        debug!(?bus, ?slave, clock_hz = config.spi_clock_hz, "opened board io");
        Ok(io)
    }

    fn pin(&mut self, line: ControlLine) -> &mut OutputPin {
        match line {
            ControlLine::PsgWrite => &mut self.wr_psg,
            ControlLine::FmWrite => &mut self.wr_fm,
            ControlLine::FmReset => &mut self.ic_fm,
            ControlLine::FmAddress => &mut self.a0_fm,
            ControlLine::FmPort => &mut self.a1_fm,
        }
    }
}

impl BoardIo for RppalIo {
    fn set_line(&mut self, line: ControlLine, level: Level) {
        let pin = self.pin(line);
        match level {
            Level::High => pin.set_high(),
            Level::Low => pin.set_low(),
        }
    }

    fn shift_out(&mut self, byte: u8) {
        if let Err(e) = self.spi.write(&[byte]) {
            warn!(byte, error = %e, "spi write dropped");
        }
    }

    fn delay_us(&mut self, us: u32) {
        spin_sleep::sleep(Duration::from_micros(us as u64));
    }
}
