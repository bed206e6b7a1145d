use tracing::trace;

use super::{BoardIo, ControlLine, Level};

/// Counters kept by [`TraceIo`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceStats {
    pub line_changes: u64,
    pub bytes_shifted: u64,
    pub delayed_us: u64,
}

/// A board without hardware.
///
/// Logs every bus transaction at `trace` level and counts them. Delays are
/// accounted for but not slept, so a dry run finishes at playback speed
/// set by the scheduler alone.
#[derive(Debug, Default)]
pub struct TraceIo {
    stats: TraceStats,
}

impl TraceIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> TraceStats {
        self.stats
    }
}

impl BoardIo for TraceIo {
    fn set_line(&mut self, line: ControlLine, level: Level) {
        self.stats.line_changes += 1;
        trace!(?line, ?level, "line");
    }

    fn shift_out(&mut self, byte: u8) {
        self.stats.bytes_shifted += 1;
        trace!(byte = format_args!("0x{byte:02X}"), "shift");
    }

    fn delay_us(&mut self, us: u32) {
        self.stats.delayed_us += us as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{GenesisBoard, SoundChips};
    use crate::vgm::FmPort;

    #[test]
    fn test_counts_transactions() {
        let mut board = GenesisBoard::begin(TraceIo::new());
        let after_begin = board.io().stats();
        // 5 idle levels, 2 reset edges, 4 PSG writes with 2 edges each
        assert_eq!(after_begin.line_changes, 5 + 2 + 8);
        assert_eq!(after_begin.bytes_shifted, 4);
        assert_eq!(after_begin.delayed_us, 500 + 1000 + 4 * 9);

        board.write_fm(FmPort::Port0, 0x22, 0x08);
        let stats = board.io().stats();
        assert_eq!(stats.bytes_shifted, after_begin.bytes_shifted + 2);
        assert_eq!(stats.line_changes, after_begin.line_changes + 7);
        assert_eq!(stats.delayed_us, after_begin.delayed_us + 5);
    }
}
