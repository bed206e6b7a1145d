//! Emulator bridge protocol.
//!
//! A peer (typically an emulator) streams raw chip writes using VGM opcodes
//! over any byte channel. The peer paces itself, so wait opcodes are read
//! and dropped.
//!
//! | Peer sends | Operands | Board action | Reply |
//! |---|---|---|---|
//! | `0xAA` PING | | reset | `0x0F`, board id, `0x06` |
//! | `0x50` | value | PSG write | |
//! | `0x52` / `0x53` | register, value | FM write (port 0 `0x2A` goes to the DAC) | |
//! | `0x66` | | reset | `0x06` |
//! | `0x61` | 2 bytes | | |
//! | `0x62`, `0x63`, `0x70..=0x7F` | | | |
//!
//! Register writes received before the first PING are read and ignored.
//! Any other opcode desynchronises the session: the board is reset and
//! incoming bytes are discarded until the next PING.
use std::io::{self, Read, Write};

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::board::SoundChips;
use crate::vgm::FmPort;

pub const PING: u8 = 0xAA;
pub const ACK: u8 = 0x0F;
pub const READY: u8 = 0x06;
pub const PSG_WRITE: u8 = 0x50;
pub const FM_PORT0_WRITE: u8 = 0x52;
pub const FM_PORT1_WRITE: u8 = 0x53;
pub const END_STREAM: u8 = 0x66;

/// Board id reported by the reference Raspberry Pi board.
pub const DEFAULT_BOARD_ID: u8 = 6;
pub const DEFAULT_TCP_PORT: u16 = 7654;
pub const DEFAULT_UNIX_SOCKET: &str = "/tmp/genesis_bridge.sock";

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Counters for one peer connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub handshakes: u64,
    pub psg_writes: u64,
    pub fm_writes: u64,
    /// Writes received before the handshake.
    pub ignored_writes: u64,
    pub stream_resets: u64,
    pub protocol_errors: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    /// Connected, no PING yet.
    Idle,
    Active,
    /// After a protocol error; waiting for PING.
    Resync,
}

/// One peer connection driving a borrowed board.
pub struct BridgeSession<'a, D: ?Sized, T> {
    board: &'a mut D,
    channel: T,
    board_id: u8,
    link: Link,
    stats: SessionStats,
}

impl<'a, D: SoundChips + ?Sized, T: Read + Write> BridgeSession<'a, D, T> {
    pub fn new(board: &'a mut D, channel: T) -> Self {
        BridgeSession {
            board,
            channel,
            board_id: DEFAULT_BOARD_ID,
            link: Link::Idle,
            stats: SessionStats::default(),
        }
    }

    pub fn with_board_id(mut self, board_id: u8) -> Self {
        self.board_id = board_id;
        self
    }

    /// Serve the peer until it disconnects.
    ///
    /// The board is muted and reset on every exit path.
    pub fn run(mut self) -> Result<SessionStats, BridgeError> {
        let result = self.serve();
        self.board.mute_all();
        self.board.reset();
        match &result {
            Ok(()) => debug!(stats = ?self.stats, "peer disconnected"),
            Err(e) => warn!(error = %e, "bridge session failed"),
        }
        result.map(|()| self.stats)
    }

    fn serve(&mut self) -> Result<(), BridgeError> {
        while let Some(opcode) = self.read_byte()? {
            if self.link == Link::Resync && opcode != PING {
                trace!(opcode, "discarded while resyncing");
                continue;
            }
            if !self.handle(opcode)? {
                break;
            }
        }
        Ok(())
    }

    /// Returns `false` when the peer closed the channel mid-command.
    fn handle(&mut self, opcode: u8) -> Result<bool, BridgeError> {
        match opcode {
            PING => {
                self.board.reset();
                self.send(&[ACK, self.board_id, READY])?;
                self.link = Link::Active;
                self.stats.handshakes += 1;
                info!(board_id = self.board_id, "bridge handshake");
            }
            PSG_WRITE => {
                let Some([value]) = self.read_operands::<1>()? else {
                    return Ok(false);
                };
                if self.accepts_writes() {
                    self.board.write_psg(value);
                    self.stats.psg_writes += 1;
                }
            }
            FM_PORT0_WRITE | FM_PORT1_WRITE => {
                let Some([register, value]) = self.read_operands::<2>()? else {
                    return Ok(false);
                };
                let port = if opcode == FM_PORT0_WRITE {
                    FmPort::Port0
                } else {
                    FmPort::Port1
                };
                if self.accepts_writes() {
                    self.board.write_fm_or_dac(port, register, value);
                    self.stats.fm_writes += 1;
                }
            }
            END_STREAM => {
                self.board.reset();
                self.send(&[READY])?;
                self.stats.stream_resets += 1;
                debug!("end of stream");
            }
            0x61 => {
                if self.read_operands::<2>()?.is_none() {
                    return Ok(false);
                }
            }
            0x62 | 0x63 | 0x70..=0x7F => {}
            _ => {
                warn!(opcode, "protocol error, resyncing");
                self.board.reset();
                self.link = Link::Resync;
                self.stats.protocol_errors += 1;
            }
        }
        Ok(true)
    }

    fn accepts_writes(&mut self) -> bool {
        if self.link == Link::Active {
            true
        } else {
            self.stats.ignored_writes += 1;
            false
        }
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.channel.write_all(bytes)?;
        self.channel.flush()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.read_operands::<1>()?.map(|[b]| b))
    }

    /// Read exactly `N` bytes, `None` if the channel closes first.
    fn read_operands<const N: usize>(&mut self) -> io::Result<Option<[u8; N]>> {
        let mut buf = [0u8; N];
        match self.channel.read_exact(&mut buf) {
            Ok(()) => Ok(Some(buf)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        }
    }
}
