#![doc = include_str!("../README.md")]
//!
//! Data flows one way during playback:
//!
//! ```text
//! ByteSource -> VgmParser (owns the PCM bank) -> Player (paced by a Clock) -> SoundChips
//! ```
//!
//! The bridge skips parser and player and writes to the board directly.
//! The board handle is an ordinary owned value: a `Player` owns it while a
//! track plays, a `BridgeSession` borrows it for one peer connection.
//!
//! Example: dry-run playback of an in-memory image
//!
//! ```rust
//! use genesis_engine::board::{GenesisBoard, TraceIo};
//! use genesis_engine::player::{MonotonicClock, Player};
//! use genesis_engine::source::MemorySource;
//! use genesis_engine::vgm::VgmHeader;
//!
//! let header = VgmHeader {
//!     psg_clock: 3_579_545,
//!     total_samples: 735,
//!     ..Default::default()
//! };
//! let mut image = header.to_bytes();
//! image.extend_from_slice(&[0x50, 0x9F, 0x62, 0x66]);
//!
//! let board = GenesisBoard::begin(TraceIo::new());
//! let mut player = Player::new(board, MonotonicClock::new());
//! player.play(MemorySource::new(image)).unwrap();
//! assert!(player.is_playing());
//! player.update();
//! player.stop();
//! assert!(player.is_stopped());
//! ```
pub mod board;
pub mod bridge;
pub mod config;
mod error;
pub mod player;
pub mod source;
pub mod vgm;

pub use board::{BoardIo, GenesisBoard, HardwareError, SoundChips};
pub use bridge::{BridgeError, BridgeSession, SessionStats};
pub use config::{BoardConfig, ConfigError};
pub use error::ParseError;
pub use player::{Clock, MonotonicClock, PlayError, PlaybackState, Player};
pub use source::{ByteSource, open_path};
pub use vgm::{Command, FmPort, VgmHeader, VgmParser};
