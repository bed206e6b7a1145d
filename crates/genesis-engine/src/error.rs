//! Errors raised while reading a VGM stream.
use thiserror::Error;

/// Error type returned by the header decoder and the VGM parser.
#[derive(Debug, Error)]
pub enum ParseError {
    /// An opcode needed more operand bytes than the source had left.
    ///
    /// - `opcode` is the command byte whose operands were truncated.
    /// - `offset` is the absolute source position of that opcode.
    #[error("unexpected end of input in opcode 0x{opcode:02X} at offset 0x{offset:X}")]
    UnexpectedEof { opcode: u8, offset: u64 },

    /// The four-byte file signature did not match `"Vgm "`.
    ///
    /// The contained array is the raw 4 bytes that were read.
    #[error("invalid ident: {0:?}")]
    InvalidIdent([u8; 4]),

    /// The source ended before the fixed 0x40-byte header was complete.
    #[error("header too short: {available} bytes (need 0x40)")]
    HeaderTooShort { available: usize },

    /// The header points the command stream somewhere it cannot start.
    #[error("invalid data offset: 0x{0:X}")]
    InvalidDataOffset(u64),

    /// `seek_to_loop` was called on a file without a loop point.
    #[error("file has no loop point")]
    NoLoopPoint,

    /// The byte source cannot reposition (for example a streaming decompressor).
    #[error("byte source does not support seeking")]
    SeekUnsupported,

    /// The underlying byte source failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
