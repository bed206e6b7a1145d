//! Streaming VGM command parser.
//!
//! `VgmParser` pulls bytes from a [`ByteSource`] one opcode at a time, so a
//! file never needs to be held in memory as a whole (unless the source
//! itself chooses to, like `VgzSource`). YM2612 PCM data blocks are loaded
//! into the parser's own [`PcmDataBank`] as they are encountered, and DAC
//! commands read from it.
//! Each block is appended rather than replacing the bank, and the bank
//! cursor is left where it was, so offsets into earlier blocks stay valid
//! in files that split their samples across several blocks.
//!
//! Opcodes for chips other than the YM2612 and SN76489 are skipped with
//! their exact operand length and reported as [`Command::Skipped`], keeping
//! the stream aligned.
use tracing::{debug, trace};

use crate::error::ParseError;
use crate::source::ByteSource;
use crate::vgm::command::{Command, FmPort, remap_psg_attenuation};
use crate::vgm::header::VgmHeader;
use crate::vgm::pcm::{LoadMode, PcmDataBank};
use crate::vgm::VGM_HEADER_SIZE;

/// Data block type holding uncompressed YM2612 PCM samples.
const DATA_TYPE_YM2612_PCM: u8 = 0x00;
/// Compatibility byte following 0x67.
const DATA_BLOCK_GUARD: u8 = 0x66;

pub struct VgmParser<S> {
    source: S,
    header: Option<VgmHeader>,
    pcm: PcmDataBank,
    finished: bool,
    loop_count: u32,
    remap_psg: bool,
}

impl<S: ByteSource> VgmParser<S> {
    pub fn new(source: S) -> Self {
        VgmParser {
            source,
            header: None,
            pcm: PcmDataBank::new(),
            finished: false,
            loop_count: 0,
            remap_psg: false,
        }
    }

    /// Read and validate the header, then position the source at the first
    /// command. Opens the source if the caller has not.
    pub fn parse_header(&mut self) -> Result<VgmHeader, ParseError> {
        if !self.source.is_open() {
            self.source.open()?;
        } else if self.source.position() != 0 && !self.source.seek(0) {
            return Err(ParseError::SeekUnsupported);
        }

        let mut buf = [0u8; VGM_HEADER_SIZE as usize];
        let n = self.source.read(&mut buf)?;
        let header = VgmHeader::from_bytes(&buf[..n])?;

        let data_start = header.data_start();
        if data_start < VGM_HEADER_SIZE {
            return Err(ParseError::InvalidDataOffset(data_start));
        }
        if let Some(size) = self.source.size()
            && data_start > size
        {
            return Err(ParseError::InvalidDataOffset(data_start));
        }

        let pos = self.source.position();
        if data_start != pos {
            let positioned = if self.source.can_seek() {
                self.source.seek(data_start)
            } else {
                self.source.skip(data_start - pos)? == data_start - pos
            };
            if !positioned {
                return Err(ParseError::InvalidDataOffset(data_start));
            }
        }

        debug!(
            version = %header.version_string(),
            fm = header.has_fm(),
            psg = header.has_psg(),
            total_samples = header.total_samples,
            data_start,
            "parsed vgm header"
        );

        self.pcm.clear();
        self.finished = false;
        self.loop_count = 0;
        self.remap_psg = header.has_fm() && header.has_psg();
        self.header = Some(header.clone());
        Ok(header)
    }

    /// Decode the next command.
    ///
    /// Once the stream has ended (0x66, declared EOF, exhausted source or a
    /// decode error) every further call returns `EndOfStream`.
    pub fn next_command(&mut self) -> Result<Command, ParseError> {
        if self.finished {
            return Ok(Command::EndOfStream);
        }
        let result = self.decode();
        if result.is_err() {
            self.finished = true;
        }
        result
    }

    /// Jump back to the loop point.
    pub fn seek_to_loop(&mut self) -> Result<(), ParseError> {
        let target = self
            .header
            .as_ref()
            .and_then(VgmHeader::loop_start)
            .ok_or(ParseError::NoLoopPoint)?;
        if !self.source.can_seek() {
            return Err(ParseError::SeekUnsupported);
        }
        if !self.source.seek(target) {
            return Err(ParseError::InvalidDataOffset(target));
        }
        self.finished = false;
        self.loop_count += 1;
        debug!(loop_count = self.loop_count, position = target, "seek to loop point");
        Ok(())
    }

    pub fn header(&self) -> Option<&VgmHeader> {
        self.header.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn has_loop(&self) -> bool {
        self.header.as_ref().is_some_and(VgmHeader::has_loop)
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn pcm_bank(&self) -> &PcmDataBank {
        &self.pcm
    }

    pub fn position(&self) -> u64 {
        self.source.position()
    }

    pub fn into_source(self) -> S {
        self.source
    }

    fn finish(&mut self) -> Result<Command, ParseError> {
        self.finished = true;
        Ok(Command::EndOfStream)
    }

    fn decode(&mut self) -> Result<Command, ParseError> {
        let offset = self.source.position();
        if let Some(eof) = self.header.as_ref().and_then(VgmHeader::eof_position)
            && offset >= eof
        {
            return self.finish();
        }
        let Some(opcode) = self.source.read_u8()? else {
            return self.finish();
        };

        let command = match opcode {
            0x50 => {
                let [v] = self.operands::<1>(opcode, offset)?;
                let v = if self.remap_psg {
                    remap_psg_attenuation(v)
                } else {
                    v
                };
                Command::PsgWrite(v)
            }
            0x52 | 0x53 => {
                let [register, value] = self.operands::<2>(opcode, offset)?;
                let port = if opcode == 0x52 {
                    FmPort::Port0
                } else {
                    FmPort::Port1
                };
                Command::FmWrite {
                    port,
                    register,
                    value,
                }
            }
            0x61 => {
                let [lo, hi] = self.operands::<2>(opcode, offset)?;
                Command::Wait(u16::from_le_bytes([lo, hi]) as u32)
            }
            0x62 => Command::Wait(735),
            0x63 => Command::Wait(882),
            0x66 => return self.finish(),
            0x67 => self.data_block(offset)?,
            0x70..=0x7F => Command::Wait((opcode & 0x0F) as u32 + 1),
            0x80..=0x8F => Command::DacWrite {
                sample: self.pcm.read_byte(),
                wait: opcode & 0x0F,
            },
            0xE0 => {
                let bytes = self.operands::<4>(opcode, offset)?;
                let target = u32::from_le_bytes(bytes);
                self.pcm.seek(target);
                Command::PcmSeek(target)
            }
            _ => {
                let len = skipped_operand_len(opcode);
                if len == 0 {
                    debug!(opcode, offset, "unknown opcode");
                } else {
                    self.skip_operands(opcode, offset, len)?;
                }
                Command::Skipped { opcode }
            }
        };
        trace!(offset, ?command, "command");
        Ok(command)
    }

    fn data_block(&mut self, offset: u64) -> Result<Command, ParseError> {
        let [guard, data_type, s0, s1, s2, s3] = self.operands::<6>(0x67, offset)?;
        if guard != DATA_BLOCK_GUARD {
            debug!(guard, offset, "unexpected data block guard byte");
        }
        let size = u32::from_le_bytes([s0, s1, s2, s3]);

        if data_type == DATA_TYPE_YM2612_PCM {
            let payload = self.read_payload(size, offset)?;
            self.pcm.load(&payload, LoadMode::Append);
            debug!(size, bank_len = self.pcm.len(), "loaded pcm data block");
        } else {
            self.skip_operands(0x67, offset, size as u64)?;
            debug!(data_type, size, "skipped data block");
        }
        Ok(Command::DataBlock { data_type, size })
    }

    fn read_payload(&mut self, size: u32, offset: u64) -> Result<Vec<u8>, ParseError> {
        let size = size as u64;
        if let Some(total) = self.source.size()
            && self.source.position().saturating_add(size) > total
        {
            return Err(ParseError::UnexpectedEof {
                opcode: 0x67,
                offset,
            });
        }

        let mut payload = Vec::new();
        let mut chunk = [0u8; 4096];
        let mut remaining = size;
        while remaining > 0 {
            let want = remaining.min(chunk.len() as u64) as usize;
            let n = self.source.read(&mut chunk[..want])?;
            if n == 0 {
                return Err(ParseError::UnexpectedEof {
                    opcode: 0x67,
                    offset,
                });
            }
            payload.extend_from_slice(&chunk[..n]);
            remaining -= n as u64;
        }
        Ok(payload)
    }

    fn operands<const N: usize>(&mut self, opcode: u8, offset: u64) -> Result<[u8; N], ParseError> {
        let mut buf = [0u8; N];
        if self.source.read(&mut buf)? != N {
            return Err(ParseError::UnexpectedEof { opcode, offset });
        }
        Ok(buf)
    }

    fn skip_operands(&mut self, opcode: u8, offset: u64, len: u64) -> Result<(), ParseError> {
        if self.source.skip(len)? != len {
            return Err(ParseError::UnexpectedEof { opcode, offset });
        }
        Ok(())
    }
}

impl<S: ByteSource> Iterator for VgmParser<S> {
    type Item = Result<Command, ParseError>;

    /// Yields commands until the end of the stream, which is not itself
    /// yielded.
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_command() {
            Ok(Command::EndOfStream) => None,
            other => Some(other),
        }
    }
}

/// Operand length of opcodes that target chips this board does not carry.
/// 0 for opcodes with no known operands.
fn skipped_operand_len(opcode: u8) -> u64 {
    match opcode {
        0x30..=0x3F | 0x4F | 0x94 => 1,
        0x40..=0x4E | 0x51 | 0x54..=0x5F | 0xA0..=0xBF => 2,
        0xC0..=0xDF => 3,
        0x90 | 0x91 | 0x95 | 0xE1..=0xFF => 4,
        0x92 => 5,
        0x93 => 10,
        0x68 => 11,
        _ => 0,
    }
}
