//! PCM data bank for YM2612 DAC playback.
//!
//! VGM files ship DAC samples in data blocks (opcode 0x67, type 0x00) and
//! then play them back with 0x8n commands, each of which consumes one byte
//! at the bank cursor. 0xE0 repositions the cursor.
//!
//! The bank never fails: reading past the end yields the DAC midpoint so a
//! malformed stream plays silence instead of aborting playback.

/// Unsigned 8-bit PCM midpoint.
pub const PCM_SILENCE: u8 = 0x80;

/// How a new data block is combined with what the bank already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Concatenate; the cursor is left where it was.
    #[default]
    Append,
    /// Discard the old contents and rewind the cursor.
    Replace,
}

#[derive(Debug, Default, Clone)]
pub struct PcmDataBank {
    data: Vec<u8>,
    cursor: usize,
}

impl PcmDataBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, bytes: &[u8], mode: LoadMode) {
        match mode {
            LoadMode::Append => self.data.extend_from_slice(bytes),
            LoadMode::Replace => {
                self.data.clear();
                self.data.extend_from_slice(bytes);
                self.cursor = 0;
            }
        }
    }

    /// Byte at the cursor, advancing it; `PCM_SILENCE` once exhausted.
    pub fn read_byte(&mut self) -> u8 {
        match self.data.get(self.cursor) {
            Some(&b) => {
                self.cursor += 1;
                b
            }
            None => PCM_SILENCE,
        }
    }

    /// Move the cursor, clamped to `[0, len]`.
    pub fn seek(&mut self, offset: u32) {
        self.cursor = (offset as usize).min(self.data.len());
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }
}
