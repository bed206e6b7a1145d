use std::io;

use super::ByteSource;

/// A VGM image held in memory. Seekable.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    data: Vec<u8>,
    pos: usize,
    open: bool,
}

impl MemorySource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        MemorySource {
            data: data.into(),
            pos: 0,
            open: false,
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn remaining(&self) -> &[u8] {
        if self.open {
            &self.data[self.pos..]
        } else {
            &[]
        }
    }
}

impl ByteSource for MemorySource {
    fn open(&mut self) -> io::Result<()> {
        self.open = true;
        self.pos = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = self.remaining();
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }

    fn peek(&mut self) -> Option<u8> {
        self.remaining().first().copied()
    }

    fn seek(&mut self, pos: u64) -> bool {
        if !self.open || pos > self.data.len() as u64 {
            return false;
        }
        self.pos = pos as usize;
        true
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn can_seek(&self) -> bool {
        true
    }
}
