//! Byte sources feeding the VGM parser.
//!
//! A `ByteSource` is a forward (and optionally random-access) byte stream
//! with a known or unknown total size. The parser only ever talks to this
//! trait, so playback works the same from a plain file, a gzip-compressed
//! `.vgz`, an in-memory image, or a streaming decompressor that cannot seek.
//!
//! Offsets passed to `seek` and reported by `position` are absolute byte
//! positions from the start of the (decompressed) VGM image.
mod file;
mod gz_stream;
mod memory;
mod vgz;

pub use file::FileSource;
pub use gz_stream::GzStreamSource;
pub use memory::MemorySource;
pub use vgz::VgzSource;

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Gzip stream signature (`.vgz` files are plain gzip).
pub(crate) const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Common interface for reading VGM data.
pub trait ByteSource {
    /// Open the underlying resource. Reopening rewinds to position 0.
    fn open(&mut self) -> io::Result<()>;

    /// Release the underlying resource. Safe to call when already closed.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Read up to `buf.len()` bytes.
    ///
    /// Returns fewer bytes than requested only at the end of the stream;
    /// a closed source reads as empty.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Return the next byte without consuming it, or `None` at end of stream.
    fn peek(&mut self) -> Option<u8>;

    /// Whether at least one more byte can be read.
    fn available(&mut self) -> bool {
        self.peek().is_some()
    }

    /// Move to absolute position `pos`.
    ///
    /// Returns `false` when the source cannot seek or `pos` lies beyond the
    /// end of a sized source; the read position is unchanged in that case.
    fn seek(&mut self, _pos: u64) -> bool {
        false
    }

    /// Current absolute read position.
    fn position(&self) -> u64;

    /// Total size in bytes when known.
    fn size(&self) -> Option<u64> {
        None
    }

    fn can_seek(&self) -> bool {
        false
    }

    /// Read one byte, `None` at end of stream.
    fn read_u8(&mut self) -> io::Result<Option<u8>> {
        let mut b = [0u8; 1];
        Ok((self.read(&mut b)? == 1).then_some(b[0]))
    }

    /// Read a little-endian `u16`, `None` if the stream ends first.
    fn read_u16_le(&mut self) -> io::Result<Option<u16>> {
        let mut b = [0u8; 2];
        Ok((self.read(&mut b)? == 2).then(|| u16::from_le_bytes(b)))
    }

    /// Read a little-endian `u32`, `None` if the stream ends first.
    fn read_u32_le(&mut self) -> io::Result<Option<u32>> {
        let mut b = [0u8; 4];
        Ok((self.read(&mut b)? == 4).then(|| u32::from_le_bytes(b)))
    }

    /// Discard `count` bytes and return how many were actually skipped.
    ///
    /// Seekable sources with a known size jump directly; everything else
    /// reads and drops the bytes.
    fn skip(&mut self, count: u64) -> io::Result<u64> {
        if self.can_seek()
            && let Some(size) = self.size()
        {
            let target = self.position().saturating_add(count).min(size);
            let skipped = target - self.position();
            if self.seek(target) {
                return Ok(skipped);
            }
        }

        let mut scratch = [0u8; 256];
        let mut remaining = count;
        while remaining > 0 {
            let chunk = remaining.min(scratch.len() as u64) as usize;
            let n = self.read(&mut scratch[..chunk])?;
            if n == 0 {
                break;
            }
            remaining -= n as u64;
        }
        Ok(count - remaining)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn open(&mut self) -> io::Result<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn peek(&mut self) -> Option<u8> {
        (**self).peek()
    }

    fn available(&mut self) -> bool {
        (**self).available()
    }

    fn seek(&mut self, pos: u64) -> bool {
        (**self).seek(pos)
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn size(&self) -> Option<u64> {
        (**self).size()
    }

    fn can_seek(&self) -> bool {
        (**self).can_seek()
    }
}

/// Fill `buf` from `reader`, stopping early only at end of stream.
pub(crate) fn read_fully<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Pick a source for `path`: gzip-compressed files (by `.vgz`/`.gz`
/// extension or by the gzip signature) get a `VgzSource`, everything else a
/// `FileSource`. The returned source is not opened yet.
pub fn open_path(path: impl AsRef<Path>) -> Box<dyn ByteSource> {
    let path = path.as_ref();
    let by_extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("vgz") || s.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    if by_extension || has_gzip_magic(path) {
        Box::new(VgzSource::new(path))
    } else {
        Box::new(FileSource::new(path))
    }
}

fn has_gzip_magic(path: &Path) -> bool {
    let mut magic = [0u8; 2];
    File::open(path)
        .and_then(|mut f| read_fully(&mut f, &mut magic))
        .map(|n| n == 2 && magic == GZIP_MAGIC)
        .unwrap_or(false)
}
