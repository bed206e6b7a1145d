use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::debug;

use super::{ByteSource, MemorySource};

/// A gzip-compressed `.vgz` file.
///
/// The whole file is decompressed on `open` so the result is seekable and
/// loop points work exactly as with an uncompressed file.
#[derive(Debug)]
pub struct VgzSource {
    path: PathBuf,
    inner: Option<MemorySource>,
}

impl VgzSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        VgzSource {
            path: path.as_ref().to_path_buf(),
            inner: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for VgzSource {
    fn open(&mut self) -> io::Result<()> {
        self.inner = None;
        let file = File::open(&self.path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut data = Vec::new();
        decoder.read_to_end(&mut data)?;
        debug!(path = %self.path.display(), bytes = data.len(), "decompressed vgz");

        let mut inner = MemorySource::new(data);
        inner.open()?;
        self.inner = Some(inner);
        Ok(())
    }

    fn close(&mut self) {
        self.inner = None;
    }

    fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.as_mut() {
            Some(inner) => inner.read(buf),
            None => Ok(0),
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.inner.as_mut()?.peek()
    }

    fn seek(&mut self, pos: u64) -> bool {
        self.inner.as_mut().is_some_and(|inner| inner.seek(pos))
    }

    fn position(&self) -> u64 {
        self.inner.as_ref().map_or(0, |inner| inner.position())
    }

    fn size(&self) -> Option<u64> {
        self.inner.as_ref()?.size()
    }

    fn can_seek(&self) -> bool {
        true
    }
}
