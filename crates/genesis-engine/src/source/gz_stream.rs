use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use super::{ByteSource, read_fully};

/// Streaming gzip decompression with a one-byte lookahead.
///
/// Uses constant memory regardless of file size but cannot seek, so tracks
/// played from it cannot loop.
pub struct GzStreamSource {
    path: PathBuf,
    decoder: Option<GzDecoder<BufReader<File>>>,
    lookahead: Option<u8>,
    pos: u64,
}

impl GzStreamSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        GzStreamSource {
            path: path.as_ref().to_path_buf(),
            decoder: None,
            lookahead: None,
            pos: 0,
        }
    }
}

impl ByteSource for GzStreamSource {
    fn open(&mut self) -> io::Result<()> {
        self.close();
        let file = File::open(&self.path)?;
        self.decoder = Some(GzDecoder::new(BufReader::new(file)));
        Ok(())
    }

    fn close(&mut self) {
        self.decoder = None;
        self.lookahead = None;
        self.pos = 0;
    }

    fn is_open(&self) -> bool {
        self.decoder.is_some()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(0);
        };
        let mut filled = 0;
        if let Some(b) = self.lookahead.take() {
            buf[0] = b;
            filled = 1;
        }
        filled += read_fully(decoder, &mut buf[filled..])?;
        self.pos += filled as u64;
        Ok(filled)
    }

    fn peek(&mut self) -> Option<u8> {
        if self.lookahead.is_none() {
            let decoder = self.decoder.as_mut()?;
            let mut b = [0u8; 1];
            if read_fully(decoder, &mut b).ok()? == 1 {
                self.lookahead = Some(b[0]);
            }
        }
        self.lookahead
    }

    fn position(&self) -> u64 {
        self.pos
    }
}
