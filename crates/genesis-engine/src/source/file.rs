use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::{ByteSource, read_fully};

/// An uncompressed `.vgm` file read through a buffered reader. Seekable.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    pos: u64,
    size: Option<u64>,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileSource {
            path: path.as_ref().to_path_buf(),
            reader: None,
            pos: 0,
            size: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn open(&mut self) -> io::Result<()> {
        self.close();
        let file = File::open(&self.path)?;
        self.size = Some(file.metadata()?.len());
        self.reader = Some(BufReader::new(file));
        self.pos = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.reader = None;
        self.size = None;
        self.pos = 0;
    }

    fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(0);
        };
        let n = read_fully(reader, buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn peek(&mut self) -> Option<u8> {
        let reader = self.reader.as_mut()?;
        reader.fill_buf().ok()?.first().copied()
    }

    fn seek(&mut self, pos: u64) -> bool {
        let (Some(reader), Some(size)) = (self.reader.as_mut(), self.size) else {
            return false;
        };
        if pos > size {
            return false;
        }
        match reader.seek(SeekFrom::Start(pos)) {
            Ok(p) => {
                self.pos = p;
                true
            }
            Err(_) => false,
        }
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn size(&self) -> Option<u64> {
        self.size
    }

    fn can_seek(&self) -> bool {
        true
    }
}
