//! Byte-range reader over one entry
//!
//! Borrows the package's file handle and exposes `[offset, offset + len)` as
//! an independent `Read + Seek` stream. Every read re-seeks the shared handle,
//! so several readers can be alive at once.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

#[derive(Debug)]
pub struct EntryReader<'a> {
    file: &'a File,
    offset: u64,
    len: u64,
    pos: u64,
}

impl<'a> EntryReader<'a> {
    pub(crate) fn new(file: &'a File, offset: u64, len: u64) -> Self {
        EntryReader {
            file,
            offset,
            len,
            pos: 0,
        }
    }

    /// Entry size in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute offset of the entry inside the package
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Current position relative to the entry start
    pub fn position(&self) -> u64 {
        self.pos
    }
}

impl Read for EntryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.len || buf.is_empty() {
            return Ok(0);
        }
        let want = (self.len - self.pos).min(buf.len() as u64) as usize;

        let mut file = self.file;
        file.seek(SeekFrom::Start(self.offset + self.pos))?;
        let n = file.read(&mut buf[..want])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for EntryReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::End(delta) => self.len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };
        match target {
            Some(p) => {
                self.pos = p;
                Ok(p)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}
