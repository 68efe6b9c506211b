//! Disk I/O operations for package files

use crate::core::error::Result;
use crate::core::header::{Header, HEADER_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Chunk size used when relocating content inside the file
const COPY_CHUNK: usize = 64 * 1024;

/// Disk-backed package storage
///
/// All access is absolute-offset: seek, then one contiguous read or write.
#[derive(Debug)]
pub struct PackageFile {
    file: File,
    path: PathBuf,
}

impl PackageFile {
    /// Create a new package file containing only `header`
    pub fn create<P: AsRef<Path>>(path: P, header: &Header) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        file.write_all(&header.to_bytes())?;
        file.flush()?;

        Ok(PackageFile {
            file,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Open an existing package file
    pub fn open<P: AsRef<Path>>(path: P, writable: bool) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(writable).open(&path)?;

        Ok(PackageFile {
            file,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Read the header at offset 0
    pub fn read_header(&mut self) -> Result<Header> {
        let mut buffer = vec![0u8; HEADER_SIZE];
        self.read_at(0, &mut buffer)?;
        Header::from_bytes(&buffer)
    }

    /// Write the header at offset 0
    pub fn write_header(&mut self, header: &Header) -> Result<()> {
        self.write_at(0, &header.to_bytes())
    }

    /// Fill `buf` from `offset`
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    /// Write all of `data` at `offset`
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Move `len` bytes from `src` down to `dst`
    ///
    /// Only backward moves (`dst <= src`) are supported; copying front to
    /// back in chunks is then safe for overlapping ranges.
    pub fn copy_back(&mut self, src: u64, dst: u64, len: u64) -> Result<()> {
        debug_assert!(dst <= src);
        let mut buffer = vec![0u8; COPY_CHUNK.min(len as usize)];
        let mut done = 0u64;
        while done < len {
            let chunk = (len - done).min(buffer.len() as u64) as usize;
            self.read_at(src + done, &mut buffer[..chunk])?;
            self.write_at(dst + done, &buffer[..chunk])?;
            done += chunk as u64;
        }
        Ok(())
    }

    /// Physical size of the file
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Cut or extend the file to exactly `len` bytes
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Shared handle for byte-range readers
    pub fn handle(&self) -> &File {
        &self.file
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sync all writes to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}
