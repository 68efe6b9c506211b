use crate::core::entry::ENTRY_SIZE;
use crate::core::error::{PackageError, Result};

pub const MAGIC: [u8; 4] = *b"PAKS";
pub const CURRENT_VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 64;

/// Package header (offset 0)
///
/// Describes where the entry table and the name blob live. Content blobs
/// occupy `[header_size, entry_offset)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Magic number: "PAKS"
    pub magic: [u8; 4],

    /// Format version; anything but [`CURRENT_VERSION`] opens read-only
    pub version: u32,

    /// Size of the header region in bytes
    pub header_size: u32,

    /// Size of one on-disk entry record (core fields plus reserved bytes)
    pub entry_size: u32,

    /// Number of live entries
    pub entry_count: u32,

    /// Byte offset of the entry table
    pub entry_offset: u64,

    /// Byte offset of the newline-delimited name blob
    pub name_offset: u64,

    /// Total byte length of the name blob
    pub name_size: u64,
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

impl Header {
    /// Header for an empty package
    pub fn new() -> Self {
        Header {
            magic: MAGIC,
            version: CURRENT_VERSION,
            header_size: HEADER_SIZE as u32,
            entry_size: ENTRY_SIZE as u32,
            entry_count: 0,
            entry_offset: HEADER_SIZE as u64,
            name_offset: HEADER_SIZE as u64,
            name_size: 0,
        }
    }

    /// Whether this implementation may rewrite a package with this header
    pub fn is_current_version(&self) -> bool {
        self.version == CURRENT_VERSION
    }

    /// Byte length of the on-disk entry table
    pub fn entry_table_size(&self) -> u64 {
        self.entry_count as u64 * self.entry_size as u64
    }

    /// Point the name blob right after the entry table
    pub fn relocate_names(&mut self) {
        self.name_offset = self.entry_offset + self.entry_table_size();
    }

    /// End of the last structure the header describes
    pub fn logical_end(&self) -> u64 {
        self.name_offset + self.name_size
    }

    /// Check the header against the physical size of the package
    pub fn validate(&self, package_size: u64) -> Result<()> {
        if self.magic != MAGIC {
            return Err(PackageError::InvalidMagic);
        }

        if (self.header_size as usize) < HEADER_SIZE || self.header_size as u64 > package_size {
            return Err(PackageError::Corrupted(format!(
                "header size {} out of range",
                self.header_size
            )));
        }

        if (self.entry_size as usize) < ENTRY_SIZE {
            return Err(PackageError::Corrupted(format!(
                "entry record size {} smaller than {}",
                self.entry_size, ENTRY_SIZE
            )));
        }

        if self.entry_offset < self.header_size as u64 {
            return Err(PackageError::Corrupted(format!(
                "entry table offset {} inside header",
                self.entry_offset
            )));
        }

        let table_end = self.entry_offset.checked_add(self.entry_table_size());
        if table_end.map_or(true, |end| end > package_size) {
            return Err(PackageError::Corrupted(format!(
                "entry table ({} x {} at {}) exceeds package size {}",
                self.entry_count, self.entry_size, self.entry_offset, package_size
            )));
        }

        let names_end = self.name_offset.checked_add(self.name_size);
        if names_end.map_or(true, |end| end > package_size) {
            return Err(PackageError::Corrupted(format!(
                "name blob ({} bytes at {}) exceeds package size {}",
                self.name_size, self.name_offset, package_size
            )));
        }

        Ok(())
    }

    /// Serialize header to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);

        bytes.extend_from_slice(&self.magic);
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.header_size.to_le_bytes());
        bytes.extend_from_slice(&self.entry_size.to_le_bytes());
        bytes.extend_from_slice(&self.entry_count.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&self.entry_offset.to_le_bytes());
        bytes.extend_from_slice(&self.name_offset.to_le_bytes());
        bytes.extend_from_slice(&self.name_size.to_le_bytes());

        // Reserved tail
        bytes.resize(HEADER_SIZE, 0);

        bytes
    }

    /// Deserialize header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(PackageError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Insufficient bytes for header",
            )));
        }

        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        let u64_at = |at: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[at..at + 8]);
            u64::from_le_bytes(raw)
        };

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);

        Ok(Header {
            magic,
            version: u32_at(4),
            header_size: u32_at(8),
            entry_size: u32_at(12),
            entry_count: u32_at(16),
            entry_offset: u64_at(24),
            name_offset: u64_at(32),
            name_size: u64_at(40),
        })
    }
}
