//! Entry records
//!
//! One fixed-size record per stored blob. The on-disk record may be wider
//! than [`ENTRY_SIZE`]; trailing bytes are reserved and skipped on read.

use crate::core::error::{PackageError, Result};
use crate::core::hash::NameHash;

/// Size of the core record fields in bytes
pub const ENTRY_SIZE: usize = 32;

/// Entry has been removed but not yet dropped by a flush
pub const FLAG_DELETED: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryRecord {
    pub hash: NameHash,
    pub flags: u32,
    pub offset: u64,
    pub size: u64,
}

impl EntryRecord {
    /// Record for content whose position is not decided yet
    pub fn new(hash: NameHash, size: u64) -> Self {
        EntryRecord {
            hash,
            flags: 0,
            offset: 0,
            size,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.flags & FLAG_DELETED != 0
    }

    pub fn mark_deleted(&mut self) {
        self.flags |= FLAG_DELETED;
    }

    /// Undo [`EntryRecord::mark_deleted`]
    pub fn restore(&mut self) {
        self.flags &= !FLAG_DELETED;
    }

    /// One past the last content byte
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    /// Serialize into a record of `record_size` bytes, zero-padding the reserved tail
    pub fn to_bytes(&self, record_size: usize) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(record_size.max(ENTRY_SIZE));

        bytes.extend_from_slice(&self.hash.hash0.to_le_bytes());
        bytes.extend_from_slice(&self.hash.hash1.to_le_bytes());
        bytes.extend_from_slice(&self.hash.hash2.to_le_bytes());
        bytes.extend_from_slice(&self.flags.to_le_bytes());
        bytes.extend_from_slice(&self.offset.to_le_bytes());
        bytes.extend_from_slice(&self.size.to_le_bytes());

        bytes.resize(record_size.max(ENTRY_SIZE), 0);
        bytes
    }

    /// Deserialize the core fields; anything past [`ENTRY_SIZE`] is ignored
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ENTRY_SIZE {
            return Err(PackageError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Insufficient bytes for entry record",
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

        Ok(EntryRecord {
            hash: NameHash {
                hash0: u32_at(0),
                hash1: u32_at(4),
                hash2: u32_at(8),
            },
            flags: u32_at(12),
            offset: u64_at(16),
            size: u64_at(24),
        })
    }
}
