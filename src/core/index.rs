//! Open-addressing hash index over entry names
//!
//! Maps the primary name hash to a position in the entry table using linear
//! probing. The index is rebuilt wholesale on load and after every flush;
//! between those points it is patched in place as entries are spliced into
//! the table.

use crate::core::entry::EntryRecord;
use crate::core::error::{PackageError, Result};
use crate::core::hash::NameHash;

pub const MIN_TABLE_SIZE: usize = 256;
pub const MAX_TABLE_SIZE: usize = 0x80000;

#[derive(Debug, Clone)]
pub struct HashIndex {
    slots: Vec<Option<usize>>,
    occupied: usize,
}

impl HashIndex {
    /// Number of slots needed for `count` entries
    ///
    /// Doubles from half the minimum until the count fits, then once more so
    /// the load factor stays below one half.
    pub fn table_size_for(count: usize) -> Result<usize> {
        let mut size = MIN_TABLE_SIZE / 2;
        while size < count {
            if size >= MAX_TABLE_SIZE {
                return Err(PackageError::CapacityExceeded {
                    entries: count,
                    max: MAX_TABLE_SIZE,
                });
            }
            size *= 2;
        }
        Ok(size * 2)
    }

    /// Build the index from the entry table, skipping tombstones
    ///
    /// Entries are inserted in table order, so the layout is deterministic.
    pub fn build(entries: &[EntryRecord]) -> Result<Self> {
        let live = entries.iter().filter(|e| !e.is_deleted()).count();
        let size = Self::table_size_for(live)?;

        let mut index = HashIndex {
            slots: vec![None; size],
            occupied: 0,
        };
        for (position, entry) in entries.iter().enumerate() {
            if !entry.is_deleted() {
                index.place(entry.hash.hash0, position);
            }
        }
        Ok(index)
    }

    /// Number of slots
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    fn home_slot(&self, hash0: u32) -> usize {
        hash0 as usize % self.slots.len()
    }

    fn place(&mut self, hash0: u32, position: usize) {
        let mut slot = self.home_slot(hash0);
        while self.slots[slot].is_some() {
            slot = (slot + 1) % self.slots.len();
        }
        self.slots[slot] = Some(position);
        self.occupied += 1;
    }

    /// Find the live entry whose three hashes match `hash`
    ///
    /// A matching tombstone ends the probe with `None`, even if a live entry
    /// with the same name sits further along the chain.
    pub fn lookup(&self, hash: &NameHash, entries: &[EntryRecord]) -> Option<usize> {
        let mut slot = self.home_slot(hash.hash0);
        while let Some(position) = self.slots[slot] {
            let entry = &entries[position];
            if entry.hash == *hash {
                if entry.is_deleted() {
                    return None;
                }
                return Some(position);
            }
            slot = (slot + 1) % self.slots.len();
        }
        None
    }

    /// Account for an entry spliced into the table at `position`
    ///
    /// Every stored position at or after the splice point moves up by one.
    pub fn shift_from(&mut self, position: usize) {
        for stored in self.slots.iter_mut().flatten() {
            if *stored >= position {
                *stored += 1;
            }
        }
    }

    /// Add a single entry without rebuilding
    ///
    /// Returns `false` when the insert would push the load factor above one
    /// half; the caller must rebuild instead.
    pub fn register(&mut self, hash0: u32, position: usize) -> bool {
        if (self.occupied + 1) * 2 > self.slots.len() {
            return false;
        }
        self.place(hash0, position);
        true
    }
}
