//! Entry table and first-fit space allocation
//!
//! Entry records are kept sorted by ascending byte offset, index-aligned with
//! their names. New content goes into the first gap between live entries
//! that is large enough, or after the last entry when none is.

use crate::core::entry::EntryRecord;

/// Where a new entry goes, as decided by [`EntryTable::plan`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Into a gap; entries from `position` on move up by one
    Spliced { position: usize, offset: u64 },
    /// After every existing entry
    Appended { position: usize, offset: u64 },
}

impl Placement {
    pub fn position(&self) -> usize {
        match *self {
            Placement::Spliced { position, .. } | Placement::Appended { position, .. } => position,
        }
    }

    pub fn offset(&self) -> u64 {
        match *self {
            Placement::Spliced { offset, .. } | Placement::Appended { offset, .. } => offset,
        }
    }
}

/// Entry records paired with their names
#[derive(Debug, Clone, Default)]
pub struct EntryTable {
    entries: Vec<EntryRecord>,
    names: Vec<String>,
}

impl EntryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table loaded from disk
    ///
    /// `names` is empty when names were not loaded (read-only packages).
    pub fn from_parts(entries: Vec<EntryRecord>, names: Vec<String>) -> Self {
        EntryTable { entries, names }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn records(&self) -> &[EntryRecord] {
        &self.entries
    }

    pub fn records_mut(&mut self) -> &mut [EntryRecord] {
        &mut self.entries
    }

    pub fn get(&self, position: usize) -> Option<&EntryRecord> {
        self.entries.get(position)
    }

    pub fn name(&self, position: usize) -> Option<&str> {
        self.names.get(position).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Find the first gap of at least `size` bytes, starting at `content_start`
    ///
    /// Gaps are measured between live entries only; a tombstone's range counts
    /// as free. Falls back to appending after the last entry, live or not.
    pub fn plan(&self, size: u64, content_start: u64) -> Placement {
        let mut last_end = content_start;
        for (position, entry) in self.entries.iter().enumerate() {
            if entry.is_deleted() {
                continue;
            }
            if entry.offset - last_end >= size {
                return Placement::Spliced {
                    position,
                    offset: last_end,
                };
            }
            last_end = entry.end();
        }

        Placement::Appended {
            position: self.entries.len(),
            offset: self.entries.last().map_or(content_start, EntryRecord::end),
        }
    }

    /// Store `record` and `name` where `placement` says
    pub fn commit(&mut self, placement: Placement, mut record: EntryRecord, name: &str) {
        record.offset = placement.offset();
        let position = placement.position();
        self.entries.insert(position, record);
        self.names.insert(position, name.to_string());
    }

    /// Drop tombstoned records and their names
    pub fn compact(&mut self) -> usize {
        let before = self.entries.len();
        let mut names = std::mem::take(&mut self.names).into_iter();
        let mut kept_names = Vec::with_capacity(before);
        self.entries.retain(|entry| {
            let name = names.next();
            if entry.is_deleted() {
                return false;
            }
            if let Some(name) = name {
                kept_names.push(name);
            }
            true
        });
        self.names = kept_names;
        before - self.entries.len()
    }
}
