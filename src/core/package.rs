//! Package store
//!
//! Coordinates the on-disk layout, the entry and name tables and the hash
//! index. Mutations are staged in memory and committed by [`Package::flush`];
//! until then the package is dirty and refuses reads.

use crate::core::entry::EntryRecord;
use crate::core::error::{PackageError, Result};
use crate::core::hash::NameHash;
use crate::core::header::{Header, HEADER_SIZE};
use crate::core::index::HashIndex;
use crate::core::io::PackageFile;
use crate::core::reader::EntryReader;
use crate::core::table::{EntryTable, Placement};
use serde::Serialize;
use std::ops::BitOr;
use std::path::Path;
use tracing::{debug, info, warn};

/// Whether in-memory state has been written out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    Clean,
    Dirty,
}

/// Options for [`Package::add_file`] and [`Package::add_bytes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddFlags(u32);

impl AddFlags {
    pub const NONE: AddFlags = AddFlags(0);
    /// Tombstone an existing entry with the same name instead of failing
    pub const REPLACE: AddFlags = AddFlags(1);

    pub fn contains(self, other: AddFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AddFlags {
    type Output = AddFlags;

    fn bitor(self, rhs: AddFlags) -> AddFlags {
        AddFlags(self.0 | rhs.0)
    }
}

/// Result of [`Package::count_fragment_size`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FragmentInfo {
    /// Bytes a defrag would cut from the end of the file
    pub reclaimable: u64,
    /// Bytes a defrag would have to rewrite
    pub bytes_to_move: u64,
}

/// One entry as seen from outside
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    /// `None` when names were not loaded (read-only packages)
    pub name: Option<String>,
    pub offset: u64,
    pub size: u64,
    pub deleted: bool,
}

/// Package statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageStats {
    pub version: u32,
    pub file_count: usize,
    pub content_bytes: u64,
    pub physical_size: u64,
    pub logical_size: u64,
    pub fragments: FragmentInfo,
    pub read_only: bool,
    pub dirty: bool,
}

/// A single-file package of named blobs
pub struct Package {
    /// Backing file; `None` once the instance has become unusable
    file: Option<PackageFile>,

    header: Header,

    /// Records sorted by offset, index-aligned with names
    table: EntryTable,

    index: HashIndex,

    read_only: bool,

    state: CommitState,
}

impl Package {
    /// Create an empty package at `path`, replacing any existing file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Creating package at {:?}", path.as_ref());
        let header = Header::new();
        let file = PackageFile::create(&path, &header)?;

        Ok(Package {
            file: Some(file),
            header,
            table: EntryTable::new(),
            index: HashIndex::build(&[])?,
            read_only: false,
            state: CommitState::Clean,
        })
    }

    /// Open an existing package
    ///
    /// A package written by another format version opens read-only
    /// regardless of `read_only`.
    pub fn open<P: AsRef<Path>>(path: P, read_only: bool) -> Result<Self> {
        info!("Opening package at {:?}", path.as_ref());
        let mut file = PackageFile::open(&path, !read_only)?;

        let header = Self::load_header(&mut file)?;
        let read_only = if header.is_current_version() {
            read_only
        } else {
            warn!(
                "Package version {} differs from supported version; opening read-only",
                header.version
            );
            true
        };

        let entries = Self::load_entries(&mut file, &header)?;
        let names = if read_only || entries.is_empty() {
            Vec::new()
        } else {
            Self::load_names(&mut file, &header, entries.len())?
        };
        let index = HashIndex::build(&entries)?;

        debug!(
            "Loaded {} entries (read_only = {}, index slots = {})",
            entries.len(),
            read_only,
            index.slot_count()
        );

        Ok(Package {
            file: Some(file),
            header,
            table: EntryTable::from_parts(entries, names),
            index,
            read_only,
            state: CommitState::Clean,
        })
    }

    fn load_header(file: &mut PackageFile) -> Result<Header> {
        let package_size = file.len()?;
        if package_size < HEADER_SIZE as u64 {
            return Err(PackageError::Corrupted(format!(
                "file is {} bytes, smaller than the header",
                package_size
            )));
        }
        let header = file.read_header()?;
        header.validate(package_size)?;
        Ok(header)
    }

    fn load_entries(file: &mut PackageFile, header: &Header) -> Result<Vec<EntryRecord>> {
        let record_size = header.entry_size as usize;
        let mut raw = vec![0u8; header.entry_table_size() as usize];
        file.read_at(header.entry_offset, &mut raw)?;

        let mut entries = Vec::with_capacity(header.entry_count as usize);
        let mut next_offset = header.header_size as u64;
        for chunk in raw.chunks_exact(record_size) {
            let entry = EntryRecord::from_bytes(chunk)?;
            if entry.offset < next_offset {
                return Err(PackageError::Corrupted(format!(
                    "entry {} at offset {} overlaps previous content ending at {}",
                    entries.len(),
                    entry.offset,
                    next_offset
                )));
            }
            match entry.offset.checked_add(entry.size) {
                Some(end) if end <= header.entry_offset => next_offset = end,
                _ => {
                    return Err(PackageError::Corrupted(format!(
                        "entry {} ({} bytes at {}) runs past the entry table",
                        entries.len(),
                        entry.size,
                        entry.offset
                    )))
                }
            }
            entries.push(entry);
        }
        Ok(entries)
    }

    fn load_names(file: &mut PackageFile, header: &Header, count: usize) -> Result<Vec<String>> {
        let mut blob = vec![0u8; header.name_size as usize];
        file.read_at(header.name_offset, &mut blob)?;

        let names = blob
            .split_inclusive(|&b| b == b'\n')
            .filter_map(|raw| raw.strip_suffix(b"\n"))
            .take(count)
            .map(|raw| {
                String::from_utf8(raw.to_vec())
                    .map_err(|_| PackageError::Corrupted("entry name is not UTF-8".to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        if names.len() != count {
            return Err(PackageError::Corrupted(format!(
                "name blob holds {} names, expected {}",
                names.len(),
                count
            )));
        }
        Ok(names)
    }

    /// Whether the package still holds its backing file
    pub fn valid(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether there are uncommitted changes
    pub fn is_dirty(&self) -> bool {
        self.state == CommitState::Dirty
    }

    pub fn state(&self) -> CommitState {
        self.state
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Path of the backing file
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(PackageFile::path)
    }

    fn file(&self) -> Result<&PackageFile> {
        self.file.as_ref().ok_or(PackageError::Invalid)
    }

    fn file_mut(&mut self) -> Result<&mut PackageFile> {
        self.file.as_mut().ok_or(PackageError::Invalid)
    }

    fn ensure_writable(&self) -> Result<()> {
        self.file()?;
        if self.read_only {
            return Err(PackageError::ReadOnly);
        }
        Ok(())
    }

    fn ensure_clean(&self) -> Result<()> {
        if self.is_dirty() {
            return Err(PackageError::Dirty);
        }
        Ok(())
    }

    /// Position of the live entry called `name`
    ///
    /// Not gated on the dirty state; the index is kept usable between
    /// commits.
    fn lookup(&self, name: &str) -> Option<usize> {
        self.index.lookup(&NameHash::of(name), self.table.records())
    }

    /// Whether a live entry called `name` exists
    ///
    /// Always `false` while the package is dirty.
    pub fn has_file(&self, name: &str) -> bool {
        if !self.valid() || self.is_dirty() {
            return false;
        }
        self.lookup(name).is_some()
    }

    /// Open a reader over the content of `name`
    ///
    /// The reader borrows the package, so it must be dropped (or passed to
    /// [`Package::close_file`]) before the package can be modified.
    pub fn open_file(&self, name: &str) -> Result<EntryReader<'_>> {
        let file = self.file()?;
        self.ensure_clean()?;
        let position = self
            .lookup(name)
            .ok_or_else(|| PackageError::NotFound(name.to_string()))?;
        let entry = &self.table.records()[position];
        Ok(EntryReader::new(file.handle(), entry.offset, entry.size))
    }

    /// Release a reader returned by [`Package::open_file`]
    pub fn close_file(&self, reader: EntryReader<'_>) {
        debug!("Closing reader at offset {}", reader.offset());
        drop(reader);
    }

    /// Read the whole content of `name`
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        use std::io::Read;

        let mut reader = self.open_file(name)?;
        let mut content = Vec::with_capacity(reader.len() as usize);
        reader.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Number of entries in the table, tombstones included
    pub fn file_count(&self) -> usize {
        self.table.len()
    }

    /// Name of the entry at `index`, in offset order
    pub fn filename_by_index(&self, index: usize) -> Option<&str> {
        self.table.name(index)
    }

    /// Details of the entry at `index`
    pub fn entry_info(&self, index: usize) -> Option<EntryInfo> {
        let entry = self.table.get(index)?;
        Some(EntryInfo {
            name: self.table.name(index).map(str::to_string),
            offset: entry.offset,
            size: entry.size,
            deleted: entry.is_deleted(),
        })
    }

    /// All entries in offset order
    pub fn entries(&self) -> impl Iterator<Item = EntryInfo> + '_ {
        (0..self.table.len()).filter_map(move |index| self.entry_info(index))
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() || name.contains('\n') || name.contains('\0') {
            return Err(PackageError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    /// Add the content of an external file under `name`
    pub fn add_file<P: AsRef<Path>>(
        &mut self,
        external_path: P,
        name: &str,
        flags: AddFlags,
    ) -> Result<()> {
        self.ensure_writable()?;
        let content = std::fs::read(external_path.as_ref())?;
        self.add_bytes(name, &content, flags)
    }

    /// Add `content` under `name`
    ///
    /// Fails if a live entry with the same name exists, unless `flags`
    /// contains [`AddFlags::REPLACE`], in which case that entry is
    /// tombstoned first and its space becomes available to the new content.
    pub fn add_bytes(&mut self, name: &str, content: &[u8], flags: AddFlags) -> Result<()> {
        self.ensure_writable()?;
        Self::validate_name(name)?;

        let hash = NameHash::of(name);
        let replaced = match self.lookup(name) {
            Some(_) if !flags.contains(AddFlags::REPLACE) => {
                return Err(PackageError::AlreadyExists(name.to_string()));
            }
            existing => existing,
        };

        let live_after = self.header.entry_count as usize + usize::from(replaced.is_none());
        HashIndex::table_size_for(live_after)?;

        if let Some(position) = replaced {
            self.table.records_mut()[position].mark_deleted();
        }

        let size = content.len() as u64;
        let placement = self.table.plan(size, self.header.header_size as u64);
        if let Err(err) = self.file_mut()?.write_at(placement.offset(), content) {
            if let Some(position) = replaced {
                self.table.records_mut()[position].restore();
            }
            return Err(err);
        }

        self.table.commit(placement, EntryRecord::new(hash, size), name);
        match placement {
            Placement::Spliced { position, .. } => self.index.shift_from(position),
            Placement::Appended { offset, .. } => self.header.entry_offset = offset + size,
        }
        if !self.index.register(hash.hash0, placement.position()) {
            debug!("Hash index over half full; rebuilding");
            self.index = HashIndex::build(self.table.records())?;
        }

        if replaced.is_none() {
            self.header.entry_count += 1;
        }
        self.header.relocate_names();
        self.state = CommitState::Dirty;

        debug!(
            "Added {} ({} bytes at offset {}{})",
            name,
            size,
            placement.offset(),
            if replaced.is_some() { ", replacing" } else { "" }
        );
        Ok(())
    }

    /// Tombstone the entry called `name`
    ///
    /// The record stays in the table (and the index) until the next flush.
    pub fn remove_file(&mut self, name: &str) -> Result<()> {
        self.ensure_writable()?;
        let position = self
            .lookup(name)
            .ok_or_else(|| PackageError::NotFound(name.to_string()))?;

        self.table.records_mut()[position].mark_deleted();
        self.header.entry_count -= 1;
        self.header.relocate_names();
        self.state = CommitState::Dirty;

        debug!("Removed {}", name);
        Ok(())
    }

    /// Commit staged changes
    ///
    /// Writes the live entry records, the name blob and the header, syncs,
    /// then drops tombstones and rebuilds the hash index. In-memory state is
    /// only touched once the writes succeed. A no-op when clean or read-only.
    pub fn flush(&mut self) -> Result<()> {
        if self.read_only || !self.is_dirty() {
            return Ok(());
        }

        let record_size = self.header.entry_size as usize;
        let mut tables = Vec::with_capacity(self.table.len() * record_size);
        let mut names = Vec::new();
        let mut live = 0u32;
        for (entry, name) in self.table.records().iter().zip(self.table.names()) {
            if entry.is_deleted() {
                continue;
            }
            tables.extend_from_slice(&entry.to_bytes(record_size));
            names.extend_from_slice(name.as_bytes());
            names.push(b'\n');
            live += 1;
        }

        let mut header = self.header;
        header.entry_count = live;
        header.relocate_names();
        header.name_size = names.len() as u64;
        tables.extend_from_slice(&names);

        let file = self.file_mut()?;
        file.write_at(header.entry_offset, &tables)?;
        file.write_header(&header)?;
        file.sync()?;

        let dropped = self.table.compact();
        self.header = header;
        self.index = HashIndex::build(self.table.records())?;
        self.state = CommitState::Clean;

        debug!(
            "Flushed {} entries ({} tombstones dropped)",
            self.table.len(),
            dropped
        );
        Ok(())
    }

    /// Measure how much a [`Package::defrag`] would reclaim
    ///
    /// Returns zeros while dirty.
    pub fn count_fragment_size(&self) -> Result<FragmentInfo> {
        let file = self.file()?;
        if self.is_dirty() {
            return Ok(FragmentInfo::default());
        }

        let header = &self.header;
        let table_size = header.entry_table_size();
        let mut logical_size = header.header_size as u64 + table_size + header.name_size;
        let mut moving = false;
        let mut bytes_to_move = 0u64;
        let mut next_offset = header.header_size as u64;

        for entry in self.table.records() {
            if !moving && entry.offset != next_offset {
                moving = true;
            }
            if moving {
                bytes_to_move += entry.size;
            }
            next_offset += entry.size;
            logical_size += entry.size;
        }
        if bytes_to_move > 0 || next_offset != header.entry_offset {
            bytes_to_move += table_size + header.name_size;
        }

        Ok(FragmentInfo {
            reclaimable: file.len()?.saturating_sub(logical_size),
            bytes_to_move,
        })
    }

    /// Pack all content right after the header and cut the file to size
    ///
    /// A failed truncation leaves the package unusable and is reported as
    /// [`PackageError::Fatal`].
    pub fn defrag(&mut self) -> Result<()> {
        self.ensure_writable()?;
        self.ensure_clean()?;
        info!("Defragmenting {} entries", self.table.len());

        let file = self.file.as_mut().ok_or(PackageError::Invalid)?;
        let mut next_offset = self.header.header_size as u64;
        let mut moved = 0usize;
        for entry in self.table.records_mut() {
            if entry.offset != next_offset {
                // In-memory offsets are the truth from here on
                self.state = CommitState::Dirty;
                file.copy_back(entry.offset, next_offset, entry.size)?;
                entry.offset = next_offset;
                moved += 1;
            }
            next_offset += entry.size;
        }

        self.header.entry_offset = next_offset;
        self.header.relocate_names();
        self.state = CommitState::Dirty;
        self.flush()?;

        let end = self.header.logical_end();
        let file = self.file_mut()?;
        if let Err(err) = file.truncate(end) {
            self.file = None;
            return Err(PackageError::Fatal(format!(
                "truncating package to {} bytes failed: {}",
                end, err
            )));
        }

        info!("Defragmented: moved {} entries, package is now {} bytes", moved, end);
        Ok(())
    }

    /// Size, fragmentation and state summary
    pub fn stats(&self) -> Result<PackageStats> {
        let physical_size = self.file()?.len()?;
        let content_bytes = self
            .table
            .records()
            .iter()
            .filter(|e| !e.is_deleted())
            .map(|e| e.size)
            .sum::<u64>();

        Ok(PackageStats {
            version: self.header.version,
            file_count: self.table.len(),
            content_bytes,
            physical_size,
            logical_size: self.header.header_size as u64
                + self.header.entry_table_size()
                + self.header.name_size
                + content_bytes,
            fragments: self.count_fragment_size()?,
            read_only: self.read_only,
            dirty: self.is_dirty(),
        })
    }

    /// Flush and release the package
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }
}

impl Drop for Package {
    fn drop(&mut self) {
        if self.file.is_some() {
            if let Err(err) = self.flush() {
                warn!("Flush on drop failed: {}", err);
            }
        }
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("path", &self.path())
            .field("entries", &self.table.len())
            .field("read_only", &self.read_only)
            .field("state", &self.state)
            .finish()
    }
}
