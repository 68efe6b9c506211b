//! # pakstore - Single-File Package Archive
//!
//! `pakstore` packs many named blobs into one file with:
//!
//! - **Hashed name index** using open addressing over three independent hashes
//! - **Incremental edits**: add and remove without rewriting the archive
//! - **First-fit space reuse** for gaps left by removed entries
//! - **Explicit defragmentation** to pack content and shrink the file
//!
//! Names are flat and case-insensitive.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pakstore::{AddFlags, Package, Result};
//! use std::io::Read;
//!
//! # fn main() -> Result<()> {
//! let mut pkg = Package::create("assets.pak")?;
//!
//! pkg.add_bytes("readme.txt", b"Hello, World!", AddFlags::NONE)?;
//! pkg.add_file("textures/grass.png", "grass.png", AddFlags::NONE)?;
//!
//! // Reads are refused until changes are committed
//! pkg.flush()?;
//!
//! let mut reader = pkg.open_file("README.TXT")?;
//! let mut text = String::new();
//! reader.read_to_string(&mut text)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Header (64 bytes)                           │
//! │  - Magic "PAKS", version                    │
//! │  - Entry table and name blob locations      │
//! ├─────────────────────────────────────────────┤
//! │ Content blobs, ascending offsets            │
//! │  (gaps left by removals until defrag)       │
//! ├─────────────────────────────────────────────┤
//! │ Entry table: hashes, flags, offset, size    │
//! ├─────────────────────────────────────────────┤
//! │ Name blob: newline-terminated names         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Editing and compaction
//!
//! ```rust,no_run
//! use pakstore::{AddFlags, Package};
//!
//! # fn main() -> pakstore::Result<()> {
//! let mut pkg = Package::open("assets.pak", false)?;
//! pkg.remove_file("old.bin")?;
//! pkg.add_bytes("new.bin", &[0u8; 128], AddFlags::REPLACE)?;
//! pkg.flush()?;
//!
//! let fragments = pkg.count_fragment_size()?;
//! if fragments.reclaimable > 0 {
//!     pkg.defrag()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;

pub use crate::config::{PackageBuilder, PackageConfig};
pub use crate::core::{
    error::{PackageError, Result},
    hash::NameHash,
    header::{Header, CURRENT_VERSION, HEADER_SIZE},
    package::{AddFlags, CommitState, EntryInfo, FragmentInfo, Package, PackageStats},
    reader::EntryReader,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package format magic number
pub const MAGIC: &[u8; 4] = &crate::core::header::MAGIC;
