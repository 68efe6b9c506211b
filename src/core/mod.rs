//! Package storage engine
//!
//! - [`hash`] - case-insensitive triple name hash
//! - [`header`] - fixed header at offset 0
//! - [`entry`] - entry records
//! - [`index`] - open-addressing hash index over names
//! - [`table`] - offset-ordered entry table and first-fit allocation
//! - [`io`] - absolute-offset file access
//! - [`reader`] - byte-range reader for one entry
//! - [`package`] - the store tying it together

pub mod entry;
pub mod error;
pub mod hash;
pub mod header;
pub mod index;
pub mod io;
pub mod package;
pub mod reader;
pub mod table;
