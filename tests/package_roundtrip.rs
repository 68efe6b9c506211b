//! End-to-end tests for adding, removing and reading entries

use pakstore::{AddFlags, Package, PackageError, HEADER_SIZE};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn package_path(dir: &TempDir) -> PathBuf {
    dir.path().join("test.pak")
}

fn write_source(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_two_file_scenario() {
    let dir = TempDir::new().unwrap();
    let a = write_source(dir.path(), "a.txt", b"hello");
    let b = write_source(dir.path(), "b.txt", b"abc");

    let mut pkg = Package::create(package_path(&dir)).unwrap();
    pkg.add_file(&a, "a", AddFlags::NONE).unwrap();
    pkg.add_file(&b, "b", AddFlags::NONE).unwrap();
    pkg.flush().unwrap();

    assert_eq!(pkg.file_count(), 2);
    assert_eq!(pkg.filename_by_index(0), Some("a"));
    assert_eq!(pkg.filename_by_index(1), Some("b"));
    assert_eq!(pkg.filename_by_index(2), None);

    let mut reader = pkg.open_file("a").unwrap();
    assert_eq!(reader.len(), 5);
    let mut content = Vec::new();
    reader.read_to_end(&mut content).unwrap();
    assert_eq!(content, b"hello");
    pkg.close_file(reader);
}

#[test]
fn test_round_trip_after_reopen() {
    let dir = TempDir::new().unwrap();
    let path = package_path(&dir);
    let files: Vec<(String, Vec<u8>)> = (0..40)
        .map(|i| (format!("data/file{}.bin", i), vec![i as u8; i * 37 + 1]))
        .collect();

    {
        let mut pkg = Package::create(&path).unwrap();
        for (name, content) in &files {
            pkg.add_bytes(name, content, AddFlags::NONE).unwrap();
        }
        pkg.close().unwrap();
    }

    let pkg = Package::open(&path, false).unwrap();
    assert_eq!(pkg.file_count(), files.len());
    for (name, content) in &files {
        assert!(pkg.has_file(name));
        assert_eq!(&pkg.read(name).unwrap(), content);
    }
}

#[test]
fn test_drop_flushes_pending_changes() {
    let dir = TempDir::new().unwrap();
    let path = package_path(&dir);
    {
        let mut pkg = Package::create(&path).unwrap();
        pkg.add_bytes("kept", b"on drop", AddFlags::NONE).unwrap();
    }

    let pkg = Package::open(&path, true).unwrap();
    assert_eq!(pkg.read("kept").unwrap(), b"on drop");
}

#[test]
fn test_lookup_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let mut pkg = Package::create(package_path(&dir)).unwrap();
    pkg.add_bytes("Textures/Grass.PNG", b"png", AddFlags::NONE).unwrap();
    pkg.flush().unwrap();

    assert!(pkg.has_file("textures/grass.png"));
    assert_eq!(pkg.read("TEXTURES/GRASS.png").unwrap(), b"png");
    // Stored name keeps its original case
    assert_eq!(pkg.filename_by_index(0), Some("Textures/Grass.PNG"));
}

#[test]
fn test_idempotent_flush() {
    let dir = TempDir::new().unwrap();
    let path = package_path(&dir);
    let mut pkg = Package::create(&path).unwrap();
    pkg.add_bytes("a", b"12345", AddFlags::NONE).unwrap();
    pkg.flush().unwrap();
    let first = std::fs::read(&path).unwrap();

    pkg.flush().unwrap();
    assert!(!pkg.is_dirty());
    assert_eq!(std::fs::read(&path).unwrap(), first);
}

#[test]
fn test_dirty_blocks_all_reads() {
    let dir = TempDir::new().unwrap();
    let mut pkg = Package::create(package_path(&dir)).unwrap();
    pkg.add_bytes("a", b"1", AddFlags::NONE).unwrap();
    pkg.add_bytes("b", b"2", AddFlags::NONE).unwrap();
    assert!(!pkg.has_file("a"));
    pkg.flush().unwrap();
    assert!(pkg.has_file("b"));

    pkg.remove_file("a").unwrap();
    assert!(pkg.is_dirty());
    // Untouched entries are hidden too
    assert!(!pkg.has_file("b"));
    assert!(matches!(pkg.open_file("b"), Err(PackageError::Dirty)));

    pkg.flush().unwrap();
    assert!(!pkg.has_file("a"));
    assert!(pkg.has_file("b"));
    assert_eq!(pkg.file_count(), 1);
}

#[test]
fn test_space_reuse_first_fit() {
    let dir = TempDir::new().unwrap();
    let mut pkg = Package::create(package_path(&dir)).unwrap();
    pkg.add_bytes("a", &[1; 10], AddFlags::NONE).unwrap();
    pkg.add_bytes("filler", &[2; 10], AddFlags::NONE).unwrap();
    pkg.add_bytes("b", &[3; 10], AddFlags::NONE).unwrap();
    pkg.flush().unwrap();

    let b_offset = pkg.entry_info(2).unwrap().offset;
    assert_eq!(b_offset, HEADER_SIZE as u64 + 20);

    pkg.remove_file("a").unwrap();
    pkg.remove_file("filler").unwrap();
    pkg.flush().unwrap();
    let table_offset = pkg.header().entry_offset;

    pkg.add_bytes("c", &[4; 10], AddFlags::NONE).unwrap();
    let c = pkg.entry_info(0).unwrap();
    assert_eq!(c.name.as_deref(), Some("c"));
    assert_eq!(c.offset, HEADER_SIZE as u64);
    // Content region did not grow
    assert_eq!(pkg.header().entry_offset, table_offset);

    pkg.flush().unwrap();
    assert_eq!(pkg.read("c").unwrap(), vec![4; 10]);
    assert_eq!(pkg.read("b").unwrap(), vec![3; 10]);
}

#[test]
fn test_primary_hash_collision() {
    // 'a'*31 + '~' == 'b'*31 + '_'
    let dir = TempDir::new().unwrap();
    let path = package_path(&dir);
    {
        let mut pkg = Package::create(&path).unwrap();
        pkg.add_bytes("a~", b"first", AddFlags::NONE).unwrap();
        pkg.add_bytes("b_", b"second", AddFlags::NONE).unwrap();
        pkg.close().unwrap();
    }

    let pkg = Package::open(&path, false).unwrap();
    assert_eq!(pkg.read("a~").unwrap(), b"first");
    assert_eq!(pkg.read("b_").unwrap(), b"second");
}

#[test]
fn test_duplicate_requires_replace() {
    let dir = TempDir::new().unwrap();
    let mut pkg = Package::create(package_path(&dir)).unwrap();
    pkg.add_bytes("a", b"one", AddFlags::NONE).unwrap();
    pkg.flush().unwrap();

    assert!(matches!(
        pkg.add_bytes("a", b"two", AddFlags::NONE),
        Err(PackageError::AlreadyExists(_))
    ));
    assert!(!pkg.is_dirty());

    pkg.add_bytes("a", b"two", AddFlags::REPLACE).unwrap();
    pkg.flush().unwrap();
    assert_eq!(pkg.file_count(), 1);
    assert_eq!(pkg.read("a").unwrap(), b"two");
}

#[test]
fn test_remove_unknown() {
    let dir = TempDir::new().unwrap();
    let mut pkg = Package::create(package_path(&dir)).unwrap();
    assert!(matches!(
        pkg.remove_file("ghost"),
        Err(PackageError::NotFound(_))
    ));
    assert!(matches!(pkg.open_file("ghost"), Err(PackageError::NotFound(_))));
}

#[test]
fn test_tombstone_hides_readded_name_until_flush() {
    let dir = TempDir::new().unwrap();
    let mut pkg = Package::create(package_path(&dir)).unwrap();
    pkg.add_bytes("a", b"old", AddFlags::NONE).unwrap();
    pkg.flush().unwrap();

    pkg.remove_file("a").unwrap();
    // The tombstone ends the probe, so the name reads as free
    pkg.add_bytes("a", b"new", AddFlags::NONE).unwrap();
    // ...and the re-added copy cannot be found until the tombstone is gone
    assert!(matches!(pkg.remove_file("a"), Err(PackageError::NotFound(_))));

    pkg.flush().unwrap();
    assert_eq!(pkg.file_count(), 1);
    assert_eq!(pkg.read("a").unwrap(), b"new");
}

#[test]
fn test_read_only_package() {
    let dir = TempDir::new().unwrap();
    let path = package_path(&dir);
    {
        let mut pkg = Package::create(&path).unwrap();
        pkg.add_bytes("a", b"data", AddFlags::NONE).unwrap();
    }

    let mut pkg = Package::open(&path, true).unwrap();
    assert!(pkg.is_read_only());
    assert!(matches!(
        pkg.add_bytes("b", b"x", AddFlags::NONE),
        Err(PackageError::ReadOnly)
    ));
    assert!(matches!(pkg.remove_file("a"), Err(PackageError::ReadOnly)));
    assert!(matches!(pkg.defrag(), Err(PackageError::ReadOnly)));

    // Names are not loaded, lookups still work
    assert_eq!(pkg.file_count(), 1);
    assert_eq!(pkg.filename_by_index(0), None);
    assert_eq!(pkg.read("a").unwrap(), b"data");
}

#[test]
fn test_version_mismatch_opens_read_only() {
    let dir = TempDir::new().unwrap();
    let path = package_path(&dir);
    {
        let mut pkg = Package::create(&path).unwrap();
        pkg.add_bytes("a", b"data", AddFlags::NONE).unwrap();
    }

    let mut bytes = std::fs::read(&path).unwrap();
    bytes[4..8].copy_from_slice(&7u32.to_le_bytes());
    std::fs::write(&path, &bytes).unwrap();

    let mut pkg = Package::open(&path, false).unwrap();
    assert!(pkg.is_read_only());
    assert!(matches!(pkg.remove_file("a"), Err(PackageError::ReadOnly)));
    assert_eq!(pkg.read("a").unwrap(), b"data");
    drop(pkg);

    // Never rewritten
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
}

#[test]
fn test_entries_listing() {
    let dir = TempDir::new().unwrap();
    let mut pkg = Package::create(package_path(&dir)).unwrap();
    pkg.add_bytes("x", &[0; 3], AddFlags::NONE).unwrap();
    pkg.add_bytes("y", &[0; 7], AddFlags::NONE).unwrap();
    pkg.flush().unwrap();

    let listed: Vec<_> = pkg
        .entries()
        .map(|e| (e.name.unwrap(), e.offset, e.size))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("x".to_string(), HEADER_SIZE as u64, 3),
            ("y".to_string(), HEADER_SIZE as u64 + 3, 7),
        ]
    );
}

#[test]
fn test_empty_entry() {
    let dir = TempDir::new().unwrap();
    let path = package_path(&dir);
    {
        let mut pkg = Package::create(&path).unwrap();
        pkg.add_bytes("empty", b"", AddFlags::NONE).unwrap();
        pkg.add_bytes("full", b"abc", AddFlags::NONE).unwrap();
    }

    let pkg = Package::open(&path, false).unwrap();
    assert!(pkg.has_file("empty"));
    assert!(pkg.read("empty").unwrap().is_empty());
    assert_eq!(pkg.read("full").unwrap(), b"abc");
}
