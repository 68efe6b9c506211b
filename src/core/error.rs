use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Invalid magic number in header")]
    InvalidMagic,

    #[error("Corrupted package: {0}")]
    Corrupted(String),

    #[error("Package is read-only")]
    ReadOnly,

    #[error("Package has uncommitted changes; flush before reading")]
    Dirty,

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid entry name: {0:?} (must be non-empty, without newline or NUL)")]
    InvalidName(String),

    #[error("Hash index capacity exceeded: {entries} entries (max {max})")]
    CapacityExceeded { entries: usize, max: usize },

    #[error("Package is not valid (stream was released)")]
    Invalid,

    #[error("Fatal package error: {0}")]
    Fatal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PackageError>;
