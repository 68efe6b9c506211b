//! Package configuration
//!
//! [`PackageConfig`] can be loaded from TOML; [`PackageBuilder`] applies it
//! (or explicit settings) when opening a package.

use crate::core::error::{PackageError, Result};
use crate::core::package::Package;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a package is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
    /// Refuse all mutations
    pub read_only: bool,

    /// Create an empty package when the path does not exist
    pub create_if_missing: bool,
}

impl PackageConfig {
    /// Parse a TOML document
    ///
    /// ```
    /// use pakstore::PackageConfig;
    ///
    /// let config = PackageConfig::from_toml_str("read_only = true").unwrap();
    /// assert!(config.read_only);
    /// assert!(!config.create_if_missing);
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| PackageError::Config(e.to_string()))
    }

    /// Load a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }
}

/// Builder for opening or creating a package
///
/// # Examples
///
/// ```rust,no_run
/// use pakstore::PackageBuilder;
///
/// # fn main() -> pakstore::Result<()> {
/// let pkg = PackageBuilder::new()
///     .path("assets.pak")
///     .create_if_missing(true)
///     .open()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PackageBuilder {
    path: Option<PathBuf>,
    config: PackageConfig,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the package path
    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Replace all settings with `config`
    pub fn config(mut self, config: PackageConfig) -> Self {
        self.config = config;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.config.read_only = read_only;
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Open the package, creating it first if configured to
    pub fn open(self) -> Result<Package> {
        let path = self
            .path
            .ok_or_else(|| PackageError::Config("package path not set".to_string()))?;
        debug!("Opening {:?} with {:?}", path, self.config);

        if !path.exists() && self.config.create_if_missing {
            if self.config.read_only {
                return Err(PackageError::Config(
                    "cannot create a package in read-only mode".to_string(),
                ));
            }
            return Package::create(&path);
        }
        Package::open(&path, self.config.read_only)
    }
}
