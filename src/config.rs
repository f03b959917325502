//! Configuration for DeltaDB
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a DeltaDB instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── db.lock          (advisory directory lock)
    ///     ├── <table>.tbl      (schema)
    ///     └── <table>.blk      (row blocks)
    pub data_dir: PathBuf,

    /// Name of the lock file inside `data_dir`
    pub lock_file: String,

    // -------------------------------------------------------------------------
    // Block Configuration
    // -------------------------------------------------------------------------
    /// Verify the CRC of every block read from disk
    pub verify_checksums: bool,

    /// fsync the block file after every block write
    pub sync_on_flush: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./deltadb_data"),
            lock_file: "db.lock".to_string(),
            verify_checksums: true,
            sync_on_flush: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Full path of the directory lock file
    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join(&self.lock_file)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the lock file name
    pub fn lock_file(mut self, name: impl Into<String>) -> Self {
        self.config.lock_file = name.into();
        self
    }

    /// Enable or disable block checksum verification on load
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.config.verify_checksums = verify;
        self
    }

    /// Enable or disable fsync after block writes
    pub fn sync_on_flush(mut self, sync: bool) -> Self {
        self.config.sync_on_flush = sync;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
