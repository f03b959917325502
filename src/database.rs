//! Database Module
//!
//! Front door over a data directory: takes the directory lock, discovers
//! `.tbl` files and maps table names to table handles.
//!
//! ## Responsibilities
//! - Create the data directory and hold its lock while open
//! - Open every table found on startup
//! - Create new tables and route row writes to them
//! - Flush every table and release the lock on close

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{DeltaError, Result};
use crate::lock::DirLock;
use crate::row::Row;
use crate::schema::Column;
use crate::table::Table;

/// Shared handle to an open table
pub type TableHandle = Arc<Mutex<Table>>;

/// An open data directory
///
/// ## Concurrency:
/// - `tables`: RwLock over the name → table map
/// - each table sits behind its own Mutex, so writes to one table are
///   serialized while different tables can be written independently
/// - the directory lock keeps other processes out
pub struct Database {
    config: Config,
    lock: DirLock,
    tables: RwLock<HashMap<String, TableHandle>>,
}

impl Database {
    /// Open the data directory
    ///
    /// On startup:
    /// 1. Create the directory if it doesn't exist
    /// 2. Acquire the directory lock (fails fast if held)
    /// 3. Open every `<name>.tbl` found in the directory; a table that
    ///    fails to load is logged and left out
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let mut lock = DirLock::new(config.lock_path());
        if !lock.acquire()? {
            return Err(DeltaError::LockContention(lock.path().to_path_buf()));
        }

        let mut tables = HashMap::new();
        for name in Self::discover_tables(&config)? {
            match Table::open(&config, &name) {
                Ok(table) => {
                    tables.insert(name, Arc::new(Mutex::new(table)));
                }
                Err(e) => warn!(table = %name, error = %e, "skipping unreadable table"),
            }
        }

        info!(
            data_dir = %config.data_dir.display(),
            tables = tables.len(),
            "opened database"
        );

        Ok(Self {
            config,
            lock,
            tables: RwLock::new(tables),
        })
    }

    /// Create a new table with the given columns
    ///
    /// A known table that has no columns yet takes them; one that already
    /// has columns fails with `TableExists`.
    pub fn create(&self, name: &str, columns: Vec<Column>) -> Result<TableHandle> {
        let mut tables = self.tables.write();
        if let Some(handle) = tables.get(name) {
            if !handle.lock().set_columns(columns)? {
                return Err(DeltaError::TableExists(name.to_string()));
            }
            return Ok(Arc::clone(handle));
        }

        let table = Table::create(&self.config, name, columns)?;
        let handle = Arc::new(Mutex::new(table));
        tables.insert(name.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Look up an open table
    pub fn table(&self, name: &str) -> Result<TableHandle> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| DeltaError::TableNotFound(name.to_string()))
    }

    /// Append a row to the named table
    pub fn write_row(&self, name: &str, row: &Row) -> Result<()> {
        let table = self.table(name)?;
        let mut table = table.lock();
        table.write(row)
    }

    /// Names of all open tables, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Flush every table without closing the database
    pub fn flush(&self) -> Result<()> {
        for table in self.tables.read().values() {
            table.lock().flush()?;
        }
        Ok(())
    }

    /// Flush every table and release the directory lock
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn shutdown(&mut self) -> Result<()> {
        let tables = std::mem::take(self.tables.get_mut());

        let mut first_error = None;
        for (name, table) in tables {
            if let Err(e) = table.lock().flush() {
                warn!(table = %name, error = %e, "failed to flush table");
                first_error.get_or_insert(e);
            }
        }

        self.lock.release()?;
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Table names from `<name>.tbl` files in the data directory
    fn discover_tables(config: &Config) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&config.data_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(Table::SCHEMA_EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => names.push(stem.to_string()),
                None => warn!(path = %path.display(), "skipping table file with non-UTF-8 name"),
            }
        }

        names.sort();
        Ok(names)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "failed to close database cleanly");
        }
    }
}
