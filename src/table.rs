//! Table Module
//!
//! Binds a schema to its `.tbl` / `.blk` file pair and appends rows.
//!
//! ## Responsibilities
//! - Load an existing schema and its blocks, or create empty files
//! - Persist the column list exactly once
//! - Append rows to the active block, sealing it when a row won't fit
//! - Decode all stored rows in write order
//!
//! ## Block Rotation
//! ```text
//!   write(row) ──► size > payload? ──yes──► RowTooLarge
//!                      │ no
//!                      ▼
//!          cursor + size > payload? ──yes──► seal active (append or
//!                      │ no                  overwrite-last), start a
//!                      ▼                     fresh active block
//!            encode row at payload[cursor..], cursor += size, dirty
//! ```
//! The active block is appended on its first flush and overwritten in place
//! on every later flush, so it never produces duplicate trailing blocks.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::bitstream::{BitReader, BitWriter};
use crate::block::{Block, BlockFile, WriteMode, BLOCK_PAYLOAD_SIZE};
use crate::config::Config;
use crate::error::{DeltaError, Result};
use crate::row::{decode_row, encode_row, Row};
use crate::schema::{Column, Schema, TableName};

/// A single table: schema plus append-only row blocks
///
/// ## Concurrency
/// A table is confined to one owner: `write`, `flush` and `close` take
/// `&mut self`. Shared access goes through the database's per-table mutex.
pub struct Table {
    schema: Schema,
    schema_path: PathBuf,
    blocks: BlockFile,

    /// Blocks that no longer accept rows, in file order
    sealed: Vec<Block>,

    /// The block accepting appends
    active: Block,

    /// Whether the active block already occupies the last slot on disk
    active_on_disk: bool,

    /// Whether the active block holds rows not yet flushed
    dirty: bool,
}

impl Table {
    // =========================================================================
    // File Extensions
    // =========================================================================
    pub const SCHEMA_EXTENSION: &'static str = "tbl";
    pub const BLOCK_EXTENSION: &'static str = "blk";

    /// Open a table in `config.data_dir`, creating empty files if needed
    ///
    /// On open:
    /// 1. Validate the name
    /// 2. Existing table: load and verify the schema, load every block;
    ///    the last one becomes the active block
    /// 3. New table: write an empty schema and an empty block file
    pub fn open(config: &Config, name: &str) -> Result<Self> {
        let table_name = Self::validate_name(name)?;
        let schema_path = Self::schema_path(&config.data_dir, name);
        let blocks = BlockFile::new(Self::block_path(&config.data_dir, name))
            .verify_checksums(config.verify_checksums)
            .sync_writes(config.sync_on_flush);

        if schema_path.is_file() {
            let schema = Schema::load(&schema_path, name)?;
            let mut sealed = blocks.read_all()?;
            let active = sealed.pop();
            let active_on_disk = active.is_some();

            info!(
                table = name,
                columns = schema.columns().len(),
                blocks = sealed.len() + active_on_disk as usize,
                "opened table"
            );

            Ok(Self {
                schema,
                schema_path,
                blocks,
                sealed,
                active: active.unwrap_or_default(),
                active_on_disk,
                dirty: false,
            })
        } else {
            let schema = Schema::empty(table_name);
            schema.save(&schema_path)?;
            blocks.create()?;

            info!(table = name, "created table files");

            Ok(Self {
                schema,
                schema_path,
                blocks,
                sealed: Vec::new(),
                active: Block::new(),
                active_on_disk: false,
                dirty: false,
            })
        }
    }

    /// Open a table and set its columns in one step
    ///
    /// The column list is validated before any file is touched. Fails with
    /// `TableExists` if the table already has columns.
    pub fn create(config: &Config, name: &str, columns: Vec<Column>) -> Result<Self> {
        let schema = Schema::new(Self::validate_name(name)?, columns)?;

        let mut table = Self::open(config, name)?;
        if !table.schema.is_empty() {
            return Err(DeltaError::TableExists(name.to_string()));
        }
        table.install_schema(schema)?;
        Ok(table)
    }

    // =========================================================================
    // Schema
    // =========================================================================

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn columns(&self) -> &[Column] {
        self.schema.columns()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.column_index(name)
    }

    /// Set the column list and persist the schema
    ///
    /// Only a table without columns accepts this; afterwards it is a no-op
    /// returning `false`.
    pub fn set_columns(&mut self, columns: Vec<Column>) -> Result<bool> {
        if !self.schema.is_empty() {
            debug!(table = self.name(), "columns already set, ignoring");
            return Ok(false);
        }

        let schema = Schema::new(self.schema.table_name().clone(), columns)?;
        self.install_schema(schema)?;
        Ok(true)
    }

    // =========================================================================
    // Rows
    // =========================================================================

    /// Append a row, sealing the active block first if the row won't fit
    pub fn write(&mut self, row: &Row) -> Result<()> {
        if self.schema.is_empty() {
            return Err(DeltaError::SchemaNotSet(self.name().to_string()));
        }
        row.check_columns(self.schema.columns())?;

        let size = row.size_in_bytes();
        if size > BLOCK_PAYLOAD_SIZE {
            return Err(DeltaError::RowTooLarge {
                size,
                capacity: BLOCK_PAYLOAD_SIZE,
            });
        }

        if self.active.cursor() + size > BLOCK_PAYLOAD_SIZE {
            self.rotate()?;
        }

        let mut writer = BitWriter::over(self.active.reserve(size)?);
        encode_row(&mut writer, row)?;
        if writer.position() != size * 8 {
            return Err(DeltaError::BufferBounds(format!(
                "row encoded to {} bits, expected {}",
                writer.position(),
                size * 8
            )));
        }

        self.active.advance(size)?;
        self.dirty = true;
        Ok(())
    }

    /// Decode every stored row, oldest first
    pub fn rows(&self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        for block in self.sealed.iter().chain(std::iter::once(&self.active)) {
            let mut reader = BitReader::over(block.used());
            while !reader.is_exhausted() {
                rows.push(decode_row(self.schema.columns(), &mut reader)?);
            }
        }
        Ok(rows)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Persist the active block if it holds unflushed rows
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let mode = self.active_write_mode();
        self.blocks.write(&mut self.active, mode)?;
        self.active_on_disk = true;
        self.dirty = false;
        Ok(())
    }

    /// Flush and release the table
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        info!(table = self.name(), "closed table");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of sealed blocks held in memory
    pub fn sealed_block_count(&self) -> usize {
        self.sealed.len()
    }

    /// Bytes used in the active block
    pub fn active_cursor(&self) -> usize {
        self.active.cursor()
    }

    /// Whether the active block has rows not yet on disk
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of blocks currently in the `.blk` file
    pub fn blocks_on_disk(&self) -> Result<u32> {
        self.blocks.count()
    }

    pub fn schema_file(&self) -> &Path {
        &self.schema_path
    }

    pub fn block_file(&self) -> &Path {
        self.blocks.path()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Persist `schema` and make it the table's schema
    fn install_schema(&mut self, schema: Schema) -> Result<()> {
        schema.save(&self.schema_path)?;

        info!(
            table = schema.name(),
            columns = schema.columns().len(),
            "schema written"
        );
        self.schema = schema;
        Ok(())
    }

    /// Seal the active block and start a fresh one
    fn rotate(&mut self) -> Result<()> {
        if self.dirty || !self.active_on_disk {
            let mode = self.active_write_mode();
            self.blocks.write(&mut self.active, mode)?;
        }

        let sealed = std::mem::take(&mut self.active);
        debug!(
            table = self.name(),
            cursor = sealed.cursor(),
            sealed = self.sealed.len() + 1,
            "sealed block"
        );
        self.sealed.push(sealed);
        self.active_on_disk = false;
        self.dirty = false;
        Ok(())
    }

    fn active_write_mode(&self) -> WriteMode {
        if self.active_on_disk {
            WriteMode::OverwriteLast
        } else {
            WriteMode::Append
        }
    }

    fn validate_name(name: &str) -> Result<TableName> {
        if name.is_empty() {
            return Err(DeltaError::InvalidName(
                "table name must not be empty".to_string(),
            ));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(DeltaError::InvalidName(format!(
                "'{}' is not a valid table name",
                name
            )));
        }
        TableName::new(name)
    }

    fn schema_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.{}", name, Self::SCHEMA_EXTENSION))
    }

    fn block_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.{}", name, Self::BLOCK_EXTENSION))
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.flush() {
                warn!(table = self.name(), error = %e, "failed to flush table on drop");
            }
        }
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name())
            .field("columns", &self.columns().len())
            .field("sealed", &self.sealed.len())
            .field("active_cursor", &self.active.cursor())
            .field("dirty", &self.dirty)
            .finish()
    }
}
