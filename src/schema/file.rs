//! Schema file (`.tbl`)
//!
//! Encodes a table's name and column list, and verifies the embedded name
//! when the file is loaded.

use std::fs;
use std::path::Path;

use bytes::Bytes;

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{DeltaError, Result};

use super::{decode_column, encode_column, Column, TableName};

/// Fixed width of the table name field
pub const TABLE_NAME_FIELD_LEN: usize = TableName::MAX_LEN;

/// Current (and only) schema format version
pub const SCHEMA_VERSION: u8 = 0;

/// Column indexes are bits of a 64-bit presence mask
pub const MAX_COLUMNS: usize = 64;

/// Name + version + column count
const HEADER_BITS: usize = (TABLE_NAME_FIELD_LEN + 2) * 8;

/// A table's persisted shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: TableName,
    version: u8,
    columns: Vec<Column>,
}

impl Schema {
    /// A schema with no columns yet
    pub fn empty(name: TableName) -> Self {
        Self {
            name,
            version: SCHEMA_VERSION,
            columns: Vec::new(),
        }
    }

    /// A schema with `columns`; there must be between 1 and `MAX_COLUMNS`
    pub fn new(name: TableName, columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(DeltaError::InvalidValue(format!(
                "table '{}' needs at least one column",
                name
            )));
        }
        if columns.len() > MAX_COLUMNS {
            return Err(DeltaError::SchemaMismatch(format!(
                "{} columns exceeds the limit of {}",
                columns.len(),
                MAX_COLUMNS
            )));
        }

        Ok(Self {
            name,
            version: SCHEMA_VERSION,
            columns,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn table_name(&self) -> &TableName {
        &self.name
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index of the column called `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Serialize to the `.tbl` byte layout
    pub fn encode(&self) -> Result<Bytes> {
        let bits = HEADER_BITS
            + self
                .columns
                .iter()
                .map(Column::encoded_bits)
                .sum::<usize>();
        let mut writer = BitWriter::with_capacity((bits + 7) / 8);

        // Fixed-width name field, NUL-padded
        let mut name_field = [0u8; TABLE_NAME_FIELD_LEN];
        name_field[..self.name.len()].copy_from_slice(self.name.as_bytes());
        writer.write_bytes(&name_field)?;

        writer.write(8, self.version as u32)?;
        writer.write(8, self.columns.len() as u32)?;

        for column in &self.columns {
            encode_column(&mut writer, column)?;
        }

        Ok(writer.into_bytes())
    }

    /// Parse `.tbl` bytes, requiring the embedded name to equal `expected`
    pub fn decode(expected: &str, data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::over(data);

        let mut name_field = [0u8; TABLE_NAME_FIELD_LEN];
        reader.read_into(&mut name_field)?;
        let name_len = name_field
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(TABLE_NAME_FIELD_LEN);
        let raw_name = &name_field[..name_len];

        if raw_name != expected.as_bytes() {
            return Err(DeltaError::FormatMismatch {
                expected: expected.to_string(),
                found: String::from_utf8_lossy(raw_name).into_owned(),
            });
        }
        let name = TableName::from_disk(raw_name.to_vec())?;

        let version = reader.read(8)? as u8;
        if version != SCHEMA_VERSION {
            return Err(DeltaError::Corruption(format!(
                "unsupported schema version {}",
                version
            )));
        }

        let count = reader.read(8)? as usize;
        if count > MAX_COLUMNS {
            return Err(DeltaError::Corruption(format!(
                "schema declares {} columns, limit is {}",
                count, MAX_COLUMNS
            )));
        }

        let mut columns = Vec::with_capacity(count);
        for _ in 0..count {
            columns.push(decode_column(&mut reader)?);
        }

        Ok(Self {
            name,
            version,
            columns,
        })
    }

    // =========================================================================
    // File I/O
    // =========================================================================

    /// Read and verify a schema file
    pub fn load(path: &Path, expected: &str) -> Result<Self> {
        let data = fs::read(path)?;
        Self::decode(expected, &data)
    }

    /// Write the schema file, replacing any previous contents
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.encode()?)?;
        Ok(())
    }
}
