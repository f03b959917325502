//! Row Module
//!
//! Sparse rows: a 64-bit presence mask plus the values actually set.
//!
//! ## Responsibilities
//! - Track which columns a row carries (absent = inherited/default)
//! - Keep values ordered by column index
//! - Report the exact encoded size without serializing
//! - Encode/decode rows against the owning table's column list
//!
//! ## Encoding
//! ```text
//! ┌──────────────┬──────────────┬────────────────────────────────┐
//! │ Mask Hi (32) │ Mask Lo (32) │ Values, ascending column index │
//! └──────────────┴──────────────┴────────────────────────────────┘
//! ```
//! Fixed-width kinds are written as raw bits, `string` as a NUL-terminated
//! run, `bytes` as a 16-bit length followed by the raw bytes.

mod codec;
mod value;

pub use codec::{decode_row, encode_row};
pub use value::{Value, MAX_BYTES_LEN, MAX_STRING_LEN};

use crate::error::{DeltaError, Result};
use crate::schema::{Column, MAX_COLUMNS};

/// Size of the encoded presence mask
pub const MASK_SIZE: usize = 8;

/// A sparse row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// Bit `i` set ⇔ column `i` has a value
    mask: u64,
    /// Values in ascending column-index order, one per set mask bit
    values: Vec<Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set column `index`, replacing any existing value
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        if index >= MAX_COLUMNS {
            return Err(DeltaError::SchemaMismatch(format!(
                "column index {} exceeds the limit of {}",
                index, MAX_COLUMNS
            )));
        }

        let value = value.into();
        value.validate()?;

        let slot = self.slot(index);
        if self.has(index) {
            self.values[slot] = value;
        } else {
            self.values.insert(slot, value);
            self.mask |= 1u64 << index;
        }
        Ok(())
    }

    /// Builder-style `set`
    pub fn with(mut self, index: usize, value: impl Into<Value>) -> Result<Self> {
        self.set(index, value)?;
        Ok(self)
    }

    /// Clear column `index`, returning its previous value
    pub fn unset(&mut self, index: usize) -> Option<Value> {
        if !self.has(index) {
            return None;
        }
        let slot = self.slot(index);
        self.mask &= !(1u64 << index);
        Some(self.values.remove(slot))
    }

    pub fn has(&self, index: usize) -> bool {
        index < MAX_COLUMNS && self.mask & (1u64 << index) != 0
    }

    /// Value of column `index`, `None` when absent
    pub fn get(&self, index: usize) -> Option<&Value> {
        if self.has(index) {
            self.values.get(self.slot(index))
        } else {
            None
        }
    }

    /// The presence mask
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Number of columns set
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(column index, value)` pairs in ascending index order
    pub fn values(&self) -> impl Iterator<Item = (usize, &Value)> + '_ {
        (0..MAX_COLUMNS)
            .filter(move |&i| self.has(i))
            .zip(self.values.iter())
    }

    /// One entry per column of a `column_count`-wide schema, `None` if absent
    pub fn cells(&self, column_count: usize) -> impl Iterator<Item = Option<&Value>> + '_ {
        (0..column_count).map(move |i| self.get(i))
    }

    /// Exact number of bytes `encode_row` writes for this row
    pub fn size_in_bytes(&self) -> usize {
        MASK_SIZE + self.values.iter().map(Value::encoded_len).sum::<usize>()
    }

    /// Check every value against the column it is stored in
    pub fn check_columns(&self, columns: &[Column]) -> Result<()> {
        for (index, value) in self.values() {
            let column = columns.get(index).ok_or_else(|| {
                DeltaError::SchemaMismatch(format!(
                    "row sets column {} but the table has {} columns",
                    index,
                    columns.len()
                ))
            })?;

            if value.kind() != column.kind() || value.is_unsigned() != column.is_unsigned() {
                return Err(DeltaError::SchemaMismatch(format!(
                    "column '{}' is {}{} but the value is {:?}",
                    column.name(),
                    if column.is_unsigned() { "unsigned " } else { "" },
                    column.kind(),
                    value
                )));
            }
        }
        Ok(())
    }

    /// Position of column `index` within `values`
    fn slot(&self, index: usize) -> usize {
        (self.mask & ((1u64 << index) - 1)).count_ones() as usize
    }
}
