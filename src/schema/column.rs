//! Column descriptors
//!
//! A column is a kind, its flags, a name and an optional comment. On disk a
//! descriptor is bit-packed: the comment is preceded by a single presence bit,
//! so descriptors after the first are usually not byte-aligned.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{DeltaError, Result};

use super::kind::{split_type_byte, type_byte};
use super::{ColumnComment, ColumnFlags, ColumnKind, ColumnName};

/// Size of the name field, terminator included
pub const NAME_FIELD_LEN: usize = ColumnName::MAX_LEN + 1;

/// Size of the comment field, terminator included
pub const COMMENT_FIELD_LEN: usize = ColumnComment::MAX_LEN + 1;

/// A single table column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    kind: ColumnKind,
    flags: ColumnFlags,
    name: ColumnName,
    comment: ColumnComment,
}

impl Column {
    /// Create a column with no flags and no comment
    pub fn new(name: &str, kind: ColumnKind) -> Result<Self> {
        if name.is_empty() {
            return Err(DeltaError::InvalidName(
                "column name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            kind,
            flags: ColumnFlags::empty(),
            name: ColumnName::new(name)?,
            comment: ColumnComment::default(),
        })
    }

    /// Attach a comment (empty clears it)
    pub fn with_comment(mut self, comment: &str) -> Result<Self> {
        self.comment = ColumnComment::new(comment)?;
        Ok(self)
    }

    /// Add flags to the column
    pub fn with_flags(mut self, flags: ColumnFlags) -> Self {
        self.flags.insert(flags);
        self
    }

    /// Shorthand for `with_flags(ColumnFlags::UNSIGNED)`
    pub fn unsigned(self) -> Self {
        self.with_flags(ColumnFlags::UNSIGNED)
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn flags(&self) -> ColumnFlags {
        self.flags
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn comment(&self) -> &str {
        self.comment.as_str()
    }

    /// Integer column whose payloads decode as unsigned values
    pub fn is_unsigned(&self) -> bool {
        self.kind.is_integer() && self.flags.contains(ColumnFlags::UNSIGNED)
    }

    pub fn is_indexed(&self) -> bool {
        self.flags.contains(ColumnFlags::INDEXED)
    }

    pub fn is_sparse(&self) -> bool {
        self.flags.contains(ColumnFlags::SPARSE)
    }

    /// The packed kind + flags byte
    pub fn type_byte(&self) -> u8 {
        type_byte(self.kind, self.flags)
    }

    /// Encoded descriptor size in bits
    pub(crate) fn encoded_bits(&self) -> usize {
        let mut bits = 8 + (self.name.len() + 1) * 8 + 1;
        if !self.comment.is_empty() {
            bits += (self.comment.len() + 1) * 8;
        }
        bits
    }
}

/// Write one column descriptor
pub fn encode_column(writer: &mut BitWriter<'_>, column: &Column) -> Result<()> {
    writer.write(8, column.type_byte() as u32)?;
    writer.write_string(NAME_FIELD_LEN, column.name.as_bytes())?;

    if column.comment.is_empty() {
        writer.write_bool(false)
    } else {
        writer.write_bool(true)?;
        writer.write_string(COMMENT_FIELD_LEN, column.comment.as_bytes())
    }
}

/// Read one column descriptor
pub fn decode_column(reader: &mut BitReader<'_>) -> Result<Column> {
    let (kind, flags) = split_type_byte(reader.read(8)? as u8)?;
    let name = ColumnName::from_disk(reader.read_string(NAME_FIELD_LEN)?)?;

    let comment = if reader.read_bool()? {
        ColumnComment::from_disk(reader.read_string(COMMENT_FIELD_LEN)?)?
    } else {
        ColumnComment::default()
    };

    Ok(Column {
        kind,
        flags,
        name,
        comment,
    })
}
