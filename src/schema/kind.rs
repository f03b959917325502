//! Column kinds and type flags
//!
//! A column's type byte holds the kind in its low four bits and the
//! unsigned / indexed / sparse flags in bits 5..=7.

use std::fmt;
use std::str::FromStr;

use crate::error::{DeltaError, Result};

/// Mask selecting the kind from a type byte
const KIND_MASK: u8 = 0x0f;

/// Storage kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColumnKind {
    /// 1 byte
    Int8 = 0,
    /// 2 bytes
    Int16 = 1,
    /// 4 bytes
    Int32 = 2,
    /// 8 bytes
    Int64 = 3,
    /// 1 byte (0 or 1)
    Bool = 4,
    /// 4 bytes, IEEE 754
    Float32 = 5,
    /// 8 bytes, IEEE 754
    Float64 = 6,
    /// NUL-terminated, at most 255 bytes
    String = 7,
    /// 2-byte length + raw bytes, at most 65535 bytes
    Bytes = 8,
}

impl ColumnKind {
    /// Decode a kind code
    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            0 => ColumnKind::Int8,
            1 => ColumnKind::Int16,
            2 => ColumnKind::Int32,
            3 => ColumnKind::Int64,
            4 => ColumnKind::Bool,
            5 => ColumnKind::Float32,
            6 => ColumnKind::Float64,
            7 => ColumnKind::String,
            8 => ColumnKind::Bytes,
            other => {
                return Err(DeltaError::Corruption(format!(
                    "unknown column kind code {}",
                    other
                )))
            }
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Encoded size for fixed-width kinds, `None` for string/bytes
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            ColumnKind::Int8 | ColumnKind::Bool => Some(1),
            ColumnKind::Int16 => Some(2),
            ColumnKind::Int32 | ColumnKind::Float32 => Some(4),
            ColumnKind::Int64 | ColumnKind::Float64 => Some(8),
            ColumnKind::String | ColumnKind::Bytes => None,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ColumnKind::Int8 | ColumnKind::Int16 | ColumnKind::Int32 | ColumnKind::Int64
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnKind::Int8 => "int8",
            ColumnKind::Int16 => "int16",
            ColumnKind::Int32 => "int32",
            ColumnKind::Int64 => "int64",
            ColumnKind::Bool => "bool",
            ColumnKind::Float32 => "float32",
            ColumnKind::Float64 => "float64",
            ColumnKind::String => "string",
            ColumnKind::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnKind {
    type Err = DeltaError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "int8" => ColumnKind::Int8,
            "int16" => ColumnKind::Int16,
            "int32" => ColumnKind::Int32,
            "int64" => ColumnKind::Int64,
            "bool" => ColumnKind::Bool,
            "float32" | "float" => ColumnKind::Float32,
            "float64" | "double" => ColumnKind::Float64,
            "string" => ColumnKind::String,
            "bytes" => ColumnKind::Bytes,
            other => {
                return Err(DeltaError::InvalidValue(format!(
                    "unknown column kind '{}'",
                    other
                )))
            }
        })
    }
}

/// Flag bits stored alongside the kind in a column's type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColumnFlags(u8);

impl ColumnFlags {
    /// Integer payloads are unsigned
    pub const UNSIGNED: ColumnFlags = ColumnFlags(1 << 5);
    /// Reserved: no index structure exists yet
    pub const INDEXED: ColumnFlags = ColumnFlags(1 << 6);
    /// Reserved
    pub const SPARSE: ColumnFlags = ColumnFlags(1 << 7);

    const ALL: u8 = (1 << 5) | (1 << 6) | (1 << 7);

    pub const fn empty() -> Self {
        ColumnFlags(0)
    }

    /// Keep only the known flag bits of `bits`
    pub const fn from_bits_truncate(bits: u8) -> Self {
        ColumnFlags(bits & Self::ALL)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: ColumnFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: ColumnFlags) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for ColumnFlags {
    type Output = ColumnFlags;

    fn bitor(self, rhs: ColumnFlags) -> ColumnFlags {
        ColumnFlags(self.0 | rhs.0)
    }
}

/// Pack a kind and flags into a type byte
pub(crate) fn type_byte(kind: ColumnKind, flags: ColumnFlags) -> u8 {
    kind.code() | flags.bits()
}

/// Split a type byte into kind and flags
pub(crate) fn split_type_byte(byte: u8) -> Result<(ColumnKind, ColumnFlags)> {
    let kind = ColumnKind::from_code(byte & KIND_MASK)?;
    Ok((kind, ColumnFlags::from_bits_truncate(byte)))
}
