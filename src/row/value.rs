//! Typed column values

use std::fmt;

use crate::error::{DeltaError, Result};
use crate::schema::ColumnKind;

/// Longest string value in bytes (the terminator makes the field 256)
pub const MAX_STRING_LEN: usize = 255;

/// Longest bytes value, bounded by its 16-bit length prefix
pub const MAX_BYTES_LEN: usize = u16::MAX as usize;

/// A single column value
///
/// Unsigned variants are only valid in columns carrying the unsigned flag;
/// they share the bit encoding of their signed counterparts.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Bool(bool),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// The column kind this value is stored as
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Int8(_) | Value::UInt8(_) => ColumnKind::Int8,
            Value::Int16(_) | Value::UInt16(_) => ColumnKind::Int16,
            Value::Int32(_) | Value::UInt32(_) => ColumnKind::Int32,
            Value::Int64(_) | Value::UInt64(_) => ColumnKind::Int64,
            Value::Bool(_) => ColumnKind::Bool,
            Value::Float32(_) => ColumnKind::Float32,
            Value::Float64(_) => ColumnKind::Float64,
            Value::String(_) => ColumnKind::String,
            Value::Bytes(_) => ColumnKind::Bytes,
        }
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Value::UInt8(_) | Value::UInt16(_) | Value::UInt32(_) | Value::UInt64(_)
        )
    }

    /// Bytes the row codec writes for this value
    pub fn encoded_len(&self) -> usize {
        match self {
            Value::String(s) => s.len() + 1,
            Value::Bytes(b) => b.len() + 2,
            other => other.kind().fixed_size().unwrap_or(0),
        }
    }

    /// Check the value fits its on-disk field
    pub fn validate(&self) -> Result<()> {
        match self {
            Value::String(s) if s.len() > MAX_STRING_LEN => Err(DeltaError::InvalidValue(
                format!("string of {} bytes exceeds {}", s.len(), MAX_STRING_LEN),
            )),
            Value::String(s) if s.contains('\0') => Err(DeltaError::InvalidValue(
                "string value contains a NUL byte".to_string(),
            )),
            Value::Bytes(b) if b.len() > MAX_BYTES_LEN => Err(DeltaError::InvalidValue(
                format!("bytes value of {} bytes exceeds {}", b.len(), MAX_BYTES_LEN),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt8(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Bytes(v) => {
                f.write_str("0x")?;
                for byte in v {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    bool => Bool,
    f32 => Float32,
    f64 => Float64,
    String => String,
    &str => String,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
}
