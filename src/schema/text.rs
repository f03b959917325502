//! Length-bounded text
//!
//! Names and comments live in fixed-capacity NUL-terminated fields on disk.
//! `BoundedText` rejects input that would not fit instead of truncating it.

use std::fmt;

use crate::error::{DeltaError, Result};

/// UTF-8 text of at most `MAX` bytes with no embedded NUL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BoundedText<const MAX: usize>(String);

/// Column name: up to 31 bytes
pub type ColumnName = BoundedText<31>;

/// Column comment: up to 127 bytes
pub type ColumnComment = BoundedText<127>;

/// Table name: up to 32 bytes
pub type TableName = BoundedText<32>;

impl<const MAX: usize> BoundedText<MAX> {
    /// Maximum length in bytes
    pub const MAX_LEN: usize = MAX;

    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.len() > MAX {
            return Err(DeltaError::InvalidName(format!(
                "'{}' is {} bytes, limit is {}",
                text,
                text.len(),
                MAX
            )));
        }
        if text.contains('\0') {
            return Err(DeltaError::InvalidName(format!(
                "{:?} contains a NUL byte",
                text
            )));
        }
        Ok(Self(text))
    }

    /// Build from bytes read off disk; invalid UTF-8 is corruption
    pub(crate) fn from_disk(bytes: Vec<u8>) -> Result<Self> {
        let text = String::from_utf8(bytes).map_err(|e| {
            DeltaError::Corruption(format!("stored text is not UTF-8: {}", e))
        })?;
        Self::new(text).map_err(|e| DeltaError::Corruption(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const MAX: usize> fmt::Display for BoundedText<MAX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const MAX: usize> AsRef<str> for BoundedText<MAX> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<const MAX: usize> TryFrom<&str> for BoundedText<MAX> {
    type Error = DeltaError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}
