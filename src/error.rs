//! Error types for DeltaDB
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using DeltaError
pub type Result<T> = std::result::Result<T, DeltaError>;

/// Unified error type for DeltaDB operations
#[derive(Debug, Error)]
pub enum DeltaError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Format / Integrity Errors
    // -------------------------------------------------------------------------
    #[error("Table format mismatch: expected table '{expected}', file names '{found}'")]
    FormatMismatch { expected: String, found: String },

    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Bitstream Errors
    // -------------------------------------------------------------------------
    #[error("Buffer bounds violation: {0}")]
    BufferBounds(String),

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Table '{0}' has no columns")]
    SchemaNotSet(String),

    #[error("Row of {size} bytes exceeds block capacity of {capacity} bytes")]
    RowTooLarge { size: usize, capacity: usize },

    // -------------------------------------------------------------------------
    // Database Errors
    // -------------------------------------------------------------------------
    #[error("Table already exists: {0}")]
    TableExists(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Data directory is locked: {0}")]
    LockContention(PathBuf),
}
