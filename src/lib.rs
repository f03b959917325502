//! # DeltaDB
//!
//! A minimal embedded storage engine with:
//! - A bit-level codec packing values across 32-bit word boundaries
//! - Sparse rows: a presence mask plus only the columns actually set
//! - Append-only 128 KB blocks, rotated as they fill
//! - A binary `.tbl` schema format with name verification
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Database                              │
//! │           (directory lock, name → table map)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                         Table                                │
//! │            (schema + active block + sealed blocks)           │
//! └──────────┬─────────────────────────────────┬────────────────┘
//!            │                                 │
//!            ▼                                 ▼
//!   ┌─────────────────┐               ┌─────────────────┐
//!   │  Schema (.tbl)  │               │   Block (.blk)  │
//!   │ column codec    │               │   row codec     │
//!   └────────┬────────┘               └────────┬────────┘
//!            │                                 │
//!            └──────────────┬──────────────────┘
//!                           ▼
//!                   ┌───────────────┐
//!                   │   Bitstream   │
//!                   └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod bitstream;
pub mod schema;
pub mod row;
pub mod block;
pub mod table;
pub mod lock;
pub mod database;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use database::{Database, TableHandle};
pub use error::{DeltaError, Result};
pub use row::{Row, Value};
pub use schema::{Column, ColumnFlags, ColumnKind};
pub use table::Table;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of DeltaDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
