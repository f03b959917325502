//! Schema Module
//!
//! Column descriptors and the `.tbl` schema file.
//!
//! ## Responsibilities
//! - Column kinds and flags packed into a single type byte
//! - Length-bounded text for table names, column names and comments
//! - Column descriptor codec over a bitstream
//! - Schema file codec with table-name verification
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Table Name (32, NUL-padded) │ Version (1) │ Column Count (1) │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Column Descriptor (bit-packed, repeated Column Count times)  │
//! │ ┌──────────┬──────────────┬─────────────┬──────────────────┐ │
//! │ │ Type (8) │ Name (NUL-t) │ HasCmt (1b) │ Comment (NUL-t)? │ │
//! │ └──────────┴──────────────┴─────────────┴──────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod column;
mod file;
mod kind;
mod text;

pub use column::{decode_column, encode_column, Column, COMMENT_FIELD_LEN, NAME_FIELD_LEN};
pub use file::{Schema, MAX_COLUMNS, SCHEMA_VERSION, TABLE_NAME_FIELD_LEN};
pub use kind::{ColumnFlags, ColumnKind};
pub use text::{BoundedText, ColumnComment, ColumnName, TableName};
