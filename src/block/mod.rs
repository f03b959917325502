//! Block Module
//!
//! Fixed-size row storage pages and the `.blk` file that holds them.
//!
//! ## Responsibilities
//! - 128 KB blocks: small header + payload of back-to-back row encodings
//! - Read a block by 1-based index, append or overwrite-last on write
//! - CRC32 over the used part of every block, verified on load
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Block 1 (131072 bytes)                                  │
//! │ ┌─────────┬────────────┬──────────────────────────────┐ │
//! │ │ CRC (4) │ Cursor (4) │ Payload (131064)             │ │
//! │ └─────────┴────────────┴──────────────────────────────┘ │
//! ├─────────────────────────────────────────────────────────┤
//! │ Block 2 ...                                             │
//! ├─────────────────────────────────────────────────────────┤
//! │ Block N (active: rewritten in place until sealed)       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! Header fields are little-endian. Payload bytes past `cursor` are padding.

mod file;

pub use file::{BlockFile, WriteMode};

use crate::error::{DeltaError, Result};

// =============================================================================
// Shared Constants
// =============================================================================

/// Total on-disk size of a block
pub const BLOCK_SIZE: usize = 128 * 1024;

/// CRC (4) + Cursor (4)
pub const BLOCK_HEADER_SIZE: usize = 8;

/// Bytes available for row data in one block
pub const BLOCK_PAYLOAD_SIZE: usize = BLOCK_SIZE - BLOCK_HEADER_SIZE;

// =============================================================================
// Block
// =============================================================================

/// A single row storage page
pub struct Block {
    /// Checksum as of the last write/read
    crc: u32,
    /// Bytes of payload in use
    cursor: u32,
    payload: Box<[u8]>,
}

impl Block {
    /// Create an empty block
    pub fn new() -> Self {
        Self {
            crc: 0,
            cursor: 0,
            payload: vec![0u8; BLOCK_PAYLOAD_SIZE].into_boxed_slice(),
        }
    }

    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// Bytes of payload in use
    pub fn cursor(&self) -> usize {
        self.cursor as usize
    }

    /// Bytes of payload still free
    pub fn free(&self) -> usize {
        BLOCK_PAYLOAD_SIZE - self.cursor()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Payload bytes holding row data
    pub fn used(&self) -> &[u8] {
        &self.payload[..self.cursor()]
    }

    /// The next `len` free payload bytes, for encoding a row in place
    pub fn reserve(&mut self, len: usize) -> Result<&mut [u8]> {
        if len > self.free() {
            return Err(DeltaError::BufferBounds(format!(
                "{} bytes requested, {} free in block",
                len,
                self.free()
            )));
        }
        let start = self.cursor();
        Ok(&mut self.payload[start..start + len])
    }

    /// Mark `len` reserved bytes as used
    pub fn advance(&mut self, len: usize) -> Result<()> {
        if len > self.free() {
            return Err(DeltaError::BufferBounds(format!(
                "cannot advance cursor {} by {} bytes",
                self.cursor, len
            )));
        }
        self.cursor += len as u32;
        Ok(())
    }

    /// CRC32 over the cursor field and the used payload
    pub fn compute_crc(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.cursor.to_le_bytes());
        hasher.update(self.used());
        hasher.finalize()
    }

    /// Check the stored checksum against the contents
    pub fn verify(&self) -> Result<()> {
        let actual = self.compute_crc();
        if actual != self.crc {
            return Err(DeltaError::Corruption(format!(
                "block checksum mismatch: stored {:#010x}, computed {:#010x}",
                self.crc, actual
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Refresh the checksum and serialize the whole block
    pub(crate) fn to_bytes(&mut self) -> Vec<u8> {
        self.crc = self.compute_crc();

        let mut out = Vec::with_capacity(BLOCK_SIZE);
        out.extend_from_slice(&self.crc.to_le_bytes());
        out.extend_from_slice(&self.cursor.to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse a full block read from disk
    pub(crate) fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() != BLOCK_SIZE {
            return Err(DeltaError::Corruption(format!(
                "block is {} bytes, expected {}",
                raw.len(),
                BLOCK_SIZE
            )));
        }

        let crc = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let cursor = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
        if cursor as usize > BLOCK_PAYLOAD_SIZE {
            return Err(DeltaError::Corruption(format!(
                "block cursor {} exceeds payload size {}",
                cursor, BLOCK_PAYLOAD_SIZE
            )));
        }

        Ok(Self {
            crc,
            cursor,
            payload: raw[BLOCK_HEADER_SIZE..].to_vec().into_boxed_slice(),
        })
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("crc", &self.crc)
            .field("cursor", &self.cursor)
            .finish()
    }
}
