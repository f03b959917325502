//! Bitstream Module
//!
//! Cursor-based bit-level reader and writer over a word-addressable buffer.
//!
//! ## Responsibilities
//! - Bit-granular reads/writes of 1..=32 bits at any bit offset
//! - Byte-aligned bulk transfers with an unaligned fallback
//! - Fixed-capacity NUL-terminated string transfers
//! - Bounds checking against the stream's declared size
//!
//! ## Bit Layout
//! The buffer is viewed as a sequence of little-endian 32-bit words. Bit `n`
//! of the stream is bit `n % 32` of word `n / 32`, which makes the stream
//! LSB-first within every byte. A value that straddles two words is split:
//! its low part fills the top of the current word, the remainder lands at
//! the bottom of the next one.
//!
//! ```text
//!            word k                         word k+1
//! ┌──────────────────────────────┐ ┌──────────────────────────────┐
//! │ value[low bits] │ older bits │ │ newer bits │ value[high bits]│
//! └──────────────────────────────┘ └──────────────────────────────┘
//!  bit 31    shift ▲          0     bit 31                     0
//! ```
//!
//! Reader and writer are distinct types, so the I/O mode of a stream is fixed
//! when it is constructed and can never be switched.

mod reader;
mod writer;

pub use reader::BitReader;
pub use writer::BitWriter;

// =============================================================================
// Shared Constants
// =============================================================================

/// Width of a single buffer word in bits
pub const WORD_BITS: usize = 32;

/// Widest value a single `read`/`write` can transfer
pub const MAX_WIDTH: u8 = 32;

/// Largest buffer (in bytes) whose size in bits still fits a `u32`
pub const MAX_STREAM_BYTES: usize = (u32::MAX / 8) as usize;

// =============================================================================
// Word Primitives
// =============================================================================

/// Mask selecting the low `width` bits
#[inline]
pub(crate) fn low_mask(width: u8) -> u32 {
    if width >= MAX_WIDTH {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// Load word `index`, zero-filling bytes past the end of a ragged tail
#[inline]
fn load_word(buf: &[u8], index: usize) -> u32 {
    let start = index * 4;
    let end = (start + 4).min(buf.len());
    let mut raw = [0u8; 4];
    if start < end {
        raw[..end - start].copy_from_slice(&buf[start..end]);
    }
    u32::from_le_bytes(raw)
}

/// Store word `index`, dropping bytes past the end of a ragged tail
#[inline]
fn store_word(buf: &mut [u8], index: usize, word: u32) {
    let start = index * 4;
    let end = (start + 4).min(buf.len());
    if start < end {
        let raw = word.to_le_bytes();
        buf[start..end].copy_from_slice(&raw[..end - start]);
    }
}

/// Write the low `width` bits of `value` at bit `position`.
///
/// Only the target bits are modified. Caller guarantees
/// `1 <= width <= 32` and `position + width <= buf.len() * 8`.
pub(crate) fn write_bits(buf: &mut [u8], position: usize, width: u8, value: u32) {
    let start = position / WORD_BITS;
    let end = (position + width as usize - 1) / WORD_BITS;
    let shift = (position % WORD_BITS) as u32;

    let mask = (low_mask(width) as u64) << shift;
    let bits = ((value & low_mask(width)) as u64) << shift;

    let low = load_word(buf, start);
    store_word(buf, start, (low & !(mask as u32)) | bits as u32);

    if start != end {
        let high = load_word(buf, end);
        let high_mask = (mask >> WORD_BITS) as u32;
        store_word(buf, end, (high & !high_mask) | (bits >> WORD_BITS) as u32);
    }
}

/// Read `width` bits starting at bit `position`.
///
/// Same preconditions as [`write_bits`].
pub(crate) fn read_bits(buf: &[u8], position: usize, width: u8) -> u32 {
    let start = position / WORD_BITS;
    let end = (position + width as usize - 1) / WORD_BITS;
    let shift = (position % WORD_BITS) as u32;

    let mut combined = load_word(buf, start) as u64;
    if start != end {
        combined |= (load_word(buf, end) as u64) << WORD_BITS;
    }

    ((combined >> shift) as u32) & low_mask(width)
}

/// Round a bit position up to the next byte boundary
#[inline]
pub(crate) fn align_up(position: usize) -> usize {
    (position + 7) & !7
}
