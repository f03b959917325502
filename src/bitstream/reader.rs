//! Bitstream Reader
//!
//! Read-only half of the bitstream.

use bytes::Bytes;

use crate::error::{DeltaError, Result};

use super::writer::oversize;
use super::{align_up, read_bits, MAX_STREAM_BYTES, MAX_WIDTH};

/// Backing storage of a reader
enum Buffer<'a> {
    Detached,
    /// Copied or handed-over bytes owned by the stream
    Owned(Bytes),
    Borrowed(&'a [u8]),
}

impl Buffer<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Detached => &[],
            Buffer::Owned(buf) => &buf[..],
            Buffer::Borrowed(buf) => &buf[..],
        }
    }
}

/// Reads values from a stream of bits
///
/// Mirrors [`BitWriter`](super::BitWriter): every `read_*` consumes exactly
/// the bits the matching `write_*` produced.
pub struct BitReader<'a> {
    buf: Buffer<'a>,
    position: usize,
    size: usize,
    poisoned: Option<String>,
}

impl<'a> BitReader<'a> {
    /// Create a reader with no buffer; call `attach` before reading
    pub fn empty() -> Self {
        Self {
            buf: Buffer::Detached,
            position: 0,
            size: 0,
            poisoned: None,
        }
    }

    /// Wrap an existing buffer without copying it
    pub fn over(buf: &'a [u8]) -> Self {
        let mut reader = Self::empty();
        reader.attach(buf);
        reader
    }

    /// Copy an opaque byte sequence into a reader that owns it
    pub fn copy_from(data: &[u8]) -> BitReader<'static> {
        BitReader::from_bytes(Bytes::copy_from_slice(data))
    }

    /// Take ownership of an existing `Bytes` buffer
    pub fn from_bytes(data: Bytes) -> BitReader<'static> {
        if data.len() > MAX_STREAM_BYTES {
            return BitReader {
                poisoned: Some(oversize(data.len())),
                ..BitReader::empty()
            };
        }

        BitReader {
            size: data.len() * 8,
            buf: Buffer::Owned(data),
            position: 0,
            poisoned: None,
        }
    }

    /// Bind a buffer to an empty reader; attaching twice poisons it
    pub fn attach(&mut self, buf: &'a [u8]) {
        if self.poisoned.is_some() {
            return;
        }
        if !matches!(self.buf, Buffer::Detached) {
            self.poisoned = Some("buffer already attached".to_string());
            return;
        }
        if buf.len() > MAX_STREAM_BYTES {
            self.poisoned = Some(oversize(buf.len()));
            return;
        }

        self.size = buf.len() * 8;
        self.position = 0;
        self.buf = Buffer::Borrowed(buf);
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn is_valid(&self) -> bool {
        self.poisoned.is_none()
    }

    pub fn error(&self) -> Option<&str> {
        self.poisoned.as_deref()
    }

    /// Current position in bits
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total size in bits
    pub fn size(&self) -> usize {
        self.size
    }

    /// Bits left to read
    pub fn remaining(&self) -> usize {
        self.size - self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    // =========================================================================
    // Positioning
    // =========================================================================

    /// Move to an absolute bit position (may equal `size`)
    pub fn seek(&mut self, position: usize) -> Result<()> {
        self.check_valid()?;
        if position > self.size {
            return Err(DeltaError::BufferBounds(format!(
                "seek to bit {} past stream size {}",
                position, self.size
            )));
        }
        self.position = position;
        Ok(())
    }

    /// Advance to the next byte boundary
    pub fn align(&mut self) {
        self.position = align_up(self.position).min(self.size);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read `width` bits (at most 32)
    pub fn read(&mut self, width: u8) -> Result<u32> {
        self.check_valid()?;
        if width > MAX_WIDTH {
            return Err(DeltaError::BufferBounds(format!(
                "bit width {} exceeds {}",
                width, MAX_WIDTH
            )));
        }
        self.check_read(width as usize)?;
        if width == 0 {
            return Ok(0);
        }

        let value = read_bits(self.buf.as_slice(), self.position, width);
        self.position += width as usize;
        Ok(value)
    }

    /// Read a single bit
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read(1)? == 1)
    }

    /// Read a 64-bit value stored as two 32-bit halves, high half first
    pub fn read_u64(&mut self) -> Result<u64> {
        self.check_read(64)?;
        let high = self.read(32)? as u64;
        let low = self.read(32)? as u64;
        Ok((high << 32) | low)
    }

    /// Read `len` raw bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; len];
        self.read_into(&mut out)?;
        Ok(out)
    }

    /// Fill `dest` with raw bytes.
    ///
    /// Copies directly when the cursor is byte-aligned, otherwise reads one
    /// byte at a time through the bit path.
    pub fn read_into(&mut self, dest: &mut [u8]) -> Result<()> {
        self.check_read(dest.len() * 8)?;

        if self.position % 8 == 0 {
            let start = self.position / 8;
            dest.copy_from_slice(&self.buf.as_slice()[start..start + dest.len()]);
            self.position += dest.len() * 8;
        } else {
            for byte in dest.iter_mut() {
                *byte = self.read(8)? as u8;
            }
        }
        Ok(())
    }

    /// Read a NUL-terminated string from a field of at most `max_len` bytes.
    ///
    /// Stops after the terminator or after `max_len` bytes, whichever comes
    /// first. The terminator is consumed but not returned.
    pub fn read_string(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for _ in 0..max_len {
            let byte = self.read(8)? as u8;
            if byte == 0 {
                break;
            }
            out.push(byte);
        }
        Ok(out)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_valid(&self) -> Result<()> {
        match &self.poisoned {
            Some(reason) => Err(DeltaError::BufferBounds(format!(
                "stream is unusable: {}",
                reason
            ))),
            None => Ok(()),
        }
    }

    fn check_read(&self, bits: usize) -> Result<()> {
        self.check_valid()?;
        if bits > self.remaining() {
            return Err(DeltaError::BufferBounds(format!(
                "read of {} bits at position {} exceeds stream size {}",
                bits, self.position, self.size
            )));
        }
        Ok(())
    }
}

impl Default for BitReader<'_> {
    fn default() -> Self {
        Self::empty()
    }
}
