//! Bitstream Writer
//!
//! Write-only half of the bitstream.

use bytes::{Bytes, BytesMut};

use crate::error::{DeltaError, Result};

use super::{align_up, write_bits, MAX_STREAM_BYTES, MAX_WIDTH};

/// Backing storage of a writer
enum Buffer<'a> {
    /// No buffer attached yet
    Detached,
    /// Buffer allocated and owned by the stream
    Owned(BytesMut),
    /// Caller's buffer, e.g. the free tail of a block payload
    Borrowed(&'a mut [u8]),
}

impl Buffer<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Detached => &[],
            Buffer::Owned(buf) => &buf[..],
            Buffer::Borrowed(buf) => &buf[..],
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Buffer::Detached => &mut [],
            Buffer::Owned(buf) => &mut buf[..],
            Buffer::Borrowed(buf) => &mut buf[..],
        }
    }
}

/// Writes values as a stream of bits
///
/// A writer either owns its buffer (`with_capacity`) or borrows one
/// (`over`, `attach`). A stream whose construction failed is poisoned:
/// every subsequent operation returns [`DeltaError::BufferBounds`].
pub struct BitWriter<'a> {
    buf: Buffer<'a>,
    /// Bits written so far
    position: usize,
    /// Total bits available
    size: usize,
    /// Set once when construction or attach fails
    poisoned: Option<String>,
}

impl<'a> BitWriter<'a> {
    /// Create a writer with no buffer; call `attach` before writing
    pub fn empty() -> Self {
        Self {
            buf: Buffer::Detached,
            position: 0,
            size: 0,
            poisoned: None,
        }
    }

    /// Create a writer over a freshly zeroed buffer of `bytes` bytes
    pub fn with_capacity(bytes: usize) -> BitWriter<'static> {
        if bytes > MAX_STREAM_BYTES {
            return BitWriter {
                poisoned: Some(oversize(bytes)),
                ..BitWriter::empty()
            };
        }

        BitWriter {
            buf: Buffer::Owned(BytesMut::zeroed(bytes)),
            position: 0,
            size: bytes * 8,
            poisoned: None,
        }
    }

    /// Create a writer over a caller-owned buffer
    pub fn over(buf: &'a mut [u8]) -> Self {
        let mut writer = Self::empty();
        writer.attach(buf);
        writer
    }

    /// Bind a buffer to an empty writer.
    ///
    /// A writer accepts exactly one buffer; attaching twice poisons it.
    pub fn attach(&mut self, buf: &'a mut [u8]) {
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

    /// Whether the stream can still be written to
    pub fn is_valid(&self) -> bool {
        self.poisoned.is_none()
    }

    /// Reason the stream was poisoned, if it was
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

    /// Bits left before the end of the buffer
    pub fn remaining(&self) -> usize {
        self.size - self.position
    }

    /// Number of bytes touched so far (position rounded up)
    pub fn bytes_written(&self) -> usize {
        align_up(self.position) / 8
    }

    /// The whole underlying buffer, including bytes not yet written
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// Consume the writer, returning the bytes written so far
    pub fn into_bytes(self) -> Bytes {
        let len = self.bytes_written();
        match self.buf {
            Buffer::Detached => Bytes::new(),
            Buffer::Owned(mut buf) => {
                buf.truncate(len);
                buf.freeze()
            }
            Buffer::Borrowed(buf) => Bytes::copy_from_slice(&buf[..len]),
        }
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
    // Writes
    // =========================================================================

    /// Write the low `width` bits of `value`
    pub fn write(&mut self, width: u8, value: u32) -> Result<()> {
        self.check_valid()?;
        if width > MAX_WIDTH {
            return Err(DeltaError::BufferBounds(format!(
                "bit width {} exceeds {}",
                width, MAX_WIDTH
            )));
        }
        self.check_write(width as usize)?;
        if width == 0 {
            return Ok(());
        }

        write_bits(self.buf.as_mut_slice(), self.position, width, value);
        self.position += width as usize;
        Ok(())
    }

    /// Write a single bit
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write(1, value as u32)
    }

    /// Write a 64-bit value as two 32-bit halves, high half first
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.check_write(64)?;
        self.write(32, (value >> 32) as u32)?;
        self.write(32, value as u32)
    }

    /// Write raw bytes.
    ///
    /// Copies directly when the cursor is byte-aligned, otherwise falls back
    /// to one 8-bit write per byte. Both paths produce the same bits.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.check_write(data.len() * 8)?;

        if self.position % 8 == 0 {
            let start = self.position / 8;
            self.buf.as_mut_slice()[start..start + data.len()].copy_from_slice(data);
            self.position += data.len() * 8;
        } else {
            for &byte in data {
                self.write(8, byte as u32)?;
            }
        }
        Ok(())
    }

    /// Write a NUL-terminated string into a field of `max_len` bytes.
    ///
    /// `max_len` includes the terminator, so `data` must be shorter than it.
    /// Over-length input and embedded NULs are rejected, never truncated.
    pub fn write_string(&mut self, max_len: usize, data: &[u8]) -> Result<()> {
        if data.len() >= max_len {
            return Err(DeltaError::InvalidValue(format!(
                "string of {} bytes does not fit a {}-byte field",
                data.len(),
                max_len
            )));
        }
        if data.contains(&0) {
            return Err(DeltaError::InvalidValue(
                "string contains an embedded NUL".to_string(),
            ));
        }

        self.check_write((data.len() + 1) * 8)?;
        self.write_bytes(data)?;
        self.write(8, 0)
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

    fn check_write(&self, bits: usize) -> Result<()> {
        self.check_valid()?;
        if bits > self.remaining() {
            return Err(DeltaError::BufferBounds(format!(
                "write of {} bits at position {} exceeds stream size {}",
                bits, self.position, self.size
            )));
        }
        Ok(())
    }
}

impl Default for BitWriter<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

pub(super) fn oversize(bytes: usize) -> String {
    format!(
        "buffer of {} bytes exceeds the {}-byte stream limit",
        bytes, MAX_STREAM_BYTES
    )
}
