//! Block file (`.blk`)
//!
//! Every call opens the file, performs one read or write, and closes it
//! again; no descriptor is held between operations.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DeltaError, Result};

use super::{Block, BLOCK_SIZE};

/// Where `BlockFile::write` places a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Add a new block after the last one
    Append,
    /// Rewrite the last block in place
    OverwriteLast,
}

/// Handle to a `.blk` file
#[derive(Debug, Clone)]
pub struct BlockFile {
    path: PathBuf,
    /// Verify block checksums on read
    verify: bool,
    /// fsync after each write
    sync: bool,
}

impl BlockFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            verify: true,
            sync: false,
        }
    }

    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty file, truncating any existing one
    pub fn create(&self) -> Result<()> {
        File::create(&self.path)?;
        Ok(())
    }

    /// Number of complete blocks in the file
    pub fn count(&self) -> Result<u32> {
        let len = std::fs::metadata(&self.path)?.len();
        if len % BLOCK_SIZE as u64 != 0 {
            debug!(
                path = %self.path.display(),
                len,
                "block file has a partial trailing block"
            );
        }
        Ok((len / BLOCK_SIZE as u64) as u32)
    }

    /// Read block `index` (1-based)
    pub fn read(&self, index: u32) -> Result<Block> {
        if index == 0 {
            return Err(DeltaError::InvalidValue(
                "block indexes start at 1".to_string(),
            ));
        }

        let mut file = File::open(&self.path)?;
        let count = (file.metadata()?.len() / BLOCK_SIZE as u64) as u32;
        if index > count {
            return Err(DeltaError::Corruption(format!(
                "block {} requested but {} holds {} blocks",
                index,
                self.path.display(),
                count
            )));
        }

        file.seek(SeekFrom::Start(Self::offset(index)))?;
        let mut raw = vec![0u8; BLOCK_SIZE];
        file.read_exact(&mut raw)?;

        let block = Block::from_bytes(&raw)?;
        if self.verify {
            block.verify().map_err(|e| match e {
                DeltaError::Corruption(msg) => {
                    DeltaError::Corruption(format!("block {}: {}", index, msg))
                }
                other => other,
            })?;
        }
        Ok(block)
    }

    /// Read every block in file order
    pub fn read_all(&self) -> Result<Vec<Block>> {
        (1..=self.count()?).map(|index| self.read(index)).collect()
    }

    /// Write `block`, refreshing its checksum. Returns the index written.
    pub fn write(&self, block: &mut Block, mode: WriteMode) -> Result<u32> {
        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let count = (file.metadata()?.len() / BLOCK_SIZE as u64) as u32;

        // Positions are derived from whole blocks, so a torn trailing
        // block is overwritten rather than extended.
        let index = match mode {
            WriteMode::Append => count + 1,
            WriteMode::OverwriteLast => {
                if count == 0 {
                    return Err(DeltaError::InvalidValue(format!(
                        "no block to overwrite in {}",
                        self.path.display()
                    )));
                }
                count
            }
        };

        file.seek(SeekFrom::Start(Self::offset(index)))?;
        file.write_all(&block.to_bytes())?;
        if self.sync {
            file.sync_data()?;
        }

        debug!(
            path = %self.path.display(),
            index,
            cursor = block.cursor(),
            ?mode,
            "wrote block"
        );
        Ok(index)
    }

    /// Byte offset of block `index`
    fn offset(index: u32) -> u64 {
        (index as u64 - 1) * BLOCK_SIZE as u64
    }
}
