//! Tests for blocks and the block file
//!
//! These tests verify:
//! - Block header layout (CRC, cursor) and payload bounds
//! - Append and overwrite-last placement in the `.blk` file
//! - 1-based indexing and out-of-range reads
//! - CRC verification on read, and opting out of it

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use deltadb::block::{Block, BlockFile, WriteMode, BLOCK_PAYLOAD_SIZE, BLOCK_SIZE};
use deltadb::DeltaError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_block_file() -> (TempDir, BlockFile) {
    let temp_dir = TempDir::new().unwrap();
    let file = BlockFile::new(temp_dir.path().join("test.blk"));
    file.create().unwrap();
    (temp_dir, file)
}

/// A block whose payload starts with `data`
fn block_with(data: &[u8]) -> Block {
    let mut block = Block::new();
    block.reserve(data.len()).unwrap().copy_from_slice(data);
    block.advance(data.len()).unwrap();
    block
}

fn flip_byte(path: &Path, offset: u64) {
    let mut raw = fs::read(path).unwrap();
    raw[offset as usize] ^= 0xFF;
    let mut file = OpenOptions::new().write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    file.write_all(&raw).unwrap();
}

// =============================================================================
// Block Tests
// =============================================================================

#[test]
fn test_block_geometry() {
    assert_eq!(BLOCK_SIZE, 131072);
    assert_eq!(BLOCK_PAYLOAD_SIZE, 131064);

    let block = Block::new();
    assert!(block.is_empty());
    assert_eq!(block.free(), BLOCK_PAYLOAD_SIZE);
}

#[test]
fn test_reserve_past_capacity() {
    let mut block = Block::new();
    assert!(block.reserve(BLOCK_PAYLOAD_SIZE).is_ok());
    assert!(matches!(
        block.reserve(BLOCK_PAYLOAD_SIZE + 1),
        Err(DeltaError::BufferBounds(_))
    ));

    block.advance(BLOCK_PAYLOAD_SIZE - 1).unwrap();
    assert_eq!(block.free(), 1);
    assert!(matches!(block.advance(2), Err(DeltaError::BufferBounds(_))));
}

// =============================================================================
// BlockFile Tests
// =============================================================================

#[test]
fn test_new_file_is_empty() {
    let (_temp, file) = setup_temp_block_file();
    assert_eq!(file.count().unwrap(), 0);
    assert!(file.read_all().unwrap().is_empty());
}

#[test]
fn test_append_writes_full_blocks() {
    let (_temp, file) = setup_temp_block_file();

    assert_eq!(file.write(&mut block_with(b"first"), WriteMode::Append).unwrap(), 1);
    assert_eq!(file.write(&mut block_with(b"second"), WriteMode::Append).unwrap(), 2);

    assert_eq!(file.count().unwrap(), 2);
    assert_eq!(fs::metadata(file.path()).unwrap().len(), 2 * BLOCK_SIZE as u64);

    let blocks = file.read_all().unwrap();
    assert_eq!(blocks[0].used(), b"first");
    assert_eq!(blocks[1].used(), b"second");
}

#[test]
fn test_header_layout() {
    let (_temp, file) = setup_temp_block_file();
    let mut block = block_with(b"xyz");
    file.write(&mut block, WriteMode::Append).unwrap();

    let raw = fs::read(file.path()).unwrap();
    assert_eq!(&raw[0..4], &block.crc().to_le_bytes());
    assert_eq!(&raw[4..8], &3u32.to_le_bytes());
    assert_eq!(&raw[8..11], b"xyz");
    assert_eq!(block.crc(), block.compute_crc());
}

#[test]
fn test_overwrite_last_replaces_in_place() {
    let (_temp, file) = setup_temp_block_file();
    file.write(&mut block_with(b"sealed"), WriteMode::Append).unwrap();

    let mut active = block_with(b"ab");
    assert_eq!(file.write(&mut active, WriteMode::Append).unwrap(), 2);

    active.reserve(2).unwrap().copy_from_slice(b"cd");
    active.advance(2).unwrap();
    assert_eq!(file.write(&mut active, WriteMode::OverwriteLast).unwrap(), 2);

    assert_eq!(file.count().unwrap(), 2);
    assert_eq!(file.read(1).unwrap().used(), b"sealed");
    assert_eq!(file.read(2).unwrap().used(), b"abcd");
}

#[test]
fn test_overwrite_on_empty_file() {
    let (_temp, file) = setup_temp_block_file();
    let result = file.write(&mut Block::new(), WriteMode::OverwriteLast);
    assert!(matches!(result, Err(DeltaError::InvalidValue(_))));
}

#[test]
fn test_index_zero_rejected() {
    let (_temp, file) = setup_temp_block_file();
    file.write(&mut block_with(b"a"), WriteMode::Append).unwrap();
    assert!(matches!(file.read(0), Err(DeltaError::InvalidValue(_))));
}

#[test]
fn test_read_past_end() {
    let (_temp, file) = setup_temp_block_file();
    file.write(&mut block_with(b"a"), WriteMode::Append).unwrap();
    assert!(matches!(file.read(2), Err(DeltaError::Corruption(_))));
}

#[test]
fn test_partial_trailing_block_ignored() {
    let (_temp, file) = setup_temp_block_file();
    file.write(&mut block_with(b"whole"), WriteMode::Append).unwrap();

    let mut handle = OpenOptions::new().append(true).open(file.path()).unwrap();
    handle.write_all(&[0xAB; 100]).unwrap();
    drop(handle);

    assert_eq!(file.count().unwrap(), 1);

    // The next append lands on the whole-block boundary, over the torn tail
    assert_eq!(file.write(&mut block_with(b"next"), WriteMode::Append).unwrap(), 2);
    assert_eq!(fs::metadata(file.path()).unwrap().len(), 2 * BLOCK_SIZE as u64);
    assert_eq!(file.read(2).unwrap().used(), b"next");
}

#[test]
fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = BlockFile::new(temp_dir.path().join("absent.blk"));
    assert!(matches!(file.count(), Err(DeltaError::Io(_))));
    assert!(matches!(
        file.write(&mut Block::new(), WriteMode::Append),
        Err(DeltaError::Io(_))
    ));
}

// =============================================================================
// Checksum Tests
// =============================================================================

#[test]
fn test_corrupt_payload_detected() {
    let (_temp, file) = setup_temp_block_file();
    file.write(&mut block_with(b"important"), WriteMode::Append).unwrap();

    flip_byte(file.path(), 8);
    assert!(matches!(file.read(1), Err(DeltaError::Corruption(_))));
}

#[test]
fn test_unused_payload_not_checksummed() {
    let (_temp, file) = setup_temp_block_file();
    file.write(&mut block_with(b"data"), WriteMode::Append).unwrap();

    flip_byte(file.path(), 8 + 1000);
    assert!(file.read(1).is_ok());
}

#[test]
fn test_verification_can_be_disabled() {
    let (_temp, file) = setup_temp_block_file();
    file.write(&mut block_with(b"important"), WriteMode::Append).unwrap();
    flip_byte(file.path(), 8);

    let lenient = file.clone().verify_checksums(false);
    let block = lenient.read(1).unwrap();
    assert_eq!(block.cursor(), 9);
    assert!(block.verify().is_err());
}

#[test]
fn test_cursor_beyond_payload_is_corruption() {
    let (_temp, file) = setup_temp_block_file();
    file.write(&mut block_with(b"a"), WriteMode::Append).unwrap();

    let mut raw = fs::read(file.path()).unwrap();
    raw[4..8].copy_from_slice(&(BLOCK_PAYLOAD_SIZE as u32 + 1).to_le_bytes());
    fs::write(file.path(), &raw).unwrap();

    let lenient = file.clone().verify_checksums(false);
    assert!(matches!(lenient.read(1), Err(DeltaError::Corruption(_))));
}
