//! Byte-level file I/O: translating offset ranges against a directory entry
//! into block reads/writes along the entry's FAT chain.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::config::BLOCK_SIZE;
use crate::directory::DirEntry;
use crate::error::FsError;
use crate::fat::{self, Fat};
use crate::superblock::Superblock;
use crate::{BlockDevice, Result};

/// Copies up to `buf.len()` bytes starting at `offset` into `buf`.
/// Returns the number of bytes copied, truncating at end-of-file; a read
/// past the end is a short read, never an error.
pub fn read_at(
    device: &impl BlockDevice,
    superblock: &Superblock,
    fat: &Fat,
    entry: &DirEntry,
    offset: u32,
    buf: &mut [u8],
) -> Result<usize> {
    let size = entry.size as usize;
    let offset = offset as usize;
    if offset >= size || buf.is_empty() {
        return Ok(0);
    }
    let to_read = buf.len().min(size - offset);

    let mut walk = fat.chain(entry.first_block);
    for _ in 0..offset / BLOCK_SIZE {
        // The chain must cover every byte below `size`.
        walk.next().ok_or(FsError::CorruptChain)??;
    }

    let mut block_buf = Box::new([0u8; BLOCK_SIZE]);
    let mut copied = 0;
    while copied < to_read {
        let block = walk.next().ok_or(FsError::CorruptChain)??;
        fat::read_data_block(device, superblock, block, block_buf.as_mut_slice())?;

        let start = (offset + copied) % BLOCK_SIZE;
        let count = (BLOCK_SIZE - start).min(to_read - copied);
        buf[copied..copied + count].copy_from_slice(&block_buf[start..start + count]);
        copied += count;
    }

    Ok(copied)
}

/// Writes `buf` at `offset`, extending the entry's chain and recorded size
/// as needed. Partial first/last blocks are read-modify-written.
///
/// On `NoSpace` the bytes written so far stay committed: the entry's size
/// already covers them when the error is returned. Callers treat the error
/// as "some prefix is durable" and may re-stat to learn how much.
pub fn write_at(
    device: &impl BlockDevice,
    superblock: &Superblock,
    fat: &mut Fat,
    entry: &mut DirEntry,
    offset: u32,
    buf: &[u8],
) -> Result<usize> {
    if buf.is_empty() {
        return Ok(0);
    }
    let offset = offset as usize;
    debug_assert!(offset <= entry.size as usize);

    let mut chain = fat.chain(entry.first_block).collect::<Result<Vec<u16>>>()?;
    let mut block_buf = Box::new([0u8; BLOCK_SIZE]);
    let mut written = 0;

    while written < buf.len() {
        let position = offset + written;
        let ordinal = position / BLOCK_SIZE;
        let block = if ordinal < chain.len() {
            chain[ordinal]
        } else {
            let new = match fat.allocate() {
                Ok(block) => block,
                Err(e) => {
                    commit_size(entry, offset, written);
                    return Err(e);
                }
            };
            match chain.last() {
                Some(&tail) => fat.chain_append(tail, new),
                None => entry.first_block = new,
            }
            chain.push(new);
            new
        };

        let start = position % BLOCK_SIZE;
        let count = (BLOCK_SIZE - start).min(buf.len() - written);
        if count != BLOCK_SIZE {
            // Keep the untouched portion of a partially written block.
            fat::read_data_block(device, superblock, block, block_buf.as_mut_slice())?;
        }
        block_buf[start..start + count].copy_from_slice(&buf[written..written + count]);
        fat::write_data_block(device, superblock, block, block_buf.as_slice())?;
        written += count;
    }

    commit_size(entry, offset, written);
    Ok(written)
}

fn commit_size(entry: &mut DirEntry, offset: usize, written: usize) {
    let end = (offset + written) as u32;
    if end > entry.size {
        entry.size = end;
    }
}
