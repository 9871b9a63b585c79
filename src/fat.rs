//! The File Allocation Table: free-space tracking and block chains.
//!
//! Every data block has one 16-bit entry: `FAT_FREE` for an unused block,
//! `FAT_EOC` for the last block of a file, anything else the index of the
//! next block in the same file. Entry 0 is reserved and pinned to `FAT_EOC`.
//!
//! All chain mutation goes through this module; no other layer writes a FAT
//! entry. That keeps the free-block invariant in one place: a block is free
//! exactly when no directory entry's chain reaches it.

use alloc::vec;
use alloc::vec::Vec;

use crate::config::*;
use crate::error::FsError;
use crate::superblock::Superblock;
use crate::{BlockDevice, Result};

#[derive(Debug)]
pub struct Fat {
    entries: Vec<u16>,
    fat_blocks: usize,
}

impl Fat {
    /// An all-free table for a freshly formatted volume.
    pub fn new(superblock: &Superblock) -> Self {
        let mut entries = vec![FAT_FREE; superblock.data_blocks as usize];
        entries[0] = FAT_EOC;
        Fat {
            entries,
            fat_blocks: superblock.fat_blocks as usize,
        }
    }

    /// Deserializes the table from its contiguous block range.
    pub fn load(device: &impl BlockDevice, superblock: &Superblock) -> Result<Self> {
        let fat_blocks = superblock.fat_blocks as usize;
        let mut raw = vec![0u8; fat_blocks * BLOCK_SIZE];
        for i in 0..fat_blocks {
            let chunk = &mut raw[i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE];
            device.read_block(FAT_START + i, chunk)?;
        }

        let entries = raw
            .chunks_exact(2)
            .take(superblock.data_blocks as usize)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect::<Vec<u16>>();

        if entries[0] != FAT_EOC {
            log::debug!("fat: reserved entry 0 is {:#06x}, expected EOC", entries[0]);
            return Err(FsError::CorruptChain);
        }

        Ok(Fat {
            entries,
            fat_blocks,
        })
    }

    /// Serializes the table back across its block range.
    pub fn flush(&self, device: &impl BlockDevice) -> Result<()> {
        let mut raw = vec![0u8; self.fat_blocks * BLOCK_SIZE];
        for (i, entry) in self.entries.iter().enumerate() {
            raw[i * 2..i * 2 + 2].copy_from_slice(&entry.to_le_bytes());
        }
        for i in 0..self.fat_blocks {
            let chunk = &raw[i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE];
            device.write_block(FAT_START + i, chunk)?;
        }
        Ok(())
    }

    /// Claims the lowest-indexed free entry and marks it end-of-chain.
    /// The ascending scan keeps allocation order deterministic. Entry 0 is
    /// never a candidate.
    pub fn allocate(&mut self) -> Result<u16> {
        for i in 1..self.entries.len() {
            if self.entries[i] == FAT_FREE {
                self.entries[i] = FAT_EOC;
                return Ok(i as u16);
            }
        }
        Err(FsError::NoSpace)
    }

    /// Links `new` after `tail`, making `new` the chain's last block.
    /// `new` must come from `allocate`.
    pub fn chain_append(&mut self, tail: u16, new: u16) {
        debug_assert_eq!(self.entries[tail as usize], FAT_EOC);
        self.entries[tail as usize] = new;
        self.entries[new as usize] = FAT_EOC;
    }

    /// A lazy walk over the chain starting at `first`. `FAT_EOC` as the
    /// start yields an empty walk (a file with no blocks). The iterator is
    /// cheap to recreate, so callers restart it rather than cloning it.
    pub fn chain(&self, first: u16) -> ChainWalk<'_> {
        ChainWalk {
            fat: self,
            next: if first == FAT_EOC { None } else { Some(first) },
            hops: 0,
        }
    }

    /// Marks every block of the chain free. A no-op for the empty-chain
    /// marker, so freeing an empty file twice is harmless.
    pub fn free_chain(&mut self, first: u16) -> Result<()> {
        let blocks = self.chain(first).collect::<Result<Vec<u16>>>()?;
        for block in blocks {
            self.entries[block as usize] = FAT_FREE;
        }
        Ok(())
    }

    /// Number of data blocks currently free for allocation.
    pub fn free_count(&self) -> usize {
        self.entries[1..]
            .iter()
            .filter(|&&entry| entry == FAT_FREE)
            .count()
    }

    pub fn is_free(&self, index: u16) -> bool {
        self.entries
            .get(index as usize)
            .is_some_and(|&entry| entry == FAT_FREE)
    }
}

/// Iterator over a file's block indices, in chain order.
///
/// Yields `Err(CorruptChain)` once, then stops, if the walk leaves the data
/// region, steps onto a free or reserved entry, or takes more hops than
/// there are data blocks (a cycle).
pub struct ChainWalk<'a> {
    fat: &'a Fat,
    next: Option<u16>,
    hops: usize,
}

impl Iterator for ChainWalk<'_> {
    type Item = Result<u16>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;

        if current == 0
            || current as usize >= self.fat.entries.len()
            || self.fat.entries[current as usize] == FAT_FREE
        {
            return Some(Err(FsError::CorruptChain));
        }
        if self.hops >= self.fat.entries.len() {
            return Some(Err(FsError::CorruptChain));
        }
        self.hops += 1;

        let next = self.fat.entries[current as usize];
        if next != FAT_EOC {
            self.next = Some(next);
        }
        Some(Ok(current))
    }
}

/// Reads one block of the data region into `buf`.
pub fn read_data_block(
    device: &impl BlockDevice,
    superblock: &Superblock,
    index: u16,
    buf: &mut [u8],
) -> Result<()> {
    device.read_block(superblock.data_start as usize + index as usize, buf)
}

/// Writes one block of the data region from `buf`.
pub fn write_data_block(
    device: &impl BlockDevice,
    superblock: &Superblock,
    index: u16,
    buf: &[u8],
) -> Result<()> {
    device.write_block(superblock.data_start as usize + index as usize, buf)
}

#[cfg(test)]
mod test {
    use super::*;

    fn empty_fat(data_blocks: u16) -> Fat {
        let sb = Superblock::new(data_blocks).unwrap();
        Fat::new(&sb)
    }

    #[test]
    fn test_allocate_ascending() {
        let mut fat = empty_fat(16);
        assert_eq!(fat.allocate().unwrap(), 1);
        assert_eq!(fat.allocate().unwrap(), 2);
        fat.free_chain(1).unwrap();
        // Lowest free index wins again.
        assert_eq!(fat.allocate().unwrap(), 1);
    }

    #[test]
    fn test_allocate_exhausts() {
        let mut fat = empty_fat(4);
        // Entry 0 is reserved, so only 3 blocks are usable.
        for _ in 0..3 {
            fat.allocate().unwrap();
        }
        assert_eq!(fat.allocate(), Err(FsError::NoSpace));
    }

    #[test]
    fn test_chain_walk_in_order() {
        let mut fat = empty_fat(16);
        let a = fat.allocate().unwrap();
        let b = fat.allocate().unwrap();
        let c = fat.allocate().unwrap();
        fat.chain_append(a, b);
        fat.chain_append(b, c);
        let blocks = fat.chain(a).collect::<Result<Vec<u16>>>().unwrap();
        assert_eq!(blocks, vec![a, b, c]);
    }

    #[test]
    fn test_chain_walk_empty_chain() {
        let fat = empty_fat(16);
        assert_eq!(fat.chain(FAT_EOC).count(), 0);
    }

    #[test]
    fn test_chain_walk_detects_cycle() {
        let mut fat = empty_fat(8);
        let a = fat.allocate().unwrap();
        let b = fat.allocate().unwrap();
        fat.chain_append(a, b);
        // Corrupt the tail to point back at the head.
        fat.entries[b as usize] = a;
        let result = fat.chain(a).collect::<Result<Vec<u16>>>();
        assert_eq!(result, Err(FsError::CorruptChain));
    }

    #[test]
    fn test_chain_walk_rejects_free_link() {
        let mut fat = empty_fat(8);
        let a = fat.allocate().unwrap();
        fat.entries[a as usize] = 5; // next points at a free entry
        let result = fat.chain(a).collect::<Result<Vec<u16>>>();
        assert_eq!(result, Err(FsError::CorruptChain));
    }

    #[test]
    fn test_free_chain_idempotent_on_empty() {
        let mut fat = empty_fat(8);
        let before = fat.free_count();
        fat.free_chain(FAT_EOC).unwrap();
        assert_eq!(fat.free_count(), before);
    }
}
