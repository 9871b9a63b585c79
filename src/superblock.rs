//! Parsing, validation, and encoding of the volume superblock.
//!
//! The superblock is write-once: `format` encodes it, `mount` decodes it,
//! and nothing mutates it afterwards.

use alloc::boxed::Box;

use crate::config::*;
use crate::error::FsError;
use crate::{BlockDevice, Result};

/// Volume geometry, as persisted in block 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub total_blocks: u16,
    pub root_dir_block: u16,
    pub data_start: u16,
    pub data_blocks: u16,
    pub fat_blocks: u8,
}

impl Superblock {
    /// Computes the layout of a volume holding `data_blocks` data blocks:
    /// one superblock, the smallest FAT region with one 16-bit entry per
    /// data block, one root directory block, then the data region.
    pub fn new(data_blocks: u16) -> Result<Self> {
        if data_blocks == 0 || data_blocks == FAT_EOC {
            return Err(FsError::InvalidSuperblock);
        }
        let fat_blocks = fat_blocks_for(data_blocks as usize);
        let total = 2 + fat_blocks + data_blocks as usize;
        if fat_blocks > u8::MAX as usize || total > u16::MAX as usize {
            return Err(FsError::InvalidSuperblock);
        }
        Ok(Self {
            total_blocks: total as u16,
            root_dir_block: (FAT_START + fat_blocks) as u16,
            data_start: (FAT_START + fat_blocks + 1) as u16,
            data_blocks,
            fat_blocks: fat_blocks as u8,
        })
    }

    /// Reads block 0 and validates it against the device geometry.
    /// Returns `InvalidSuperblock` on a bad signature or inconsistent layout.
    pub fn load(device: &impl BlockDevice) -> Result<Self> {
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        device.read_block(SUPERBLOCK_ID, buf.as_mut_slice())?;

        if &buf[0..8] != SIGNATURE {
            log::debug!("superblock: signature mismatch");
            return Err(FsError::InvalidSuperblock);
        }

        let sb = Self {
            total_blocks: u16::from_le_bytes([buf[8], buf[9]]),
            root_dir_block: u16::from_le_bytes([buf[10], buf[11]]),
            data_start: u16::from_le_bytes([buf[12], buf[13]]),
            data_blocks: u16::from_le_bytes([buf[14], buf[15]]),
            fat_blocks: buf[16],
        };
        sb.validate(device.num_blocks())?;

        Ok(sb)
    }

    /// Encodes the superblock into block 0.
    pub fn store(&self, device: &impl BlockDevice) -> Result<()> {
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        buf[0..8].copy_from_slice(SIGNATURE);
        buf[8..10].copy_from_slice(&self.total_blocks.to_le_bytes());
        buf[10..12].copy_from_slice(&self.root_dir_block.to_le_bytes());
        buf[12..14].copy_from_slice(&self.data_start.to_le_bytes());
        buf[14..16].copy_from_slice(&self.data_blocks.to_le_bytes());
        buf[16] = self.fat_blocks;
        device.write_block(SUPERBLOCK_ID, buf.as_slice())?;
        Ok(())
    }

    fn validate(&self, device_blocks: usize) -> Result<()> {
        let fat_blocks = self.fat_blocks as usize;
        let data_blocks = self.data_blocks as usize;

        if self.total_blocks as usize != device_blocks {
            log::debug!(
                "superblock: claims {} blocks, device has {}",
                self.total_blocks,
                device_blocks
            );
            return Err(FsError::InvalidSuperblock);
        }
        if data_blocks == 0 || data_blocks >= FAT_EOC as usize {
            return Err(FsError::InvalidSuperblock);
        }
        if fat_blocks != fat_blocks_for(data_blocks) {
            log::debug!(
                "superblock: {} FAT blocks inconsistent with {} data blocks",
                fat_blocks,
                data_blocks
            );
            return Err(FsError::InvalidSuperblock);
        }
        if self.root_dir_block as usize != FAT_START + fat_blocks
            || self.data_start != self.root_dir_block + 1
            || self.total_blocks as usize != self.data_start as usize + data_blocks
        {
            log::debug!("superblock: region indices do not line up");
            return Err(FsError::InvalidSuperblock);
        }

        Ok(())
    }
}

/// Number of blocks the FAT occupies for the given data block count.
pub fn fat_blocks_for(data_blocks: usize) -> usize {
    data_blocks.div_ceil(FAT_ENTRIES_PER_BLOCK).max(1)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_geometry_small() {
        let sb = Superblock::new(7).unwrap();
        assert_eq!(sb.total_blocks, 10);
        assert_eq!(sb.fat_blocks, 1);
        assert_eq!(sb.root_dir_block, 2);
        assert_eq!(sb.data_start, 3);
    }

    #[test]
    fn test_geometry_spans_multiple_fat_blocks() {
        // 8192 data blocks need 16384 bytes of FAT, i.e. 4 blocks.
        let sb = Superblock::new(8192).unwrap();
        assert_eq!(sb.fat_blocks, 4);
        assert_eq!(sb.data_start, 6);
        assert_eq!(sb.total_blocks, 8198);
    }

    #[test]
    fn test_geometry_rejects_empty_volume() {
        assert_eq!(Superblock::new(0), Err(FsError::InvalidSuperblock));
    }
}
