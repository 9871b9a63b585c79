//! The mounted-volume interface: owns the in-memory superblock, FAT, root
//! directory, and handle table, and exposes the POSIX-like call surface.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::config::*;
use crate::directory::{DirEntry, RootDir};
use crate::error::FsError;
use crate::fat::Fat;
use crate::file::{read_at, write_at};
use crate::handle::{Fd, HandleTable};
use crate::superblock::Superblock;
use crate::{BlockDevice, Result};

/// A mounted volume. Created by `mount` or `format`, destroyed by
/// `unmount`. One value per volume; there are no process-wide singletons,
/// so "one volume at a time" is whatever the caller's ownership allows.
#[derive(Debug)]
pub struct FileSystem<D: BlockDevice> {
    device: Arc<D>,
    superblock: Superblock,
    fat: Fat,
    root: RootDir,
    handles: HandleTable,
}

/// Geometry and occupancy summary returned by `info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeInfo {
    pub total_blocks: u16,
    pub fat_blocks: u8,
    pub root_dir_block: u16,
    pub data_start: u16,
    pub data_blocks: u16,
    pub free_data_blocks: usize,
    pub free_dir_entries: usize,
}

impl core::fmt::Display for VolumeInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "total_blk_count={}", self.total_blocks)?;
        writeln!(f, "fat_blk_count={}", self.fat_blocks)?;
        writeln!(f, "rdir_blk={}", self.root_dir_block)?;
        writeln!(f, "data_blk={}", self.data_start)?;
        writeln!(f, "data_blk_count={}", self.data_blocks)?;
        writeln!(f, "fat_free_ratio={}/{}", self.free_data_blocks, self.data_blocks)?;
        write!(f, "rdir_free_ratio={}/{}", self.free_dir_entries, MAX_FILES)
    }
}

impl<D: BlockDevice> FileSystem<D> {
    /// Writes a fresh, empty volume with `data_blocks` data blocks onto the
    /// device and returns it mounted. The device must be exactly the size
    /// the geometry calls for.
    pub fn format(device: Arc<D>, data_blocks: u16) -> Result<Self> {
        let superblock = Superblock::new(data_blocks)?;
        if superblock.total_blocks as usize != device.num_blocks() {
            log::debug!(
                "format: geometry needs {} blocks, device has {}",
                superblock.total_blocks,
                device.num_blocks()
            );
            return Err(FsError::InvalidSuperblock);
        }

        let fat = Fat::new(&superblock);
        let root = RootDir::new();
        superblock.store(&*device)?;
        fat.flush(&*device)?;
        root.flush(&*device, &superblock)?;
        device.flush()?;

        log::info!(
            "formatted volume: {} data blocks, {} FAT blocks",
            superblock.data_blocks,
            superblock.fat_blocks
        );
        Ok(Self {
            device,
            superblock,
            fat,
            root,
            handles: HandleTable::new(),
        })
    }

    /// Loads superblock, FAT, and root directory into memory and makes the
    /// volume ready for use.
    pub fn mount(device: Arc<D>) -> Result<Self> {
        let superblock = Superblock::load(&*device)?;
        let fat = Fat::load(&*device, &superblock)?;
        let root = RootDir::load(&*device, &superblock)?;

        log::info!(
            "mounted volume: {} data blocks, {} free",
            superblock.data_blocks,
            fat.free_count()
        );
        Ok(Self {
            device,
            superblock,
            fat,
            root,
            handles: HandleTable::new(),
        })
    }

    /// Flushes the FAT and root directory back to their blocks and releases
    /// the volume. Any handles still open are invalidated with it.
    pub fn unmount(self) -> Result<()> {
        self.fat.flush(&*self.device)?;
        self.root.flush(&*self.device, &self.superblock)?;
        self.device.flush()?;
        Ok(())
    }

    pub fn info(&self) -> VolumeInfo {
        VolumeInfo {
            total_blocks: self.superblock.total_blocks,
            fat_blocks: self.superblock.fat_blocks,
            root_dir_block: self.superblock.root_dir_block,
            data_start: self.superblock.data_start,
            data_blocks: self.superblock.data_blocks,
            free_data_blocks: self.fat.free_count(),
            free_dir_entries: self.root.free_count(),
        }
    }

    /// Creates an empty file. No data blocks are allocated until the first
    /// write.
    pub fn create(&mut self, name: &str) -> Result<()> {
        self.root.create(name)?;
        Ok(())
    }

    /// Deletes a file and frees its chain. Refused while the file is open.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let index = self.root.find(name)?;
        self.root.delete(index, &mut self.fat)
    }

    /// All files in the root directory, in slot order.
    pub fn list(&self) -> Vec<DirEntry> {
        self.root.list()
    }

    /// Opens a file and returns a handle positioned at offset 0.
    pub fn open(&mut self, name: &str) -> Result<Fd> {
        let index = self.root.find(name)?;
        let fd = self.handles.open(index)?;
        self.root.entry_mut(index)?.open_handles += 1;
        Ok(fd)
    }

    /// Closes a handle and releases its slot.
    pub fn close(&mut self, fd: Fd) -> Result<()> {
        let index = self.handles.close(fd)?;
        self.root.entry_mut(index)?.open_handles -= 1;
        Ok(())
    }

    /// Current size of the file the handle is bound to.
    pub fn stat(&self, fd: Fd) -> Result<u32> {
        let handle = self.handles.get(fd)?;
        self.root.stat(handle.entry_index())
    }

    /// Moves the handle's offset. Offsets past the current file size are
    /// rejected with `InvalidOffset`.
    pub fn seek(&mut self, fd: Fd, offset: u32) -> Result<()> {
        let size = self.stat(fd)?;
        if offset > size {
            return Err(FsError::InvalidOffset);
        }
        self.handles.get_mut(fd)?.set_offset(offset);
        Ok(())
    }

    /// Reads from the handle's offset into `buf`, advancing the offset by
    /// the bytes actually read. Short at end-of-file, never an error.
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize> {
        let handle = self.handles.get(fd)?;
        let entry = self.root.entry(handle.entry_index())?;
        let offset = handle.offset();

        let count = read_at(&*self.device, &self.superblock, &self.fat, entry, offset, buf)?;
        self.handles.get_mut(fd)?.set_offset(offset + count as u32);
        Ok(count)
    }

    /// Writes `buf` at the handle's offset, allocating blocks and growing
    /// the file as needed, and advances the offset past the written bytes.
    ///
    /// On `NoSpace` the prefix written before exhaustion stays committed
    /// (visible through `stat`), but the offset is left where it was.
    pub fn write(&mut self, fd: Fd, buf: &[u8]) -> Result<usize> {
        let handle = self.handles.get(fd)?;
        let index = handle.entry_index();
        let offset = handle.offset();

        let entry = self.root.entry_mut(index)?;
        let count = write_at(
            &*self.device,
            &self.superblock,
            &mut self.fat,
            entry,
            offset,
            buf,
        )?;
        self.handles.get_mut(fd)?.set_offset(offset + count as u32);
        Ok(count)
    }

    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    /// Read-only view of the allocation table, for inspection.
    pub fn fat(&self) -> &Fat {
        &self.fat
    }

    pub fn device(&self) -> Arc<D> {
        Arc::clone(&self.device)
    }
}
