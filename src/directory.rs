//! The root directory: a fixed table of 128 name-to-metadata records,
//! persisted in the single block after the FAT region.
//!
//! Record layout (32 bytes): 16-byte NUL-terminated name, u32 size,
//! u16 first data block (`FAT_EOC` when no blocks are allocated),
//! u8 open-handle count, 9 bytes padding.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::config::*;
use crate::error::FsError;
use crate::fat::Fat;
use crate::superblock::Superblock;
use crate::{BlockDevice, Result};

#[derive(Debug, Clone, Copy)]
pub struct DirEntry {
    pub name: [u8; MAX_FILE_NAME_LEN],
    pub size: u32,
    pub first_block: u16,
    pub open_handles: u8,
}

impl DirEntry {
    pub const EMPTY: Self = Self {
        name: [0; MAX_FILE_NAME_LEN],
        size: 0,
        first_block: FAT_EOC,
        open_handles: 0,
    };

    /// An entry is empty when its name starts with NUL.
    pub fn is_empty(&self) -> bool {
        self.name[0] == 0
    }

    /// The stored name without trailing NULs, lossless for ASCII names.
    pub fn name(&self) -> &str {
        core::str::from_utf8(trim_zero(&self.name)).unwrap_or("")
    }

    fn decode(record: &[u8]) -> Self {
        let mut name = [0u8; MAX_FILE_NAME_LEN];
        name.copy_from_slice(&record[0..MAX_FILE_NAME_LEN]);
        Self {
            name,
            size: u32::from_le_bytes([record[16], record[17], record[18], record[19]]),
            first_block: u16::from_le_bytes([record[20], record[21]]),
            open_handles: record[22],
        }
    }

    fn encode(&self, record: &mut [u8]) {
        record[0..MAX_FILE_NAME_LEN].copy_from_slice(&self.name);
        record[16..20].copy_from_slice(&self.size.to_le_bytes());
        record[20..22].copy_from_slice(&self.first_block.to_le_bytes());
        record[22] = self.open_handles;
    }
}

fn trim_zero(name: &[u8]) -> &[u8] {
    let mut end = name.len();
    while end > 0 && name[end - 1] == 0 {
        end -= 1;
    }
    &name[..end]
}

/// Exact, length-aware name equality. Two names sharing a prefix are never
/// equal, and a stored name is always compared in full.
fn name_eq(stored: &[u8], query: &[u8]) -> bool {
    trim_zero(stored) == query
}

#[derive(Debug)]
pub struct RootDir {
    entries: Box<[DirEntry; MAX_FILES]>,
}

impl RootDir {
    /// An all-empty table for a freshly formatted volume.
    pub fn new() -> Self {
        RootDir {
            entries: Box::new([DirEntry::EMPTY; MAX_FILES]),
        }
    }

    /// Deserializes the table from its block. Persisted open-handle counts
    /// are stale by definition (handles are transient), so they are reset.
    pub fn load(device: &impl BlockDevice, superblock: &Superblock) -> Result<Self> {
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        device.read_block(superblock.root_dir_block as usize, buf.as_mut_slice())?;

        let mut dir = Self::new();
        for (i, record) in buf.chunks_exact(DIR_ENTRY_SIZE).enumerate() {
            let mut entry = DirEntry::decode(record);
            entry.open_handles = 0;
            dir.entries[i] = entry;
        }
        Ok(dir)
    }

    /// Serializes the table back to its block.
    pub fn flush(&self, device: &impl BlockDevice, superblock: &Superblock) -> Result<()> {
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        for (i, entry) in self.entries.iter().enumerate() {
            entry.encode(&mut buf[i * DIR_ENTRY_SIZE..(i + 1) * DIR_ENTRY_SIZE]);
        }
        device.write_block(superblock.root_dir_block as usize, buf.as_slice())
    }

    /// Linear scan for an exact name match among non-empty entries.
    pub fn find(&self, name: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|entry| !entry.is_empty() && name_eq(&entry.name, name.as_bytes()))
            .ok_or(FsError::NotFound)
    }

    /// Installs a new entry with size 0 and no allocated blocks.
    pub fn create(&mut self, name: &str) -> Result<usize> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.contains(&0) {
            return Err(FsError::InvalidFileName);
        }
        // One byte stays reserved for the terminating NUL.
        if bytes.len() >= MAX_FILE_NAME_LEN {
            return Err(FsError::NameTooLong);
        }
        if self.find(name).is_ok() {
            return Err(FsError::AlreadyExists);
        }

        let slot = self
            .entries
            .iter()
            .position(|entry| entry.is_empty())
            .ok_or(FsError::DirectoryFull)?;

        let mut entry = DirEntry::EMPTY;
        entry.name[..bytes.len()].copy_from_slice(bytes);
        self.entries[slot] = entry;
        Ok(slot)
    }

    /// Clears the entry and returns its data blocks to the FAT.
    /// Refused while any handle still references the entry.
    pub fn delete(&mut self, index: usize, fat: &mut Fat) -> Result<()> {
        let entry = self.entry(index)?;
        if entry.open_handles > 0 {
            return Err(FsError::FileOpen);
        }
        fat.free_chain(entry.first_block)?;
        self.entries[index] = DirEntry::EMPTY;
        Ok(())
    }

    /// Snapshot of all non-empty entries, in slot order.
    pub fn list(&self) -> Vec<DirEntry> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_empty())
            .copied()
            .collect()
    }

    pub fn stat(&self, index: usize) -> Result<u32> {
        Ok(self.entry(index)?.size)
    }

    pub fn entry(&self, index: usize) -> Result<&DirEntry> {
        match self.entries.get(index) {
            Some(entry) if !entry.is_empty() => Ok(entry),
            _ => Err(FsError::NotFound),
        }
    }

    pub fn entry_mut(&mut self, index: usize) -> Result<&mut DirEntry> {
        match self.entries.get_mut(index) {
            Some(entry) if !entry.is_empty() => Ok(entry),
            _ => Err(FsError::NotFound),
        }
    }

    /// Number of unused directory slots.
    pub fn free_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_empty()).count()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_name_eq_full_length() {
        let mut stored = [0u8; MAX_FILE_NAME_LEN];
        stored[..4].copy_from_slice(b"test");
        assert!(name_eq(&stored, b"test"));
        assert!(!name_eq(&stored, b"tes"));
        assert!(!name_eq(&stored, b"test1"));
    }

    #[test]
    fn test_create_and_find() {
        let mut dir = RootDir::new();
        let slot = dir.create("a.txt").unwrap();
        assert_eq!(dir.find("a.txt").unwrap(), slot);
        let entry = dir.entry(slot).unwrap();
        assert_eq!(entry.size, 0);
        assert_eq!(entry.first_block, FAT_EOC);
        assert_eq!(entry.open_handles, 0);
    }

    #[test]
    fn test_find_ignores_prefix_match() {
        let mut dir = RootDir::new();
        dir.create("report").unwrap();
        assert_eq!(dir.find("rep"), Err(FsError::NotFound));
        assert_eq!(dir.find("reports"), Err(FsError::NotFound));
    }

    #[test]
    fn test_create_rejects_long_name() {
        let mut dir = RootDir::new();
        // 15 characters plus the NUL fills the field exactly.
        assert!(dir.create("123456789012345").is_ok());
        assert_eq!(dir.create("1234567890123456"), Err(FsError::NameTooLong));
    }

    #[test]
    fn test_create_rejects_duplicate() {
        let mut dir = RootDir::new();
        dir.create("a.txt").unwrap();
        assert_eq!(dir.create("a.txt"), Err(FsError::AlreadyExists));
    }

    #[test]
    fn test_directory_full() {
        let mut dir = RootDir::new();
        for i in 0..MAX_FILES {
            dir.create(&alloc::format!("f{i}")).unwrap();
        }
        assert_eq!(dir.create("straw"), Err(FsError::DirectoryFull));
    }

    #[test]
    fn test_list_in_slot_order() {
        let mut dir = RootDir::new();
        dir.create("one").unwrap();
        dir.create("two").unwrap();
        let entries = dir.list();
        let names = entries.iter().map(|e| e.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["one", "two"]);
    }
}
