//! The open-file-handle table: a bounded arena of cursors, each bound to
//! one root directory entry. Handles are transient; nothing here persists.

use crate::config::MAX_OPEN_FILES;
use crate::error::FsError;
use crate::Result;

/// Index into the handle table, handed out by `open`.
pub type Fd = usize;

#[derive(Debug, Clone, Copy)]
pub struct Handle {
    in_use: bool,
    entry_index: usize,
    offset: u32,
}

impl Handle {
    const FREE: Self = Self {
        in_use: false,
        entry_index: 0,
        offset: 0,
    };

    /// Index of the directory entry this handle is bound to.
    pub fn entry_index(&self) -> usize {
        self.entry_index
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: u32) {
        self.offset = offset;
    }
}

#[derive(Debug)]
pub struct HandleTable {
    slots: [Handle; MAX_OPEN_FILES],
}

impl HandleTable {
    pub fn new() -> Self {
        HandleTable {
            slots: [Handle::FREE; MAX_OPEN_FILES],
        }
    }

    /// Binds a free slot to `entry_index` at offset 0.
    /// The caller bumps the directory entry's open count.
    pub fn open(&mut self, entry_index: usize) -> Result<Fd> {
        let fd = self
            .slots
            .iter()
            .position(|slot| !slot.in_use)
            .ok_or(FsError::TooManyOpen)?;
        self.slots[fd] = Handle {
            in_use: true,
            entry_index,
            offset: 0,
        };
        Ok(fd)
    }

    /// Releases the slot and returns the entry index it was bound to.
    /// The caller decrements the directory entry's open count.
    pub fn close(&mut self, fd: Fd) -> Result<usize> {
        let entry_index = self.get(fd)?.entry_index;
        self.slots[fd] = Handle::FREE;
        Ok(entry_index)
    }

    pub fn get(&self, fd: Fd) -> Result<&Handle> {
        match self.slots.get(fd) {
            Some(slot) if slot.in_use => Ok(slot),
            _ => Err(FsError::InvalidHandle),
        }
    }

    pub fn get_mut(&mut self, fd: Fd) -> Result<&mut Handle> {
        match self.slots.get_mut(fd) {
            Some(slot) if slot.in_use => Ok(slot),
            _ => Err(FsError::InvalidHandle),
        }
    }

    /// True while any handle remains open.
    pub fn any_open(&self) -> bool {
        self.slots.iter().any(|slot| slot.in_use)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_open_fills_lowest_slot() {
        let mut table = HandleTable::new();
        assert_eq!(table.open(3).unwrap(), 0);
        assert_eq!(table.open(3).unwrap(), 1);
        table.close(0).unwrap();
        assert_eq!(table.open(7).unwrap(), 0);
    }

    #[test]
    fn test_open_bounded() {
        let mut table = HandleTable::new();
        for _ in 0..MAX_OPEN_FILES {
            table.open(0).unwrap();
        }
        assert_eq!(table.open(0), Err(FsError::TooManyOpen));
    }

    #[test]
    fn test_close_twice_is_invalid() {
        let mut table = HandleTable::new();
        let fd = table.open(5).unwrap();
        assert_eq!(table.close(fd).unwrap(), 5);
        assert_eq!(table.close(fd), Err(FsError::InvalidHandle));
    }

    #[test]
    fn test_stale_fd_rejected() {
        let table = HandleTable::new();
        assert_eq!(table.get(99).err(), Some(FsError::InvalidHandle));
    }
}
