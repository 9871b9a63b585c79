//! Pion is a tiny single-volume FAT file system over a fixed-block device.
//! No support for permissions, timestamps, nested directories, or other
//! advanced features: the namespace is one flat root directory.
//!
//! Pion's linear on-disk layout:
//! - Superblock (block 0)
//! - FAT (one 16-bit entry per data block)
//! - Root Directory (128 entries, one block)
//! - Data Blocks (chained per file via the FAT)
//!
//! Pion's layers (from bottom to top):
//! 1. Block Device: Abstraction for low level devices.      | User implemented (hardware-specific)
//! 2. Superblock: Volume geometry, validated at mount.      | Fs implemented
//! 3. FAT: Free-space tracking and per-file block chains.   | Fs implemented
//! 4. Root Directory: Flat name-to-metadata table.          | Fs implemented
//! 5. Handles / File I/O: Open-file cursors and byte I/O.   | Fs implemented
//! 6. FileSystem: The mounted-volume interface for users.   | User driven (one instance per volume)

#![allow(unused)]

extern crate alloc;

mod block_dev;
mod config;
mod directory;
mod error;
mod fat;
mod file;
mod fs;
mod handle;
mod superblock;

pub use block_dev::BlockDevice;
pub use config::*;
pub use directory::{DirEntry, RootDir};
pub use error::FsError as Error;
pub use error::Result;
pub use fat::{ChainWalk, Fat};
pub use fs::{FileSystem, VolumeInfo};
pub use handle::{Fd, HandleTable};
pub use superblock::{fat_blocks_for, Superblock};
