pub const SIGNATURE: &[u8; 8] = b"ECS150FS"; // Volume signature stored in block 0

pub const BLOCK_SIZE: usize = 4096;
pub const SUPERBLOCK_ID: usize = 0; // Block ID for the superblock
pub const FAT_START: usize = 1; // First block of the FAT region

pub const FAT_FREE: u16 = 0; // FAT entry value for a free data block
pub const FAT_EOC: u16 = 0xFFFF; // End-of-chain marker; also "no first block" in a directory entry
pub const FAT_ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / 2; // 16-bit entries

pub const MAX_FILES: usize = 128; // Root directory capacity
pub const MAX_OPEN_FILES: usize = 32; // Handle table capacity
pub const MAX_FILE_NAME_LEN: usize = 16; // Including the terminating NUL
pub const DIR_ENTRY_SIZE: usize = 32; // On-disk size of one directory record
