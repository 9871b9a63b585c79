#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    IoError,
    InvalidSuperblock,
    InvalidBlockId,
    ReadError,
    WriteError,
    NoSpace,
    CorruptChain,
    InvalidFileName,
    NameTooLong,
    AlreadyExists,
    DirectoryFull,
    NotFound,
    FileOpen,
    InvalidHandle,
    InvalidOffset,
    TooManyOpen,
}

pub type Result<T> = core::result::Result<T, FsError>;
