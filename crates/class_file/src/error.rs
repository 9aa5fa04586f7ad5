use thiserror::Error;

use crate::constant_pool;

/// Broad classes of decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes do not describe a valid structure.
    Malformed,
    /// The stream ended in the middle of a structure.
    Truncated,
    /// The underlying reader or writer failed.
    Io,
}

#[derive(Error, Debug)]
pub enum ClassFileError {
    #[error(transparent)]
    IOError(std::io::Error),
    #[error("Unexpected end of data")]
    UnexpectedEof,
    #[error("Invalid magic identifier: 0x{0:X}")]
    InvalidMagicIdentifier(u32),
    #[error("Invalid constant pool count: {0}")]
    InvalidConstantPoolCount(u16),
    #[error("Invalid cp info tag: {0}")]
    InvalidCpInfoTag(u8),
    #[error("Wide constant at index {0} does not fit in the constant pool")]
    DanglingWideConstant(u16),
    #[error("Invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("Constant pool index {0} is the unusable slot after a long or double")]
    UnusableConstantPoolSlot(u16),
    #[error("Expected {0}, found {1:?}")]
    UnexpectedConstantPoolEntry(&'static str, constant_pool::CpInfo),
    #[error("Constant pool entry {0} is not valid modified UTF-8")]
    InvalidModifiedUtf8(u16),
    #[error("Invalid stack map frame type: {0}")]
    InvalidStackMapFrameType(u8),
    #[error("Invalid verification type tag: {0}")]
    InvalidVerificationTypeTag(u8),
    #[error("Invalid element value tag: 0x{0:02X}")]
    InvalidElementValueTag(u8),
    #[error("Invalid type annotation target type: 0x{0:02X}")]
    InvalidTargetType(u8),
    #[error("Invalid type path kind: {0}")]
    InvalidTypePathKind(u8),
    #[error("{name} attribute reads past its length of {length} bytes")]
    AttributeOverrun { name: String, length: u32 },
    #[error("{name} attribute leaves {remaining} of its {length} bytes unread")]
    AttributeUnderrun {
        name: String,
        length: u32,
        remaining: u64,
    },
    #[error("Too many {what} to encode: {len}")]
    CountOverflow { what: &'static str, len: usize },
    #[error("{frame} frame with {count} locals, must be 1 to 3")]
    InvalidFrameLocalCount { frame: &'static str, count: usize },
    #[error("{what} nested deeper than {limit} levels")]
    NestingTooDeep { what: &'static str, limit: u16 },
}

impl ClassFileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassFileError::IOError(_) => ErrorKind::Io,
            ClassFileError::UnexpectedEof => ErrorKind::Truncated,
            _ => ErrorKind::Malformed,
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.kind() == ErrorKind::Truncated
    }
}

impl From<std::io::Error> for ClassFileError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ClassFileError::UnexpectedEof,
            _ => ClassFileError::IOError(e),
        }
    }
}
