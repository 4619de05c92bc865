//! Crate-specific error types for mmap-pages.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result alias for mmap-pages operations.
pub type Result<T> = std::result::Result<T, MmapPagesError>;

/// Why a requested range was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFault {
    /// A zero-length page or window was requested.
    ZeroLength,
    /// The range starts or ends outside the mapping's window.
    OutOfWindow,
    /// Aligning or adding the range would overflow the native size type.
    Overflow,
}

impl fmt::Display for RangeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RangeFault::ZeroLength => "zero length",
            RangeFault::OutOfWindow => "outside window",
            RangeFault::Overflow => "arithmetic overflow",
        })
    }
}

/// Why a filename could not be transcoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingFault {
    /// Bad lead byte, bad continuation byte, overlong form, encoded surrogate
    /// or code point above U+10FFFF.
    InvalidSequence,
    /// The input ended in the middle of a multi-byte sequence.
    TruncatedSequence,
    /// A UTF-16 surrogate without its partner.
    UnpairedSurrogate,
    /// A NUL inside the name; native open calls would stop there.
    InteriorNul,
}

impl fmt::Display for EncodingFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EncodingFault::InvalidSequence => "invalid sequence",
            EncodingFault::TruncatedSequence => "truncated sequence",
            EncodingFault::UnpairedSurrogate => "unpaired surrogate",
            EncodingFault::InteriorNul => "interior NUL",
        })
    }
}

/// Error type covering open, sizing, range, mapping and encoding failures.
#[derive(Debug, Error)]
pub enum MmapPagesError {
    /// The native open call failed (bad path, permissions, ...).
    #[error("failed to open '{path}': {source}")]
    OpenFailed {
        /// Path as given by the caller, lossily rendered.
        path: String,
        /// Underlying OS error.
        source: io::Error,
    },

    /// The window resolved to zero bytes, or extends past the end of the file.
    #[error("size mismatch: offset={offset}, len={len}, file size={file_size}")]
    SizeMismatch {
        /// Requested window offset.
        offset: usize,
        /// Window length after end-of-file extension (0 when it could not resolve).
        len: usize,
        /// File size observed at open time.
        file_size: u64,
    },

    /// A sub-range request exceeds its parent window, is empty, or overflows.
    #[error("invalid range ({fault}): offset={offset}, len={len}, total={total}")]
    RangeInvalid {
        /// Requested offset.
        offset: usize,
        /// Requested length.
        len: usize,
        /// Length of the enclosing window.
        total: usize,
        /// What was wrong with the range.
        fault: RangeFault,
    },

    /// Creating a native view or mapping object failed after a successful open.
    #[error("mapping failed: {0}")]
    MapFailed(#[source] io::Error),

    /// A filename could not be converted to the platform's native form.
    #[error("invalid filename encoding ({fault}) after {valid_up_to} units")]
    EncodingInvalid {
        /// Number of input units that were well formed before the fault.
        valid_up_to: usize,
        /// What was wrong with the input.
        fault: EncodingFault,
    },

    /// Operation attempted in an incompatible mode.
    #[error("invalid access mode: {0}")]
    InvalidMode(&'static str),

    /// The mode string contained a character the parser does not know.
    #[error("unknown mode flag '{flag}' at position {position}")]
    UnknownModeFlag {
        /// The offending character.
        flag: char,
        /// Character index within the mode string.
        position: usize,
    },

    /// Wrapper for `std::io::Error` from auxiliary operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error when a memory advice call fails.
    #[error("advice failed: {0}")]
    AdviceFailed(String),

    /// Error when locking pages fails.
    #[error("lock failed: {0}")]
    LockFailed(String),

    /// Error when unlocking pages fails.
    #[error("unlock failed: {0}")]
    UnlockFailed(String),
}

impl MmapPagesError {
    /// Platform error code behind this error, if the OS reported one.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            MmapPagesError::OpenFailed { source, .. } => source.raw_os_error(),
            MmapPagesError::MapFailed(e) | MmapPagesError::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }

    pub(crate) fn range(offset: usize, len: usize, total: usize, fault: RangeFault) -> Self {
        MmapPagesError::RangeInvalid {
            offset,
            len,
            total,
            fault,
        }
    }
}
