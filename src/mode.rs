//! Mode strings and the tags parsed from them.
//!
//! A mode string is a short run of ASCII flags:
//!
//! | flag | meaning |
//! |------|---------|
//! | `r`  | read only |
//! | `w`  | read and write |
//! | `e`  | map until end of file; the requested size is ignored |
//! | `p`  | private (copy-on-write) pages |
//! | `q`  | bequeath: child processes may inherit the file handle |

use std::fmt;
use std::str::FromStr;

use crate::errors::{MmapPagesError, Result};

/// Longest mode string the parsers will scan.
pub const MAX_MODE_LEN: usize = 8;

/// Read/write intent of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    /// No access requested. Opening with this fails.
    #[default]
    None,
    /// Read-only pages.
    Read,
    /// Readable and writable pages.
    ReadWrite,
}

/// Canonical form of a mode string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeTag {
    /// Read/write intent.
    pub access: Access,
    /// Extend the window to the end of the file at open time.
    pub extend_to_eof: bool,
    /// Writes stay private to this process.
    pub private: bool,
    /// The native handles are inherited by child processes.
    pub inheritable: bool,
}

impl ModeTag {
    /// Read-only tag with no other flags.
    #[must_use]
    pub const fn read() -> Self {
        Self {
            access: Access::Read,
            extend_to_eof: false,
            private: false,
            inheritable: false,
        }
    }

    /// Read-write tag with no other flags.
    #[must_use]
    pub const fn read_write() -> Self {
        Self {
            access: Access::ReadWrite,
            extend_to_eof: false,
            private: false,
            inheritable: false,
        }
    }

    /// Same tag with end-of-file extension set.
    #[must_use]
    pub const fn with_extend_to_eof(mut self) -> Self {
        self.extend_to_eof = true;
        self
    }

    /// Same tag with private (copy-on-write) pages.
    #[must_use]
    pub const fn with_private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Same tag with inheritable handles.
    #[must_use]
    pub const fn with_inheritable(mut self) -> Self {
        self.inheritable = true;
        self
    }

    /// Whether pages produced under this tag may be written to.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.access == Access::ReadWrite
    }

    /// Permissive parse: unknown characters are skipped, characters past
    /// [`MAX_MODE_LEN`] are ignored and the last of `r`/`w` wins. Never fails.
    #[must_use]
    pub fn parse_lenient(mode: &str) -> Self {
        let mut out = Self::default();
        for ch in mode.chars().take(MAX_MODE_LEN) {
            if ch == '\0' {
                break;
            }
            if !out.apply(ch) {
                log::trace!("ignoring unknown mode flag '{ch}'");
            }
        }
        out
    }

    /// Set the field named by `ch`. Returns `false` for an unknown flag.
    fn apply(&mut self, ch: char) -> bool {
        match ch {
            'r' => self.access = Access::Read,
            'w' => self.access = Access::ReadWrite,
            'e' => self.extend_to_eof = true,
            'p' => self.private = true,
            'q' => self.inheritable = true,
            _ => return false,
        }
        true
    }
}

impl FromStr for ModeTag {
    type Err = MmapPagesError;

    /// Strict parse used by the open functions.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::UnknownModeFlag` for an unrecognized character,
    /// and `MmapPagesError::InvalidMode` when the string is longer than
    /// [`MAX_MODE_LEN`] or names both `r` and `w`.
    fn from_str(mode: &str) -> Result<Self> {
        let mut out = Self::default();
        let (mut saw_read, mut saw_write) = (false, false);
        for (position, ch) in mode.chars().enumerate() {
            if ch == '\0' {
                break;
            }
            if position >= MAX_MODE_LEN {
                return Err(MmapPagesError::InvalidMode("mode string longer than 8 characters"));
            }
            if !out.apply(ch) {
                return Err(MmapPagesError::UnknownModeFlag { flag: ch, position });
            }
            saw_read |= ch == 'r';
            saw_write |= ch == 'w';
        }
        if saw_read && saw_write {
            return Err(MmapPagesError::InvalidMode("mode string names both 'r' and 'w'"));
        }
        Ok(out)
    }
}

impl fmt::Display for ModeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.access {
            Access::None => {}
            Access::Read => f.write_str("r")?,
            Access::ReadWrite => f.write_str("w")?,
        }
        if self.extend_to_eof {
            f.write_str("e")?;
        }
        if self.private {
            f.write_str("p")?;
        }
        if self.inheritable {
            f.write_str("q")?;
        }
        Ok(())
    }
}
