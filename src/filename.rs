//! Filename resolution: narrow, UTF-8 and wide names to the form the native
//! open call takes.
//!
//! POSIX opens take NUL-terminated bytes; Windows opens take NUL-terminated
//! UTF-16. UTF-8 names are validated before use and wide names are decoded on
//! POSIX, so a malformed name fails with `EncodingInvalid` instead of opening
//! a different file.

use std::path::Path;

use crate::errors::{EncodingFault, MmapPagesError, Result};

/// A validated filename in the platform's native form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativePath {
    #[cfg(unix)]
    inner: std::ffi::CString,
    #[cfg(windows)]
    inner: Vec<u16>,
    display: String,
}

fn interior_nul(position: usize) -> MmapPagesError {
    MmapPagesError::EncodingInvalid {
        valid_up_to: position,
        fault: EncodingFault::InteriorNul,
    }
}

fn utf8_error(e: std::str::Utf8Error) -> MmapPagesError {
    MmapPagesError::EncodingInvalid {
        valid_up_to: e.valid_up_to(),
        fault: if e.error_len().is_some() {
            EncodingFault::InvalidSequence
        } else {
            EncodingFault::TruncatedSequence
        },
    }
}

/// Transcode UTF-8 to UTF-16.
///
/// Code points at or above U+10000 become surrogate pairs. Overlong forms,
/// encoded surrogates, code points above U+10FFFF, stray continuation bytes
/// and truncated sequences are rejected.
///
/// # Errors
///
/// Returns `MmapPagesError::EncodingInvalid` with the offset of the first bad
/// byte.
pub fn utf8_to_utf16(bytes: &[u8]) -> Result<Vec<u16>> {
    let text = std::str::from_utf8(bytes).map_err(utf8_error)?;
    Ok(text.encode_utf16().collect())
}

/// Transcode UTF-16 to UTF-8.
///
/// # Errors
///
/// Returns `MmapPagesError::EncodingInvalid` with `UnpairedSurrogate` and the
/// index of the offending unit.
pub fn utf16_to_utf8(units: &[u16]) -> Result<String> {
    let mut out = String::with_capacity(units.len());
    let mut position = 0;
    for decoded in char::decode_utf16(units.iter().copied()) {
        let ch = decoded.map_err(|_| MmapPagesError::EncodingInvalid {
            valid_up_to: position,
            fault: EncodingFault::UnpairedSurrogate,
        })?;
        out.push(ch);
        position += ch.len_utf16();
    }
    Ok(out)
}

#[cfg(unix)]
impl NativePath {
    fn from_bytes(bytes: Vec<u8>, display: String) -> Result<Self> {
        let inner = std::ffi::CString::new(bytes).map_err(|e| interior_nul(e.nul_position()))?;
        Ok(Self { inner, display })
    }

    /// Resolve a platform path. On POSIX the bytes are used as-is.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::EncodingInvalid` if the path contains a NUL.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        use std::os::unix::ffi::OsStrExt;
        let path = path.as_ref();
        Self::from_bytes(path.as_os_str().as_bytes().to_vec(), path.display().to_string())
    }

    /// Resolve a UTF-8 encoded name.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::EncodingInvalid` for ill-formed UTF-8 or a NUL.
    pub fn from_utf8(name: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(name).map_err(utf8_error)?;
        Self::from_bytes(name.to_vec(), text.to_owned())
    }

    /// Resolve a UTF-16 encoded name, re-encoding it as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::EncodingInvalid` for unpaired surrogates or a NUL.
    pub fn from_wide(name: &[u16]) -> Result<Self> {
        let text = utf16_to_utf8(name)?;
        Self::from_bytes(text.clone().into_bytes(), text)
    }

    pub(crate) fn as_c_str(&self) -> &std::ffi::CStr {
        &self.inner
    }
}

#[cfg(windows)]
impl NativePath {
    fn from_units(mut units: Vec<u16>, display: String) -> Result<Self> {
        if let Some(position) = units.iter().position(|&u| u == 0) {
            return Err(interior_nul(position));
        }
        units.push(0);
        Ok(Self { inner: units, display })
    }

    /// Resolve a platform path.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::EncodingInvalid` if the path contains a NUL.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        use std::os::windows::ffi::OsStrExt;
        let path = path.as_ref();
        Self::from_units(path.as_os_str().encode_wide().collect(), path.display().to_string())
    }

    /// Resolve a UTF-8 encoded name, transcoding it to UTF-16.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::EncodingInvalid` for ill-formed UTF-8 or a NUL.
    pub fn from_utf8(name: &[u8]) -> Result<Self> {
        let units = utf8_to_utf16(name)?;
        Self::from_units(units, String::from_utf8_lossy(name).into_owned())
    }

    /// Resolve a UTF-16 encoded name. The units are passed through unchanged.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::EncodingInvalid` if the name contains a NUL.
    pub fn from_wide(name: &[u16]) -> Result<Self> {
        Self::from_units(name.to_vec(), String::from_utf16_lossy(name))
    }

    pub(crate) fn as_wide_ptr(&self) -> *const u16 {
        self.inner.as_ptr()
    }
}

impl NativePath {
    /// Human-readable rendering of the name, for messages.
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }
}
