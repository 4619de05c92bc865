//! High-level API: open a mapping from a name and a mode string.
//!
//! The three open functions differ only in how the filename is encoded; all
//! of them resolve the name, parse the mode strictly and call
//! [`Mapping::open`].

use std::path::Path;

use crate::errors::Result;
use crate::filename::NativePath;
use crate::mapping::Mapping;
use crate::mode::ModeTag;
use crate::page::Page;

/// Open `path` with a mode string such as `"r"`, `"we"` or `"rpq"`.
///
/// # Errors
///
/// Returns mode parsing errors, `EncodingInvalid` for a path with a NUL, and
/// errors from `Mapping::open`.
pub fn open<P: AsRef<Path>>(path: P, mode: &str, size: usize, offset: usize) -> Result<Mapping> {
    let mode: ModeTag = mode.parse()?;
    let native = NativePath::from_path(path)?;
    Mapping::open(&native, mode, size, offset)
}

/// Open a file named by UTF-8 bytes.
///
/// # Errors
///
/// Returns `EncodingInvalid` for ill-formed UTF-8, plus the errors of [`open`].
pub fn open_utf8(name: &[u8], mode: &str, size: usize, offset: usize) -> Result<Mapping> {
    let mode: ModeTag = mode.parse()?;
    let native = NativePath::from_utf8(name)?;
    Mapping::open(&native, mode, size, offset)
}

/// Open a file named by UTF-16 units.
///
/// # Errors
///
/// Returns `EncodingInvalid` for a name that cannot be converted, plus the
/// errors of [`open`].
pub fn open_wide(name: &[u16], mode: &str, size: usize, offset: usize) -> Result<Mapping> {
    let mode: ModeTag = mode.parse()?;
    let native = NativePath::from_wide(name)?;
    Mapping::open(&native, mode, size, offset)
}

/// Acquire a page of `mapping`.
///
/// # Errors
///
/// Returns errors from `Mapping::acquire`.
pub fn acquire(mapping: &Mapping, size: usize, offset: usize) -> Result<Page<'_>> {
    mapping.acquire(size, offset)
}

#[cfg(feature = "async")]
pub mod r#async {
    //! Async helpers (Tokio) that run the blocking native calls on the
    //! blocking thread pool.
    use std::path::PathBuf;
    use std::sync::Arc;

    use crate::errors::{MmapPagesError, Result};
    use crate::mapping::Mapping;

    fn join_error(e: tokio::task::JoinError) -> MmapPagesError {
        MmapPagesError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Open a mapping without blocking the current thread.
    ///
    /// # Errors
    ///
    /// Returns errors from [`super::open`], or `MmapPagesError::Io` if the
    /// blocking task panics or is cancelled.
    pub async fn open_async<P: Into<PathBuf>>(
        path: P,
        mode: &str,
        size: usize,
        offset: usize,
    ) -> Result<Mapping> {
        let path = path.into();
        let mode = mode.to_owned();
        tokio::task::spawn_blocking(move || super::open(path, &mode, size, offset))
            .await
            .map_err(join_error)?
    }

    /// Copy `size` bytes at `offset` of the mapping's window into a buffer,
    /// mapping and unmapping a page on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns errors from `Mapping::acquire`, or `MmapPagesError::Io` if
    /// the blocking task panics or is cancelled.
    pub async fn read_region_async(mapping: Arc<Mapping>, size: usize, offset: usize) -> Result<Vec<u8>> {
        tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let page = mapping.acquire(size, offset)?;
            let bytes = page.as_slice().to_vec();
            Ok(bytes)
        })
        .await
        .map_err(join_error)?
    }
}
