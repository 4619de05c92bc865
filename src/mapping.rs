//! The mappable window over an open file.

use std::path::{Path, PathBuf};

use crate::errors::{MmapPagesError, RangeFault, Result};
use crate::filename::NativePath;
use crate::mode::{Access, ModeTag};
use crate::page::Page;
use crate::platform::{Native, NativeAuthority, NativeFile, Platform};
use crate::utils::{align_span, align_up, ensure_in_window};

/// An open file plus the byte window pages may be acquired from.
///
/// Opening a `Mapping` maps no memory; call [`Mapping::acquire`] for that.
/// A `Mapping` never changes after it is opened, so it can be shared across
/// threads and pages can be acquired from several threads at once.
///
/// Every [`Page`] borrows the `Mapping` it came from, so the compiler makes
/// sure all pages are released before the mapping closes its handles. The
/// file-mapping object on Windows must outlive its views; the borrow applies
/// the same rule on every platform.
///
/// # Examples
///
/// ```no_run
/// use mmap_pages::{Mapping, ModeTag};
///
/// // Map everything from byte 100 to the end of the file.
/// let mapping = Mapping::builder("data.bin")
///     .mode(ModeTag::read().with_extend_to_eof())
///     .offset(100)
///     .open()?;
///
/// let page = mapping.acquire(16, 0)?;
/// println!("{:02x?}", page.as_slice());
/// # Ok::<(), mmap_pages::MmapPagesError>(())
/// ```
pub struct Mapping {
    // Declaration order is drop order: the authority closes before the file.
    authority: NativeAuthority,
    file: NativeFile,
    path: NativePath,
    mode: ModeTag,
    offset: usize,
    len: usize,
}

impl std::fmt::Debug for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapping")
            .field("path", &self.path.display())
            .field("mode", &self.mode.to_string())
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

impl Mapping {
    /// Open `path` and set up the window `[offset, offset + size)`.
    ///
    /// With `mode.extend_to_eof` the window runs from `offset` to the end of
    /// the file as it is at open time, and `size` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::InvalidMode` if `mode` grants no access.
    /// Returns `MmapPagesError::OpenFailed` if the native open fails.
    /// Returns `MmapPagesError::SizeMismatch` if the window is empty or runs
    /// past the end of the file.
    /// Returns `MmapPagesError::RangeInvalid` if `offset + size` overflows.
    /// Returns `MmapPagesError::MapFailed` if the mapping object cannot be
    /// created (Windows).
    pub fn open(path: &NativePath, mode: ModeTag, size: usize, offset: usize) -> Result<Self> {
        if mode.access == Access::None {
            return Err(MmapPagesError::InvalidMode("mode string needs 'r' or 'w'"));
        }

        let file = Native::open(path, mode).map_err(|source| MmapPagesError::OpenFailed {
            path: path.display().to_owned(),
            source,
        })?;

        // From here on an early return drops `file`, closing it.
        let file_size = Native::file_size(&file);
        let len = if mode.extend_to_eof {
            let available = file_size.saturating_sub(offset as u64);
            usize::try_from(available).unwrap_or(usize::MAX)
        } else {
            size
        };
        if len == 0 {
            return Err(MmapPagesError::SizeMismatch {
                offset,
                len,
                file_size,
            });
        }
        let end = offset
            .checked_add(len)
            .ok_or_else(|| MmapPagesError::range(offset, len, usize::MAX, RangeFault::Overflow))?;
        if end as u64 > file_size {
            return Err(MmapPagesError::SizeMismatch {
                offset,
                len,
                file_size,
            });
        }

        // The mapping object may not extend past the file, or it would grow it.
        let granularity = Native::allocation_granularity() as u64;
        let extent = align_up(end as u64, granularity)
            .unwrap_or(file_size)
            .min(file_size);
        let authority =
            Native::create_authority(&file, mode, extent).map_err(MmapPagesError::MapFailed)?;

        log::debug!(
            "opened mapping '{}' mode={mode} offset={offset} len={len} file_size={file_size}",
            path.display()
        );
        Ok(Self {
            authority,
            file,
            path: path.clone(),
            mode,
            offset,
            len,
        })
    }

    /// Start configuring a mapping of `path`.
    pub fn builder<P: AsRef<Path>>(path: P) -> MappingBuilder {
        MappingBuilder::new(path)
    }

    /// Map `size` bytes starting `offset` bytes into this mapping's window.
    ///
    /// The native view starts at the nearest granularity boundary at or below
    /// the requested byte; the returned page hides the difference.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::RangeInvalid` if `size` is zero, the range
    /// leaves the window, or aligning it overflows.
    /// Returns `MmapPagesError::MapFailed` if the native view cannot be created.
    pub fn acquire(&self, size: usize, offset: usize) -> Result<Page<'_>> {
        ensure_in_window(offset, size, self.len)?;
        // Cannot overflow: offset + size <= len and self.offset + len fits.
        let absolute = offset + self.offset;
        let span = align_span(absolute, size, Native::allocation_granularity())?;
        let base = Native::create_view(&self.file, &self.authority, self.mode, span.offset, span.len)
            .map_err(MmapPagesError::MapFailed)?;
        log::debug!(
            "acquired page offset={offset} len={size} view=[{}, +{}) shift={}",
            span.offset,
            span.len,
            span.shift
        );
        Ok(Page::new(base, span, offset, self.mode))
    }

    /// Length of the window in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; an empty window cannot be opened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset of the window from the start of the file.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Mode the mapping was opened with.
    #[must_use]
    pub fn mode(&self) -> ModeTag {
        self.mode
    }

    /// Name of the mapped file.
    #[must_use]
    pub fn path(&self) -> &NativePath {
        &self.path
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        log::debug!("closing mapping '{}'", self.path.display());
    }
}

/// Builder for [`Mapping`].
///
/// Defaults: read-only, offset 0, size 0 (so either set a size or use
/// end-of-file extension).
#[derive(Debug, Clone)]
pub struct MappingBuilder {
    path: PathBuf,
    mode: ModeTag,
    size: usize,
    offset: usize,
}

impl MappingBuilder {
    fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode: ModeTag::read(),
            size: 0,
            offset: 0,
        }
    }

    /// Set the mode.
    #[must_use]
    pub fn mode(mut self, mode: ModeTag) -> Self {
        self.mode = mode;
        self
    }

    /// Set the mode from a mode string such as `"we"`.
    ///
    /// # Errors
    ///
    /// Returns the strict parser's error for a malformed mode string.
    pub fn mode_str(mut self, mode: &str) -> Result<Self> {
        self.mode = mode.parse()?;
        Ok(self)
    }

    /// Set the window size in bytes. Ignored with end-of-file extension.
    #[must_use]
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set the window offset from the start of the file.
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Open the mapping.
    ///
    /// # Errors
    ///
    /// Returns errors from `NativePath::from_path` and `Mapping::open`.
    pub fn open(self) -> Result<Mapping> {
        let native = NativePath::from_path(&self.path)?;
        Mapping::open(&native, self.mode, self.size, self.offset)
    }
}
