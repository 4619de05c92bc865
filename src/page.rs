//! Pages: granularity-aligned views acquired from a [`Mapping`].

use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};
use std::slice;

use crate::errors::{MmapPagesError, Result};
use crate::mapping::Mapping;
use crate::mode::ModeTag;
use crate::platform::{Native, Platform};
use crate::utils::{align_span, ensure_in_window, page_size, AlignedSpan};

/// One mapped view of part of a [`Mapping`]'s window.
///
/// The native view starts at a granularity boundary; the page exposes only
/// the bytes the caller asked for. Dropping the page unmaps the whole native
/// view. Use [`Page::close`] to observe unmap failures instead of having them
/// logged.
///
/// Pages acquired from the same mapping are independent: they may overlap,
/// and each is released on its own. Without the private flag, overlapping
/// pages see each other's writes; with it, each page's writes stay in that
/// page. Writes go through [`Page::update_region`], which never hands out a
/// reference to the view, or through the `unsafe` [`Page::as_mut_slice`].
pub struct Page<'m> {
    base: NonNull<u8>,
    span: AlignedSpan,
    offset: usize,
    mode: ModeTag,
    _mapping: PhantomData<&'m Mapping>,
}

// SAFETY: the page exclusively owns its view. Safe writes take `&mut self`
// and copy through a raw pointer; a `&mut [u8]` into the view only comes
// from the `unsafe` `as_mut_slice`, whose contract excludes overlapping pages.
unsafe impl Send for Page<'_> {}
// SAFETY: see above.
unsafe impl Sync for Page<'_> {}

impl std::fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("offset", &self.offset)
            .field("len", &self.len())
            .field("aligned_offset", &self.span.offset)
            .field("shift", &self.span.shift)
            .finish()
    }
}

impl<'m> Page<'m> {
    pub(crate) fn new(base: NonNull<u8>, span: AlignedSpan, offset: usize, mode: ModeTag) -> Self {
        Self {
            base,
            span,
            offset,
            mode,
            _mapping: PhantomData,
        }
    }

    /// Pointer to the first requested byte.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        // SAFETY: shift < aligned len, so the result stays inside the view.
        unsafe { self.base.as_ptr().add(self.span.shift) }
    }

    /// Mutable pointer to the first requested byte.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::InvalidMode` unless the mapping was opened
    /// with `w`; the view would fault on write.
    pub fn as_mut_ptr(&mut self) -> Result<*mut u8> {
        if !self.mode.is_writable() {
            return Err(MmapPagesError::InvalidMode("mutable access on read-only page"));
        }
        // SAFETY: shift < aligned len, so the result stays inside the view.
        Ok(unsafe { self.base.as_ptr().add(self.span.shift) })
    }

    /// The requested bytes.
    ///
    /// Overlapping pages of a shared writable mapping alias the same memory.
    /// The returned slice is only valid while no other page writes to the
    /// bytes it covers; use [`Page::read_into`] to take a copy instead.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the view covers [shift, aligned len) and lives as long as self.
        unsafe { slice::from_raw_parts(self.as_ptr(), self.len()) }
    }

    /// The requested bytes, writable.
    ///
    /// # Safety
    ///
    /// Unless the mapping is private, other pages of the same mapping may
    /// cover the same bytes. While the returned slice lives, no other page
    /// overlapping this one may be read or written, on any thread.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::InvalidMode` unless the mapping was opened
    /// with `w`.
    pub unsafe fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        let len = self.len();
        let ptr = self.as_mut_ptr()?;
        // SAFETY: the view is writable and covers [shift, aligned len); the
        // caller rules out overlapping pages.
        Ok(unsafe { slice::from_raw_parts_mut(ptr, len) })
    }

    /// Copy bytes out of the page starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::RangeInvalid` if the range leaves the page.
    pub fn read_into(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        ensure_in_window(offset, buf.len(), self.len())?;
        // SAFETY: [offset, offset + buf.len()) lies inside the visible bytes,
        // and `buf` is caller memory, disjoint from the view.
        unsafe { ptr::copy_nonoverlapping(self.as_ptr().add(offset), buf.as_mut_ptr(), buf.len()) };
        Ok(())
    }

    /// Copy `data` into the page at `offset`.
    ///
    /// The bytes are copied through a raw pointer, so no reference to the
    /// view outlives the call.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::InvalidMode` for read-only pages.
    /// Returns `MmapPagesError::RangeInvalid` if the range leaves the page.
    pub fn update_region(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let dst = self.as_mut_ptr()?;
        ensure_in_window(offset, data.len(), self.len())?;
        // SAFETY: the view is writable and [offset, offset + data.len()) lies
        // inside the visible bytes. `ptr::copy` tolerates `data` pointing into
        // an overlapping page.
        unsafe { ptr::copy(data.as_ptr(), dst.add(offset), data.len()) };
        Ok(())
    }

    /// Visible length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.span.len - self.span.shift
    }

    /// Always `false`; zero-length pages cannot be acquired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset of the page within its mapping's window, as requested.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// File offset where the native view starts.
    #[must_use]
    pub fn aligned_offset(&self) -> u64 {
        self.span.offset
    }

    /// Length of the native view.
    #[must_use]
    pub fn aligned_len(&self) -> usize {
        self.span.len
    }

    /// Bytes between the start of the native view and the first requested byte.
    #[must_use]
    pub fn alignment_shift(&self) -> usize {
        self.span.shift
    }

    /// Mode inherited from the mapping.
    #[must_use]
    pub fn mode(&self) -> ModeTag {
        self.mode
    }

    /// Base of the native view and its length, for native calls that need
    /// page-aligned addresses.
    #[cfg(any(feature = "advise", feature = "locking"))]
    pub(crate) fn raw_view(&self) -> (NonNull<u8>, usize) {
        (self.base, self.span.len)
    }

    /// Write dirty bytes back to the file. A no-op for read-only and
    /// private pages.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::Io` if the native flush fails.
    pub fn flush(&self) -> Result<()> {
        if !self.mode.is_writable() || self.mode.private {
            return Ok(());
        }
        // SAFETY: the whole live view.
        unsafe { Native::flush_view(self.base, self.span.len) }?;
        Ok(())
    }

    /// Flush `[offset, offset + len)` of the visible bytes.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::RangeInvalid` if the range leaves the page.
    /// Returns `MmapPagesError::Io` if the native flush fails.
    pub fn flush_range(&self, offset: usize, len: usize) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        ensure_in_window(offset, len, self.len())?;
        if !self.mode.is_writable() || self.mode.private {
            return Ok(());
        }
        // msync wants a page-aligned start; the view base is one.
        let sub = align_span(self.span.shift + offset, len, page_size())?;
        #[allow(clippy::cast_possible_truncation)]
        let start = sub.offset as usize;
        // SAFETY: start + sub.len <= aligned len, so the pointer and range
        // stay inside the live view.
        unsafe {
            let ptr = NonNull::new_unchecked(self.base.as_ptr().add(start));
            Native::flush_view(ptr, sub.len)?;
        }
        Ok(())
    }

    /// Unmap the page, reporting a native failure instead of logging it.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::MapFailed` if the native unmap fails.
    pub fn close(self) -> Result<()> {
        let page = ManuallyDrop::new(self);
        log::debug!("releasing page offset={} len={}", page.offset, page.len());
        // SAFETY: `page` is never used again and its Drop will not run.
        unsafe { Native::destroy_view(page.base, page.span.len) }.map_err(MmapPagesError::MapFailed)
    }
}

impl AsRef<[u8]> for Page<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Drop for Page<'_> {
    fn drop(&mut self) {
        log::debug!("releasing page offset={} len={}", self.offset, self.len());
        // SAFETY: the view is live and nothing borrows it past this point.
        if let Err(e) = unsafe { Native::destroy_view(self.base, self.span.len) } {
            log::warn!("failed to unmap page at offset {}: {e}", self.offset);
        }
    }
}
