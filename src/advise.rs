//! Memory advise operations for optimizing OS behavior on a page.

use std::ptr::NonNull;

use crate::errors::{MmapPagesError, Result};
use crate::page::Page;
use crate::utils::{align_span, ensure_in_window, page_size};

/// Memory access pattern advice for the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmapAdvice {
    /// Normal access pattern (default).
    Normal,
    /// Random access pattern.
    Random,
    /// Sequential access pattern.
    Sequential,
    /// Will need this range soon.
    WillNeed,
    /// Won't need this range soon.
    DontNeed,
}

impl Page<'_> {
    /// Advise the OS about the expected access pattern for the whole page.
    ///
    /// The advice covers the full native view, including the alignment
    /// shift in front of the visible bytes.
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::AdviceFailed` if the system call fails.
    pub fn advise(&self, advice: MmapAdvice) -> Result<()> {
        let (base, len) = self.raw_view();
        advise_raw(base, len, advice)
    }

    /// Advise the OS about `[offset, offset + len)` of the visible bytes.
    ///
    /// The range is widened down to the page boundary the OS requires.
    ///
    /// # Platform-specific behavior
    ///
    /// - **Unix**: Uses `madvise` system call
    /// - **Windows**: Uses `PrefetchVirtualMemory` for `WillNeed`, no-op for others
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::RangeInvalid` if the range leaves the page.
    /// Returns `MmapPagesError::AdviceFailed` if the system call fails.
    pub fn advise_range(&self, offset: usize, len: usize, advice: MmapAdvice) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        ensure_in_window(offset, len, self.len())?;
        let (base, _) = self.raw_view();
        let sub = align_span(self.alignment_shift() + offset, len, page_size())?;
        #[allow(clippy::cast_possible_truncation)]
        let start = sub.offset as usize;
        // SAFETY: start + sub.len stays inside the live view.
        let ptr = unsafe { NonNull::new_unchecked(base.as_ptr().add(start)) };
        advise_raw(ptr, sub.len, advice)
    }
}

fn advise_raw(addr: NonNull<u8>, length: usize, advice: MmapAdvice) -> Result<()> {
    #[cfg(unix)]
    {
        use libc::{madvise, MADV_DONTNEED, MADV_NORMAL, MADV_RANDOM, MADV_SEQUENTIAL, MADV_WILLNEED};

        let advice_flag = match advice {
            MmapAdvice::Normal => MADV_NORMAL,
            MmapAdvice::Random => MADV_RANDOM,
            MmapAdvice::Sequential => MADV_SEQUENTIAL,
            MmapAdvice::WillNeed => MADV_WILLNEED,
            MmapAdvice::DontNeed => MADV_DONTNEED,
        };

        // SAFETY: page-aligned address inside a live view of at least `length` bytes
        let result = unsafe { madvise(addr.as_ptr().cast::<libc::c_void>(), length, advice_flag) };

        if result != 0 {
            let err = std::io::Error::last_os_error();
            return Err(MmapPagesError::AdviceFailed(format!("madvise failed: {err}")));
        }
    }

    #[cfg(windows)]
    {
        // Windows only supports prefetching (WillNeed equivalent)
        if matches!(advice, MmapAdvice::WillNeed) {
            #[allow(non_snake_case)]
            #[repr(C)]
            struct WIN32_MEMORY_RANGE_ENTRY {
                VirtualAddress: *mut core::ffi::c_void,
                NumberOfBytes: usize,
            }

            extern "system" {
                fn PrefetchVirtualMemory(
                    hProcess: *mut core::ffi::c_void,
                    NumberOfEntries: usize,
                    VirtualAddresses: *const WIN32_MEMORY_RANGE_ENTRY,
                    Flags: u32,
                ) -> i32;

                fn GetCurrentProcess() -> *mut core::ffi::c_void;
            }

            let entry = WIN32_MEMORY_RANGE_ENTRY {
                VirtualAddress: addr.as_ptr().cast::<core::ffi::c_void>(),
                NumberOfBytes: length,
            };

            // SAFETY: PrefetchVirtualMemory is safe with valid memory range
            let result = unsafe { PrefetchVirtualMemory(GetCurrentProcess(), 1, &entry, 0) };

            if result == 0 {
                let err = std::io::Error::last_os_error();
                return Err(MmapPagesError::AdviceFailed(format!(
                    "PrefetchVirtualMemory failed: {err}"
                )));
            }
        }
        // Other advice types are no-ops on Windows
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mapping;
    use std::fs;
    use std::path::PathBuf;

    fn tmp_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("mmap_pages_advise_test_{}_{}", name, std::process::id()));
        p
    }

    #[test]
    fn test_advise_operations() {
        let path = tmp_path("advise_ops");
        fs::write(&path, vec![7u8; 8192]).expect("seed");

        let mapping = Mapping::builder(&path).mode_str("re").expect("mode").open().expect("open");
        let page = mapping.acquire(8000, 100).expect("acquire");

        page.advise(MmapAdvice::Sequential).expect("sequential advice");
        page.advise_range(0, 4096, MmapAdvice::Random).expect("random advice");
        page.advise_range(10, 100, MmapAdvice::WillNeed).expect("will need advice");
        page.advise_range(7000, 1000, MmapAdvice::Normal).expect("normal advice");

        // Test empty range (should be no-op)
        page.advise_range(0, 0, MmapAdvice::Normal).expect("empty range");

        // Test out of bounds
        assert!(page.advise_range(8000, 1, MmapAdvice::Normal).is_err());
        assert!(page.advise_range(0, 8001, MmapAdvice::Normal).is_err());

        drop(page);
        drop(mapping);
        fs::remove_file(&path).expect("cleanup");
    }

    #[test]
    fn test_advise_with_different_modes() {
        let path = tmp_path("advise_modes");
        fs::write(&path, vec![1u8; 4096]).expect("seed");

        for mode in ["re", "we", "wep"] {
            let mapping = Mapping::builder(&path).mode_str(mode).expect("mode").open().expect("open");
            let page = mapping.acquire(4096, 0).expect("acquire");
            page.advise(MmapAdvice::WillNeed).expect("advise");
        }

        fs::remove_file(&path).expect("cleanup");
    }
}
