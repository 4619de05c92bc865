//! Memory locking operations to prevent page memory from being swapped out.

use crate::errors::{MmapPagesError, Result};
use crate::page::Page;

impl Page<'_> {
    /// Lock the page's memory to prevent it from being swapped to disk.
    ///
    /// This operation requires appropriate permissions (typically root/admin).
    /// Locked memory counts against system limits. The whole native view is
    /// locked, including the alignment shift.
    ///
    /// # Platform-specific behavior
    ///
    /// - **Unix**: Uses `mlock` system call
    /// - **Windows**: Uses `VirtualLock`
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::LockFailed` if the lock operation fails (often due to permissions).
    pub fn lock(&self) -> Result<()> {
        let (base, length) = self.raw_view();
        let addr = base.as_ptr();

        #[cfg(unix)]
        {
            // SAFETY: mlock over a live view
            let result = unsafe { libc::mlock(addr as *const libc::c_void, length) };

            if result != 0 {
                let err = std::io::Error::last_os_error();
                return Err(MmapPagesError::LockFailed(format!(
                    "mlock failed: {err}. This operation typically requires elevated privileges."
                )));
            }
        }

        #[cfg(windows)]
        {
            extern "system" {
                fn VirtualLock(lpAddress: *const core::ffi::c_void, dwSize: usize) -> i32;
            }

            // SAFETY: VirtualLock over a live view
            let result = unsafe { VirtualLock(addr as *const core::ffi::c_void, length) };

            if result == 0 {
                let err = std::io::Error::last_os_error();
                return Err(MmapPagesError::LockFailed(format!(
                    "VirtualLock failed: {err}. This operation may require elevated privileges."
                )));
            }
        }

        Ok(())
    }

    /// Unlock memory previously locked with [`Page::lock`].
    ///
    /// # Platform-specific behavior
    ///
    /// - **Unix**: Uses `munlock` system call
    /// - **Windows**: Uses `VirtualUnlock`
    ///
    /// # Errors
    ///
    /// Returns `MmapPagesError::UnlockFailed` if the unlock operation fails.
    pub fn unlock(&self) -> Result<()> {
        let (base, length) = self.raw_view();
        let addr = base.as_ptr();

        #[cfg(unix)]
        {
            // SAFETY: munlock over a live view
            let result = unsafe { libc::munlock(addr as *const libc::c_void, length) };

            if result != 0 {
                let err = std::io::Error::last_os_error();
                return Err(MmapPagesError::UnlockFailed(format!("munlock failed: {err}")));
            }
        }

        #[cfg(windows)]
        {
            extern "system" {
                fn VirtualUnlock(lpAddress: *const core::ffi::c_void, dwSize: usize) -> i32;
            }

            // SAFETY: VirtualUnlock over a live view
            let result = unsafe { VirtualUnlock(addr as *const core::ffi::c_void, length) };

            if result == 0 {
                let err = std::io::Error::last_os_error();
                // VirtualUnlock fails if the pages weren't locked, which is not an error here
                if err.raw_os_error() != Some(158) {
                    // ERROR_NOT_LOCKED
                    return Err(MmapPagesError::UnlockFailed(format!(
                        "VirtualUnlock failed: {err}"
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Mapping;
    use std::fs;
    use std::path::PathBuf;

    fn tmp_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("mmap_pages_lock_test_{}_{}", name, std::process::id()));
        p
    }

    #[test]
    fn test_lock_unlock_operations() {
        let path = tmp_path("lock_ops");
        fs::write(&path, vec![0u8; 8192]).expect("seed");

        let mapping = Mapping::builder(&path).mode_str("we").expect("mode").open().expect("open");
        let page = mapping.acquire(4096, 100).expect("acquire");

        // These operations may fail without appropriate privileges
        // We test that they at least don't panic
        let lock_result = page.lock();
        if lock_result.is_ok() {
            page.unlock().expect("unlock should succeed after lock");
        } else {
            println!("Lock failed (expected without privileges): {lock_result:?}");
        }

        drop(page);
        drop(mapping);
        fs::remove_file(&path).expect("cleanup");
    }
}
