//! Native mapping primitives.
//!
//! Each supported OS family implements [`Platform`] once; exactly one
//! implementation is compiled in and aliased as [`Native`]. Everything above
//! this module talks to the alias, so dispatch is static.

use std::io;
use std::ptr::NonNull;

use crate::filename::NativePath;
use crate::mode::ModeTag;

/// Operating system family the crate was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Os {
    /// No supported backend; every open fails.
    None = 0,
    /// POSIX `mmap` backend.
    Unix = 1,
    /// Windows file-mapping backend.
    Win32 = 2,
}

/// Capability set every backend provides.
///
/// Handle and authority destruction happen in `Drop` of the associated types,
/// so a partially built mapping unwinds in reverse acquisition order.
pub(crate) trait Platform {
    /// Exclusively owned open file.
    type File: Send + Sync;
    /// Object views are created from. On POSIX this is the descriptor itself,
    /// so the type carries nothing.
    type Authority: Send + Sync;

    const OS: Os;

    /// Whether `open` can keep a handle from leaking into children spawned
    /// concurrently by another thread.
    const RACE_FREE_NO_BEQUEATH: bool;

    /// Open `path` for the access in `tag`, inheritable only if
    /// `tag.inheritable`.
    fn open(path: &NativePath, tag: ModeTag) -> io::Result<Self::File>;

    /// Current size of the file, 0 if it cannot be queried.
    fn file_size(file: &Self::File) -> u64;

    /// Alignment unit for view offsets. Queried once per process.
    fn allocation_granularity() -> usize;

    /// Build the object views are carved from, covering `[0, extent)`.
    fn create_authority(file: &Self::File, tag: ModeTag, extent: u64) -> io::Result<Self::Authority>;

    /// Map `len` bytes at the granularity-aligned file `offset`.
    fn create_view(
        file: &Self::File,
        authority: &Self::Authority,
        tag: ModeTag,
        offset: u64,
        len: usize,
    ) -> io::Result<NonNull<u8>>;

    /// Unmap a view returned by `create_view`.
    ///
    /// # Safety
    ///
    /// `ptr` and `len` must describe exactly one live view, and nothing may
    /// access it afterwards.
    unsafe fn destroy_view(ptr: NonNull<u8>, len: usize) -> io::Result<()>;

    /// Write dirty bytes of `[ptr, ptr + len)` back to the file.
    ///
    /// # Safety
    ///
    /// The range must lie inside one live view.
    unsafe fn flush_view(ptr: NonNull<u8>, len: usize) -> io::Result<()>;
}

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        mod windows;
        pub(crate) use self::windows::Windows as Native;
    } else if #[cfg(unix)] {
        mod unix;
        pub(crate) use self::unix::Unix as Native;
    } else {
        compile_error!("mmap-pages supports unix and windows targets only");
    }
}

pub(crate) type NativeFile = <Native as Platform>::File;
pub(crate) type NativeAuthority = <Native as Platform>::Authority;

/// Backend this build targets.
#[must_use]
pub fn current_os() -> Os {
    Native::OS
}

/// Whether opening a mapping without the bequeath flag is race-free with
/// respect to child processes spawned concurrently by other threads.
#[must_use]
pub fn check_bequeath_stop() -> bool {
    Native::RACE_FREE_NO_BEQUEATH
}
