//! POSIX backend: one descriptor, views via `mmap`.

use std::io;
use std::mem::MaybeUninit;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::ptr::{self, NonNull};
use std::sync::OnceLock;

use super::{Os, Platform};
use crate::filename::NativePath;
use crate::mode::{Access, ModeTag};

pub(crate) struct Unix;

/// `open(2)` flags for `tag`, or `None` when it grants no access.
pub(crate) fn open_flags(tag: ModeTag) -> Option<libc::c_int> {
    let no_bequeath = if tag.inheritable { 0 } else { libc::O_CLOEXEC };
    match tag.access {
        Access::Read => Some(libc::O_RDONLY | no_bequeath),
        Access::ReadWrite => Some(libc::O_RDWR | no_bequeath),
        Access::None => None,
    }
}

/// `mmap` protection for `tag`.
pub(crate) fn protection_flags(tag: ModeTag) -> libc::c_int {
    match tag.access {
        Access::Read => libc::PROT_READ,
        Access::ReadWrite => libc::PROT_READ | libc::PROT_WRITE,
        Access::None => libc::PROT_NONE,
    }
}

/// `mmap` sharing flags for `tag`.
pub(crate) fn sharing_flags(tag: ModeTag) -> libc::c_int {
    if tag.private {
        libc::MAP_PRIVATE
    } else {
        libc::MAP_SHARED
    }
}

/// Run `call`, repeating it once if it fails with `EINTR`.
fn retry_interrupted_once<T>(mut call: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    match call() {
        Err(e) if e.kind() == io::ErrorKind::Interrupted => call(),
        other => other,
    }
}

impl Platform for Unix {
    type File = OwnedFd;
    type Authority = ();

    const OS: Os = Os::Unix;
    // O_CLOEXEC is applied by open(2) itself.
    const RACE_FREE_NO_BEQUEATH: bool = true;

    fn open(path: &NativePath, tag: ModeTag) -> io::Result<OwnedFd> {
        let flags = open_flags(tag).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "mode grants no access")
        })?;
        retry_interrupted_once(|| {
            // SAFETY: the path is NUL-terminated and outlives the call.
            let fd = unsafe { libc::open(path.as_c_str().as_ptr(), flags) };
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            // SAFETY: open just returned this descriptor; nothing else owns it.
            Ok(unsafe { OwnedFd::from_raw_fd(fd) })
        })
    }

    fn file_size(file: &OwnedFd) -> u64 {
        let mut stat = MaybeUninit::<libc::stat>::zeroed();
        // SAFETY: fstat fills the buffer on success and we only read it then.
        let res = unsafe { libc::fstat(file.as_raw_fd(), stat.as_mut_ptr()) };
        if res != 0 {
            return 0;
        }
        // SAFETY: fstat returned 0, so the struct is initialized.
        let stat = unsafe { stat.assume_init() };
        u64::try_from(stat.st_size).unwrap_or(0)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn allocation_granularity() -> usize {
        static GRANULARITY: OnceLock<usize> = OnceLock::new();
        *GRANULARITY.get_or_init(|| {
            // SAFETY: sysconf with _SC_PAGESIZE is safe to call.
            let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
            // -1 means unknown; alignment is skipped for 0.
            page_size.max(0) as usize
        })
    }

    fn create_authority(_file: &OwnedFd, _tag: ModeTag, _extent: u64) -> io::Result<()> {
        Ok(())
    }

    fn create_view(
        file: &OwnedFd,
        _authority: &(),
        tag: ModeTag,
        offset: u64,
        len: usize,
    ) -> io::Result<NonNull<u8>> {
        let offset = libc::off_t::try_from(offset).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "view offset exceeds off_t")
        })?;
        // SAFETY: a fresh mapping at a kernel-chosen address; the offset is
        // page aligned by the caller and the descriptor is open.
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                protection_flags(tag),
                sharing_flags(tag),
                file.as_raw_fd(),
                offset,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        NonNull::new(ptr.cast::<u8>())
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned a null view"))
    }

    unsafe fn destroy_view(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
        if libc::munmap(ptr.as_ptr().cast::<libc::c_void>(), len) != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    unsafe fn flush_view(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
        if libc::msync(ptr.as_ptr().cast::<libc::c_void>(), len, libc::MS_SYNC) != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
