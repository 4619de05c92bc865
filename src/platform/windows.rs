//! Windows backend: a file handle plus a file-mapping object, views via
//! `MapViewOfFile`.

#![allow(non_snake_case, clippy::upper_case_acronyms)]

use std::ffi::c_void;
use std::io;
use std::mem::{self, MaybeUninit};
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle};
use std::ptr::{self, NonNull};
use std::sync::OnceLock;

use super::{Os, Platform};
use crate::filename::NativePath;
use crate::mode::{Access, ModeTag};

type HANDLE = *mut c_void;
type BOOL = i32;
type DWORD = u32;

const GENERIC_READ: DWORD = 0x8000_0000;
const GENERIC_WRITE: DWORD = 0x4000_0000;
const FILE_SHARE_READ: DWORD = 0x0000_0001;
const FILE_SHARE_WRITE: DWORD = 0x0000_0002;
const OPEN_EXISTING: DWORD = 3;
const FILE_ATTRIBUTE_NORMAL: DWORD = 0x0000_0080;
const PAGE_READONLY: DWORD = 0x02;
const PAGE_READWRITE: DWORD = 0x04;
const FILE_MAP_COPY: DWORD = 0x0001;
const FILE_MAP_WRITE: DWORD = 0x0002;
const FILE_MAP_READ: DWORD = 0x0004;

#[repr(C)]
struct SECURITY_ATTRIBUTES {
    nLength: DWORD,
    lpSecurityDescriptor: *mut c_void,
    bInheritHandle: BOOL,
}

#[repr(C)]
struct SYSTEM_INFO {
    wProcessorArchitecture: u16,
    wReserved: u16,
    dwPageSize: DWORD,
    lpMinimumApplicationAddress: *mut c_void,
    lpMaximumApplicationAddress: *mut c_void,
    dwActiveProcessorMask: usize,
    dwNumberOfProcessors: DWORD,
    dwProcessorType: DWORD,
    dwAllocationGranularity: DWORD,
    wProcessorLevel: u16,
    wProcessorRevision: u16,
}

extern "system" {
    fn CreateFileW(
        lpFileName: *const u16,
        dwDesiredAccess: DWORD,
        dwShareMode: DWORD,
        lpSecurityAttributes: *mut SECURITY_ATTRIBUTES,
        dwCreationDisposition: DWORD,
        dwFlagsAndAttributes: DWORD,
        hTemplateFile: HANDLE,
    ) -> HANDLE;
    fn GetFileSizeEx(hFile: HANDLE, lpFileSize: *mut i64) -> BOOL;
    fn CreateFileMappingW(
        hFile: HANDLE,
        lpFileMappingAttributes: *mut SECURITY_ATTRIBUTES,
        flProtect: DWORD,
        dwMaximumSizeHigh: DWORD,
        dwMaximumSizeLow: DWORD,
        lpName: *const u16,
    ) -> HANDLE;
    fn MapViewOfFile(
        hFileMappingObject: HANDLE,
        dwDesiredAccess: DWORD,
        dwFileOffsetHigh: DWORD,
        dwFileOffsetLow: DWORD,
        dwNumberOfBytesToMap: usize,
    ) -> *mut c_void;
    fn UnmapViewOfFile(lpBaseAddress: *const c_void) -> BOOL;
    fn FlushViewOfFile(lpBaseAddress: *const c_void, dwNumberOfBytesToFlush: usize) -> BOOL;
    fn GetSystemInfo(lpSystemInfo: *mut SYSTEM_INFO);
}

pub(crate) struct Windows;

/// `CreateFileW` desired access for `tag`; 0 grants nothing.
pub(crate) fn open_access(tag: ModeTag) -> DWORD {
    match tag.access {
        Access::Read => GENERIC_READ,
        Access::ReadWrite => GENERIC_READ | GENERIC_WRITE,
        Access::None => 0,
    }
}

/// `CreateFileMappingW` protection for `tag`.
pub(crate) fn protection_flags(tag: ModeTag) -> DWORD {
    match tag.access {
        Access::Read => PAGE_READONLY,
        Access::ReadWrite => PAGE_READWRITE,
        Access::None => 0,
    }
}

/// `MapViewOfFile` access for `tag`.
///
/// Read-only private views stay read-only, matching `MAP_PRIVATE` with
/// `PROT_READ` on POSIX.
pub(crate) fn sharing_flags(tag: ModeTag) -> DWORD {
    match (tag.access, tag.private) {
        (Access::Read, _) => FILE_MAP_READ,
        (Access::ReadWrite, false) => FILE_MAP_READ | FILE_MAP_WRITE,
        (Access::ReadWrite, true) => FILE_MAP_COPY,
        (Access::None, _) => 0,
    }
}

fn security_attributes(inheritable: bool) -> SECURITY_ATTRIBUTES {
    SECURITY_ATTRIBUTES {
        nLength: mem::size_of::<SECURITY_ATTRIBUTES>() as DWORD,
        lpSecurityDescriptor: ptr::null_mut(),
        bInheritHandle: BOOL::from(inheritable),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn split_u64(value: u64) -> (DWORD, DWORD) {
    ((value >> 32) as DWORD, (value & 0xFFFF_FFFF) as DWORD)
}

impl Platform for Windows {
    type File = OwnedHandle;
    type Authority = OwnedHandle;

    const OS: Os = Os::Win32;
    // bInheritHandle is set by CreateFileW itself.
    const RACE_FREE_NO_BEQUEATH: bool = true;

    fn open(path: &NativePath, tag: ModeTag) -> io::Result<OwnedHandle> {
        let access = open_access(tag);
        if access == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "mode grants no access"));
        }
        let mut sa = security_attributes(tag.inheritable);
        // SAFETY: the path is NUL-terminated UTF-16 that outlives the call;
        // `sa` is a valid SECURITY_ATTRIBUTES.
        let handle = unsafe {
            CreateFileW(
                path.as_wide_ptr(),
                access,
                FILE_SHARE_READ | FILE_SHARE_WRITE,
                &mut sa,
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                ptr::null_mut(),
            )
        };
        if handle == usize::MAX as HANDLE {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: CreateFileW returned a fresh handle that nothing else owns.
        Ok(unsafe { OwnedHandle::from_raw_handle(handle) })
    }

    fn file_size(file: &OwnedHandle) -> u64 {
        let mut size: i64 = 0;
        // SAFETY: a live file handle and a valid out pointer.
        let ok = unsafe { GetFileSizeEx(file.as_raw_handle(), &mut size) };
        if ok == 0 {
            return 0;
        }
        u64::try_from(size).unwrap_or(0)
    }

    fn allocation_granularity() -> usize {
        static GRANULARITY: OnceLock<usize> = OnceLock::new();
        *GRANULARITY.get_or_init(|| {
            let mut sysinfo = MaybeUninit::<SYSTEM_INFO>::uninit();
            // SAFETY: GetSystemInfo always fills the struct.
            unsafe {
                GetSystemInfo(sysinfo.as_mut_ptr());
                sysinfo.assume_init().dwAllocationGranularity as usize
            }
        })
    }

    fn create_authority(file: &OwnedHandle, tag: ModeTag, extent: u64) -> io::Result<OwnedHandle> {
        let mut sa = security_attributes(tag.inheritable);
        let (high, low) = split_u64(extent);
        // SAFETY: a live file handle and a valid SECURITY_ATTRIBUTES; the
        // extent never exceeds the file size, so the file is not grown.
        let handle = unsafe {
            CreateFileMappingW(
                file.as_raw_handle(),
                &mut sa,
                protection_flags(tag),
                high,
                low,
                ptr::null(),
            )
        };
        if handle.is_null() {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: CreateFileMappingW returned a fresh handle that nothing else owns.
        Ok(unsafe { OwnedHandle::from_raw_handle(handle) })
    }

    fn create_view(
        _file: &OwnedHandle,
        authority: &OwnedHandle,
        tag: ModeTag,
        offset: u64,
        len: usize,
    ) -> io::Result<NonNull<u8>> {
        let (high, low) = split_u64(offset);
        // SAFETY: a live mapping object; the offset is aligned to the
        // allocation granularity by the caller.
        let ptr = unsafe {
            MapViewOfFile(authority.as_raw_handle(), sharing_flags(tag), high, low, len)
        };
        NonNull::new(ptr.cast::<u8>()).ok_or_else(io::Error::last_os_error)
    }

    unsafe fn destroy_view(ptr: NonNull<u8>, _len: usize) -> io::Result<()> {
        // The whole view is released; the length is implied by the base address.
        if UnmapViewOfFile(ptr.as_ptr().cast::<c_void>()) == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    unsafe fn flush_view(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
        if FlushViewOfFile(ptr.as_ptr().cast::<c_void>(), len) == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
