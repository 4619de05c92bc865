//! Platform queries, inheritance control and filename encodings.
//!
//! Every backend has to produce the same observable results for the same
//! file, mode and range.

use mmap_pages::{
    check_bequeath_stop, current_os, open, open_utf8, open_wide, page_size, utf8_to_utf16,
    EncodingFault, MmapPagesError, Os,
};
use std::fs;
use std::path::PathBuf;

fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("mmap_pages_platform_parity_{}_{}", name, std::process::id()));
    p
}

#[test]
fn platform_queries() {
    #[cfg(unix)]
    assert_eq!(current_os(), Os::Unix);
    #[cfg(windows)]
    assert_eq!(current_os(), Os::Win32);
    assert_ne!(current_os(), Os::None);
    assert_eq!(Os::Unix as i32, 1);
    assert_eq!(Os::Win32 as i32, 2);

    assert!(check_bequeath_stop());

    let g = page_size();
    assert!(g > 0);
    assert!(g.is_power_of_two());
}

#[cfg(unix)]
#[test]
fn descriptors_close_on_exec_unless_bequeathed() {
    use std::os::fd::RawFd;

    // Descriptors this process holds that point at `path`.
    fn fds_for(path: &std::path::Path) -> Vec<RawFd> {
        let canonical = fs::canonicalize(path).expect("canonicalize");
        let Ok(entries) = fs::read_dir("/proc/self/fd") else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .filter(|e| fs::read_link(e.path()).map(|t| t == canonical).unwrap_or(false))
            .filter_map(|e| e.file_name().to_str().and_then(|s| s.parse().ok()))
            .collect()
    }

    fn cloexec(fd: RawFd) -> bool {
        // SAFETY: F_GETFD on a descriptor number only reads its flags.
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        flags >= 0 && flags & libc::FD_CLOEXEC != 0
    }

    if !std::path::Path::new("/proc/self/fd").exists() {
        return;
    }

    let path = tmp_path("cloexec");
    fs::write(&path, vec![1u8; 64]).expect("seed");

    let private = open(&path, "r", 64, 0).expect("open");
    let fds = fds_for(&path);
    assert!(!fds.is_empty());
    assert!(fds.iter().all(|&fd| cloexec(fd)));
    drop(private);

    let inherited = open(&path, "rq", 64, 0).expect("open bequeathed");
    let fds = fds_for(&path);
    assert!(fds.iter().any(|&fd| !cloexec(fd)));
    drop(inherited);

    fs::remove_file(&path).expect("cleanup");
}

#[test]
fn utf8_and_wide_names_open_the_same_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("caf\u{e9}-\u{1F600}.bin");
    fs::write(&path, b"unicode name bytes").expect("seed");

    let name = path.to_str().expect("utf-8 path");
    let wide = utf8_to_utf16(name.as_bytes()).expect("transcode");
    assert_eq!(wide, name.encode_utf16().collect::<Vec<_>>());

    let by_utf8 = open_utf8(name.as_bytes(), "r", 7, 8).expect("open_utf8");
    let by_wide = open_wide(&wide, "r", 7, 8).expect("open_wide");
    assert_eq!(by_utf8.acquire(5, 0).expect("page").as_slice(), b"name ");
    assert_eq!(by_wide.acquire(5, 2).expect("page").as_slice(), b"me by");
}

#[test]
fn astral_code_point_becomes_surrogate_pair() {
    let units = utf8_to_utf16("\u{10437}".as_bytes()).expect("transcode");
    assert_eq!(units, vec![0xD801, 0xDC37]);
}

#[test]
fn malformed_names_never_truncate() {
    let overlong = open_utf8(&[b'/', 0xC0, 0xAF], "r", 1, 0);
    assert!(matches!(
        overlong,
        Err(MmapPagesError::EncodingInvalid { fault: EncodingFault::InvalidSequence, valid_up_to: 1 })
    ));

    let truncated = open_utf8(&[b'a', b'b', 0xF0, 0x9F], "r", 1, 0);
    assert!(matches!(
        truncated,
        Err(MmapPagesError::EncodingInvalid { fault: EncodingFault::TruncatedSequence, valid_up_to: 2 })
    ));

    // Wide names pass through untouched on Windows, so only POSIX decodes them.
    #[cfg(unix)]
    {
        let lone = open_wide(&[0x61, 0xDC00, 0x62], "r", 1, 0);
        assert!(matches!(
            lone,
            Err(MmapPagesError::EncodingInvalid { fault: EncodingFault::UnpairedSurrogate, .. })
        ));
    }

    let nul = open_utf8(b"bad\0name", "r", 1, 0);
    assert!(matches!(
        nul,
        Err(MmapPagesError::EncodingInvalid { fault: EncodingFault::InteriorNul, .. })
    ));
}
