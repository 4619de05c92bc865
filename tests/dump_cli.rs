//! End-to-end runs of the `dump` binary.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("mmap_pages_dump_{}_{}", name, std::process::id()));
    p
}

fn dump(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dump"))
        .args(args)
        .output()
        .expect("run dump")
}

#[test]
fn dumps_a_window_in_hex() {
    let path = tmp_path("window");
    fs::write(&path, b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ").expect("seed");
    let name = path.to_str().expect("utf-8 path");

    let out = dump(&[name, "r", "0x14", "10"]);
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).expect("utf-8 output");
    assert_eq!(
        text,
        "   0: 41424344 45464748 494a4b4c 4d4e4f50 | ABCDEFGHIJKLMNOP\n  10: 51525354                            | QRST            \n"
    );

    let out = dump(&[name, "re", "0", "32"]);
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).expect("utf-8 output");
    assert!(text.ends_with("| WXYZ            \n"));

    fs::remove_file(&path).expect("cleanup");
}

#[test]
fn reports_usage_and_open_failures() {
    let out = dump(&["only-one-arg"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("usage: dump"));

    let path = tmp_path("missing");
    let _ = fs::remove_file(&path);
    let name = path.to_str().expect("utf-8 path");
    let out = dump(&[name, "r", "1", "0"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to open file"));
}
