//! Integration tests for the optional page features working together.

use mmap_pages::{open, page_size, Mapping, ModeTag};
use std::fs;
use std::path::PathBuf;

fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("mmap_pages_feature_test_{}_{}", name, std::process::id()));
    p
}

#[test]
#[cfg(all(feature = "advise", feature = "iterator"))]
fn advise_then_iterate() {
    use mmap_pages::MmapAdvice;

    let path = tmp_path("advise_iterate");
    let data: Vec<u8> = (0..(4 * page_size())).map(|i| (i % 256) as u8).collect();
    fs::write(&path, &data).expect("seed");

    let mapping = open(&path, "re", 0, 17).expect("open");
    let mut rebuilt = Vec::with_capacity(mapping.len());
    for page in mapping.pages() {
        let page = page.expect("page");
        page.advise(MmapAdvice::Sequential).expect("advise");
        rebuilt.extend_from_slice(page.as_slice());
    }
    assert_eq!(rebuilt, &data[17..]);

    drop(mapping);
    fs::remove_file(&path).expect("cleanup");
}

#[test]
#[cfg(feature = "advise")]
fn advise_sub_ranges() {
    use mmap_pages::{MmapAdvice, MmapPagesError};

    let path = tmp_path("advise_range");
    fs::write(&path, vec![7u8; 3 * page_size()]).expect("seed");

    let mapping = open(&path, "r", 3 * page_size(), 0).expect("open");
    let page = mapping.acquire(2 * page_size(), 123).expect("acquire");
    for advice in [
        MmapAdvice::Normal,
        MmapAdvice::Random,
        MmapAdvice::WillNeed,
        MmapAdvice::DontNeed,
    ] {
        page.advise_range(page_size() - 1, 2, advice).expect("advise_range");
    }
    page.advise_range(0, 0, MmapAdvice::Normal).expect("empty range");
    assert!(matches!(
        page.advise_range(2 * page_size() - 1, 2, MmapAdvice::Normal),
        Err(MmapPagesError::RangeInvalid { .. })
    ));

    drop(page);
    drop(mapping);
    fs::remove_file(&path).expect("cleanup");
}

#[test]
#[cfg(feature = "locking")]
fn lock_write_flush() {
    let path = tmp_path("lock_write_flush");
    fs::write(&path, vec![0u8; 2 * page_size()]).expect("seed");

    let mapping = Mapping::builder(&path)
        .mode(ModeTag::read_write().with_extend_to_eof())
        .open()
        .expect("open");
    let mut page = mapping.acquire(64, 10).expect("acquire");

    // Locking may fail without privileges; writing must work either way.
    let locked = page.lock().is_ok();
    page.update_region(0, b"locked bytes").expect("update");
    page.flush().expect("flush");
    if locked {
        page.unlock().expect("unlock");
    }

    drop(page);
    drop(mapping);
    assert_eq!(&fs::read(&path).expect("read back")[10..22], b"locked bytes");
    fs::remove_file(&path).expect("cleanup");
}

#[test]
fn builder_matches_mode_string() {
    let path = tmp_path("builder");
    fs::write(&path, b"builder versus mode string").expect("seed");

    let built = Mapping::builder(&path)
        .mode(ModeTag::read())
        .size(6)
        .offset(8)
        .open()
        .expect("builder open");
    let parsed = open(&path, "r", 6, 8).expect("open");
    assert_eq!(built.mode(), parsed.mode());
    assert_eq!(built.len(), parsed.len());
    assert_eq!(built.offset(), parsed.offset());
    assert_eq!(
        built.acquire(6, 0).expect("page").as_slice(),
        parsed.acquire(6, 0).expect("page").as_slice()
    );
    assert_eq!(built.path().display(), path.display().to_string());

    let from_str = Mapping::builder(&path)
        .mode_str("re")
        .expect("mode")
        .offset(15)
        .open()
        .expect("open");
    assert_eq!(from_str.acquire(from_str.len(), 0).expect("page").as_slice(), b"mode string");

    drop((built, parsed, from_str));
    fs::remove_file(&path).expect("cleanup");
}
