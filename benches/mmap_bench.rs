use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mmap_pages::{open, page_size};
use std::fs;
use std::path::PathBuf;

// Unique temp path per bench
fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("mmap_pages_bench_{}_{}", name, std::process::id()));
    p
}

fn seed(name: &str, len: usize) -> PathBuf {
    let path = tmp_path(name);
    fs::write(&path, vec![0x5A_u8; len]).expect("seed");
    path
}

fn bench_open(b: &mut Criterion) {
    let mut group = b.benchmark_group("open");
    let path = seed("open", 1024 * 1024);
    for mode in ["r", "re", "w", "rp"] {
        group.bench_with_input(BenchmarkId::from_parameter(mode), &mode, |ben, &mode| {
            ben.iter(|| {
                let m = open(&path, mode, 1024 * 1024, 0).expect("open");
                criterion::black_box(m.len());
            });
        });
    }
    group.finish();
    let _ = fs::remove_file(&path);
}

fn bench_acquire(b: &mut Criterion) {
    let mut group = b.benchmark_group("acquire");
    let total = 8 * 1024 * 1024;
    let path = seed("acquire", total);
    let mapping = open(&path, "r", total, 0).expect("open");
    for &size in &[4_usize * 1024, 64 * 1024, 1024 * 1024] {
        // Aligned and misaligned starts.
        for (label, offset) in [("aligned", page_size()), ("shifted", page_size() + 123)] {
            group.bench_with_input(BenchmarkId::new(label, size), &size, |ben, &sz| {
                ben.iter(|| {
                    let page = mapping.acquire(sz, offset).expect("acquire");
                    criterion::black_box(page.alignment_shift());
                });
            });
        }
    }
    group.finish();
    drop(mapping);
    let _ = fs::remove_file(&path);
}

fn bench_read_page(b: &mut Criterion) {
    let mut group = b.benchmark_group("read_page");
    let total = 4 * 1024 * 1024;
    let path = seed("read_page", total);
    let mapping = open(&path, "r", total, 0).expect("open");
    for &size in &[4_usize * 1024, 64 * 1024, 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |ben, &sz| {
            let page = mapping.acquire(sz, 77).expect("acquire");
            let mut buf = vec![0u8; sz];
            ben.iter(|| {
                page.read_into(0, &mut buf).expect("read_into");
                criterion::black_box(&buf);
            });
        });
    }
    group.finish();
    drop(mapping);
    let _ = fs::remove_file(&path);
}

fn bench_update_flush(b: &mut Criterion) {
    let mut group = b.benchmark_group("update_flush");
    let total = 1024 * 1024;
    let path = seed("update_flush", total);
    let mapping = open(&path, "w", total, 0).expect("open");
    for &size in &[4_usize * 1024, 64 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        let payload = vec![0xAB_u8; size];
        group.bench_with_input(BenchmarkId::new("update_only", size), &size, |ben, &sz| {
            let mut page = mapping.acquire(sz, 0).expect("acquire");
            ben.iter(|| {
                page.update_region(0, &payload).expect("update");
                criterion::black_box(&payload);
            });
        });
        group.bench_with_input(BenchmarkId::new("update_plus_flush", size), &size, |ben, &sz| {
            let mut page = mapping.acquire(sz, 0).expect("acquire");
            ben.iter(|| {
                page.update_region(0, &payload).expect("update");
                page.flush().expect("flush");
            });
        });
    }
    group.finish();
    drop(mapping);
    let _ = fs::remove_file(&path);
}

#[cfg(feature = "iterator")]
fn bench_iterator_chunks(b: &mut Criterion) {
    let mut group = b.benchmark_group("iterator_chunks");
    let sz = 4 * 1024 * 1024;
    group.throughput(Throughput::Bytes(sz as u64));
    let path = seed("iter_chunks", sz);
    let mapping = open(&path, "re", 0, 0).expect("open");
    group.bench_function("iterate_4MB_by_64KB", |ben| {
        ben.iter(|| {
            let mut total = 0usize;
            for page in mapping.chunks(64 * 1024) {
                let page = page.expect("page");
                total += page.len();
                criterion::black_box(page.as_slice());
            }
            criterion::black_box(total);
        });
    });
    group.finish();
    drop(mapping);
    let _ = fs::remove_file(&path);
}
#[cfg(not(feature = "iterator"))]
fn bench_iterator_chunks(_: &mut Criterion) {}

#[cfg(feature = "advise")]
fn bench_advise(b: &mut Criterion) {
    use mmap_pages::MmapAdvice;
    let mut group = b.benchmark_group("advise");
    let sz = 4 * 1024 * 1024;
    let path = seed("advise", sz);
    let mapping = open(&path, "r", sz, 0).expect("open");
    let page = mapping.acquire(sz, 0).expect("acquire");
    group.bench_function("sequential_whole_page", |ben| {
        ben.iter(|| {
            page.advise(MmapAdvice::Sequential).ok();
        });
    });
    group.finish();
    drop(page);
    drop(mapping);
    let _ = fs::remove_file(&path);
}
#[cfg(not(feature = "advise"))]
fn bench_advise(_: &mut Criterion) {}

fn criterion_config() -> Criterion {
    Criterion::default()
        .sample_size(30)
        .warm_up_time(std::time::Duration::from_millis(300))
        .measurement_time(std::time::Duration::from_secs(3))
}

criterion_group! {
    name = mmap_benches;
    config = criterion_config();
    targets =
        bench_open,
        bench_acquire,
        bench_read_page,
        bench_update_flush,
        bench_iterator_chunks,
        bench_advise
}

criterion_main!(mmap_benches);
