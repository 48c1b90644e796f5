//! Benchmarks for FileSystem operations. Every mutation reserializes the
//! whole tree, so write cost grows with tree size.

use std::collections::BTreeMap;
use std::sync::Arc;

use cedar_types::clock::ManualClock;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use cedar_vfs::{FileSystem, FsOptions, MemoryStorage, resolve_path};

fn open() -> FileSystem {
    FileSystem::open(
        Box::new(MemoryStorage::new()),
        Arc::new(ManualClock::new(0)),
        FsOptions::default(),
    )
}

fn populated(n_files: usize) -> FileSystem {
    let mut fs = open();
    fs.mkdir("/data").unwrap();
    for i in 0..n_files {
        let dir = format!("/data/d{}", i % 10);
        if fs.get_node(&dir).is_none() {
            fs.mkdir(&dir).unwrap();
        }
        fs.write_file(&format!("{dir}/file_{i}.txt"), "some content")
            .unwrap();
    }
    fs
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("fs_write");

    for n_files in [10, 100] {
        let paths: Vec<String> = (0..n_files)
            .map(|i| format!("/data/file_{i}.txt"))
            .collect();

        group.bench_function(BenchmarkId::new("write", n_files), |b| {
            b.iter(|| {
                let mut fs = open();
                fs.mkdir("/data").unwrap();
                for path in &paths {
                    fs.write_file(path, "payload").unwrap();
                }
            });
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("fs_search");

    for n_files in [100, 1_000] {
        let fs = populated(n_files);

        group.bench_function(BenchmarkId::new("find", n_files), |b| {
            b.iter(|| fs.find("file_7.txt", "/"));
        });
        group.bench_function(BenchmarkId::new("seek", n_files), |b| {
            b.iter(|| fs.seek("content", "/"));
        });
        group.bench_function(BenchmarkId::new("tree_list", n_files), |b| {
            b.iter(|| fs.tree_list("/"));
        });
    }

    group.finish();
}

fn bench_copy(c: &mut Criterion) {
    c.bench_function("fs_copy_subtree", |b| {
        b.iter_batched(
            || populated(200),
            |mut fs| fs.copy("/data", "/backup").unwrap(),
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_resolve(c: &mut Criterion) {
    let mut marks = BTreeMap::new();
    marks.insert("w".to_string(), "/home/guest/work".to_string());

    c.bench_function("resolve_path", |b| {
        b.iter(|| {
            resolve_path("../a/./b/../c.txt", "/home/guest/docs", "guest", &marks);
            resolve_path("~/notes", "/", "guest", &marks);
            resolve_path("@w", "/", "guest", &marks);
        });
    });
}

criterion_group!(benches, bench_write, bench_search, bench_copy, bench_resolve);
criterion_main!(benches);
