use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pakstore::{AddFlags, Package};
use tempfile::TempDir;

fn populated(dir: &TempDir, count: usize) -> Package {
    let mut pkg = Package::create(dir.path().join("bench.pak")).unwrap();
    for i in 0..count {
        pkg.add_bytes(&format!("assets/file{}.bin", i), &[i as u8; 64], AddFlags::NONE)
            .unwrap();
    }
    pkg.flush().unwrap();
    pkg
}

fn bench_has_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("has_file");

    for count in [100, 1000, 10000] {
        let dir = TempDir::new().unwrap();
        let pkg = populated(&dir, count);

        group.bench_with_input(BenchmarkId::new("hit", count), &count, |b, &count| {
            b.iter(|| {
                let i = rand::random::<usize>() % count;
                black_box(pkg.has_file(&format!("ASSETS/FILE{}.BIN", i)))
            });
        });

        group.bench_with_input(BenchmarkId::new("miss", count), &count, |b, _| {
            b.iter(|| black_box(pkg.has_file("assets/missing.bin")));
        });
    }
    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let dir = TempDir::new().unwrap();
        let mut pkg = Package::create(dir.path().join("bench.pak")).unwrap();
        let content: Vec<u8> = (0..size).map(|_| rand::random::<u8>()).collect();
        pkg.add_bytes("blob", &content, AddFlags::NONE).unwrap();
        pkg.flush().unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(pkg.read("blob").unwrap()));
        });
    }
    group.finish();
}

fn bench_add_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_flush");
    group.sample_size(20);

    for count in [100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let dir = TempDir::new().unwrap();
                black_box(populated(&dir, count));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_has_file, bench_read, bench_add_flush);
criterion_main!(benches);
