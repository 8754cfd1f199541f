//! S³ vector geometry benchmarks (spec.md §5, components C2/C3): centroid
//! computation and geodesic distance, the inner loop of both Physicality
//! creation and `find_gravitational_truth`'s cluster-density scan.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use substrate_geometry::{centroid, geodesic, hash_to_point};

fn sample_points(count: usize) -> Vec<[f64; 4]> {
    (0..count as u64)
        .map(|i| {
            let bytes = i.to_le_bytes();
            let mut h = [0u8; 16];
            h[..8].copy_from_slice(&bytes);
            hash_to_point(&h)
        })
        .collect()
}

fn bench_centroid(c: &mut Criterion) {
    let sizes: &[usize] = &[2, 8, 64, 512];
    let mut group = c.benchmark_group("centroid");

    for &size in sizes {
        let points = sample_points(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("children", size), &size, |b, _| {
            b.iter(|| black_box(centroid(black_box(&points))));
        });
    }
    group.finish();
}

fn bench_geodesic(c: &mut Criterion) {
    let points = sample_points(10_000);
    let mut group = c.benchmark_group("geodesic");
    group.throughput(Throughput::Elements(points.len() as u64 - 1));
    group.bench_function("pairwise_sequential", |b| {
        b.iter(|| {
            for window in points.windows(2) {
                black_box(geodesic(window[0], window[1]));
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_centroid, bench_geodesic);
criterion_main!(benches);
