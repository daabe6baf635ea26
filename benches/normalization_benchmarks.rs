use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use repaint::{NormalizedDimensions, RegionMask};

fn bench_dimension_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("dimension_normalization");
    for (w, h) in [(400_u32, 800_u32), (1920, 1080), (4032, 3024)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", w, h)),
            &(w, h),
            |b, &(w, h)| b.iter(|| NormalizedDimensions::compute(black_box(w), black_box(h))),
        );
    }
    group.finish();
}

fn bench_mask_binarization(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask_binarization");
    for size in [128_usize, 352, 512] {
        let logits = Array2::from_shape_fn((size, size), |(y, x)| {
            (x as f32 - y as f32) / size as f32
        });
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &logits,
            |b, logits| b.iter(|| RegionMask::from_logits(black_box(logits))),
        );
    }
    group.finish();
}

fn bench_mask_rendering(c: &mut Criterion) {
    let size = 512_u32;
    let data = (0..size * size).map(|i| (i % 2) as u8).collect::<Vec<_>>();
    let mask = RegionMask::new(data, (size, size)).unwrap();
    c.bench_function("mask_to_rgb_512", |b| {
        b.iter(|| black_box(&mask).to_rgb_image());
    });
}

criterion_group!(
    benches,
    bench_dimension_normalization,
    bench_mask_binarization,
    bench_mask_rendering
);
criterion_main!(benches);
