use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_scan::utils::rotation::{invert_luminance, rotate90, rotate90_into};

fn bench_rotate90_frame(c: &mut Criterion) {
    let plane = vec![128u8; 1280 * 720];
    c.bench_function("rotate90_1280x720", |b| {
        b.iter(|| rotate90(black_box(&plane), black_box(1280), black_box(720)))
    });
}

fn bench_rotate90_into_reused(c: &mut Criterion) {
    let plane = vec![128u8; 1920 * 1080];
    let mut output = vec![0u8; 1920 * 1080];
    c.bench_function("rotate90_into_1920x1080", |b| {
        b.iter(|| {
            rotate90_into(
                black_box(&plane),
                black_box(1920),
                black_box(1080),
                black_box(&mut output),
            )
        })
    });
}

fn bench_invert_region(c: &mut Criterion) {
    let mut region = vec![77u8; 384 * 384];
    c.bench_function("invert_384x384", |b| {
        b.iter(|| invert_luminance(black_box(&mut region)))
    });
}

fn bench_invert_large(c: &mut Criterion) {
    let mut plane = vec![77u8; 1920 * 1080];
    c.bench_function("invert_1920x1080", |b| {
        b.iter(|| invert_luminance(black_box(&mut plane)))
    });
}

criterion_group!(
    benches,
    bench_rotate90_frame,
    bench_rotate90_into_reused,
    bench_invert_region,
    bench_invert_large
);
criterion_main!(benches);
