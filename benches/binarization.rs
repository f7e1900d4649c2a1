use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_scan::models::LuminanceRegion;
use rust_scan::utils::binarization::{BinarizerKind, adaptive_binarize, binarize, otsu_binarize};

/// Horizontal gradient with a dark square in the middle
fn synthetic_region(width: usize, height: usize) -> Vec<u8> {
    let mut gray = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let inside = (width / 4..3 * width / 4).contains(&x)
                && (height / 4..3 * height / 4).contains(&y);
            gray.push(if inside { 20 } else { (x * 200 / width) as u8 + 40 });
        }
    }
    gray
}

fn bench_otsu_binarize_medium(c: &mut Criterion) {
    let gray = synthetic_region(640, 480);
    c.bench_function("otsu_binarize_640x480", |b| {
        b.iter(|| otsu_binarize(black_box(&gray), black_box(640), black_box(480)))
    });
}

fn bench_adaptive_binarize_medium(c: &mut Criterion) {
    let gray = synthetic_region(640, 480);
    c.bench_function("adaptive_binarize_640x480", |b| {
        b.iter(|| adaptive_binarize(black_box(&gray), black_box(640), black_box(480)))
    });
}

fn bench_adaptive_binarize_large(c: &mut Criterion) {
    let gray = synthetic_region(1920, 1080);
    c.bench_function("adaptive_binarize_1920x1080", |b| {
        b.iter(|| adaptive_binarize(black_box(&gray), black_box(1920), black_box(1080)))
    });
}

fn bench_roi_both_binarizers(c: &mut Criterion) {
    // default region of a 640x480 frame
    let region = LuminanceRegion::new(synthetic_region(384, 384), 384, 384).unwrap();
    c.bench_function("roi_384_adaptive_then_global", |b| {
        b.iter(|| {
            let adaptive = binarize(black_box(&region), BinarizerKind::Adaptive);
            let global = binarize(black_box(&region), BinarizerKind::GlobalHistogram);
            (adaptive, global)
        })
    });
}

criterion_group!(
    benches,
    bench_otsu_binarize_medium,
    bench_adaptive_binarize_medium,
    bench_adaptive_binarize_large,
    bench_roi_both_binarizers
);
criterion_main!(benches);
