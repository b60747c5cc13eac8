//! Criterion benchmarks for frame decoding and template matching.
//!
//! Every navigation step decodes one frame and scores the whole template
//! library against it, so these two paths bound how fast the bench can react
//! to a screen change.
//!
//! Run with:
//! ```bash
//! cargo bench --package bench-core --bench matcher_bench
//! ```

use bench_core::frame::{FRAME_BYTES, INK, PAPER};
use bench_core::{decode_frame, Frame, Recognizer, Region, Template, TemplateLibrary};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{GrayImage, Luma};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// A pseudo-random but reproducible framebuffer.
fn busy_buffer() -> Vec<u8> {
    (0..FRAME_BYTES).map(|i| (i * 73 % 251) as u8).collect()
}

/// A textured `w × h` icon, distinct per `seed`.
fn icon(w: u32, h: u32, seed: u32) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        if (x * 7 + y * 13 + seed) % 5 < 2 {
            Luma([INK])
        } else {
            Luma([PAPER])
        }
    })
}

fn library(count: u32) -> TemplateLibrary {
    (0..count)
        .map(|i| Template::new(format!("icon{i}"), icon(16, 12, i)))
        .collect()
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_decode(c: &mut Criterion) {
    let data = busy_buffer();
    c.bench_function("decode_frame", |b| b.iter(|| decode_frame(black_box(&data))));
}

fn bench_recognize(c: &mut Criterion) {
    let frame = decode_frame(&busy_buffer()).unwrap_or_else(|_| Frame::blank());
    let recognizer = Recognizer::new(0.99);
    let mut group = c.benchmark_group("recognize_full_frame");

    for count in [1u32, 8, 32] {
        let lib = library(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &lib, |b, lib| {
            b.iter(|| recognizer.recognize(black_box(lib), black_box(&frame), Region::FULL))
        });
    }
    group.finish();
}

fn bench_recognize_header_strip(c: &mut Criterion) {
    let frame = decode_frame(&busy_buffer()).unwrap_or_else(|_| Frame::blank());
    let recognizer = Recognizer::new(0.99);
    let lib = library(8);
    let header = Region::new(0, 16, 0, 128);

    c.bench_function("recognize_header_strip_8", |b| {
        b.iter(|| recognizer.recognize(black_box(&lib), black_box(&frame), header))
    });
}

criterion_group!(benches, bench_decode, bench_recognize, bench_recognize_header_strip);
criterion_main!(benches);
