//! Record accessor throughput.
//!
//! Measures typed strided writes/reads on an interleaved vertex buffer and the
//! normalized-color conversion path.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use strata::{RecordAccessor, RecordFormat, ScalarType};

const VERTICES: usize = 4096;

fn vertex_format() -> RecordFormat {
    let mut format = RecordFormat::new();
    format.append_vec3("position", 1, false).unwrap();
    format.append_vec3("normal", 1, false).unwrap();
    format.append_vec2("uv", 1, false).unwrap();
    format
        .append_attribute("color", ScalarType::UInt8, 4, 1, 1, true, 0)
        .unwrap();
    format
}

fn bench_accessor(c: &mut Criterion) {
    let format = vertex_format();
    let mut buffer = vec![0u8; format.size() * VERTICES];
    let positions: Vec<f32> = (0..VERTICES * 3).map(|i| i as f32).collect();
    let colors: Vec<f32> = (0..VERTICES * 4).map(|i| (i % 256) as f32 / 255.0).collect();

    let mut group = c.benchmark_group("RecordAccessor");

    group.bench_function("write_positions", |b| {
        let mut acc = RecordAccessor::new(&mut buffer, &format);
        b.iter(|| {
            acc.write_values(0, "position", black_box(positions.as_slice()), VERTICES)
                .unwrap();
        });
    });

    group.bench_function("read_positions", |b| {
        let acc = RecordAccessor::new(&mut buffer, &format);
        let mut out = vec![0.0f32; VERTICES * 3];
        b.iter(|| {
            acc.read_values(0, 0usize, out.as_mut_slice(), VERTICES).unwrap();
            black_box(&out);
        });
    });

    group.bench_function("write_normalized_colors", |b| {
        let mut acc = RecordAccessor::new(&mut buffer, &format);
        b.iter(|| {
            acc.write_values(0, "color", black_box(colors.as_slice()), VERTICES).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_accessor);
criterion_main!(benches);
