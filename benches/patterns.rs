use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slm_sweep::pattern::{generate, HadamardMatrix, PatternDescriptor, Resolution};

fn bench_generators(c: &mut Criterion) {
    let native = Resolution::default();

    c.bench_function("half_split_1024x768", |b| {
        let d = PatternDescriptor::HalfSplit {
            index: 500,
            steps: 1000,
        };
        b.iter(|| generate(black_box(&d), native))
    });

    c.bench_function("checkerboard_1024x768", |b| {
        let d = PatternDescriptor::Checkerboard {
            squares_x: 8,
            squares_y: 8,
        };
        b.iter(|| generate(black_box(&d), native))
    });

    c.bench_function("hadamard_basis_64_1024x768", |b| {
        let d = PatternDescriptor::Hadamard {
            order: 64,
            row: 17,
            col: 42,
        };
        b.iter(|| generate(black_box(&d), native))
    });

    c.bench_function("hadamard_matrix_256", |b| {
        b.iter(|| HadamardMatrix::new(black_box(256)))
    });
}

criterion_group!(benches, bench_generators);
criterion_main!(benches);
