use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fringe_calib::{CameraIntrinsics, PolynomialDistortion, ProjectionPair};
use fringe_grid::{Field2, GridSize};
use fringe_recon::inverse3::{invert3, invert3_batch};
use fringe_recon::triangulation::{triangulate_dense, TriangulationParams};

fn bench_invert3(c: &mut Criterion) {
    let mut group = c.benchmark_group("invert3");

    let systems: Vec<[f64; 9]> = (0..640 * 480)
        .map(|i| {
            let t = (i % 97) as f64 * 0.01;
            [
                5.0 + t,
                0.1,
                0.2,
                0.3,
                4.0 - t,
                0.1,
                0.2,
                0.3,
                6.0 + t,
            ]
        })
        .collect();

    group.bench_function("scalar", |b| {
        b.iter(|| {
            for a in systems.iter() {
                black_box(invert3(a));
            }
        })
    });

    group.bench_function("batch", |b| {
        let mut dst = vec![[0.0; 9]; systems.len()];
        b.iter(|| {
            invert3_batch(black_box(&systems), &mut dst);
            black_box(());
        })
    });

    group.finish();
}

fn bench_triangulate_dense(c: &mut Criterion) {
    let size = GridSize {
        width: 640,
        height: 480,
    };
    let phase = Field2::new(
        size,
        (0..size.width * size.height)
            .map(|i| 1.5 + (i % size.width) as f64 * 0.05)
            .collect(),
    )
    .unwrap();

    let camera = CameraIntrinsics {
        fx: 1000.0,
        fy: 1000.0,
        cx: 320.0,
        cy: 240.0,
    };
    let distortion = PolynomialDistortion {
        k1: -0.1,
        k2: 0.02,
        ..Default::default()
    };
    let projections = ProjectionPair {
        camera: [
            [1000.0, 0.0, 320.0, 0.0],
            [0.0, 1000.0, 240.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
        projector: [
            [900.0, 0.0, 456.0, 180000.0],
            [0.0, 900.0, 380.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };
    let params = TriangulationParams {
        phase_offset: 1.5,
        pitch: 18.0,
    };

    c.bench_function("triangulate_dense_640x480", |b| {
        b.iter(|| {
            let result = triangulate_dense(
                black_box(&phase),
                &camera,
                &distortion,
                &projections,
                &params,
            );
            black_box(result);
        })
    });
}

criterion_group!(benches, bench_invert3, bench_triangulate_dense);
criterion_main!(benches);
