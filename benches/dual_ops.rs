//! Benchmarks for dual-mesh operations.

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Point3;
use waffle::prelude::*;

fn grid_arrays(n: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    (vertices, faces)
}

fn bench_mesh_construction(c: &mut Criterion) {
    let (vertices, faces) = grid_arrays(10);

    c.bench_function("build_grid_10x10", |b| {
        b.iter(|| build_from_triangles(&vertices, &faces).unwrap());
    });
}

fn bench_dual_construction(c: &mut Criterion) {
    let (vertices, faces) = grid_arrays(50);
    let mesh = build_from_triangles(&vertices, &faces).unwrap();

    c.bench_function("dual_grid_50x50", |b| {
        b.iter(|| dual_mesh(&mesh, &DualOptions::new()).unwrap());
    });

    c.bench_function("dual_grid_50x50_circumcenter", |b| {
        let options = DualOptions::new().with_placement(PlacementPolicy::Circumcenter);
        b.iter(|| dual_mesh(&mesh, &options).unwrap());
    });
}

fn bench_projection(c: &mut Criterion) {
    let (vertices, faces) = grid_arrays(50);
    let index = SurfaceIndex::from_arrays(&vertices, &faces).unwrap();

    c.bench_function("closest_point_grid_50x50", |b| {
        let query = Point3::new(25.3, 25.7, 3.0);
        b.iter(|| index.closest_point(&query));
    });
}

criterion_group!(
    benches,
    bench_mesh_construction,
    bench_dual_construction,
    bench_projection
);
criterion_main!(benches);
