//! Benchmarks for atlas generation.

use criterion::{criterion_group, criterion_main, Criterion};
use mesh_atlas::algo::charts::build_charts;
use mesh_atlas::algo::Progress;
use mesh_atlas::mesh::build_mesh;
use mesh_atlas::prelude::*;

/// An `n` x `n` grid folded into waves so that charting has work to do.
fn create_wavy_grid(n: usize) -> (Vec<[f32; 3]>, Vec<u32>) {
    let mut positions = Vec::with_capacity((n + 1) * (n + 1));
    let mut indices = Vec::with_capacity(n * n * 6);

    for j in 0..=n {
        for i in 0..=n {
            let z = (i as f32 * 0.4).sin() * (j as f32 * 0.3).cos();
            positions.push([i as f32, j as f32, z]);
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = (j * (n + 1) + i) as u32;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1) as u32;
            let v11 = v01 + 1;

            indices.extend_from_slice(&[v00, v10, v11, v00, v11, v01]);
        }
    }

    (positions, indices)
}

fn bench_mesh_construction(c: &mut Criterion) {
    let (positions, indices) = create_wavy_grid(50);
    let input = InputMesh::from_positions(&positions, IndexData::U32(&indices));

    c.bench_function("build_mesh_50x50", |b| {
        b.iter(|| build_mesh(&input, true, &mut |_| {}).unwrap());
    });
}

fn bench_charts(c: &mut Criterion) {
    let (positions, indices) = create_wavy_grid(50);
    let input = InputMesh::from_positions(&positions, IndexData::U32(&indices));
    let mesh = build_mesh(&input, true, &mut |_| {}).unwrap();

    c.bench_function("build_charts_50x50", |b| {
        b.iter(|| build_charts(&mesh, &CharterOptions::default(), &Progress::none()));
    });

    c.bench_function("build_charts_50x50_sequential", |b| {
        let options = CharterOptions::default().sequential();
        b.iter(|| build_charts(&mesh, &options, &Progress::none()));
    });
}

fn bench_generate(c: &mut Criterion) {
    let (positions, indices) = create_wavy_grid(30);
    let input = InputMesh::from_positions(&positions, IndexData::U32(&indices));

    let mut group = c.benchmark_group("generate_30x30");
    group.sample_size(10);

    for (name, method) in [
        ("texel_area", PackMethod::TexelArea),
        ("approximate", PackMethod::ApproximateResolution),
        ("exact", PackMethod::ExactResolution),
    ] {
        let packer = PackerOptions::default()
            .with_method(method)
            .with_resolution(256)
            .with_padding(1)
            .with_quality(4);
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut atlas = Atlas::new();
                atlas.add_mesh(&input).unwrap();
                atlas.generate(&CharterOptions::default(), &packer).unwrap();
                atlas.num_charts()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_mesh_construction, bench_charts, bench_generate);
criterion_main!(benches);
