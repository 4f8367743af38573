//! Benchmarks for pose generation and software rendering

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use viewcrate_core::{CameraIntrinsics, Point3f, TriangleMesh, CAMERA_FRAME};
use viewcrate_render::{
    GridRange, PlanarGrid, PlanarWorksurfaceDiscretizer, RenderMode, RenderOptions,
    SoftwareRasterizer, SphericalGrid, ViewsphereDiscretizer, VirtualCamera,
};

fn generate_sphere_grid(samples: usize) -> SphericalGrid {
    SphericalGrid::new(
        GridRange::new(0.5, 0.8, 2),
        GridRange::new(0.1, std::f64::consts::FRAC_PI_2, samples),
    )
    .with_azimuth(GridRange::full_turn(samples))
    .with_roll(GridRange::full_turn(4))
}

/// Wavy height field mesh centered on the origin
fn generate_grid_mesh(size: usize) -> TriangleMesh {
    let mut vertices = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let fx = x as f32 / (size - 1) as f32;
            let fy = y as f32 / (size - 1) as f32;
            let z = (fx * std::f32::consts::PI).sin() * (fy * std::f32::consts::PI).sin() * 0.05;
            vertices.push(Point3f::new(fx * 0.2 - 0.1, fy * 0.2 - 0.1, z));
        }
    }
    let mut faces = Vec::with_capacity((size - 1) * (size - 1) * 2);
    for y in 0..(size - 1) {
        for x in 0..(size - 1) {
            let tl = y * size + x;
            let tr = tl + 1;
            let bl = (y + 1) * size + x;
            let br = bl + 1;
            faces.push([tl, bl, tr]);
            faces.push([tr, bl, br]);
        }
    }
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

fn bench_discretizers(c: &mut Criterion) {
    let mut group = c.benchmark_group("discretizer");
    let intrinsics =
        CameraIntrinsics::new(CAMERA_FRAME, 525.0, 525.0, 319.5, 239.5, 640, 480).unwrap();

    for &samples in &[4, 8, 16] {
        let viewsphere = ViewsphereDiscretizer::new(generate_sphere_grid(samples)).unwrap();
        group.bench_with_input(
            BenchmarkId::new("viewsphere", samples),
            &viewsphere,
            |b, discretizer| {
                b.iter(|| black_box(discretizer.object_to_camera_poses()));
            },
        );

        let planar = PlanarWorksurfaceDiscretizer::new(
            PlanarGrid::new(generate_sphere_grid(samples))
                .with_x(GridRange::new(-0.1, 0.1, 3))
                .with_y(GridRange::new(-0.1, 0.1, 3)),
        )
        .unwrap();
        group.bench_with_input(
            BenchmarkId::new("planar_worksurface", samples),
            &planar,
            |b, discretizer| {
                b.iter(|| black_box(discretizer.object_to_camera_poses(&intrinsics).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_software_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("software_render");
    let intrinsics = CameraIntrinsics::new(
        CAMERA_FRAME,
        150.0,
        150.0,
        79.5,
        59.5,
        160,
        120,
    )
    .unwrap();
    let camera = VirtualCamera::new(intrinsics, SoftwareRasterizer::new()).unwrap();
    let viewsphere = ViewsphereDiscretizer::new(generate_sphere_grid(4)).unwrap();
    let options = RenderOptions::default();

    for &size in &[10, 40] {
        let mesh = generate_grid_mesh(size);
        for mode in [RenderMode::Segmask, RenderMode::Rgbd] {
            group.bench_with_input(
                BenchmarkId::new(mode.name(), format!("{}f", mesh.face_count())),
                &mesh,
                |b, mesh| {
                    b.iter(|| {
                        let records = camera
                            .wrapped_images_viewsphere(
                                black_box(mesh),
                                &viewsphere,
                                mode,
                                None,
                                &options,
                            )
                            .unwrap();
                        black_box(records);
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_discretizers, bench_software_render);
criterion_main!(benches);
