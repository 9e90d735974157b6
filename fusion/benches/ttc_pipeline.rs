use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nalgebra::{Matrix3, Matrix4};
use rand::Rng;
use std::hint::black_box;
use ttc_fusion::{
    camera_ttc, cluster_points_with_rois, BoundingBox, Calibration, Correspondence, Frame,
    FusionConfig, FusionPipeline, Keypoint, RangePoint, Roi,
};

fn calibration() -> Calibration {
    let intrinsic = Matrix3::new(700.0, 0.0, 600.0, 0.0, 700.0, 180.0, 0.0, 0.0, 1.0);
    #[rustfmt::skip]
    let extrinsic = Matrix4::new(
        0.0, -1.0,  0.0, 0.0,
        0.0,  0.0, -1.0, 0.0,
        1.0,  0.0,  0.0, 0.0,
        0.0,  0.0,  0.0, 1.0,
    );
    Calibration::from_intrinsic_3x3(intrinsic, Matrix3::identity(), extrinsic)
}

/// Scattered lidar returns in front of the sensor
fn generate_points(count: usize) -> Vec<RangePoint> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            RangePoint::new(
                rng.gen_range(4.0..40.0),
                rng.gen_range(-8.0..8.0),
                rng.gen_range(-1.5..1.0),
            )
        })
        .collect()
}

fn generate_boxes(count: usize) -> Vec<BoundingBox> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let w = rng.gen_range(40.0..300.0);
            let h = rng.gen_range(30.0..200.0);
            let x = rng.gen_range(0.0..(1200.0 - w));
            let y = rng.gen_range(0.0..(370.0 - h));
            BoundingBox::new(i as u32, Roi::new(x, y, w, h))
        })
        .collect()
}

/// Keypoints inside one region with a uniform scale change between frames
fn generate_matches(
    count: usize,
    scale: f64,
) -> (Vec<Keypoint>, Vec<Keypoint>, Vec<Correspondence>) {
    let mut rng = rand::thread_rng();
    let (cx, cy) = (600.0, 180.0);
    let mut prev = Vec::with_capacity(count);
    let mut curr = Vec::with_capacity(count);
    let mut matches = Vec::with_capacity(count);
    for i in 0..count {
        let dx: f64 = rng.gen_range(-150.0..150.0);
        let dy: f64 = rng.gen_range(-100.0..100.0);
        prev.push(Keypoint::new(cx + dx, cy + dy));
        curr.push(Keypoint::new(cx + dx * scale, cy + dy * scale));
        matches.push(Correspondence::new(i, i, rng.gen_range(5.0..80.0)));
    }
    (prev, curr, matches)
}

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("lidar_projection");
    let calib = calibration();
    let boxes = generate_boxes(12);

    for &count in [1_000usize, 10_000, 100_000].iter() {
        let points = generate_points(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &points, |b, points| {
            b.iter_batched(
                || boxes.clone(),
                |mut boxes| cluster_points_with_rois(&mut boxes, black_box(points), 0.1, &calib),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_camera_ttc(c: &mut Criterion) {
    let mut group = c.benchmark_group("camera_ttc");

    for &count in [50usize, 200, 800].iter() {
        let (prev, curr, matches) = generate_matches(count, 1.05);
        group.bench_with_input(BenchmarkId::from_parameter(count), &matches, |b, matches| {
            b.iter(|| camera_ttc(&prev, &curr, black_box(matches), 10.0, 100.0))
        });
    }

    group.finish();
}

fn bench_frame_pair(c: &mut Criterion) {
    let pipeline = FusionPipeline::new(FusionConfig::default(), calibration()).unwrap();
    let (prev_kpts, curr_kpts, matches) = generate_matches(500, 1.05);
    let boxes = generate_boxes(12);
    let points = generate_points(20_000);

    let mut prev = Frame::new(prev_kpts, boxes.clone());
    pipeline.prepare_frame(&mut prev, &points);

    let mut curr = Frame::new(curr_kpts, boxes).with_matches(matches);
    pipeline.prepare_frame(&mut curr, &points);

    c.bench_function("process_frame_pair_12_boxes_500_matches", |b| {
        b.iter_batched(
            || curr.clone(),
            |mut curr| pipeline.process(black_box(&prev), &mut curr).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_projection,
    bench_camera_ttc,
    bench_frame_pair
);
criterion_main!(benches);
