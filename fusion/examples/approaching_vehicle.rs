/// Approaching Vehicle Example
///
/// Simulates a car ahead closing on the ego vehicle at constant speed and
/// prints both TTC estimates per frame. Ground truth is printed alongside.
///
/// Usage:
///   cargo run --release --example approaching_vehicle [config.json]
use nalgebra::{Matrix3, Matrix4};
use std::env;
use ttc_fusion::{
    BoundingBox, Calibration, Correspondence, Frame, FusionConfig, FusionPipeline, Keypoint,
    RangePoint, Roi,
};

const FOCAL: f64 = 721.5;
const CX: f64 = 609.6;
const CY: f64 = 172.9;
/// Closing speed in m/s
const SPEED: f64 = 5.0;

fn calibration() -> Calibration {
    let intrinsic = Matrix3::new(FOCAL, 0.0, CX, 0.0, FOCAL, CY, 0.0, 0.0, 1.0);
    #[rustfmt::skip]
    let extrinsic = Matrix4::new(
        0.0, -1.0,  0.0, 0.0,
        0.0,  0.0, -1.0, 0.0,
        1.0,  0.0,  0.0, 0.0,
        0.0,  0.0,  0.0, 1.0,
    );
    Calibration::from_intrinsic_3x3(intrinsic, Matrix3::identity(), extrinsic)
}

/// Lidar returns on the rear of the lead vehicle plus a guard rail outside the lane
fn lidar_scan(range: f64) -> Vec<RangePoint> {
    let mut points: Vec<RangePoint> = (0..15)
        .map(|i| {
            let x = range + 0.02 * (i % 3) as f64;
            RangePoint::new(x, -0.7 + 0.1 * i as f64, -0.3).with_reflectivity(0.4)
        })
        .collect();
    points.extend((0..20).map(|i| RangePoint::new(3.0 + i as f64, 4.5, -0.5)));
    points
}

/// Image rectangle of a 1.8 m x 1.4 m vehicle rear at `range`
fn vehicle_roi(range: f64) -> Roi {
    let w = FOCAL * 1.8 / range;
    let h = FOCAL * 1.4 / range;
    Roi::new(CX - w / 2.0, CY - h * 0.6, w, h)
}

/// Feature offsets (lateral, vertical) on the vehicle rear in metres
const FEATURES: [(f64, f64); 12] = [
    (-0.7, -0.4),
    (-0.4, 0.2),
    (-0.1, -0.3),
    (0.2, 0.3),
    (0.5, -0.2),
    (0.7, 0.1),
    (-0.6, 0.4),
    (0.0, 0.0),
    (0.3, -0.45),
    (0.65, 0.45),
    (-0.3, -0.1),
    (0.1, 0.42),
];

/// Features on the vehicle rear, fixed in vehicle coordinates
fn features(range: f64) -> Vec<Keypoint> {
    FEATURES
        .iter()
        .map(|&(y, z)| Keypoint::new(CX - FOCAL * y / range, CY - FOCAL * z / range))
        .collect()
}

fn frame_at(range: f64, with_matches: bool) -> Frame {
    let bbox = BoundingBox::new(0, vehicle_roi(range)).with_class(2, 0.91);
    let kpts = features(range);
    let n = kpts.len();
    let frame = Frame::new(kpts, vec![bbox]);
    if !with_matches {
        return frame;
    }
    // A few weak matches so the distance filter has something to reject
    let matches = (0..n)
        .map(|i| {
            let distance = if i % 4 == 3 { 90.0 } else { 12.0 + i as f64 };
            Correspondence::new(i, i, distance)
        })
        .collect();
    frame.with_matches(matches)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => FusionConfig::from_json_file(path)?,
        None => FusionConfig {
            min_pair_distance: 20.0,
            ..Default::default()
        },
    };
    let dt = config.frame_interval();
    let pipeline = FusionPipeline::new(config, calibration())?;

    println!(
        "Lead vehicle closing at {:.1} m/s, frame interval {:.3} s\n",
        SPEED, dt
    );

    let mut range = 20.0;
    let mut prev = frame_at(range, false);
    pipeline.prepare_frame(&mut prev, &lidar_scan(range));

    for step in 1..=10 {
        range -= SPEED * dt;
        let mut curr = frame_at(range, true);
        let stats = pipeline.prepare_frame(&mut curr, &lidar_scan(range));
        let report = pipeline.process(&prev, &mut curr)?;

        for object in &report.objects {
            println!(
                "frame {:2}  range {:5.2} m  true {:5.2} s  camera {:>18}  lidar {:>18}  ({} pts)",
                step,
                range,
                range / SPEED,
                object.camera.to_string(),
                object.lidar.to_string(),
                stats.assigned
            );
        }
        prev = curr;
    }

    Ok(())
}
