//! Lidar-to-image projection from camera calibration matrices

use crate::error::{FusionError, Result};
use crate::types::RangePoint;
use nalgebra::{Matrix3, Matrix3x4, Matrix4, Vector4};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Intrinsic, rectification and extrinsic transforms, plus their product
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    /// Camera projection (3x4; a 3x3 intrinsic gets a zero fourth column)
    pub intrinsic: Matrix3x4<f64>,
    /// Rectifying rotation (3x3)
    pub rectification: Matrix3<f64>,
    /// Sensor-to-camera rigid transform (4x4)
    pub extrinsic: Matrix4<f64>,
    projection: Matrix3x4<f64>,
}

/// Outcome of projecting one range point into the image
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Pixel(f64, f64),
    /// Homogeneous depth component not strictly positive
    Behind,
    /// Non-finite input or output coordinates
    NonFinite,
}

/// Row-major matrices as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationFile {
    pub intrinsic: Vec<f64>,
    pub rectification: Vec<f64>,
    pub extrinsic: Vec<f64>,
}

impl Calibration {
    pub fn new(
        intrinsic: Matrix3x4<f64>,
        rectification: Matrix3<f64>,
        extrinsic: Matrix4<f64>,
    ) -> Self {
        let mut rect4 = Matrix4::identity();
        rect4.fixed_view_mut::<3, 3>(0, 0).copy_from(&rectification);
        let projection = intrinsic * rect4 * extrinsic;

        Self {
            intrinsic,
            rectification,
            extrinsic,
            projection,
        }
    }

    pub fn from_intrinsic_3x3(
        intrinsic: Matrix3<f64>,
        rectification: Matrix3<f64>,
        extrinsic: Matrix4<f64>,
    ) -> Self {
        let mut padded = Matrix3x4::zeros();
        padded.fixed_view_mut::<3, 3>(0, 0).copy_from(&intrinsic);
        Self::new(padded, rectification, extrinsic)
    }

    /// Build from row-major slices; the intrinsic may hold 9 or 12 values
    pub fn from_row_slices(
        intrinsic: &[f64],
        rectification: &[f64],
        extrinsic: &[f64],
    ) -> Result<Self> {
        if rectification.len() != 9 {
            return Err(FusionError::calibration(format!(
                "rectification needs 9 values, got {}",
                rectification.len()
            )));
        }
        if extrinsic.len() != 16 {
            return Err(FusionError::calibration(format!(
                "extrinsic needs 16 values, got {}",
                extrinsic.len()
            )));
        }
        if intrinsic
            .iter()
            .chain(rectification)
            .chain(extrinsic)
            .any(|v| !v.is_finite())
        {
            return Err(FusionError::calibration("matrices contain non-finite values"));
        }

        let rect = Matrix3::from_row_slice(rectification);
        let rt = Matrix4::from_row_slice(extrinsic);

        match intrinsic.len() {
            12 => Ok(Self::new(Matrix3x4::from_row_slice(intrinsic), rect, rt)),
            9 => Ok(Self::from_intrinsic_3x3(Matrix3::from_row_slice(intrinsic), rect, rt)),
            n => Err(FusionError::calibration(format!(
                "intrinsic needs 9 or 12 values, got {}",
                n
            ))),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CalibrationFile = serde_json::from_str(json)?;
        Self::from_row_slices(&file.intrinsic, &file.rectification, &file.extrinsic)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let calibration = Self::from_json_str(&json)?;
        log::info!("Loaded calibration from {}", path.as_ref().display());
        Ok(calibration)
    }

    /// Composed intrinsic * rectification * extrinsic (3x4)
    pub fn projection(&self) -> &Matrix3x4<f64> {
        &self.projection
    }

    /// Project a sensor-frame point to pixel coordinates.
    ///
    /// Returns `None` for points on or behind the image plane, and for
    /// points whose coordinates do not yield a finite pixel.
    pub fn project(&self, point: &RangePoint) -> Option<(f64, f64)> {
        match self.project_point(point) {
            Projection::Pixel(u, v) => Some((u, v)),
            Projection::Behind | Projection::NonFinite => None,
        }
    }

    /// Like `project`, but tells apart why a point has no pixel
    pub fn project_point(&self, point: &RangePoint) -> Projection {
        let y = self.projection * Vector4::new(point.x, point.y, point.z, 1.0);
        let w = y[2];
        if !w.is_finite() {
            return Projection::NonFinite;
        }
        if w <= 0.0 {
            return Projection::Behind;
        }
        let (u, v) = (y[0] / w, y[1] / w);
        if u.is_finite() && v.is_finite() {
            Projection::Pixel(u, v)
        } else {
            Projection::NonFinite
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Pinhole camera looking along lidar +x: camera x = -lidar y, camera y = -lidar z
    pub(crate) fn forward_camera(focal: f64, cx: f64, cy: f64) -> Calibration {
        let intrinsic = Matrix3::new(focal, 0.0, cx, 0.0, focal, cy, 0.0, 0.0, 1.0);
        #[rustfmt::skip]
        let extrinsic = Matrix4::new(
            0.0, -1.0,  0.0, 0.0,
            0.0,  0.0, -1.0, 0.0,
            1.0,  0.0,  0.0, 0.0,
            0.0,  0.0,  0.0, 1.0,
        );
        Calibration::from_intrinsic_3x3(intrinsic, Matrix3::identity(), extrinsic)
    }

    #[test]
    fn test_project_divides_by_depth() {
        let calib = forward_camera(500.0, 320.0, 240.0);

        let (u, v) = calib.project(&RangePoint::new(10.0, 0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(u, 320.0, epsilon = 1e-9);
        assert_abs_diff_eq!(v, 240.0, epsilon = 1e-9);

        // 1 m left and 0.5 m up at 10 m range
        let (u, v) = calib.project(&RangePoint::new(10.0, 1.0, 0.5)).unwrap();
        assert_abs_diff_eq!(u, 320.0 - 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(v, 240.0 - 25.0, epsilon = 1e-9);

        // Same direction twice as far projects to the same pixel
        let (u2, v2) = calib.project(&RangePoint::new(20.0, 2.0, 1.0)).unwrap();
        assert_abs_diff_eq!(u2, u, epsilon = 1e-9);
        assert_abs_diff_eq!(v2, v, epsilon = 1e-9);
    }

    #[test]
    fn test_points_behind_camera_are_rejected() {
        let calib = forward_camera(500.0, 320.0, 240.0);
        assert!(calib.project(&RangePoint::new(-5.0, 0.0, 0.0)).is_none());
        assert!(calib.project(&RangePoint::new(0.0, 1.0, 0.0)).is_none());
        assert_eq!(
            calib.project_point(&RangePoint::new(-5.0, 0.0, 0.0)),
            Projection::Behind
        );
    }

    #[test]
    fn test_non_finite_points_are_not_behind() {
        let calib = forward_camera(500.0, 320.0, 240.0);
        for point in [
            RangePoint::new(f64::NAN, 0.0, 0.0),
            RangePoint::new(10.0, f64::INFINITY, 0.0),
            RangePoint::new(10.0, 0.0, f64::NEG_INFINITY),
        ] {
            assert_eq!(calib.project_point(&point), Projection::NonFinite);
            assert!(calib.project(&point).is_none());
        }
        assert_eq!(
            calib.project_point(&RangePoint::new(10.0, 0.0, 0.0)),
            Projection::Pixel(320.0, 240.0)
        );
    }

    #[test]
    fn test_rectification_is_applied() {
        #[rustfmt::skip]
        let intrinsic = Matrix3x4::new(
            100.0,   0.0, 50.0, 0.0,
              0.0, 100.0, 50.0, 0.0,
              0.0,   0.0,  1.0, 0.0,
        );
        // Swap camera x and y
        let rect = Matrix3::new(0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let calib = Calibration::new(intrinsic, rect, Matrix4::identity());

        let (u, v) = calib.project(&RangePoint::new(1.0, 2.0, 10.0)).unwrap();
        assert_abs_diff_eq!(u, 50.0 + 100.0 * 2.0 / 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(v, 50.0 + 100.0 * 1.0 / 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_from_row_slices() {
        let k3 = [500.0, 0.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0];
        let r = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let mut rt = [0.0; 16];
        for i in 0..4 {
            rt[i * 5] = 1.0;
        }

        let calib = Calibration::from_row_slices(&k3, &r, &rt).unwrap();
        assert_eq!(calib.intrinsic[(0, 3)], 0.0);
        assert_eq!(calib.intrinsic[(1, 2)], 240.0);

        assert!(Calibration::from_row_slices(&k3[..8], &r, &rt).is_err());
        assert!(Calibration::from_row_slices(&k3, &r[..4], &rt).is_err());
        assert!(Calibration::from_row_slices(&k3, &r, &rt[..12]).is_err());

        let mut nan = k3;
        nan[0] = f64::NAN;
        assert!(matches!(
            Calibration::from_row_slices(&nan, &r, &rt),
            Err(FusionError::InvalidCalibration(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "intrinsic": [700.0, 0.0, 600.0, 0.0, 0.0, 700.0, 170.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            "rectification": [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            "extrinsic": [
                0.0, -1.0, 0.0, 0.0,
                0.0, 0.0, -1.0, 0.0,
                1.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0
            ]
        }"#;
        let calib = Calibration::from_json_str(json).unwrap();
        let (u, v) = calib.project(&RangePoint::new(7.0, 0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(u, 600.0, epsilon = 1e-9);
        assert_abs_diff_eq!(v, 170.0, epsilon = 1e-9);
    }
}
