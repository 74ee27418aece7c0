use silhouette_bridge_common::skeleton::SkeletonPoint;

/// Nominal depth camera focal length in pixels at 640x480.
pub const NOMINAL_FOCAL_PX_640: f32 = 571.26;

/// Projects sensor-space positions into depth-frame pixel coordinates.
///
/// Implementations may return non-finite coordinates for positions that do
/// not project (behind the sensor, NaN input); callers skip those.
pub trait CoordinateMapper: Send + Sync {
    fn skeleton_to_depth(&self, point: SkeletonPoint) -> (f32, f32);
}

/// Pinhole projection with the principal point at the frame centre.
#[derive(Debug, Clone, Copy)]
pub struct PinholeMapper {
    width: f32,
    height: f32,
    focal: f32,
}

impl PinholeMapper {
    /// Focal length scales with the frame width from the 640-pixel nominal.
    pub fn for_frame(width: usize, height: usize) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            focal: NOMINAL_FOCAL_PX_640 * width as f32 / 640.0,
        }
    }

    pub fn focal(&self) -> f32 {
        self.focal
    }
}

impl CoordinateMapper for PinholeMapper {
    fn skeleton_to_depth(&self, p: SkeletonPoint) -> (f32, f32) {
        if !(p.z > 0.0) {
            return (f32::NAN, f32::NAN);
        }
        (
            self.width / 2.0 + p.x * self.focal / p.z,
            self.height / 2.0 - p.y * self.focal / p.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optical_axis_hits_frame_centre() {
        let m = PinholeMapper::for_frame(640, 480);
        assert_eq!(m.skeleton_to_depth(SkeletonPoint::new(0.0, 0.0, 2.0)), (320.0, 240.0));
    }

    #[test]
    fn up_in_space_is_up_in_frame() {
        let m = PinholeMapper::for_frame(640, 480);
        let (x, y) = m.skeleton_to_depth(SkeletonPoint::new(0.5, 0.5, 2.0));
        assert!(x > 320.0);
        assert!(y < 240.0);
    }

    #[test]
    fn behind_sensor_is_not_finite() {
        let m = PinholeMapper::for_frame(640, 480);
        let (x, y) = m.skeleton_to_depth(SkeletonPoint::new(0.1, 0.1, 0.0));
        assert!(x.is_nan() && y.is_nan());
        let (x, _) = m.skeleton_to_depth(SkeletonPoint::new(0.1, 0.1, f32::NAN));
        assert!(x.is_nan());
    }

    #[test]
    fn focal_scales_with_frame_width() {
        let m = PinholeMapper::for_frame(320, 240);
        assert!((m.focal() - 285.63).abs() < 1e-3);
        // 1 m right at 1 m depth
        let (x, y) = m.skeleton_to_depth(SkeletonPoint::new(1.0, 0.0, 1.0));
        assert!((x - (160.0 + 285.63)).abs() < 1e-2);
        assert_eq!(y, 120.0);
    }
}
