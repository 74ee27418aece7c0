use silhouette_bridge_common::frame::Rect;
use silhouette_bridge_common::skeleton::TrackedSubject;

use crate::sensor::mapper::CoordinateMapper;

/// Padded frame-space bounding box of a subject's usable joints.
///
/// Joints that are not tracked or whose projection is not finite are
/// skipped. `None` when no joint survives or the frame has no area.
pub fn subject_bounds(
    subject: &TrackedSubject,
    mapper: &dyn CoordinateMapper,
    width: usize,
    height: usize,
    padding: usize,
) -> Option<Rect> {
    if width == 0 || height == 0 {
        return None;
    }
    let max_x = (width - 1) as f32;
    let max_y = (height - 1) as f32;

    let mut extent: Option<(f32, f32, f32, f32)> = None;
    for joint in subject.joints.iter().filter(|j| j.is_usable()) {
        let (px, py) = mapper.skeleton_to_depth(joint.position);
        if !px.is_finite() || !py.is_finite() {
            continue;
        }
        let (px, py) = (px.clamp(0.0, max_x), py.clamp(0.0, max_y));
        extent = Some(match extent {
            None => (px, py, px, py),
            Some((x0, y0, x1, y1)) => (x0.min(px), y0.min(py), x1.max(px), y1.max(py)),
        });
    }

    let (x0, y0, x1, y1) = extent?;
    let left = (x0 as usize).saturating_sub(padding);
    let top = (y0 as usize).saturating_sub(padding);
    let right = (x1 as usize + padding + 1).min(width);
    let bottom = (y1 as usize + padding + 1).min(height);
    Some(Rect {
        left,
        top,
        right,
        bottom,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use silhouette_bridge_common::skeleton::{
        Joint, JointState, JointType, SkeletonPoint, SubjectState,
    };

    /// Treats skeleton x/y as pixel coordinates directly.
    struct IdentityMapper;

    impl CoordinateMapper for IdentityMapper {
        fn skeleton_to_depth(&self, p: SkeletonPoint) -> (f32, f32) {
            (p.x, p.y)
        }
    }

    fn subject(joints: &[(JointType, f32, f32)]) -> TrackedSubject {
        let mut s = TrackedSubject::new(1, SubjectState::Tracked);
        for &(kind, x, y) in joints {
            s.set_joint(kind, Joint::tracked(SkeletonPoint::new(x, y, 2.0)));
        }
        s
    }

    #[test]
    fn extent_is_padded_and_clamped() {
        let s = subject(&[(JointType::Head, 50.0, 10.0), (JointType::FootLeft, 70.0, 90.0)]);
        let r = subject_bounds(&s, &IdentityMapper, 100, 100, 20).unwrap();
        assert_eq!(
            r,
            Rect {
                left: 30,
                top: 0,
                right: 91,
                bottom: 100
            }
        );
    }

    #[test]
    fn nan_projection_is_skipped() {
        let s = subject(&[(JointType::Head, f32::NAN, 10.0), (JointType::Spine, 40.0, 40.0)]);
        let r = subject_bounds(&s, &IdentityMapper, 100, 100, 0).unwrap();
        assert_eq!(
            r,
            Rect {
                left: 40,
                top: 40,
                right: 41,
                bottom: 41
            }
        );
    }

    #[test]
    fn untracked_joints_are_ignored() {
        let mut s = subject(&[(JointType::Head, 10.0, 10.0)]);
        s.set_joint(
            JointType::HandRight,
            Joint {
                state: JointState::NotTracked,
                position: SkeletonPoint::new(90.0, 90.0, 2.0),
            },
        );
        let r = subject_bounds(&s, &IdentityMapper, 100, 100, 5).unwrap();
        assert_eq!(r.right, 16);
    }

    #[test]
    fn no_usable_geometry() {
        let s = subject(&[(JointType::Head, f32::NAN, f32::NAN)]);
        assert!(subject_bounds(&s, &IdentityMapper, 100, 100, 20).is_none());
        let s = TrackedSubject::new(1, SubjectState::Tracked);
        assert!(subject_bounds(&s, &IdentityMapper, 100, 100, 20).is_none());
        let s = subject(&[(JointType::Head, 1.0, 1.0)]);
        assert!(subject_bounds(&s, &IdentityMapper, 0, 100, 20).is_none());
    }
}
