use chrono::Utc;
use silhouette_bridge_common::capture::CaptureRecord;
use silhouette_bridge_common::frame::{DepthFrame, DepthPixel};
use silhouette_bridge_common::skeleton::{Joint, JointType, SkeletonPoint, SubjectState, TrackedSubject};

use super::mapper::{CoordinateMapper, PinholeMapper};
use super::{Sensor, SensorError};

/// Ticks per scene cycle; the subject is absent for the last `ABSENT_TICKS`.
const CYCLE_TICKS: u64 = 300;
const ABSENT_TICKS: u64 = 60;
const SUBJECT_DISTANCE_M: f32 = 2.2;
const BACKGROUND_MM: u16 = 3500;
const HEAD_RADIUS_M: f32 = 0.11;
const LIMB_RADIUS_M: f32 = 0.05;
const TORSO_RADIUS_M: f32 = 0.16;
const PLAYER_INDEX: u8 = 1;

/// Renders a single swaying figure into a depth frame with a matching
/// skeleton, so the bridge can run without hardware.
pub struct SyntheticSensor {
    width: usize,
    height: usize,
    mapper: PinholeMapper,
    tick: u64,
}

/// Bones drawn as capsules between two joints.
const BONES: [(JointType, JointType); 15] = [
    (JointType::ShoulderCenter, JointType::Head),
    (JointType::ShoulderLeft, JointType::ElbowLeft),
    (JointType::ElbowLeft, JointType::WristLeft),
    (JointType::WristLeft, JointType::HandLeft),
    (JointType::ShoulderRight, JointType::ElbowRight),
    (JointType::ElbowRight, JointType::WristRight),
    (JointType::WristRight, JointType::HandRight),
    (JointType::HipLeft, JointType::KneeLeft),
    (JointType::KneeLeft, JointType::AnkleLeft),
    (JointType::AnkleLeft, JointType::FootLeft),
    (JointType::HipRight, JointType::KneeRight),
    (JointType::KneeRight, JointType::AnkleRight),
    (JointType::AnkleRight, JointType::FootRight),
    (JointType::ShoulderLeft, JointType::ShoulderRight),
    (JointType::HipLeft, JointType::HipRight),
];

impl SyntheticSensor {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            mapper: PinholeMapper::for_frame(width, height),
            tick: 0,
        }
    }

    fn subject_present(tick: u64) -> bool {
        tick % CYCLE_TICKS < CYCLE_TICKS - ABSENT_TICKS
    }

    fn pose(tick: u64) -> TrackedSubject {
        let t = tick as f32 * 0.05;
        let cx = 0.4 * t.sin();
        let z = SUBJECT_DISTANCE_M;
        let wave = 0.25 * (t * 3.0).sin();

        let at = |dx: f32, y: f32| Joint::tracked(SkeletonPoint::new(cx + dx, y, z));
        let mut s = TrackedSubject::new(PLAYER_INDEX, SubjectState::Tracked);
        let joints = [
            (JointType::HipCenter, at(0.0, 0.0)),
            (JointType::Spine, at(0.0, 0.15)),
            (JointType::ShoulderCenter, at(0.0, 0.45)),
            (JointType::Head, at(0.0, 0.65)),
            (JointType::ShoulderLeft, at(-0.18, 0.42)),
            (JointType::ElbowLeft, at(-0.30, 0.20)),
            (JointType::WristLeft, at(-0.34, 0.0)),
            (JointType::HandLeft, at(-0.35, -0.06)),
            (JointType::ShoulderRight, at(0.18, 0.42)),
            (JointType::ElbowRight, at(0.34, 0.45)),
            (JointType::WristRight, at(0.45, 0.60 + wave)),
            (JointType::HandRight, at(0.48, 0.66 + wave)),
            (JointType::HipLeft, at(-0.10, -0.05)),
            (JointType::KneeLeft, at(-0.12, -0.45)),
            (JointType::AnkleLeft, at(-0.12, -0.82)),
            (JointType::FootLeft, at(-0.16, -0.88)),
            (JointType::HipRight, at(0.10, -0.05)),
            (JointType::KneeRight, at(0.12, -0.45)),
            (JointType::AnkleRight, at(0.12, -0.82)),
            (JointType::FootRight, at(0.16, -0.88)),
        ];
        for (kind, joint) in joints {
            s.set_joint(kind, joint);
        }
        s
    }

    fn render(&self, subject: Option<&TrackedSubject>) -> DepthFrame {
        let mut frame = DepthFrame::new(
            self.width,
            self.height,
            vec![DepthPixel::new(BACKGROUND_MM, 0); self.width * self.height],
        )
        .unwrap_or_else(|_| DepthFrame::empty(self.width, self.height));

        let Some(subject) = subject else {
            return frame;
        };

        let project = |kind: JointType| {
            let j = subject.joint(kind);
            let (x, y) = self.mapper.skeleton_to_depth(j.position);
            (x, y, j.position.z)
        };
        let px_per_m = |z: f32| self.mapper.focal() / z;

        let (hx, hy, hz) = project(JointType::Head);
        self.fill_capsule(&mut frame, (hx, hy), (hx, hy), HEAD_RADIUS_M * px_per_m(hz), hz);

        let (sx, sy, sz) = project(JointType::ShoulderCenter);
        let (bx, by, _) = project(JointType::HipCenter);
        self.fill_capsule(&mut frame, (sx, sy), (bx, by), TORSO_RADIUS_M * px_per_m(sz), sz);

        for (a, b) in BONES {
            let (ax, ay, az) = project(a);
            let (bx, by, _) = project(b);
            self.fill_capsule(&mut frame, (ax, ay), (bx, by), LIMB_RADIUS_M * px_per_m(az), az);
        }
        frame
    }

    /// Mark every pixel within `radius` of segment `a`-`b` as the player.
    fn fill_capsule(&self, frame: &mut DepthFrame, a: (f32, f32), b: (f32, f32), radius: f32, z: f32) {
        if !(a.0.is_finite() && a.1.is_finite() && b.0.is_finite() && b.1.is_finite()) {
            return;
        }
        let depth = (z * 1000.0).round().clamp(0.0, 8191.0) as u16;
        let min_x = (a.0.min(b.0) - radius).floor().max(0.0) as usize;
        let min_y = (a.1.min(b.1) - radius).floor().max(0.0) as usize;
        let max_x = ((a.0.max(b.0) + radius).ceil().max(0.0) as usize).min(self.width.saturating_sub(1));
        let max_y = ((a.1.max(b.1) + radius).ceil().max(0.0) as usize).min(self.height.saturating_sub(1));

        let (abx, aby) = (b.0 - a.0, b.1 - a.1);
        let len2 = abx * abx + aby * aby;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let (px, py) = (x as f32 - a.0, y as f32 - a.1);
                let t = if len2 > 0.0 {
                    ((px * abx + py * aby) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (dx, dy) = (px - t * abx, py - t * aby);
                if dx * dx + dy * dy <= radius * radius {
                    frame.set(x, y, DepthPixel::new(depth, PLAYER_INDEX));
                }
            }
        }
    }
}

impl Sensor for SyntheticSensor {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn next_record(&mut self) -> Result<Option<CaptureRecord>, SensorError> {
        let tick = self.tick;
        self.tick += 1;

        let subject = Self::subject_present(tick).then(|| Self::pose(tick));
        let frame = self.render(subject.as_ref());
        let subjects = match subject {
            Some(s) => vec![s],
            None => Vec::new(),
        };
        Ok(Some(CaptureRecord {
            captured_at_ms: Utc::now().timestamp_millis(),
            seq: tick,
            subjects,
            frame: Some(frame),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn figure_is_drawn_with_its_skeleton() {
        let mut sensor = SyntheticSensor::new(640, 480);
        let record = sensor.next_record().unwrap().unwrap();
        assert_eq!(record.subjects.len(), 1);
        let frame = record.frame.unwrap();
        let owned = frame.pixels().iter().filter(|p| p.player_index == PLAYER_INDEX).count();
        assert!(owned > 1000, "only {owned} player pixels");
        assert!(owned < 640 * 480 / 2);

        let head = record.subjects[0].joint(JointType::Head).position;
        let (hx, hy) = PinholeMapper::for_frame(640, 480).skeleton_to_depth(head);
        assert_eq!(frame.player_index_at(hx as usize, hy as usize), Some(PLAYER_INDEX));
        assert_eq!(frame.depth_at(hx as usize, hy as usize), Some(2200));
    }

    #[test]
    fn subject_leaves_once_per_cycle() {
        let mut sensor = SyntheticSensor::new(64, 48);
        let present: Vec<bool> = (0..CYCLE_TICKS)
            .map(|_| !sensor.next_record().unwrap().unwrap().subjects.is_empty())
            .collect();
        let absent = present.iter().filter(|p| !**p).count() as u64;
        assert_eq!(absent, ABSENT_TICKS);
        assert!(present[0]);
        assert!(!present[(CYCLE_TICKS - 1) as usize]);
    }

    #[test]
    fn empty_scene_has_no_player_pixels() {
        let sensor = SyntheticSensor::new(32, 24);
        let frame = sensor.render(None);
        assert!(frame.pixels().iter().all(|p| p.player_index == 0 && p.depth == BACKGROUND_MM));
    }

    #[test]
    fn sequence_numbers_increase() {
        let mut sensor = SyntheticSensor::new(16, 12);
        let a = sensor.next_record().unwrap().unwrap().seq;
        let b = sensor.next_record().unwrap().unwrap().seq;
        assert_eq!((a, b), (0, 1));
    }
}
