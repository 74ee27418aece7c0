/// Height added to a torso joint when the head itself is not tracked, in metres.
pub const HEAD_FALLBACK_RISE: f32 = 0.25;

/// Number of joints in one sensor skeleton.
pub const JOINT_COUNT: usize = 20;

/// Position in sensor space, metres. Y points up, Z away from the sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SkeletonPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl SkeletonPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum JointType {
    HipCenter = 0,
    Spine,
    ShoulderCenter,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
}

impl JointType {
    pub const ALL: [JointType; JOINT_COUNT] = [
        JointType::HipCenter,
        JointType::Spine,
        JointType::ShoulderCenter,
        JointType::Head,
        JointType::ShoulderLeft,
        JointType::ElbowLeft,
        JointType::WristLeft,
        JointType::HandLeft,
        JointType::ShoulderRight,
        JointType::ElbowRight,
        JointType::WristRight,
        JointType::HandRight,
        JointType::HipLeft,
        JointType::KneeLeft,
        JointType::AnkleLeft,
        JointType::FootLeft,
        JointType::HipRight,
        JointType::KneeRight,
        JointType::AnkleRight,
        JointType::FootRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum JointState {
    #[default]
    NotTracked = 0,
    Inferred = 1,
    Tracked = 2,
}

impl TryFrom<u8> for JointState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NotTracked),
            1 => Ok(Self::Inferred),
            2 => Ok(Self::Tracked),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum SubjectState {
    #[default]
    NotTracked = 0,
    PositionOnly = 1,
    Tracked = 2,
}

impl TryFrom<u8> for SubjectState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NotTracked),
            1 => Ok(Self::PositionOnly),
            2 => Ok(Self::Tracked),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Joint {
    pub state: JointState,
    pub position: SkeletonPoint,
}

impl Joint {
    pub fn tracked(position: SkeletonPoint) -> Self {
        Self {
            state: JointState::Tracked,
            position,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.state != JointState::NotTracked
    }
}

/// One skeleton slot reported by the sensor for a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedSubject {
    /// Player index this subject owns in the depth frame (1-based).
    pub player_index: u8,
    pub state: SubjectState,
    pub joints: [Joint; JOINT_COUNT],
}

impl TrackedSubject {
    pub fn new(player_index: u8, state: SubjectState) -> Self {
        Self {
            player_index,
            state,
            joints: [Joint::default(); JOINT_COUNT],
        }
    }

    pub fn joint(&self, kind: JointType) -> &Joint {
        &self.joints[kind.index()]
    }

    pub fn set_joint(&mut self, kind: JointType, joint: Joint) {
        self.joints[kind.index()] = joint;
    }

    pub fn is_tracked(&self) -> bool {
        self.state == SubjectState::Tracked
    }
}

/// The first fully tracked subject, in sensor slot order.
pub fn first_tracked(subjects: &[TrackedSubject]) -> Option<&TrackedSubject> {
    subjects.iter().find(|s| s.is_tracked())
}

/// Best available head position for a subject.
///
/// Uses the head joint when it is at least inferred. Otherwise falls back to
/// the shoulder centre, then the spine, raised by [`HEAD_FALLBACK_RISE`].
pub fn estimate_head(subject: &TrackedSubject) -> Option<SkeletonPoint> {
    let head = subject.joint(JointType::Head);
    if head.is_usable() {
        return Some(head.position);
    }

    [JointType::ShoulderCenter, JointType::Spine]
        .into_iter()
        .map(|kind| subject.joint(kind))
        .find(|j| j.is_usable())
        .map(|body| SkeletonPoint {
            x: body.position.x,
            y: body.position.y + HEAD_FALLBACK_RISE,
            z: body.position.z,
        })
}
