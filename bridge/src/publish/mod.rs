pub mod silhouette;
pub mod state;
pub mod writer;

use silhouette_bridge_common::protocol::{Notification, OutlinePoint};

use crate::outline::ContourPoint;
use state::{Emission, PublishState};

/// Owns the outline channel's publication state and turns each frame's
/// outline into at most one notification.
pub struct OutlinePublisher {
    state: PublishState,
    include_depth: bool,
}

impl OutlinePublisher {
    pub fn new(include_depth: bool) -> Self {
        Self {
            state: PublishState::Idle,
            include_depth,
        }
    }

    pub fn state(&self) -> PublishState {
        self.state
    }

    pub fn publish(&mut self, outline: &[ContourPoint]) -> Option<Notification> {
        match self.state.advance(!outline.is_empty()) {
            Emission::Nothing => None,
            Emission::Cleared => Some(Notification::OutlineCleared),
            Emission::Content => Some(Notification::Outline(
                outline
                    .iter()
                    .map(|p| OutlinePoint {
                        x: p.x as u32,
                        y: p.y as u32,
                        depth: self.include_depth.then_some(p.depth),
                    })
                    .collect(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: usize, y: usize) -> ContourPoint {
        ContourPoint { x, y, depth: 2150 }
    }

    #[test]
    fn first_empty_frame_is_silent() {
        let mut p = OutlinePublisher::new(true);
        assert!(p.publish(&[]).is_none());
        assert_eq!(p.state(), PublishState::Idle);
    }

    #[test]
    fn outline_then_two_empties_clears_once() {
        let mut p = OutlinePublisher::new(true);
        let line = p.publish(&[point(1, 1)]).unwrap().to_string();
        assert_eq!(line, "OUTLINE 1 1 1 2150");
        assert_eq!(p.publish(&[]), Some(Notification::OutlineCleared));
        assert_eq!(p.publish(&[]), None);
    }

    #[test]
    fn depth_tokens_follow_the_variant() {
        let mut p = OutlinePublisher::new(false);
        let line = p.publish(&[point(1, 1), point(4, 2)]).unwrap().to_string();
        assert_eq!(line, "OUTLINE 2 1 1 4 2");
    }

    #[test]
    fn consecutive_outlines_are_all_sent() {
        let mut p = OutlinePublisher::new(true);
        assert!(p.publish(&[point(1, 1)]).is_some());
        assert!(p.publish(&[point(2, 2)]).is_some());
        assert_eq!(p.state(), PublishState::Active);
    }
}
