use std::sync::Arc;

use silhouette_bridge_common::config::{OutlineConfig, SilhouetteConfig};
use silhouette_bridge_common::frame::DepthFrame;
use silhouette_bridge_common::protocol::Notification;
use silhouette_bridge_common::skeleton::{first_tracked, TrackedSubject};
use tracing::{debug, info};

use crate::outline::bounds::subject_bounds;
use crate::outline::OutlineTracker;
use crate::publish::silhouette::SilhouettePublisher;
use crate::publish::OutlinePublisher;
use crate::sensor::mapper::CoordinateMapper;

/// Per-sensor processing context: scratch buffers plus publication state.
///
/// Not internally synchronized; callers that process frames from several
/// threads keep it behind one lock and write the returned notification
/// before releasing it.
pub struct Session {
    tracker: OutlineTracker,
    outline: OutlinePublisher,
    silhouette: Option<SilhouettePublisher>,
    mapper: Arc<dyn CoordinateMapper>,
    target_override: Option<u8>,
    use_roi: bool,
    roi_padding: usize,
}

impl Session {
    pub fn new(
        width: usize,
        height: usize,
        outline: &OutlineConfig,
        silhouette: &SilhouetteConfig,
        mapper: Arc<dyn CoordinateMapper>,
    ) -> Self {
        Self {
            tracker: OutlineTracker::new(width, height, outline.stride, outline.max_points),
            outline: OutlinePublisher::new(outline.include_depth),
            silhouette: silhouette.enabled.then(SilhouettePublisher::default),
            mapper,
            target_override: outline.target_override(),
            use_roi: outline.use_skeleton_roi,
            roi_padding: outline.roi_padding,
        }
    }

    /// Process one depth frame against the current skeleton slots and return
    /// the outline notification to write, if any.
    ///
    /// Missing or zero-sized frames, no tracked subject, and unusable
    /// skeleton geometry all take the empty-outline path.
    pub fn process_frame(
        &mut self,
        frame: Option<&DepthFrame>,
        subjects: &[TrackedSubject],
    ) -> Option<Notification> {
        let Some(frame) = frame.filter(|f| !f.is_empty()) else {
            return self.clear();
        };
        let Some(subject) = first_tracked(subjects) else {
            return self.clear();
        };

        let target = self.target_override.unwrap_or(subject.player_index);
        let roi = if self.use_roi {
            let bounds = subject_bounds(
                subject,
                self.mapper.as_ref(),
                frame.width(),
                frame.height(),
                self.roi_padding,
            );
            if bounds.is_none() {
                debug!(player = subject.player_index, "no usable joint geometry for region");
                return self.clear();
            }
            bounds
        } else {
            None
        };

        let was_active = self.outline.state().is_active();
        let points = self.tracker.extract(frame, target, roi);
        let notification = self.outline.publish(points);
        if !was_active && self.outline.state().is_active() {
            info!(target, points = points.len(), "player outline acquired");
        }
        notification
    }

    /// The empty-outline path on its own.
    pub fn clear(&mut self) -> Option<Notification> {
        let notification = self.outline.publish(&[]);
        if notification.is_some() {
            info!("player outline lost");
        }
        notification
    }

    /// Silhouette notification for `frame`, when silhouettes are enabled.
    pub fn silhouette(&mut self, frame: Option<&DepthFrame>) -> Option<Notification> {
        self.silhouette.as_mut()?.publish(frame)
    }
}
