use silhouette_bridge_common::protocol::{HeadPosition, Notification, OutlinePoint, Silhouette};

/// Latest values reported by the bridge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeView {
    pub ready: bool,
    pub sensor_missing: bool,
    pub head: Option<HeadPosition>,
    /// Empty while no outline is published.
    pub outline: Vec<OutlinePoint>,
    pub silhouette: Option<Silhouette>,
}

/// What a notification changed, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Ready,
    SensorMissing,
    HeadMoved,
    OutlineAppeared { points: usize },
    OutlineUpdated { points: usize },
    OutlineCleared,
    SilhouetteUpdated { runs: usize },
    SilhouetteCleared,
    /// Repeated empty notification.
    Unchanged,
}

impl BridgeView {
    pub fn has_outline(&self) -> bool {
        !self.outline.is_empty()
    }

    pub fn apply(&mut self, notification: Notification) -> Change {
        match notification {
            Notification::Ready => {
                self.ready = true;
                Change::Ready
            }
            Notification::NoSensor => {
                self.sensor_missing = true;
                Change::SensorMissing
            }
            Notification::Head(h) => {
                self.head = Some(h);
                Change::HeadMoved
            }
            Notification::Outline(points) => {
                let appeared = !self.has_outline();
                let n = points.len();
                self.outline = points;
                if appeared {
                    Change::OutlineAppeared { points: n }
                } else {
                    Change::OutlineUpdated { points: n }
                }
            }
            Notification::OutlineCleared => {
                if self.has_outline() {
                    self.outline.clear();
                    Change::OutlineCleared
                } else {
                    Change::Unchanged
                }
            }
            Notification::Silhouette(s) if s.is_empty() => {
                if self.silhouette.take().is_some() {
                    Change::SilhouetteCleared
                } else {
                    Change::Unchanged
                }
            }
            Notification::Silhouette(s) => {
                let runs = s.runs.len();
                self.silhouette = Some(s);
                Change::SilhouetteUpdated { runs }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Notification {
        line.parse().unwrap()
    }

    #[test]
    fn session_lifecycle() {
        let mut view = BridgeView::default();
        assert_eq!(view.apply(parse("BRIDGE_READY")), Change::Ready);
        assert!(view.ready);

        assert_eq!(view.apply(parse("HEAD 320 110 2.20")), Change::HeadMoved);
        assert_eq!(view.head.map(|h| (h.x, h.y)), Some((320, 110)));

        assert_eq!(
            view.apply(parse("OUTLINE 2 10 10 2200 11 10 2200")),
            Change::OutlineAppeared { points: 2 }
        );
        assert_eq!(
            view.apply(parse("OUTLINE 1 12 10")),
            Change::OutlineUpdated { points: 1 }
        );
        assert_eq!(view.outline[0].depth, None);

        assert_eq!(view.apply(parse("OUTLINE 0")), Change::OutlineCleared);
        assert!(!view.has_outline());
        assert_eq!(view.apply(parse("OUTLINE 0")), Change::Unchanged);
    }

    #[test]
    fn missing_sensor_is_recorded() {
        let mut view = BridgeView::default();
        assert_eq!(view.apply(parse("NO_KINECT")), Change::SensorMissing);
        assert!(view.sensor_missing);
        assert!(!view.ready);
    }

    #[test]
    fn silhouette_replaced_and_cleared() {
        let mut view = BridgeView::default();
        assert_eq!(view.apply(parse("SILHOUETTE 4 2 0")), Change::Unchanged);
        assert_eq!(
            view.apply(parse("SILHOUETTE 4 2 2 0 1 2 1 1 0 4 1")),
            Change::SilhouetteUpdated { runs: 2 }
        );
        assert_eq!(view.silhouette.as_ref().map(|s| s.width), Some(4));
        assert_eq!(view.apply(parse("SILHOUETTE 4 2 0")), Change::SilhouetteCleared);
        assert!(view.silhouette.is_none());
    }
}
