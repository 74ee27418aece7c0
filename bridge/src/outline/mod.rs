pub mod bounds;
pub mod mask;
pub mod sample;
pub mod scan;
pub mod trace;

use silhouette_bridge_common::frame::{DepthFrame, Rect};
use tracing::{debug, trace};

use mask::OccupancyMask;
use sample::Decimator;

/// A kept boundary pixel with the depth sampled at trace time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContourPoint {
    pub x: usize,
    pub y: usize,
    pub depth: u16,
}

/// Per-frame outline extraction: occupancy mask, seed scan, Moore-neighbour
/// trace and decimation.
///
/// Scratch buffers are sized from the sensor's frame dimensions and reused
/// for every frame.
pub struct OutlineTracker {
    mask: OccupancyMask,
    outline: Vec<ContourPoint>,
    stride: usize,
    max_points: usize,
}

impl OutlineTracker {
    pub fn new(width: usize, height: usize, stride: usize, max_points: usize) -> Self {
        Self {
            mask: OccupancyMask::new(width, height),
            outline: Vec::with_capacity(max_points),
            stride,
            max_points,
        }
    }

    /// Trace the outline of `target` in `frame`, optionally restricted to
    /// `roi`. The returned slice is empty when the player is not in view.
    pub fn extract(&mut self, frame: &DepthFrame, target: u8, roi: Option<Rect>) -> &[ContourPoint] {
        if (frame.width(), frame.height()) != (self.mask.width(), self.mask.height()) {
            debug!(
                from_width = self.mask.width(),
                from_height = self.mask.height(),
                width = frame.width(),
                height = frame.height(),
                "frame dimensions changed, resizing mask"
            );
            self.mask.resize(frame.width(), frame.height());
        }

        self.outline.clear();
        self.mask.build(frame, target, roi);

        let Some(seed) = scan::find_seed(&self.mask) else {
            trace!(target, "no boundary pixel for player");
            return &self.outline;
        };

        let mut decimator = Decimator::new(frame, &mut self.outline, self.stride, self.max_points);
        let summary = trace::trace_contour(&self.mask, seed, |p| decimator.offer(p));
        let traced = decimator.offered();
        trace!(
            target,
            seed_x = seed.x,
            seed_y = seed.y,
            steps = summary.steps,
            traced,
            end = ?summary.end,
            "contour traced"
        );
        if summary.end == trace::TraceEnd::StepLimit {
            debug!(steps = summary.steps, "trace hit the step ceiling, outline truncated");
        }

        &self.outline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silhouette_bridge_common::frame::DepthPixel;

    fn frame_from(width: usize, height: usize, f: impl Fn(usize, usize) -> Option<u8>) -> DepthFrame {
        let mut frame = DepthFrame::empty(width, height);
        for y in 0..height {
            for x in 0..width {
                if let Some(player) = f(x, y) {
                    frame.set(x, y, DepthPixel::new((2000 + x) as u16, player));
                }
            }
        }
        frame
    }

    #[test]
    fn single_pixel_outline() {
        let frame = frame_from(4, 4, |x, y| ((x, y) == (1, 1)).then_some(1));
        let mut tracker = OutlineTracker::new(4, 4, 3, 320);
        let outline = tracker.extract(&frame, 1, None);
        assert_eq!(outline, &[ContourPoint { x: 1, y: 1, depth: 2001 }]);
    }

    #[test]
    fn square_is_decimated_by_stride() {
        let frame = frame_from(5, 5, |x, y| ((1..=3).contains(&x) && (1..=3).contains(&y)).then_some(2));
        let mut tracker = OutlineTracker::new(5, 5, 3, 320);
        let outline: Vec<(usize, usize)> = tracker
            .extract(&frame, 2, None)
            .iter()
            .map(|p| (p.x, p.y))
            .collect();
        // trace order (1,1) (2,1) (3,1) (3,2) (3,3) (2,3) (1,3) (1,2)
        assert_eq!(outline, vec![(1, 1), (3, 2), (1, 3)]);
    }

    #[test]
    fn other_players_are_ignored() {
        let frame = frame_from(6, 6, |x, _| (x < 3).then_some(2));
        let mut tracker = OutlineTracker::new(6, 6, 1, 320);
        assert!(tracker.extract(&frame, 1, None).is_empty());
        assert!(!tracker.extract(&frame, 2, None).is_empty());
    }

    #[test]
    fn count_never_exceeds_cap() {
        let frame = frame_from(200, 150, |x, y| {
            let (dx, dy) = (x as i64 - 100, y as i64 - 75);
            (dx * dx + dy * dy <= 70 * 70).then_some(1)
        });
        let mut tracker = OutlineTracker::new(200, 150, 1, 50);
        let outline = tracker.extract(&frame, 1, None);
        assert_eq!(outline.len(), 50);

        let mut tracker = OutlineTracker::new(200, 150, 3, 320);
        let outline = tracker.extract(&frame, 1, None);
        assert!(outline.len() <= 320);
        assert!(!outline.is_empty());
    }

    #[test]
    fn every_kept_point_is_boundary_and_owned() {
        let frame = frame_from(60, 40, |x, y| {
            let body = (20..40).contains(&x) && (10..35).contains(&y);
            let head = {
                let (dx, dy) = (x as i64 - 30, y as i64 - 6);
                dx * dx + dy * dy <= 16
            };
            let arm = (8..52).contains(&x) && (14..17).contains(&y);
            (body || head || arm).then_some(1)
        });
        let mut tracker = OutlineTracker::new(60, 40, 2, 320);
        let points = tracker.extract(&frame, 1, None).to_vec();
        assert!(!points.is_empty());
        for p in &points {
            assert_eq!(frame.player_index_at(p.x, p.y), Some(1));
            assert!(tracker.mask.is_boundary(p.x, p.y), "({}, {}) not on boundary", p.x, p.y);
        }
    }

    #[test]
    fn resizes_for_new_dimensions() {
        let mut tracker = OutlineTracker::new(4, 4, 1, 320);
        let frame = frame_from(8, 3, |x, y| ((x, y) == (6, 2)).then_some(1));
        let outline = tracker.extract(&frame, 1, None);
        assert_eq!(outline.len(), 1);
        assert_eq!((outline[0].x, outline[0].y), (6, 2));
    }

    #[test]
    fn region_limits_the_trace() {
        let frame = frame_from(10, 10, |x, y| ((x < 2 && y < 2) || (x > 5 && y > 5)).then_some(1));
        let mut tracker = OutlineTracker::new(10, 10, 1, 320);
        let roi = Rect {
            left: 4,
            top: 4,
            right: 10,
            bottom: 10,
        };
        let outline = tracker.extract(&frame, 1, Some(roi));
        assert_eq!((outline[0].x, outline[0].y), (6, 6));
    }
}
