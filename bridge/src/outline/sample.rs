use std::ops::ControlFlow;

use silhouette_bridge_common::frame::{DepthFrame, PixelCoord};

use super::ContourPoint;

/// Keeps every `stride`-th traced pixel (the seed always), samples its depth,
/// and stops the trace once `max_points` are kept.
pub struct Decimator<'a> {
    frame: &'a DepthFrame,
    out: &'a mut Vec<ContourPoint>,
    stride: usize,
    max_points: usize,
    offered: usize,
}

impl<'a> Decimator<'a> {
    /// `out` is cleared; `stride` and `max_points` are treated as at least 1.
    pub fn new(
        frame: &'a DepthFrame,
        out: &'a mut Vec<ContourPoint>,
        stride: usize,
        max_points: usize,
    ) -> Self {
        out.clear();
        Self {
            frame,
            out,
            stride: stride.max(1),
            max_points: max_points.max(1),
            offered: 0,
        }
    }

    pub fn offer(&mut self, pixel: PixelCoord) -> ControlFlow<()> {
        let index = self.offered;
        self.offered += 1;

        if index % self.stride == 0 {
            self.out.push(ContourPoint {
                x: pixel.x,
                y: pixel.y,
                depth: self.frame.depth_at(pixel.x, pixel.y).unwrap_or(0),
            });
        }

        if self.out.len() >= self.max_points {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    /// Traced pixels seen so far, kept or not.
    pub fn offered(&self) -> usize {
        self.offered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silhouette_bridge_common::frame::DepthPixel;

    fn ramp_frame(width: usize, height: usize) -> DepthFrame {
        let mut f = DepthFrame::empty(width, height);
        for y in 0..height {
            for x in 0..width {
                f.set(x, y, DepthPixel::new((1000 + y * 10 + x) as u16, 1));
            }
        }
        f
    }

    #[test]
    fn keeps_seed_and_every_stride() {
        let frame = ramp_frame(8, 2);
        let mut out = Vec::new();
        let mut d = Decimator::new(&frame, &mut out, 3, 320);
        for x in 0..8 {
            assert!(d.offer(PixelCoord::new(x, 1)).is_continue());
        }
        assert_eq!(d.offered(), 8);
        let xs: Vec<usize> = out.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0, 3, 6]);
        assert_eq!(out[1].depth, 1013);
    }

    #[test]
    fn stops_at_cap() {
        let frame = ramp_frame(16, 1);
        let mut out = Vec::new();
        let mut d = Decimator::new(&frame, &mut out, 1, 4);
        let flows: Vec<bool> = (0..6).map(|x| d.offer(PixelCoord::new(x, 0)).is_break()).collect();
        assert_eq!(flows[..4], [false, false, false, true]);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn out_of_range_depth_reads_zero() {
        let frame = ramp_frame(2, 2);
        let mut out = Vec::new();
        let mut d = Decimator::new(&frame, &mut out, 1, 8);
        let _ = d.offer(PixelCoord::new(5, 5));
        assert_eq!(out[0].depth, 0);
    }

    #[test]
    fn reuse_clears_previous_points() {
        let frame = ramp_frame(2, 2);
        let mut out = vec![ContourPoint { x: 9, y: 9, depth: 9 }];
        let _ = Decimator::new(&frame, &mut out, 3, 8);
        assert!(out.is_empty());
    }
}
