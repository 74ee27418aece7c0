use silhouette_bridge_common::frame::{DepthFrame, Rect};

use super::trace::Direction;

/// Binary occupancy grid for one player, reused across frames.
pub struct OccupancyMask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl OccupancyMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reallocate for new frame dimensions. A no-op when they already match.
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells.resize(width * height, false);
    }

    /// Overwrite the mask from `frame`: a cell is set iff its pixel belongs to
    /// `target` and, when a region is given, lies inside it.
    ///
    /// The frame must have the mask's dimensions.
    pub fn build(&mut self, frame: &DepthFrame, target: u8, roi: Option<Rect>) {
        debug_assert_eq!((frame.width(), frame.height()), (self.width, self.height));
        let width = self.width;
        for (i, (cell, px)) in self.cells.iter_mut().zip(frame.pixels()).enumerate() {
            let inside = match roi {
                Some(r) => r.contains(i % width, i / width),
                None => true,
            };
            *cell = inside && px.player_index == target;
        }
    }

    /// Occupancy at `(x, y)`; anything outside the grid is unoccupied.
    pub fn is_occupied(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    /// Occupied with at least one free or off-grid 8-neighbour.
    pub fn is_boundary(&self, x: usize, y: usize) -> bool {
        let (x, y) = (x as isize, y as isize);
        self.is_occupied(x, y)
            && Direction::ALL.iter().any(|d| {
                let (dx, dy) = d.offset();
                !self.is_occupied(x + dx, y + dy)
            })
    }

    #[cfg(test)]
    pub(crate) fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let cells = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| b == b'#'))
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                mask.cells[y * width + x] = f(x, y);
            }
        }
        mask
    }
}
