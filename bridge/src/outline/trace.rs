use std::ops::ControlFlow;

use silhouette_bridge_common::frame::PixelCoord;

use super::mask::OccupancyMask;

/// Compass direction, numbered clockwise from east with y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    East = 0,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    North,
    NorthEast,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
    ];

    pub fn from_index(i: usize) -> Self {
        Self::ALL[i % 8]
    }

    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
        }
    }

    /// `steps` positions clockwise.
    pub fn rotate_cw(self, steps: usize) -> Self {
        Self::from_index(self as usize + steps)
    }

    pub fn opposite(self) -> Self {
        self.rotate_cw(4)
    }
}

/// Why a trace stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEnd {
    /// The walk came back to the seed.
    Closed,
    /// No occupied neighbour in any direction.
    DeadEnd,
    /// Hit the step ceiling.
    StepLimit,
    /// The visitor asked to stop.
    Truncated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSummary {
    pub steps: usize,
    pub end: TraceEnd,
}

/// Step ceiling for a mask: four times its pixel count.
pub fn step_limit(mask: &OccupancyMask) -> usize {
    4 * mask.width() * mask.height()
}

/// Walk the 8-connected boundary containing `seed` with Moore-neighbour
/// tracing, handing each boundary pixel to `visit` in trace order. The seed
/// is always visited first.
pub fn trace_contour<F>(mask: &OccupancyMask, seed: PixelCoord, visit: F) -> TraceSummary
where
    F: FnMut(PixelCoord) -> ControlFlow<()>,
{
    trace_with_limit(mask, seed, step_limit(mask), visit)
}

pub(crate) fn trace_with_limit<F>(
    mask: &OccupancyMask,
    seed: PixelCoord,
    max_steps: usize,
    mut visit: F,
) -> TraceSummary
where
    F: FnMut(PixelCoord) -> ControlFlow<()>,
{
    if visit(seed).is_break() {
        return TraceSummary {
            steps: 0,
            end: TraceEnd::Truncated,
        };
    }

    let mut current = seed;
    // The seed has no predecessor; pretend we arrived from the west.
    let mut backtrack = Direction::West;
    let mut steps = 0;

    loop {
        if steps >= max_steps {
            return TraceSummary {
                steps,
                end: TraceEnd::StepLimit,
            };
        }
        steps += 1;

        // clockwise sweep from two positions past the backtrack direction
        let next = (0..8).map(|i| backtrack.rotate_cw(2 + i)).find_map(|dir| {
            let (dx, dy) = dir.offset();
            let nx = current.x as isize + dx;
            let ny = current.y as isize + dy;
            mask.is_occupied(nx, ny)
                .then(|| (PixelCoord::new(nx as usize, ny as usize), dir))
        });

        let Some((pixel, dir)) = next else {
            return TraceSummary {
                steps,
                end: TraceEnd::DeadEnd,
            };
        };

        if pixel == seed {
            return TraceSummary {
                steps,
                end: TraceEnd::Closed,
            };
        }

        if visit(pixel).is_break() {
            return TraceSummary {
                steps,
                end: TraceEnd::Truncated,
            };
        }

        current = pixel;
        backtrack = dir.opposite();
    }
}
