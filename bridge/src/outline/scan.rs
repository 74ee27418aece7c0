use silhouette_bridge_common::frame::PixelCoord;

use super::mask::OccupancyMask;

/// First boundary pixel in row-major order (top to bottom, left to right).
///
/// The result is the deterministic trace seed. `None` when nothing is
/// occupied or no occupied pixel touches free space or the frame edge.
pub fn find_seed(mask: &OccupancyMask) -> Option<PixelCoord> {
    (0..mask.height())
        .flat_map(|y| (0..mask.width()).map(move |x| (x, y)))
        .find(|&(x, y)| mask.is_boundary(x, y))
        .map(|(x, y)| PixelCoord::new(x, y))
}
