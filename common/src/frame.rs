/// Number of low bits in a packed depth sample that carry the player index.
pub const PLAYER_INDEX_BITS: u16 = 3;
const PLAYER_INDEX_MASK: u16 = (1 << PLAYER_INDEX_BITS) - 1;

/// One depth sample: distance in millimetres plus the owning player.
///
/// `player_index == 0` means no tracked subject owns the pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthPixel {
    pub depth: u16,
    pub player_index: u8,
}

impl DepthPixel {
    pub fn new(depth: u16, player_index: u8) -> Self {
        Self {
            depth,
            player_index,
        }
    }

    /// Decode the sensor's packed layout: `depth_mm << 3 | player_index`.
    pub fn from_packed(raw: u16) -> Self {
        Self {
            depth: raw >> PLAYER_INDEX_BITS,
            player_index: (raw & PLAYER_INDEX_MASK) as u8,
        }
    }

    /// Inverse of [`DepthPixel::from_packed`]. Depth values above 13 bits are
    /// saturated and the player index is truncated to 3 bits.
    pub fn to_packed(self) -> u16 {
        let depth = self.depth.min(u16::MAX >> PLAYER_INDEX_BITS);
        (depth << PLAYER_INDEX_BITS) | (self.player_index as u16 & PLAYER_INDEX_MASK)
    }
}

/// Integer pixel location, `0 <= x < width`, `0 <= y < height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCoord {
    pub x: usize,
    pub y: usize,
}

impl PixelCoord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned pixel region; `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Rect {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    pub fn width(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> usize {
        self.bottom.saturating_sub(self.top)
    }
}

/// A full depth frame, row-major. Read-only to the outline pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    width: usize,
    height: usize,
    pixels: Vec<DepthPixel>,
}

impl DepthFrame {
    pub fn new(width: usize, height: usize, pixels: Vec<DepthPixel>) -> Result<Self, FrameError> {
        let expected = width * height;
        if pixels.len() != expected {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                got: pixels.len(),
                expected,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame where no pixel belongs to any player.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![DepthPixel::default(); width * height],
        }
    }

    /// Build a frame from raw packed sensor samples.
    pub fn from_packed(width: usize, height: usize, raw: &[u16]) -> Result<Self, FrameError> {
        Self::new(
            width,
            height,
            raw.iter().copied().map(DepthPixel::from_packed).collect(),
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[DepthPixel] {
        &self.pixels
    }

    pub fn row(&self, y: usize) -> &[DepthPixel] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<DepthPixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    pub fn set(&mut self, x: usize, y: usize, pixel: DepthPixel) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = pixel;
        }
    }

    pub fn player_index_at(&self, x: usize, y: usize) -> Option<u8> {
        self.pixel(x, y).map(|p| p.player_index)
    }

    pub fn depth_at(&self, x: usize, y: usize) -> Option<u16> {
        self.pixel(x, y).map(|p| p.depth)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame {width}x{height} needs {expected} pixels, got {got}")]
    SizeMismatch {
        width: usize,
        height: usize,
        got: usize,
        expected: usize,
    },
}
