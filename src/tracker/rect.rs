use crate::tracker::Position;

/// Axis-aligned bounding box in pixel space, stored as top-left plus size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

/// Integer pixel window clamped to an image, ready for cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelWindow {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from corner coordinates (x1, y1, x2, y2), as detectors report them.
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Reference point of the tracked object.
    #[inline]
    pub fn center(&self) -> Position {
        Position::new(
            f64::from(self.x + self.width / 2.0),
            f64::from(self.y + self.height / 2.0),
        )
    }

    /// Grow the box by `pad` pixels on every side and clamp it to an
    /// image of `image_width` x `image_height`.
    ///
    /// Fractional coordinates are truncated toward zero.
    pub fn padded_window(&self, pad: u32, image_width: u32, image_height: u32) -> PixelWindow {
        let [x1, y1, x2, y2] = self.to_tlbr();
        let pad = i64::from(pad);
        let clamp = |v: i64, max: u32| v.clamp(0, i64::from(max)) as u32;

        let left = clamp(x1 as i64 - pad, image_width);
        let top = clamp(y1 as i64 - pad, image_height);
        let right = clamp(x2 as i64 + pad, image_width);
        let bottom = clamp(y2 as i64 + pad, image_height);

        PixelWindow {
            x: left,
            y: top,
            width: right.saturating_sub(left),
            height: bottom.saturating_sub(top),
        }
    }
}
