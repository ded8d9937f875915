/// An axis-aligned pixel box given by its corners `[x1, x2) x [y1, y2)`.
///
/// Corners are stored as computed from the label geometry, so a region
/// may lie partly outside the frame or be inverted. [`Region::clamp`]
/// yields the visible part, or `None` when nothing is visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Region {
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Converts a normalized center/size box to pixel corners.
    ///
    /// Each corner is truncated toward zero independently, so
    /// `x2 - x1` may differ by one from `width * frame_width`.
    pub fn from_normalized(
        x_center: f64,
        y_center: f64,
        width: f64,
        height: f64,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        Self {
            x1: ((x_center - width / 2.0) * fw) as i32,
            y1: ((y_center - height / 2.0) * fh) as i32,
            x2: ((x_center + width / 2.0) * fw) as i32,
            y2: ((y_center + height / 2.0) * fh) as i32,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Intersects the region with a `frame_width x frame_height` frame.
    pub fn clamp(&self, frame_width: u32, frame_height: u32) -> Option<Region> {
        let fw = frame_width.min(i32::MAX as u32) as i32;
        let fh = frame_height.min(i32::MAX as u32) as i32;
        let clamped = Region {
            x1: self.x1.clamp(0, fw),
            y1: self.y1.clamp(0, fh),
            x2: self.x2.clamp(0, fw),
            y2: self.y2.clamp(0, fh),
        };
        if self.is_degenerate() || clamped.is_degenerate() {
            None
        } else {
            Some(clamped)
        }
    }

    /// Corners as `usize`. Only meaningful on a clamped region.
    pub(crate) fn bounds_usize(&self) -> (usize, usize, usize, usize) {
        (
            self.x1.max(0) as usize,
            self.y1.max(0) as usize,
            self.x2.max(0) as usize,
            self.y2.max(0) as usize,
        )
    }
}
