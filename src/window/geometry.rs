use std::fmt;

/// Host screen geometry as reported by the platform.
///
/// `screen_left`/`screen_top` carry the offset of the host window on a
/// multi-monitor desktop. `avail_width` is the usable width of the screen; the
/// ratio between `inner_width` and `avail_width` is the display zoom factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenGeometry {
    pub screen_left: i32,
    pub screen_top: i32,
    pub inner_width: u32,
    pub inner_height: u32,
    pub avail_width: u32,
}

impl ScreenGeometry {
    /// A single screen without offset or zoom.
    pub fn plain(width: u32, height: u32) -> Self {
        Self {
            screen_left: 0,
            screen_top: 0,
            inner_width: width,
            inner_height: height,
            avail_width: width,
        }
    }

    pub fn zoom(&self) -> f64 {
        if self.avail_width == 0 || self.inner_width == 0 {
            1.0
        } else {
            f64::from(self.inner_width) / f64::from(self.avail_width)
        }
    }
}

/// Position and size requested for a new top-level surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceFeatures {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for SurfaceFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "width={},height={},left={},top={}",
            self.width, self.height, self.left, self.top
        )
    }
}

/// Center a `width` x `height` surface over the host window.
pub fn centered_features(screen: &ScreenGeometry, width: u32, height: u32) -> SurfaceFeatures {
    let zoom = screen.zoom();
    let spare_x = f64::from(screen.inner_width.saturating_sub(width));
    let spare_y = f64::from(screen.inner_height.saturating_sub(height));
    SurfaceFeatures {
        left: offset(screen.screen_left, spare_x / 2.0 / zoom),
        top: offset(screen.screen_top, spare_y / 2.0 / zoom),
        width: extent(f64::from(width) / zoom),
        height: extent(f64::from(height) / zoom),
    }
}

/// Positions outside the `i32` range pin to its bounds.
fn offset(origin: i32, delta: f64) -> i32 {
    (f64::from(origin) + delta.round()).clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

fn extent(size: f64) -> u32 {
    size.round().clamp(0.0, f64::from(u32::MAX)) as u32
}
