//! Drawable viewport dimensions.

/// Minimum viewport dimension (prevents zero-size surfaces and NaN aspect ratios).
pub const MIN_VIEWPORT_DIMENSION: u32 = 1;

/// Physical size of the drawable area plus the device pixel ratio.
///
/// Zero-size reports (common on Wayland before the compositor assigns a
/// size, or while minimized) are clamped to 1×1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    pixel_ratio: f32,
}

impl Viewport {
    /// Create a viewport from physical dimensions and the device pixel ratio.
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self {
            width: width.max(MIN_VIEWPORT_DIMENSION),
            height: height.max(MIN_VIEWPORT_DIMENSION),
            pixel_ratio: sanitize_ratio(pixel_ratio),
        }
    }

    /// Apply new physical dimensions. Returns `true` if anything changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let width = width.max(MIN_VIEWPORT_DIMENSION);
        let height = height.max(MIN_VIEWPORT_DIMENSION);
        if width == self.width && height == self.height {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    /// Update the device pixel ratio (display scale factor).
    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        self.pixel_ratio = sanitize_ratio(pixel_ratio);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Width divided by height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

fn sanitize_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_matches_dimensions() {
        let viewport = Viewport::new(800, 600, 1.0);
        assert!((viewport.aspect() - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_size_clamped() {
        let mut viewport = Viewport::new(0, 0, 1.0);
        assert_eq!((viewport.width(), viewport.height()), (1, 1));
        assert!(viewport.resize(1024, 0));
        assert_eq!((viewport.width(), viewport.height()), (1024, 1));
    }

    #[test]
    fn test_resize_reports_change_once() {
        let mut viewport = Viewport::new(800, 600, 2.0);
        assert!(viewport.resize(1024, 768));
        assert!(!viewport.resize(1024, 768));
        assert_eq!(viewport.pixel_ratio(), 2.0);
    }

    #[test]
    fn test_invalid_pixel_ratio_defaults_to_one() {
        let mut viewport = Viewport::new(10, 10, f32::NAN);
        assert_eq!(viewport.pixel_ratio(), 1.0);
        viewport.set_pixel_ratio(-3.0);
        assert_eq!(viewport.pixel_ratio(), 1.0);
        viewport.set_pixel_ratio(1.5);
        assert_eq!(viewport.pixel_ratio(), 1.5);
    }
}
