use serde::{Deserialize, Serialize};

/// A point in display-surface coordinates (pixels of the widget showing the scan).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfacePoint {
    pub x: i32,
    pub y: i32,
}

impl SurfacePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A point on the native pixel grid of the scan image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: i32,
    pub y: i32,
}

impl ImagePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by `(dx, dy)`, saturating at the `i32` range.
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Float tuple form consumed by the `imageproc` drawing routines.
    pub fn to_f32(&self) -> (f32, f32) {
        (self.x as f32, self.y as f32)
    }
}

/// Width and height in pixels of either an image or a display surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, i.e. nothing is loaded or laid out yet.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_empty() {
        assert!(Dimensions::default().is_empty());
        assert!(Dimensions::new(400, 0).is_empty());
        assert!(!Dimensions::new(400, 300).is_empty());
        assert_eq!(Dimensions::new(400, 300).area(), 120_000);
    }

    #[test]
    fn test_dimensions_display() {
        assert_eq!(Dimensions::from((400, 300)).to_string(), "400x300");
    }

    #[test]
    fn test_image_point_translate() {
        let p = ImagePoint::new(5, 5).translate(10, -20);
        assert_eq!(p, ImagePoint::new(15, -15));
        assert_eq!(p.to_f32(), (15.0, -15.0));
        assert_eq!(
            ImagePoint::new(i32::MAX, i32::MIN).translate(1, -1),
            ImagePoint::new(i32::MAX, i32::MIN)
        );
    }
}
